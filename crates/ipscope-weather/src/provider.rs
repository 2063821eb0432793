//! OpenWeatherMap client.

use crate::types::{OpenWeatherResponse, WeatherError, WeatherSnapshot};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: Option<String>,
    units: String,
}

impl WeatherProvider {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        units: &str,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            units: units.to_string(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch current conditions at the given coordinates.
    pub async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;

        let url = format!("{}/weather", self.base_url);
        let lat = latitude.to_string();
        let lon = longitude.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", api_key),
                ("units", self.units.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Weather API returned status {}", status);
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body: OpenWeatherResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        let snapshot = WeatherSnapshot::from(body);
        if !snapshot.is_available() {
            return Err(WeatherError::Parse("response carried no conditions".to_string()));
        }

        Ok(snapshot)
    }
}
