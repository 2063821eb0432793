//! Weather and local time for a located record.

use async_trait::async_trait;
use ipscope_weather::{local_time_now, WeatherError, WeatherProvider, WeatherSnapshot, WeatherTimeResult};
use std::time::Duration;

use crate::cache::{CacheKey, TtlCache};

const WEATHER_SCOPE: &str = "weather";

/// Current conditions at a coordinate
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, WeatherError>;

    fn local_time(&self, timezone_name: &str) -> String {
        local_time_now(timezone_name)
    }

    /// Local time plus current weather. Never fails: any weather error
    /// degrades to the all-null block. Conditions are cached per rounded
    /// coordinate for `ttl`; local time is always computed fresh.
    async fn fetch(
        &self,
        cache: &TtlCache,
        ttl: Duration,
        latitude: f64,
        longitude: f64,
        timezone_name: &str,
    ) -> WeatherTimeResult {
        let key = CacheKey::new(WEATHER_SCOPE, format!("{:.2},{:.2}", latitude, longitude));
        let weather = match cache
            .get_or_compute(key, ttl, || self.current(latitude, longitude))
            .await
        {
            Ok(w) => w,
            Err(e) => {
                tracing::debug!("Weather unavailable: {}", e);
                WeatherSnapshot::unavailable()
            }
        };

        WeatherTimeResult {
            local_time: self.local_time(timezone_name),
            weather,
        }
    }
}

#[async_trait]
impl WeatherSource for WeatherProvider {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, WeatherError> {
        WeatherProvider::current(self, latitude, longitude).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TTL: Duration = Duration::from_secs(600);

    fn provider_for(server: &MockServer, api_key: Option<&str>) -> WeatherProvider {
        WeatherProvider::new(
            &server.uri(),
            api_key.map(str::to_string),
            "metric",
            Duration::from_secs(2),
        )
        .unwrap()
    }

    async fn mount_clear_sky(server: &MockServer, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "main": {"temp": 30.0, "feels_like": 33.0, "humidity": 80},
                "weather": [{"main": "Clear", "description": "clear sky"}]
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_caches_conditions_per_coordinate() {
        let mock_server = MockServer::start().await;
        mount_clear_sky(&mock_server, 2).await;

        let provider = provider_for(&mock_server, Some("k"));
        let cache = TtlCache::new();

        let first = provider.fetch(&cache, TTL, 1.29, 103.85, "Asia/Singapore").await;
        let second = provider.fetch(&cache, TTL, 1.2901, 103.8499, "Asia/Singapore").await;
        let elsewhere = provider.fetch(&cache, TTL, 51.5, -0.12, "Europe/London").await;

        assert_eq!(first.weather.condition.as_deref(), Some("Clear Sky"));
        assert_eq!(second.weather, first.weather);
        assert!(elsewhere.weather.is_available());
        assert_ne!(first.local_time, "Unknown");
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_degrades_on_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&mock_server)
            .await;

        let provider = provider_for(&mock_server, Some("bad_key"));
        let cache = TtlCache::new();

        for _ in 0..2 {
            let result = provider.fetch(&cache, TTL, 40.7, -74.0, "America/New_York").await;
            assert_eq!(result.weather, WeatherSnapshot::unavailable());
            assert_ne!(result.local_time, "Unknown");
        }
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_without_key_still_reports_time() {
        let mock_server = MockServer::start().await;
        mount_clear_sky(&mock_server, 0).await;

        let provider = provider_for(&mock_server, None);
        let result = provider
            .fetch(&TtlCache::new(), TTL, 0.0, 0.0, "UTC")
            .await;

        assert!(!result.weather.is_available());
        assert!(result.local_time.ends_with("UTC"));
    }

    #[tokio::test]
    async fn test_fetch_with_unknown_zone() {
        let mock_server = MockServer::start().await;
        mount_clear_sky(&mock_server, 1).await;

        let provider = provider_for(&mock_server, Some("k"));
        let result = provider
            .fetch(&TtlCache::new(), TTL, 1.29, 103.85, "Not/AZone")
            .await;

        assert_eq!(result.local_time, "Unknown");
        assert_eq!(result.weather.condition.as_deref(), Some("Clear Sky"));
    }
}
