use serde::{Deserialize, Serialize};

/// Placeholder used whenever a value could not be determined
pub const UNKNOWN: &str = "Unknown";

/// Current weather conditions
///
/// Every field is optional; a block with nothing filled in is the
/// "unavailable" placeholder and serializes as all `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<u8>,
    pub condition: Option<String>,
}

impl WeatherSnapshot {
    /// The all-null block returned when weather cannot be fetched
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.temperature.is_some() || self.condition.is_some()
    }
}

/// Weather plus wall-clock time at the looked-up location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherTimeResult {
    pub local_time: String,
    pub weather: WeatherSnapshot,
}

impl WeatherTimeResult {
    pub fn unknown() -> Self {
        Self {
            local_time: UNKNOWN.to_string(),
            weather: WeatherSnapshot::unavailable(),
        }
    }
}

impl Default for WeatherTimeResult {
    fn default() -> Self {
        Self::unknown()
    }
}

/// OpenWeatherMap `/weather` response (only the fields we read)
#[derive(Debug, Deserialize)]
pub(crate) struct OpenWeatherResponse {
    pub main: Option<OpenWeatherMain>,
    #[serde(default)]
    pub weather: Vec<OpenWeatherCondition>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenWeatherMain {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenWeatherCondition {
    pub main: Option<String>,
    pub description: Option<String>,
}

impl From<OpenWeatherResponse> for WeatherSnapshot {
    fn from(resp: OpenWeatherResponse) -> Self {
        let (temperature, feels_like, humidity) = match resp.main {
            Some(main) => (
                main.temp,
                main.feels_like,
                main.humidity.map(|h| h.clamp(0.0, 100.0).round() as u8),
            ),
            None => (None, None, None),
        };

        let condition = resp.weather.into_iter().next().and_then(|c| {
            c.description
                .filter(|d| !d.trim().is_empty())
                .map(|d| title_case(&d))
                .or(c.main)
        });

        Self {
            temperature,
            feels_like,
            humidity,
            condition,
        }
    }
}

/// "scattered clouds" -> "Scattered Clouds"
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Weather API key is not configured")]
    MissingApiKey,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather API returned status {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
}
