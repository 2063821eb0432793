use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Environment variable holding the weather API key
pub const WEATHER_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-upstream request timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Cache lifetimes
    #[serde(default)]
    pub cache: CacheConfig,

    /// Upstream service base URLs
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Weather settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, e.g. "0.0.0.0"
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    /// Resolve the configured host and port into a bindable address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            ConfigError::Invalid(format!("server.host is not an IP address: {}", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Request timeouts, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_geo_timeout")]
    pub geo_secs: u64,
    #[serde(default = "default_geo_timeout")]
    pub whois_secs: u64,
    #[serde(default = "default_geo_timeout")]
    pub ipv4_echo_secs: u64,
    #[serde(default = "default_ipv6_timeout")]
    pub ipv6_echo_secs: u64,
    #[serde(default = "default_geo_timeout")]
    pub weather_secs: u64,
}

fn default_geo_timeout() -> u64 {
    5
}

fn default_ipv6_timeout() -> u64 {
    3
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            geo_secs: default_geo_timeout(),
            whois_secs: default_geo_timeout(),
            ipv4_echo_secs: default_geo_timeout(),
            ipv6_echo_secs: default_ipv6_timeout(),
            weather_secs: default_geo_timeout(),
        }
    }
}

impl TimeoutConfig {
    pub fn geo(&self) -> Duration {
        Duration::from_secs(self.geo_secs)
    }

    pub fn whois(&self) -> Duration {
        Duration::from_secs(self.whois_secs)
    }

    pub fn ipv4_echo(&self) -> Duration {
        Duration::from_secs(self.ipv4_echo_secs)
    }

    pub fn ipv6_echo(&self) -> Duration {
        Duration::from_secs(self.ipv6_echo_secs)
    }

    pub fn weather(&self) -> Duration {
        Duration::from_secs(self.weather_secs)
    }
}

/// Cache lifetimes, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_lookup_ttl")]
    pub geo_ttl_secs: u64,
    #[serde(default = "default_lookup_ttl")]
    pub whois_ttl_secs: u64,
    #[serde(default = "default_weather_ttl")]
    pub weather_ttl_secs: u64,
    #[serde(default = "default_self_ip_ttl")]
    pub self_ip_ttl_secs: u64,
}

fn default_lookup_ttl() -> u64 {
    3600
}

fn default_weather_ttl() -> u64 {
    600
}

fn default_self_ip_ttl() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            geo_ttl_secs: default_lookup_ttl(),
            whois_ttl_secs: default_lookup_ttl(),
            weather_ttl_secs: default_weather_ttl(),
            self_ip_ttl_secs: default_self_ip_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn geo_ttl(&self) -> Duration {
        Duration::from_secs(self.geo_ttl_secs)
    }

    pub fn whois_ttl(&self) -> Duration {
        Duration::from_secs(self.whois_ttl_secs)
    }

    pub fn weather_ttl(&self) -> Duration {
        Duration::from_secs(self.weather_ttl_secs)
    }

    pub fn self_ip_ttl(&self) -> Duration {
        Duration::from_secs(self.self_ip_ttl_secs)
    }
}

/// Base URLs of every upstream service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// IPv4 echo, returns `{"ip": "..."}`
    pub ipv4_echo: String,
    /// IPv6-capable echo, same shape
    pub ipv6_echo: String,
    /// Primary geolocation (ipapi.co)
    pub ipapi_co: String,
    /// Secondary geolocation (ip-api.com)
    pub ip_api_com: String,
    /// Tertiary geolocation (ipinfo.io)
    pub ipinfo: String,
    /// WHOIS enrichment (ipwho.is)
    pub ipwhois: String,
    /// Current weather (OpenWeatherMap)
    pub openweather: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            ipv4_echo: "https://api.ipify.org?format=json".to_string(),
            ipv6_echo: "https://api64.ipify.org?format=json".to_string(),
            ipapi_co: "https://ipapi.co".to_string(),
            ip_api_com: "http://ip-api.com".to_string(),
            ipinfo: "https://ipinfo.io".to_string(),
            ipwhois: "https://ipwho.is".to_string(),
            openweather: "https://api.openweathermap.org/data/2.5".to_string(),
        }
    }
}

impl EndpointConfig {
    fn fields(&self) -> [(&'static str, &str); 7] {
        [
            ("endpoints.ipv4_echo", &self.ipv4_echo),
            ("endpoints.ipv6_echo", &self.ipv6_echo),
            ("endpoints.ipapi_co", &self.ipapi_co),
            ("endpoints.ip_api_com", &self.ip_api_com),
            ("endpoints.ipinfo", &self.ipinfo),
            ("endpoints.ipwhois", &self.ipwhois),
            ("endpoints.openweather", &self.openweather),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key. Never written back to disk; the
    /// `OPENWEATHER_API_KEY` environment variable takes precedence.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Units passed to the weather API
    #[serde(default = "default_units")]
    pub units: String,
}

fn default_units() -> String {
    "metric".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: api_key_from_env(),
            units: default_units(),
        }
    }
}

impl WeatherConfig {
    /// Check if an API key is present (not blank)
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

fn api_key_from_env() -> Option<String> {
    std::env::var(WEATHER_API_KEY_ENV)
        .ok()
        .filter(|k| !k.trim().is_empty())
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating it with defaults
    /// when missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let mut config: Config =
            toml::from_str(&contents).context("Failed to parse config file")?;
        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Environment values win over the file
    fn apply_env_overrides(&mut self) {
        if let Some(key) = api_key_from_env() {
            self.weather.api_key = Some(key);
        }
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        for (field, value) in self.endpoints.fields() {
            self.validate_url(value, field, &mut result);
        }

        if let Err(e) = self.server.socket_addr() {
            result.add_error("server.host", e.to_string());
        }
        if self.server.port == 0 {
            result.add_error("server.port", "Port cannot be 0");
        }

        let timeouts = [
            ("timeouts.geo_secs", self.timeouts.geo_secs),
            ("timeouts.whois_secs", self.timeouts.whois_secs),
            ("timeouts.ipv4_echo_secs", self.timeouts.ipv4_echo_secs),
            ("timeouts.ipv6_echo_secs", self.timeouts.ipv6_echo_secs),
            ("timeouts.weather_secs", self.timeouts.weather_secs),
        ];
        for (field, secs) in timeouts {
            if secs == 0 {
                result.add_error(field, "Timeout must be greater than 0");
            } else if secs > 60 {
                result.add_warning(field, "Timeout is unusually long (>60s)");
            }
        }

        let ttls = [
            ("cache.geo_ttl_secs", self.cache.geo_ttl_secs),
            ("cache.whois_ttl_secs", self.cache.whois_ttl_secs),
            ("cache.weather_ttl_secs", self.cache.weather_ttl_secs),
            ("cache.self_ip_ttl_secs", self.cache.self_ip_ttl_secs),
        ];
        for (field, secs) in ttls {
            if secs == 0 {
                result.add_warning(field, "Caching disabled (0 seconds)");
            }
        }

        if !self.weather.is_configured() {
            result.add_warning(
                "weather.api_key",
                format!("{} not set - weather data will be unavailable", WEATHER_API_KEY_ENV),
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if let Some(port) = url.port() {
                    if port == 0 {
                        result.add_error(field_name, "Port cannot be 0");
                    }
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("ipscope");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        // Default config should be valid (only warnings, no errors)
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_endpoint_url() {
        let mut config = Config::default();
        config.endpoints.ipapi_co = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "endpoints.ipapi_co"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.endpoints.ipinfo = "ftp://ipinfo.io".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_timeout_is_error() {
        let mut config = Config::default();
        config.timeouts.geo_secs = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "timeouts.geo_secs"));
    }

    #[test]
    fn test_zero_ttl_is_warning() {
        let mut config = Config::default();
        config.cache.whois_ttl_secs = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "cache.whois_ttl_secs"));
    }

    #[test]
    fn test_missing_api_key_is_warning() {
        let mut config = Config::default();
        config.weather.api_key = None;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.api_key"));
    }

    #[test]
    fn test_bad_host_is_error() {
        let mut config = Config::default();
        config.server.host = "localhost:5000".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(config.server.socket_addr().is_err());
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.server.port, 5000);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("api_key"), "API key must never be written to disk");
    }

    #[test]
    fn test_load_from_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nhost = \"127.0.0.1\"\nport = 8080\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.timeouts.ipv6_echo_secs, 3);
        assert_eq!(config.cache.self_ip_ttl_secs, 60);
        assert_eq!(config.endpoints.ipinfo, "https://ipinfo.io");
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
