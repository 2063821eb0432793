//! Shared error types for the ipscope workspace.

use thiserror::Error;

/// Errors surfaced at the binary edge.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failures while wiring up or starting the lookup service
    #[error("Service error: {0}")]
    Service(String),
}

/// Transport-level failure talking to an upstream.
///
/// The display text tells timeouts, refused connections and HTTP errors
/// apart so callers can report them verbatim.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network request failed: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Classify a reqwest failure.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::Other(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts_to_app_error() {
        let app_err: AppError = ConfigError::Invalid("server.port: Port cannot be 0".into()).into();
        assert!(matches!(app_err, AppError::Config(ConfigError::Invalid(_))));
        assert_eq!(
            app_err.to_string(),
            "Configuration error: Invalid configuration: server.port: Port cannot be 0"
        );
    }

    #[test]
    fn test_network_error_display_distinguishes_kinds() {
        assert_eq!(NetworkError::Timeout.to_string(), "Request timed out");
        assert!(NetworkError::ConnectionFailed("refused".into())
            .to_string()
            .starts_with("Connection failed"));
        assert_eq!(
            NetworkError::ServerError {
                status: 502,
                message: "bad gateway".into()
            }
            .to_string(),
            "Server error: 502 - bad gateway"
        );
        assert!(NetworkError::Other("dns".into())
            .to_string()
            .starts_with("Network request failed"));
    }
}
