//! Lookup-specific error types.

use ipscope_core::NetworkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Invalid IP address format")]
    InvalidIp,

    #[error("{provider} returned no usable data")]
    NoData { provider: &'static str },

    #[error("{provider} rate limited the request")]
    RateLimited { provider: &'static str },

    #[error("{provider} returned status {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} sent a malformed response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },

    #[error("Could not determine public IP address: {0}")]
    SelfIp(#[from] NetworkError),

    #[error("An error occurred: {0}")]
    Internal(String),
}

impl LookupError {
    /// Whether the caller supplied bad input
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidIp)
    }
}
