//! Request handlers. Every handler answers; errors become JSON bodies with
//! a matching status code.

use ipscope_lookup::{ErrorRecord, IpLookupService, LookupError};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::{self, Reply, Response};

use crate::page;

pub const IP_REQUIRED: &str = "IP address is required";

/// Body of `POST /api/lookup`
#[derive(Debug, Default, Deserialize)]
pub struct LookupRequest {
    #[serde(default)]
    pub ip: Option<String>,
}

impl LookupRequest {
    /// Anything that is not `{"ip": "<string>"}` counts as a missing address.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    fn ip(&self) -> Option<&str> {
        self.ip.as_deref().filter(|ip| !ip.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub status: &'static str,
    pub message: &'static str,
}

/// Bad input is the caller's fault; a missing own address means the echo
/// services are unreachable.
pub fn status_for(err: &LookupError) -> StatusCode {
    match err {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        LookupError::SelfIp(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_reply(message: String, status: StatusCode) -> Response {
    reply::with_status(reply::json(&ErrorRecord { error: message }), status).into_response()
}

fn lookup_error_reply(err: &LookupError) -> Response {
    reply::with_status(reply::json(&ErrorRecord::from(err)), status_for(err)).into_response()
}

pub async fn index(service: Arc<IpLookupService>) -> Result<Response, Infallible> {
    let (body, status) = match service.lookup_self().await {
        Ok(record) => (page::render_record(&record), StatusCode::OK),
        Err(e) => {
            tracing::warn!("Own address lookup failed: {}", e);
            (page::render_error(&e.to_string()), status_for(&e))
        }
    };
    Ok(reply::with_status(reply::html(body), status).into_response())
}

pub async fn own_ip(service: Arc<IpLookupService>) -> Result<Response, Infallible> {
    match service.lookup_self().await {
        Ok(record) => Ok(reply::json(&record).into_response()),
        Err(e) => {
            tracing::warn!("Own address lookup failed: {}", e);
            Ok(lookup_error_reply(&e))
        }
    }
}

pub async fn lookup(body: Bytes, service: Arc<IpLookupService>) -> Result<Response, Infallible> {
    let request = LookupRequest::from_body(&body);
    let Some(ip) = request.ip() else {
        return Ok(error_reply(IP_REQUIRED.to_string(), StatusCode::BAD_REQUEST));
    };

    match service.lookup(ip).await {
        Ok(record) => Ok(reply::json(&record).into_response()),
        Err(e) => {
            tracing::info!("Lookup rejected for {:?}: {}", ip, e);
            Ok(lookup_error_reply(&e))
        }
    }
}

pub async fn clear_cache(service: Arc<IpLookupService>) -> Result<Response, Infallible> {
    service.clear_cache();
    tracing::info!("Cache cleared");
    Ok(reply::json(&StatusMessage {
        status: "success",
        message: "Cache cleared successfully",
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipscope_core::NetworkError;

    #[test]
    fn test_lookup_request_parsing() {
        assert_eq!(
            LookupRequest::from_body(br#"{"ip": "8.8.8.8"}"#).ip(),
            Some("8.8.8.8")
        );
        assert_eq!(LookupRequest::from_body(br#"{"ip": ""}"#).ip(), None);
        assert_eq!(LookupRequest::from_body(br#"{}"#).ip(), None);
        assert_eq!(LookupRequest::from_body(br#"{"ip": 42}"#).ip(), None);
        assert_eq!(LookupRequest::from_body(b"not json").ip(), None);
        assert_eq!(LookupRequest::from_body(b"").ip(), None);
    }

    #[test]
    fn test_status_for() {
        assert_eq!(status_for(&LookupError::InvalidIp), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&LookupError::SelfIp(NetworkError::Timeout)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&LookupError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
