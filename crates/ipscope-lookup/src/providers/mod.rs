//! Upstream geolocation and WHOIS adapters.
//!
//! Every adapter makes one GET per attempt and either maps the JSON body
//! into the common shape or returns an error; the orchestrator treats any
//! error as "no data" and moves on.

mod countries;
mod ip_api_com;
mod ipapi_co;
mod ipinfo;
mod ipwhois;

pub use ip_api_com::IpApiComProvider;
pub use ipapi_co::IpapiCoProvider;
pub use ipinfo::IpinfoProvider;
pub use ipwhois::IpWhoisProvider;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::LookupError;
use crate::types::{ProviderResult, WhoisResult};

const USER_AGENT: &str = concat!("ipscope/", env!("CARGO_PKG_VERSION"));

/// A source that maps an IP address to a location
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Stable identifier, also used as the cache scope
    fn id(&self) -> &'static str;

    async fn locate(&self, ip: &str) -> Result<ProviderResult, LookupError>;
}

/// A source of registered network ownership
#[async_trait]
pub trait WhoisProvider: Send + Sync {
    fn id(&self) -> &'static str;

    async fn whois(&self, ip: &str) -> Result<WhoisResult, LookupError>;
}

/// Build a client bounded by `timeout` for one upstream.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// GET `url` and decode the JSON body, classifying every failure.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    provider: &'static str,
) -> Result<T, LookupError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| LookupError::Transport { provider, source })?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!("{} rate limited (429)", provider);
        return Err(LookupError::RateLimited { provider });
    }
    if !status.is_success() {
        return Err(LookupError::Status {
            provider,
            status: status.as_u16(),
        });
    }

    response.json().await.map_err(|e| LookupError::Parse {
        provider,
        message: e.to_string(),
    })
}

/// Reject answers with no location in them
pub(crate) fn usable(result: ProviderResult, provider: &'static str) -> Result<ProviderResult, LookupError> {
    if result.is_usable() {
        Ok(result)
    } else {
        Err(LookupError::NoData { provider })
    }
}

/// "AS15169 Google LLC" -> ("AS15169", "Google LLC")
pub(crate) fn split_as_field(value: &str) -> (Option<String>, Option<String>) {
    let value = value.trim();
    match value.split_once(' ') {
        Some((asn, rest)) if asn.starts_with("AS") => {
            let rest = rest.trim();
            (
                Some(asn.to_string()),
                (!rest.is_empty()).then(|| rest.to_string()),
            )
        }
        None if value.starts_with("AS") && value.len() > 2 => (Some(value.to_string()), None),
        _ => (None, None),
    }
}

/// Drop the leading AS number from an org string, if any
pub(crate) fn strip_as_prefix(value: &str) -> String {
    match split_as_field(value) {
        (Some(_), Some(org)) => org,
        _ => value.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, serde::Deserialize)]
    struct Echo {
        ip: String,
    }

    #[test]
    fn test_split_as_field() {
        assert_eq!(
            split_as_field("AS15169 Google LLC"),
            (Some("AS15169".into()), Some("Google LLC".into()))
        );
        assert_eq!(split_as_field("AS13335"), (Some("AS13335".into()), None));
        assert_eq!(split_as_field("Google LLC"), (None, None));
        assert_eq!(split_as_field(""), (None, None));
    }

    #[test]
    fn test_strip_as_prefix() {
        assert_eq!(strip_as_prefix("AS15169 Google LLC"), "Google LLC");
        assert_eq!(strip_as_prefix("Comcast Cable"), "Comcast Cable");
    }

    #[tokio::test]
    async fn test_get_json_classifies_rate_limit() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let client = http_client(Duration::from_secs(2)).unwrap();
        let url = format!("{}/limited", mock_server.uri());
        let err = get_json::<Echo>(&client, &url, "test").await.unwrap_err();
        assert!(matches!(err, LookupError::RateLimited { provider: "test" }));
    }

    #[tokio::test]
    async fn test_get_json_classifies_status_and_parse() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let client = http_client(Duration::from_secs(2)).unwrap();

        let err = get_json::<Echo>(&client, &format!("{}/down", mock_server.uri()), "test")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Status { status: 503, .. }));

        let err = get_json::<Echo>(&client, &format!("{}/garbage", mock_server.uri()), "test")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_get_json_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ip": "1.2.3.4"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client = http_client(Duration::from_millis(100)).unwrap();
        let err = get_json::<Echo>(&client, &mock_server.uri(), "slow")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Transport { provider: "slow", .. }));
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"ip": "1.2.3.4"})),
            )
            .mount(&mock_server)
            .await;

        let client = http_client(Duration::from_secs(2)).unwrap();
        let echo: Echo = get_json(&client, &mock_server.uri(), "echo").await.unwrap();
        assert_eq!(echo.ip, "1.2.3.4");
    }
}
