//! Discover this host's own public addresses through echo services.

use ipscope_core::{NetworkError, ReqwestErrorExt};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheKey, TtlCache};
use crate::error::LookupError;
use crate::providers::get_json;
use crate::types::NOT_AVAILABLE;
use crate::validate::is_valid;

const IPV4_SCOPE: &str = "self-ipv4";
const IPV4_PROVIDER: &str = "ipv4 echo";
const IPV6_PROVIDER: &str = "ipv6 echo";

#[derive(Debug, Deserialize)]
struct EchoResponse {
    ip: String,
}

/// The caller's public addresses
#[derive(Debug, Clone, PartialEq)]
pub struct SelfAddresses {
    pub ipv4: String,
    /// A distinct IPv6 address, or "Not available"
    pub ipv6: String,
}

impl LookupError {
    /// Collapse an upstream failure into the transport-level classification
    fn into_network_error(self) -> NetworkError {
        match self {
            LookupError::Transport { source, .. } => source.into_network_error(),
            LookupError::RateLimited { .. } => NetworkError::ServerError {
                status: 429,
                message: "rate limited".to_string(),
            },
            LookupError::Status { status, provider } => NetworkError::ServerError {
                status,
                message: format!("{} answered with an error", provider),
            },
            LookupError::SelfIp(inner) => inner,
            other => NetworkError::InvalidResponse(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelfIpResolver {
    ipv4_client: Client,
    ipv6_client: Client,
    ipv4_url: String,
    ipv6_url: String,
    ipv4_ttl: Duration,
}

impl SelfIpResolver {
    pub fn new(
        ipv4_client: Client,
        ipv4_url: &str,
        ipv6_client: Client,
        ipv6_url: &str,
        ipv4_ttl: Duration,
    ) -> Self {
        Self {
            ipv4_client,
            ipv6_client,
            ipv4_url: ipv4_url.to_string(),
            ipv6_url: ipv6_url.to_string(),
            ipv4_ttl,
        }
    }

    /// Resolve both addresses. IPv4 failure is fatal; IPv6 never is.
    pub async fn resolve(&self, cache: &Arc<TtlCache>) -> Result<SelfAddresses, LookupError> {
        let ipv4 = cache
            .get_or_compute(CacheKey::new(IPV4_SCOPE, ""), self.ipv4_ttl, || self.fetch_ipv4())
            .await?;

        let ipv6 = self.fetch_ipv6(&ipv4).await;

        Ok(SelfAddresses { ipv4, ipv6 })
    }

    async fn fetch_ipv4(&self) -> Result<String, LookupError> {
        let body: EchoResponse = get_json(&self.ipv4_client, &self.ipv4_url, IPV4_PROVIDER)
            .await
            .map_err(|e| LookupError::SelfIp(e.into_network_error()))?;

        let ip = body.ip.trim().to_string();
        if !is_valid(&ip) {
            return Err(LookupError::SelfIp(NetworkError::InvalidResponse(format!(
                "IPv4 echo returned {:?}",
                ip
            ))));
        }
        tracing::info!("Resolved public IPv4 {}", ip);
        Ok(ip)
    }

    async fn fetch_ipv6(&self, ipv4: &str) -> String {
        match get_json::<EchoResponse>(&self.ipv6_client, &self.ipv6_url, IPV6_PROVIDER).await {
            Ok(body) => accept_ipv6(body.ip.trim(), ipv4),
            Err(e) => {
                tracing::debug!("IPv6 echo failed: {}", e);
                NOT_AVAILABLE.to_string()
            }
        }
    }
}

/// The dual-stack echo returns IPv4 when no IPv6 route exists.
fn accept_ipv6(candidate: &str, ipv4: &str) -> String {
    if candidate != ipv4 && candidate.contains(':') {
        candidate.to_string()
    } else {
        NOT_AVAILABLE.to_string()
    }
}
