//! WHOIS-style ownership enrichment: ipwho.is

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{get_json, WhoisProvider};
use crate::error::LookupError;
use crate::types::{non_empty, WhoisResult};

const PROVIDER: &str = "ipwho.is";

#[derive(Debug, Deserialize)]
struct IpWhoisResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    #[serde(rename = "type")]
    ip_type: Option<String>,
    connection: Option<IpWhoisConnection>,
}

#[derive(Debug, Deserialize)]
struct IpWhoisConnection {
    asn: Option<u64>,
    org: Option<String>,
    isp: Option<String>,
}

impl From<IpWhoisResponse> for WhoisResult {
    fn from(resp: IpWhoisResponse) -> Self {
        let ip_type = non_empty(resp.ip_type);
        match resp.connection {
            Some(conn) => {
                let org = non_empty(conn.org);
                Self {
                    owner: org.clone(),
                    isp: non_empty(conn.isp),
                    asn: conn.asn.filter(|n| *n > 0).map(|n| format!("AS{}", n)),
                    asn_org: org,
                    ip_type,
                }
            }
            None => Self {
                ip_type,
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct IpWhoisProvider {
    client: Client,
    base_url: String,
}

impl IpWhoisProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl WhoisProvider for IpWhoisProvider {
    fn id(&self) -> &'static str {
        PROVIDER
    }

    async fn whois(&self, ip: &str) -> Result<WhoisResult, LookupError> {
        let url = format!("{}/{}", self.base_url, ip);
        let body: IpWhoisResponse = get_json(&self.client, &url, PROVIDER).await?;

        if !body.success {
            tracing::debug!(
                "{} refused {}: {}",
                PROVIDER,
                ip,
                body.message.as_deref().unwrap_or("no message")
            );
            return Err(LookupError::NoData { provider: PROVIDER });
        }

        Ok(body.into())
    }
}
