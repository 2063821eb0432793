//! Primary geolocation source: ipapi.co

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{get_json, usable, GeoProvider};
use crate::error::LookupError;
use crate::types::{non_empty, ProviderResult};

const PROVIDER: &str = "ipapi.co";

#[derive(Debug, Deserialize)]
struct IpapiCoResponse {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
    org: Option<String>,
    asn: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<String>,
    postal: Option<String>,
}

impl From<IpapiCoResponse> for ProviderResult {
    fn from(resp: IpapiCoResponse) -> Self {
        let org = non_empty(resp.org);
        Self {
            city: non_empty(resp.city),
            region: non_empty(resp.region),
            country_name: non_empty(resp.country_name),
            isp: None,
            asn: non_empty(resp.asn),
            asn_org: org.clone(),
            org,
            latitude: resp.latitude,
            longitude: resp.longitude,
            timezone: non_empty(resp.timezone),
            postal: non_empty(resp.postal),
            connection_type: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IpapiCoProvider {
    client: Client,
    base_url: String,
}

impl IpapiCoProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GeoProvider for IpapiCoProvider {
    fn id(&self) -> &'static str {
        PROVIDER
    }

    async fn locate(&self, ip: &str) -> Result<ProviderResult, LookupError> {
        let url = format!("{}/{}/json/", self.base_url, ip);
        let body: IpapiCoResponse = get_json(&self.client, &url, PROVIDER).await?;

        if body.error {
            tracing::debug!(
                "{} refused {}: {}",
                PROVIDER,
                ip,
                body.reason.as_deref().unwrap_or("no reason given")
            );
            return Err(LookupError::NoData { provider: PROVIDER });
        }

        usable(body.into(), PROVIDER)
    }
}
