//! Secondary geolocation source: ip-api.com

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{get_json, split_as_field, usable, GeoProvider};
use crate::error::LookupError;
use crate::types::{non_empty, ProviderResult};

const PROVIDER: &str = "ip-api.com";
const FIELDS: &str =
    "status,message,country,regionName,city,zip,lat,lon,timezone,isp,org,as,asname,mobile,proxy,hosting";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiComResponse {
    status: String,
    message: Option<String>,
    city: Option<String>,
    region_name: Option<String>,
    country: Option<String>,
    zip: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    timezone: Option<String>,
    isp: Option<String>,
    org: Option<String>,
    #[serde(rename = "as")]
    as_field: Option<String>,
    asname: Option<String>,
    #[serde(default)]
    mobile: bool,
    #[serde(default)]
    proxy: bool,
    #[serde(default)]
    hosting: bool,
}

impl IpApiComResponse {
    fn connection_type(&self) -> Option<String> {
        let kind = if self.mobile {
            "Mobile"
        } else if self.proxy {
            "Proxy/VPN"
        } else if self.hosting {
            "Hosting"
        } else {
            return None;
        };
        Some(kind.to_string())
    }
}

impl From<IpApiComResponse> for ProviderResult {
    fn from(resp: IpApiComResponse) -> Self {
        let connection_type = resp.connection_type();
        let (asn, as_org) = resp
            .as_field
            .as_deref()
            .map(split_as_field)
            .unwrap_or((None, None));

        Self {
            city: non_empty(resp.city),
            region: non_empty(resp.region_name),
            country_name: non_empty(resp.country),
            org: non_empty(resp.org),
            isp: non_empty(resp.isp),
            asn,
            asn_org: non_empty(resp.asname).or(as_org),
            latitude: resp.lat,
            longitude: resp.lon,
            timezone: non_empty(resp.timezone),
            postal: non_empty(resp.zip),
            connection_type,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IpApiComProvider {
    client: Client,
    base_url: String,
}

impl IpApiComProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GeoProvider for IpApiComProvider {
    fn id(&self) -> &'static str {
        PROVIDER
    }

    async fn locate(&self, ip: &str) -> Result<ProviderResult, LookupError> {
        let url = format!("{}/json/{}?fields={}", self.base_url, ip, FIELDS);
        let body: IpApiComResponse = get_json(&self.client, &url, PROVIDER).await?;

        if body.status != "success" {
            tracing::debug!(
                "{} refused {}: {}",
                PROVIDER,
                ip,
                body.message.as_deref().unwrap_or("no message")
            );
            return Err(LookupError::NoData { provider: PROVIDER });
        }

        usable(body.into(), PROVIDER)
    }
}
