//! Tertiary geolocation source: ipinfo.io

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::countries::country_name;
use super::{get_json, split_as_field, strip_as_prefix, usable, GeoProvider};
use crate::error::LookupError;
use crate::types::{non_empty, ProviderResult};

const PROVIDER: &str = "ipinfo.io";

#[derive(Debug, Deserialize)]
struct IpinfoResponse {
    #[serde(default)]
    bogon: bool,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    loc: Option<String>,
    org: Option<String>,
    postal: Option<String>,
    timezone: Option<String>,
}

/// "37.4056,-122.0775" -> (37.4056, -122.0775)
fn parse_loc(loc: &str) -> Option<(f64, f64)> {
    let (lat, lon) = loc.split_once(',')?;
    let lat = lat.trim().parse().ok()?;
    let lon = lon.trim().parse().ok()?;
    Some((lat, lon))
}

impl From<IpinfoResponse> for ProviderResult {
    fn from(resp: IpinfoResponse) -> Self {
        let coords = resp.loc.as_deref().and_then(parse_loc);
        let raw_org = non_empty(resp.org);
        let (asn, asn_org) = raw_org
            .as_deref()
            .map(split_as_field)
            .unwrap_or((None, None));

        Self {
            city: non_empty(resp.city),
            region: non_empty(resp.region),
            country_name: non_empty(resp.country).map(|code| country_name(&code)),
            org: raw_org.as_deref().map(strip_as_prefix),
            isp: None,
            asn,
            asn_org,
            latitude: coords.map(|(lat, _)| lat),
            longitude: coords.map(|(_, lon)| lon),
            timezone: non_empty(resp.timezone),
            postal: non_empty(resp.postal),
            connection_type: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IpinfoProvider {
    client: Client,
    base_url: String,
}

impl IpinfoProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GeoProvider for IpinfoProvider {
    fn id(&self) -> &'static str {
        PROVIDER
    }

    async fn locate(&self, ip: &str) -> Result<ProviderResult, LookupError> {
        let url = format!("{}/{}/json", self.base_url, ip);
        let body: IpinfoResponse = get_json(&self.client, &url, PROVIDER).await?;

        if body.bogon {
            return Err(LookupError::NoData { provider: PROVIDER });
        }

        usable(body.into(), PROVIDER)
    }
}
