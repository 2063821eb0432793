use ipscope_weather::{WeatherSnapshot, WeatherTimeResult};
use serde::{Deserialize, Serialize};

use crate::error::LookupError;

pub use ipscope_weather::UNKNOWN;

/// Reported when no distinct IPv6 address could be found
pub const NOT_AVAILABLE: &str = "Not available";

/// The enriched record for one IP address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpRecord {
    pub ipv4: String,
    pub ipv6: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub org: String,
    pub isp: String,
    pub asn: String,
    pub asn_org: String,
    pub owner: String,
    pub ip_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: String,
    pub postal: String,
    pub connection_type: String,
    pub local_time: String,
    pub weather: WeatherSnapshot,
    pub privacy_notice: String,
    pub data_retention: String,
    pub is_private_ip: bool,
}

impl IpRecord {
    /// A record with every field at its default and `ipv4` set
    pub fn new(ipv4: &str) -> Self {
        let unknown = || UNKNOWN.to_string();
        Self {
            ipv4: ipv4.to_string(),
            ipv6: unknown(),
            city: unknown(),
            region: unknown(),
            country: unknown(),
            org: unknown(),
            isp: unknown(),
            asn: unknown(),
            asn_org: unknown(),
            owner: unknown(),
            ip_type: unknown(),
            latitude: None,
            longitude: None,
            timezone: unknown(),
            postal: unknown(),
            connection_type: unknown(),
            local_time: unknown(),
            weather: WeatherSnapshot::unavailable(),
            privacy_notice: unknown(),
            data_retention: unknown(),
            is_private_ip: false,
        }
    }

    /// Fold one provider's answer into the record.
    pub fn merge_geo(&mut self, geo: ProviderResult) {
        let or_unknown = |v: Option<String>| v.unwrap_or_else(|| UNKNOWN.to_string());

        self.isp = or_unknown(geo.isp.or_else(|| geo.org.clone()));
        self.city = or_unknown(geo.city);
        self.region = or_unknown(geo.region);
        self.country = or_unknown(geo.country_name);
        self.org = or_unknown(geo.org);
        self.asn = or_unknown(geo.asn);
        self.asn_org = or_unknown(geo.asn_org);
        self.latitude = geo.latitude;
        self.longitude = geo.longitude;
        self.timezone = or_unknown(geo.timezone);
        self.postal = or_unknown(geo.postal);
        self.connection_type = or_unknown(geo.connection_type);
    }

    /// WHOIS owner, AS organization and address type replace what the
    /// geolocation provider said; isp and asn only fill gaps.
    pub fn merge_whois(&mut self, whois: WhoisResult) {
        if let Some(owner) = whois.owner {
            self.owner = owner;
        }
        if let Some(asn_org) = whois.asn_org {
            self.asn_org = asn_org;
        }
        if let Some(ip_type) = whois.ip_type {
            self.ip_type = ip_type;
        }
        if self.isp == UNKNOWN {
            if let Some(isp) = whois.isp {
                self.isp = isp;
            }
        }
        if self.asn == UNKNOWN {
            if let Some(asn) = whois.asn {
                self.asn = asn;
            }
        }
    }

    pub fn apply_weather(&mut self, result: WeatherTimeResult) {
        self.local_time = result.local_time;
        self.weather = result.weather;
    }

    /// Coordinates and a known zone, the inputs weather/time needs
    pub fn weather_inputs(&self) -> Option<(f64, f64, &str)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if has_value(&self.timezone) => {
                Some((lat, lon, self.timezone.as_str()))
            }
            _ => None,
        }
    }
}

/// True unless the string is empty or the "Unknown" placeholder
pub fn has_value(s: &str) -> bool {
    !s.trim().is_empty() && s != UNKNOWN
}

/// One geolocation provider's answer, already mapped into common fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderResult {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country_name: Option<String>,
    pub org: Option<String>,
    pub isp: Option<String>,
    pub asn: Option<String>,
    pub asn_org: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub postal: Option<String>,
    pub connection_type: Option<String>,
}

impl ProviderResult {
    /// A response with none of these is treated as "no data"
    pub fn is_usable(&self) -> bool {
        self.city.is_some()
            || self.country_name.is_some()
            || (self.latitude.is_some() && self.longitude.is_some())
    }
}

/// Registered ownership of an address
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhoisResult {
    pub owner: Option<String>,
    pub isp: Option<String>,
    pub asn: Option<String>,
    pub asn_org: Option<String>,
    pub ip_type: Option<String>,
}

/// Body returned instead of a record when a lookup fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
}

impl From<&LookupError> for ErrorRecord {
    fn from(err: &LookupError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Either a full record or `{error}`, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LookupResponse {
    Record(Box<IpRecord>),
    Error(ErrorRecord),
}

impl LookupResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<Result<IpRecord, LookupError>> for LookupResponse {
    fn from(result: Result<IpRecord, LookupError>) -> Self {
        match result {
            Ok(record) => Self::Record(Box::new(record)),
            Err(e) => Self::Error(ErrorRecord::from(&e)),
        }
    }
}

/// Treat empty strings from upstream JSON as absent
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
