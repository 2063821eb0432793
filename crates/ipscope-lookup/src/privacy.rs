//! Redaction and disclosure applied to every record before it leaves the
//! pipeline.

use crate::types::{IpRecord, UNKNOWN};
use crate::validate::is_private;

pub const PRIVATE_NETWORK: &str = "Private Network";

pub const PRIVATE_IP_NOTICE: &str = "Private IP detected. Limited information available.";

pub const PUBLIC_IP_NOTICE: &str =
    "This information is derived from publicly available IP geolocation and WHOIS data. \
     Locations are approximate.";

pub const DATA_RETENTION_NOTICE: &str =
    "Lookup results are cached in memory for a limited time and are never stored permanently.";

/// Organization names containing any of these are replaced wholesale
const SENSITIVE_KEYWORDS: &[&str] = &[
    "internal", "private", "corp", "intranet", "lan", "vpn", "employee", "staff", "admin",
    "secure",
];

/// Organizations whose coordinates are coarsened
const COARSEN_KEYWORDS: &[&str] = &["government", "military", "defense"];

const POSTAL_VISIBLE_CHARS: usize = 3;

fn contains_any(value: &str, keywords: &[&str]) -> bool {
    let lower = value.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Redact sensitive organization names and coarsen coordinates for
/// government or military networks.
pub fn sanitize(mut record: IpRecord) -> IpRecord {
    // Decided on the provider's org name, before any redaction below
    let coarsen = contains_any(&record.org, COARSEN_KEYWORDS);

    if contains_any(&record.org, SENSITIVE_KEYWORDS) {
        record.org = PRIVATE_NETWORK.to_string();
    }
    if contains_any(&record.owner, SENSITIVE_KEYWORDS) {
        record.owner = PRIVATE_NETWORK.to_string();
    }

    if coarsen {
        if let (Some(lat), Some(lon)) = (record.latitude, record.longitude) {
            record.latitude = Some(round_one_decimal(lat));
            record.longitude = Some(round_one_decimal(lon));
        }
    }

    record
}

/// Attach the private/public classification and disclosure strings.
pub fn annotate(mut record: IpRecord) -> IpRecord {
    record.is_private_ip = is_private(&record.ipv4);
    record.privacy_notice = if record.is_private_ip {
        PRIVATE_IP_NOTICE
    } else {
        PUBLIC_IP_NOTICE
    }
    .to_string();
    record.data_retention = DATA_RETENTION_NOTICE.to_string();
    record
}

/// Keep the first three characters of a postal code and mask the rest.
pub fn mask_postal(postal: &str) -> String {
    if postal.is_empty() || postal == UNKNOWN {
        return postal.to_string();
    }
    let visible: String = postal.chars().take(POSTAL_VISIBLE_CHARS).collect();
    format!("{}XXX", visible)
}
