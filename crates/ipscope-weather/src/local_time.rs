//! Wall-clock time for an IANA zone name.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::types::UNKNOWN;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Format `now` in the zone named `timezone_name` (e.g. "Europe/Berlin").
/// Returns "Unknown" if the name is not a recognized zone.
pub fn local_time(timezone_name: &str, now: DateTime<Utc>) -> String {
    match timezone_name.trim().parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).format(TIME_FORMAT).to_string(),
        Err(_) => {
            tracing::debug!("Unrecognized timezone: {}", timezone_name);
            UNKNOWN.to_string()
        }
    }
}

pub fn local_time_now(timezone_name: &str) -> String {
    local_time(timezone_name, Utc::now())
}
