//! Address syntax and range checks.

use std::net::IpAddr;

/// True iff `ip` is a standard dotted-quad IPv4 or colon-form IPv6 address.
pub fn is_valid(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

/// True for RFC 1918 ranges and IPv4 loopback. Anything that does not parse
/// as IPv4 is reported as public.
pub fn is_private(ip: &str) -> bool {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_private() || v4.is_loopback(),
        _ => false,
    }
}
