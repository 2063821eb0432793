//! IP lookup pipeline for ipscope
//!
//! Validates an address, geolocates it through a fallback chain of public
//! providers, enriches it with WHOIS data, redacts sensitive fields and
//! attaches weather and local time.

pub mod cache;
pub mod error;
pub mod privacy;
pub mod providers;
pub mod resolver;
pub mod service;
pub mod types;
pub mod validate;
pub mod weather;

pub use cache::{CacheKey, TtlCache};
pub use error::LookupError;
pub use providers::{GeoProvider, WhoisProvider};
pub use resolver::{SelfAddresses, SelfIpResolver};
pub use service::{IpLookupService, LookupTtls, MAX_GEO_ATTEMPTS};
pub use types::{ErrorRecord, IpRecord, LookupResponse, ProviderResult, WhoisResult, NOT_AVAILABLE, UNKNOWN};
pub use weather::WeatherSource;
