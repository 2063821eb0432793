//! Weather and local-time enrichment for ipscope
//!
//! Provides current conditions via the OpenWeatherMap API and wall-clock
//! time for an IANA zone name.

pub mod local_time;
pub mod provider;
pub mod types;

pub use local_time::{local_time, local_time_now};
pub use provider::WeatherProvider;
pub use types::*;
