//! HTTP surface for ipscope
//!
//! Serves an HTML page with the caller's own address details and a small
//! JSON API for arbitrary lookups.

pub mod handlers;
pub mod page;
pub mod routes;

pub use handlers::{LookupRequest, StatusMessage, IP_REQUIRED};
pub use routes::routes;
