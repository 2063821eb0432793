//! warp filter tree.

use ipscope_lookup::IpLookupService;
use std::convert::Infallible;
use std::sync::Arc;
use warp::hyper::body::Bytes;
use warp::Filter;

use crate::handlers;

/// Largest accepted `/api/lookup` body
const MAX_BODY_BYTES: u64 = 4 * 1024;

/// All routes served by ipscope. Paths are matched before methods so an
/// unknown path is a 404 rather than a 405.
pub fn routes(
    service: Arc<IpLookupService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    index(service.clone())
        .or(own_ip(service.clone()))
        .or(lookup(service.clone()))
        .or(clear_cache(service))
}

fn with_service(
    service: Arc<IpLookupService>,
) -> impl Filter<Extract = (Arc<IpLookupService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

/// GET /
fn index(
    service: Arc<IpLookupService>,
) -> impl Filter<Extract = (warp::reply::Response,), Error = warp::Rejection> + Clone {
    warp::path::end()
        .and(warp::get())
        .and(with_service(service))
        .and_then(handlers::index)
}

/// GET /api/ip
fn own_ip(
    service: Arc<IpLookupService>,
) -> impl Filter<Extract = (warp::reply::Response,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "ip")
        .and(warp::get())
        .and(with_service(service))
        .and_then(handlers::own_ip)
}

/// POST /api/lookup
fn lookup(
    service: Arc<IpLookupService>,
) -> impl Filter<Extract = (warp::reply::Response,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "lookup")
        .and(warp::post())
        .and(lookup_body())
        .and(with_service(service))
        .and_then(handlers::lookup)
}

/// The request body, or an empty one when it is missing its length or is
/// oversized; the handler answers those with "IP address is required".
fn lookup_body() -> impl Filter<Extract = (Bytes,), Error = Infallible> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES)
        .and(warp::body::bytes())
        .or(warp::any().map(Bytes::new))
        .unify()
}

/// POST /api/clear-cache
fn clear_cache(
    service: Arc<IpLookupService>,
) -> impl Filter<Extract = (warp::reply::Response,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "clear-cache")
        .and(warp::post())
        .and(with_service(service))
        .and_then(handlers::clear_cache)
}
