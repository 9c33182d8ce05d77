//! Responses the proxy produces on its own, without a backend.
//!
//! # Design Decisions
//! - Bare status lines with empty bodies; the proxy never invents content
//! - Unmapped hosts get 404 (a client/config error, no backend involved)
//! - Upstream failures before any response head get 502

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Response, StatusCode};
use axum::response::IntoResponse;

/// Response for a host with no route.
pub fn not_found() -> Response<Body> {
    StatusCode::NOT_FOUND.into_response()
}

/// Response for a backend that could not be reached.
pub fn bad_gateway() -> Response<Body> {
    StatusCode::BAD_GATEWAY.into_response()
}

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    HeaderName::from_static("keep-alive"),
];

/// Remove hop-by-hop headers, including every header listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove("proxy-connection");
}
