//! Per-request routing decision.
//!
//! # Responsibilities
//! - Identify the request's host exactly as the transport reports it
//! - Delegate to the host's handler, or answer 404 without contacting
//!   any backend
//!
//! # Design Decisions
//! - Authority from the request target wins (absolute-form, HTTP/2),
//!   otherwise the Host header
//! - No fallback host, no wildcard, no retry

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};

use crate::http::response::not_found;
use crate::routing::table::RouteTable;

/// Single entry point for every inbound request.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
}

impl Dispatcher {
    pub fn new(table: RouteTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Route one request to its host's handler.
    pub async fn dispatch(&self, request: Request<Body>) -> Response<Body> {
        let handler = request_host(&request).and_then(|host| self.table.get(host));

        match handler {
            Some(handler) => handler.handle(request).await,
            None => {
                tracing::warn!(
                    host = request_host(&request).unwrap_or("<none>"),
                    method = %request.method(),
                    path = %request.uri().path(),
                    "No route for host"
                );
                not_found()
            }
        }
    }
}

/// The host identifier of a request, verbatim.
pub fn request_host<B>(request: &Request<B>) -> Option<&str> {
    request.uri().authority().map(|a| a.as_str()).or_else(|| {
        request
            .headers()
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
    })
}
