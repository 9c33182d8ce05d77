//! The request handler capability shared by every route.
//!
//! A handler consumes one request and yields the response to stream back to
//! the client. Handlers compose: the compression decorator wraps any other
//! handler. The composition is fixed when the route table is built, so the
//! only per-request dispatch is a single virtual call.

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;

/// Handles a single proxied request.
pub trait ProxyHandler: Send + Sync + fmt::Debug {
    fn handle(&self, request: Request<Body>) -> BoxFuture<'_, Response<Body>>;
}

/// Shared handle stored in the route table.
pub type SharedHandler = Arc<dyn ProxyHandler>;

impl<H: ProxyHandler + ?Sized> ProxyHandler for Arc<H> {
    fn handle(&self, request: Request<Body>) -> BoxFuture<'_, Response<Body>> {
        (**self).handle(request)
    }
}
