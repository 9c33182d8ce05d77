//! Forwarding handler: the reverse proxy itself.
//!
//! # Responsibilities
//! - Rewrite the request target onto the backend URL
//! - Adjust hop-by-hop and forwarding headers
//! - Send the request over the shared pooled client
//! - Stream the backend's status, headers and body back unbuffered
//!
//! # Design Decisions
//! - No retries: a failed upstream call is surfaced immediately as 502
//! - Once the response head is returned, a body failure can only abort
//!   the client connection
//! - The client's Host header is preserved; the backend sees the virtual host

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::uri::{Authority, InvalidUri, Scheme};
use axum::http::{header, HeaderValue, Request, Response, Uri, Version};
use futures_util::future::BoxFuture;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use url::Url;

use crate::http::handler::ProxyHandler;
use crate::http::response::{bad_gateway, strip_hop_by_hop};

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Pooled HTTP/1.1 client shared by every forwarding handler. Reaches both
/// `http` and `https` backends; TLS uses the bundled webpki roots.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Backend URL schemes the upstream client can connect to.
pub const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// Build the upstream client. Connections are kept alive and reused.
pub fn build_client() -> UpstreamClient {
    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();

    Client::builder(TokioExecutor::new()).build(connector)
}

/// Error type for a single forwarding attempt.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// The parts of a backend URL used to rewrite request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    scheme: Scheme,
    authority: Authority,
    path: String,
    query: Option<String>,
}

impl Target {
    pub fn from_url(url: &Url) -> Result<Self, InvalidUri> {
        let host = url.host_str().unwrap_or_default();
        let authority = match url.port() {
            Some(port) => Authority::from_str(&format!("{host}:{port}"))?,
            None => Authority::from_str(host)?,
        };

        Ok(Self {
            scheme: Scheme::from_str(url.scheme())?,
            authority,
            path: url.path().to_string(),
            query: url.query().map(str::to_string),
        })
    }

    /// Map a client request target onto this backend.
    pub fn rewrite(&self, original: &Uri) -> Result<Uri, axum::http::Error> {
        let path = join_paths(&self.path, original.path());
        let path_and_query = match join_queries(self.query.as_deref(), original.query()) {
            Some(query) => format!("{path}?{query}"),
            None => path,
        };

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Join the backend path prefix and the request path with exactly one slash.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

fn join_queries(base: Option<&str>, query: Option<&str>) -> Option<String> {
    match (base.filter(|q| !q.is_empty()), query.filter(|q| !q.is_empty())) {
        (Some(base), Some(query)) => Some(format!("{base}&{query}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

/// Reverse proxy handler bound to one backend.
#[derive(Clone)]
pub struct Forwarder {
    target: Target,
    client: UpstreamClient,
}

impl Forwarder {
    pub fn new(target: Target, client: UpstreamClient) -> Self {
        Self { target, client }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        let (mut parts, body) = request.into_parts();

        if !parts.headers.contains_key(header::HOST) {
            if let Some(authority) = parts.uri.authority() {
                if let Ok(host) = HeaderValue::from_str(authority.as_str()) {
                    parts.headers.insert(header::HOST, host);
                }
            }
        }

        strip_hop_by_hop(&mut parts.headers);

        if let Some(ConnectInfo(peer)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            let prior: Vec<&str> = parts
                .headers
                .get_all(X_FORWARDED_FOR)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .collect();
            let forwarded = if prior.is_empty() {
                peer.ip().to_string()
            } else {
                format!("{}, {}", prior.join(", "), peer.ip())
            };
            if let Ok(value) = HeaderValue::from_str(&forwarded) {
                parts.headers.insert(X_FORWARDED_FOR, value);
            }
        }

        parts.uri = self.target.rewrite(&parts.uri)?;
        parts.version = Version::HTTP_11;

        let upstream = self.client.request(Request::from_parts(parts, body)).await?;

        let (mut parts, body) = upstream.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

impl fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forwarder")
            .field("target", &self.target.to_string())
            .finish()
    }
}

impl ProxyHandler for Forwarder {
    fn handle(&self, request: Request<Body>) -> BoxFuture<'_, Response<Body>> {
        Box::pin(async move {
            let method = request.method().clone();
            let path = request.uri().path().to_string();

            match self.forward(request).await {
                Ok(response) => {
                    tracing::debug!(
                        backend = %self.target,
                        method = %method,
                        path = %path,
                        status = %response.status(),
                        "Upstream responded"
                    );
                    response
                }
                Err(e) => {
                    tracing::error!(
                        backend = %self.target,
                        method = %method,
                        path = %path,
                        error = %e,
                        "Upstream request failed"
                    );
                    bad_gateway()
                }
            }
        })
    }
}
