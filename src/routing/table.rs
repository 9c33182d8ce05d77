//! Route table: host name → fully wired request handler.
//!
//! # Responsibilities
//! - Validate every backend URL before serving starts
//! - Wire a forwarding handler per host, gzip-decorated when requested
//! - Answer exact-match host lookups
//!
//! # Design Decisions
//! - Built once, immutable afterwards; shared without locks
//! - Host keys are stored verbatim: no case folding, port or dot stripping
//! - Construction opens no connections

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::config::HostConfig;
use crate::http::compression::Gzip;
use crate::http::forward::{build_client, Forwarder, Target, UpstreamClient, SUPPORTED_SCHEMES};
use crate::http::handler::{ProxyHandler, SharedHandler};

/// Error type for route table construction.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("error on config host {host} parsing target URL: {source}")]
    InvalidTargetUrl {
        host: String,
        #[source]
        source: url::ParseError,
    },

    #[error("error on config host {host} parsing target URL: {url} has no host")]
    NotAbsolute { host: String, url: String },

    #[error("error on config host {host} parsing target URL: unsupported scheme {scheme:?}")]
    UnsupportedScheme { host: String, scheme: String },

    #[error("error on config host {host} parsing target URL: {source}")]
    InvalidAuthority {
        host: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },
}

impl RouteError {
    /// The config host whose entry was rejected.
    pub fn host(&self) -> &str {
        match self {
            RouteError::InvalidTargetUrl { host, .. }
            | RouteError::NotAbsolute { host, .. }
            | RouteError::UnsupportedScheme { host, .. }
            | RouteError::InvalidAuthority { host, .. } => host,
        }
    }
}

/// Immutable mapping from host name to request handler.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<String, SharedHandler>,
}

impl RouteTable {
    /// Build the table from configuration with a fresh pooled client.
    pub fn from_config(config: &HostConfig) -> Result<Self, RouteError> {
        Self::from_config_with_client(config, build_client())
    }

    /// Build the table from configuration, sharing `client` across all hosts.
    pub fn from_config_with_client(
        config: &HostConfig,
        client: UpstreamClient,
    ) -> Result<Self, RouteError> {
        let mut routes: HashMap<String, SharedHandler> = HashMap::with_capacity(config.len());

        for (host, spec) in config {
            let target = parse_target(host, &spec.target_url)?;
            let forwarder = Forwarder::new(target, client.clone());

            tracing::info!(
                host = %host,
                target = %forwarder.target(),
                gzip = spec.gzip,
                "Route registered"
            );

            let handler: SharedHandler = if spec.gzip {
                Arc::new(Gzip::new(forwarder))
            } else {
                Arc::new(forwarder)
            };
            routes.insert(host.clone(), handler);
        }

        Ok(Self { routes })
    }

    /// Build a table from arbitrary handlers.
    pub fn from_handlers<I, S, H>(handlers: I) -> Self
    where
        I: IntoIterator<Item = (S, H)>,
        S: Into<String>,
        H: ProxyHandler + 'static,
    {
        let routes = handlers
            .into_iter()
            .map(|(host, handler)| (host.into(), Arc::new(handler) as SharedHandler))
            .collect();
        Self { routes }
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, host: &str) -> Option<&SharedHandler> {
        self.routes.get(host)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

fn parse_target(host: &str, target_url: &str) -> Result<Target, RouteError> {
    let url = Url::parse(target_url).map_err(|source| RouteError::InvalidTargetUrl {
        host: host.to_string(),
        source,
    })?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(RouteError::NotAbsolute {
            host: host.to_string(),
            url: target_url.to_string(),
        });
    }
    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(RouteError::UnsupportedScheme {
            host: host.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    Target::from_url(&url).map_err(|source| RouteError::InvalidAuthority {
        host: host.to_string(),
        source,
    })
}
