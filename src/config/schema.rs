//! Configuration schema definitions.
//!
//! The config file is a single JSON object keyed by host name:
//!
//! ```json
//! {
//!     "www.example.com": { "TargetURL": "http://localhost:8080/example" },
//!     "www2.example.com": { "TargetURL": "http://localhost:8081/", "GZ": true }
//! }
//! ```

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::loader::ConfigError;

/// One proxy target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendSpec {
    /// Absolute backend URL; its path acts as a prefix for forwarded paths.
    #[serde(rename = "TargetURL")]
    pub target_url: String,

    /// Gzip responses for clients that accept it.
    #[serde(rename = "GZ", default, skip_serializing_if = "is_false")]
    pub gzip: bool,
}

impl BackendSpec {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            gzip: false,
        }
    }

    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Host name → backend, exactly as written in the config file.
///
/// Ordered so that startup logging and error reporting are deterministic.
pub type HostConfig = BTreeMap<String, BackendSpec>;

/// Listener settings supplied on the command line.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address, e.g. "127.0.0.1:8080" or ":8080" (all interfaces).
    pub listen_address: String,

    /// Maximum idle time while reading a request body.
    pub read_timeout: Duration,

    /// Maximum time to produce the response head, and maximum stall
    /// between response body frames.
    pub write_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: ":8080".to_string(),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// Resolve the listen address. A bare ":port" binds every IPv4 interface.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let address = if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        };

        address
            .parse()
            .map_err(|source| ConfigError::ListenAddress {
                address: self.listen_address.clone(),
                source,
            })
    }
}
