//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON, or TOML by extension)
//!     → loader.rs (stat, read, deserialize)
//!     → HostConfig (host → BackendSpec)
//!     → routing::RouteTable::from_config (URL validation, handler wiring)
//!
//! command line
//!     → ServerConfig (listen address, timeouts)
//!     → http::HttpServer
//! ```
//!
//! # Design Decisions
//! - Config is read exactly once; there is no reload
//! - Any load error is fatal before the listener is bound
//! - URL validation belongs to the route table, which reports the host

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{BackendSpec, HostConfig, ServerConfig};
