//! Host-based HTTP reverse proxy library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::{BackendSpec, HostConfig, ServerConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Dispatcher, RouteTable};
