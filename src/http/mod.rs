//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeouts, tracing)
//!     → routing::Dispatcher (host lookup)
//!     → compression.rs (optional gzip decorator)
//!     → forward.rs (rewrite, send upstream, stream back)
//!     → Send to client
//! ```

pub mod compression;
pub mod forward;
pub mod handler;
pub mod response;
pub mod server;

pub use handler::{ProxyHandler, SharedHandler};
pub use server::HttpServer;
