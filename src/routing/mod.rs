//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     HostConfig (host → BackendSpec)
//!     → table.rs (parse URL, build Forwarder, wrap in Gzip if requested)
//!     → RouteTable (frozen)
//!
//! Per request:
//!     Incoming Request (authority / Host header)
//!     → dispatcher.rs (exact host lookup)
//!     → matched handler, or 404
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Host is the only routing key
//! - Deterministic: same host always reaches the same handler

pub mod dispatcher;
pub mod table;

pub use dispatcher::Dispatcher;
pub use table::{RouteError, RouteTable};
