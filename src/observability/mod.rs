//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (routes registered, unmapped hosts, upstream errors)
//!     → tower_http TraceLayer spans per request
//!
//! Consumers:
//!     → logging.rs fmt subscriber (stdout)
//! ```

pub mod logging;
