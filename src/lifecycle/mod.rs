//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Build route table → Bind listener → Serve
//!
//! Shutdown:
//!     Ctrl-C or Shutdown::trigger → stop accepting → drain in-flight → exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error exits before the listener is bound
//! - Programmatic shutdown lets tests stop a server they started

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
