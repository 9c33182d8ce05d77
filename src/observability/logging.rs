//! Structured logging.
//!
//! `RUST_LOG` overrides the default filter, e.g.
//! `RUST_LOG=vhost_proxy=debug,tower_http=debug`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "vhost_proxy=info,tower_http=info";

/// Install the global subscriber. Later calls are ignored.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
