//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the dispatcher as the only handler
//! - Wire up middleware (tracing, read/write timeouts)
//! - Serve connections until shutdown
//!
//! # Design Decisions
//! - Every method and path reaches the dispatcher; routing is by host only
//! - One task per connection on the multi-threaded runtime
//! - Timeouts abort a single request, never the server

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response, StatusCode},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    timeout::{RequestBodyTimeoutLayer, ResponseBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::lifecycle::signals::shutdown_signal;
use crate::routing::Dispatcher;

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    routes: usize,
}

impl HttpServer {
    /// Create a new HTTP server serving `dispatcher`.
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        let routes = dispatcher.table().len();
        let router = Self::build_router(&config, dispatcher);
        Self {
            router,
            config,
            routes,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outermost first: tracing, request body idle timeout,
    /// response body idle timeout, then the deadline for the response head.
    /// A backend missing that deadline is answered with 504, never a 4xx.
    fn build_router(config: &ServerConfig, dispatcher: Dispatcher) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(dispatcher)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(RequestBodyTimeoutLayer::new(config.read_timeout))
                    .layer(ResponseBodyTimeoutLayer::new(config.write_timeout))
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::GATEWAY_TIMEOUT,
                        config.write_timeout,
                    )),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// Ctrl-C or a message on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.routes,
            read_timeout_secs = self.config.read_timeout.as_secs(),
            write_timeout_secs = self.config.write_timeout.as_secs(),
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Fallback handler: every request goes through the dispatcher.
async fn proxy_handler(
    State(dispatcher): State<Dispatcher>,
    request: Request<Body>,
) -> Response<Body> {
    dispatcher.dispatch(request).await
}
