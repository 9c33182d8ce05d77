//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, Response, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use vhost_proxy::{Dispatcher, HostConfig, HttpServer, RouteTable, ServerConfig, Shutdown};

/// Fixed body served by the mock backend under `/static`.
pub const STATIC_BODY: &str = "<html><body>\
    <p>Lorem ipsum dolor sit amet, consectetur adipiscing elit.</p>\
    <p>Lorem ipsum dolor sit amet, consectetur adipiscing elit.</p>\
    <p>Lorem ipsum dolor sit amet, consectetur adipiscing elit.</p>\
    </body></html>";

/// What the mock backend saw, echoed back as JSON.
#[derive(Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// A running mock backend.
pub struct Backend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl Backend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a backend that echoes every request, except `/static` which
/// returns `STATIC_BODY`.
pub async fn start_backend() -> Backend {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().fallback(echo).with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Backend { addr, hits }
}

async fn echo(State(hits): State<Arc<AtomicUsize>>, request: Request<Body>) -> Response<Body> {
    hits.fetch_add(1, Ordering::SeqCst);

    if request.uri().path().ends_with("/static") {
        return Response::builder()
            .header(header::CONTENT_TYPE, "text/html")
            .header(header::CONTENT_LENGTH, STATIC_BODY.len())
            .body(Body::from(STATIC_BODY))
            .unwrap();
    }

    let (parts, body) = request.into_parts();
    let Ok(body) = axum::body::to_bytes(body, usize::MAX).await else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let echo = Echo {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts
            .headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    Response::builder()
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&echo).unwrap()))
        .unwrap()
}

/// Body bytes the truncating backend sends before hanging up.
pub const TRUNCATED_PREFIX: &str = "partial";

/// Start a raw backend that answers `200` announcing 1000 body bytes, sends
/// `TRUNCATED_PREFIX`, then closes the connection.
pub async fn start_truncating_backend() -> SocketAddr {
    spawn_raw_backend(|mut socket| async move {
        read_request_head(&mut socket).await;

        let head = "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: 1000\r\n\r\n";
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.flush().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let _ = socket.write_all(TRUNCATED_PREFIX.as_bytes()).await;
        let _ = socket.flush().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let _ = socket.shutdown().await;
    })
    .await
}

/// Start a raw backend that reads each request and never answers.
pub async fn start_stalled_backend() -> SocketAddr {
    spawn_raw_backend(|mut socket| async move {
        read_request_head(&mut socket).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    })
    .await
}

async fn spawn_raw_backend<F, Fut>(serve: F) -> SocketAddr
where
    F: Fn(TcpStream) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(serve(socket));
        }
    });
    addr
}

async fn read_request_head(socket: &mut TcpStream) {
    let mut seen = Vec::new();
    let mut buf = [0u8; 1024];
    while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => seen.extend_from_slice(&buf[..n]),
        }
    }
}

/// Start the proxy on an ephemeral port. Keep the `Shutdown` alive for the
/// duration of the test.
pub async fn start_proxy(hosts: HostConfig) -> (SocketAddr, Shutdown) {
    start_proxy_with(hosts, ServerConfig::default()).await
}

/// Like `start_proxy`, with explicit timeouts.
pub async fn start_proxy_with(hosts: HostConfig, config: ServerConfig) -> (SocketAddr, Shutdown) {
    let table = RouteTable::from_config(&hosts).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = ServerConfig {
        listen_address: addr.to_string(),
        ..config
    };
    let server = HttpServer::new(config, Dispatcher::new(table));

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

/// Client that never decompresses and never uses a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
