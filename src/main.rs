//! Host-based HTTP reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                     VHOST PROXY                       │
//!                  │                                                       │
//!  Client Request  │  ┌────────┐    ┌────────────┐    ┌───────────────┐  │
//!  ────────────────┼─▶│  http  │───▶│ dispatcher │───▶│  route table  │  │
//!                  │  │ server │    │ (by host)  │    │ host→handler  │  │
//!                  │  └────────┘    └─────┬──────┘    └───────────────┘  │
//!                  │                      │ miss → 404                    │
//!                  │                      ▼                               │
//!                  │              ┌──────────────┐    ┌──────────────┐   │
//!  Client Response │              │ gzip (opt.)  │───▶│  forwarder   │◀──┼── Backend
//!  ◀───────────────┼──────────────│  decorator   │◀───│ pooled client│───┼─▶
//!                  │              └──────────────┘    └──────────────┘   │
//!                  └──────────────────────────────────────────────────────┘
//! ```
//!
//! Startup order: parse flags → load config → build route table → bind →
//! serve. Any failure before serving exits with status 1.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use tokio::net::TcpListener;

use vhost_proxy::config::{load_config, ServerConfig};
use vhost_proxy::observability::logging;
use vhost_proxy::{Dispatcher, HttpServer, RouteTable, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "vhost-proxy")]
#[command(about = "Host-based HTTP reverse proxy", long_about = None)]
struct Cli {
    /// The config file name to use. Example: /tmp/vhost-proxy.json
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// The server address to listen to.
    #[arg(short = 'a', long = "addr", default_value = ":8080")]
    addr: String,

    /// Request body read timeout in seconds.
    #[arg(long, default_value_t = 10)]
    read_timeout: u64,

    /// Response write timeout in seconds.
    #[arg(long, default_value_t = 10)]
    write_timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(logging::DEFAULT_FILTER);

    let config_path = cli.config.clone().unwrap_or_default();
    let hosts = match load_config(&config_path) {
        Ok(hosts) => hosts,
        Err(e) => {
            eprintln!("{e}");
            eprintln!();
            eprintln!("{}", Cli::command().render_help());
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        path = %config_path.display(),
        hosts = hosts.len(),
        "Configuration loaded"
    );

    let table = match RouteTable::from_config(&hosts) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let server_config = ServerConfig {
        listen_address: cli.addr,
        read_timeout: Duration::from_secs(cli.read_timeout),
        write_timeout: Duration::from_secs(cli.write_timeout),
    };

    let listener = match bind(&server_config).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let server = HttpServer::new(server_config, Dispatcher::new(table));
    if let Err(e) = server.run(listener, shutdown.subscribe()).await {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}

async fn bind(config: &ServerConfig) -> Result<TcpListener, Box<dyn std::error::Error>> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}
