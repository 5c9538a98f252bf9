//! roproxy: subdomain-routing reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ── GET /games/v1/games?universeIds=1 ──▶ ┌────────────────────┐
//!                                                   │  admission gate    │ 407
//!                                                   ├────────────────────┤
//!                                                   │  path translation  │ 400
//!                                                   ├────────────────────┤
//!                                                   │  header sanitizer  │
//!                                                   ├────────────────────┤
//!                                                   │  retry + backoff   │ 500
//!                                                   └─────────┬──────────┘
//!                                                             │ TLS
//!                                                             ▼
//!                                  https://games.roblox.com/v1/games?universeIds=1
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use roproxy::config::load_config;
use roproxy::lifecycle::shutdown_signal;
use roproxy::observability::{logging, metrics};
use roproxy::HttpServer;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Optional TOML configuration file; environment variables override it
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides PORT)
    #[clap(short, long)]
    port: Option<u16>,

    /// Interface to bind
    #[clap(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (mut config, ignored) = load_config(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.listener.port = port;
    }
    if let Some(host) = args.host {
        config.listener.host = host;
    }

    logging::init_logging(&config.observability);

    tracing::info!("roproxy v{} starting", env!("CARGO_PKG_VERSION"));
    for var in &ignored {
        tracing::warn!(
            variable = var.name,
            value = %var.value,
            "Ignoring unparsable environment variable"
        );
    }
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        upstream_domain = %config.upstream.domain,
        request_timeout_secs = config.timeouts.request_secs,
        max_attempts = config.retries.max_attempts,
        admission = ?config.admission,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
