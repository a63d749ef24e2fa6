//! Serverless Bridge
//!
//! Serves the catalog application either behind function invocations or on
//! a local port.
//!
//! # Architecture Overview
//!
//! ```text
//!   invocation mode                                   local mode
//!   ───────────────                                   ──────────
//!   platform event + context                          TCP connection
//!          │                                                │
//!          ▼                                                │
//!   ┌──────────────┐   miss   ┌──────────────┐              │
//!   │   adapter    │─────────▶│ bootstrapper │◀─────────────┤ (built once at startup)
//!   │ cache + xlat │◀─────────│ app+pipeline │              │
//!   └──────┬───────┘  Server  └──────────────┘              ▼
//!          │                                         ┌──────────────┐
//!          ▼                                         │ LocalServer  │
//!   Server::dispatch ──▶ ProxyReply                  │ axum::serve  │
//!                                                    └──────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use serverless_bridge::adapter::{runtime, InvocationAdapter};
use serverless_bridge::app::{pipeline, Bootstrapper};
use serverless_bridge::catalog::CatalogApp;
use serverless_bridge::config::{resolve_config, BridgeConfig, RunMode};
use serverless_bridge::http::LocalServer;
use serverless_bridge::lifecycle::{spawn_signal_listener, Shutdown};
use serverless_bridge::observability::init_logging;

#[derive(Parser)]
#[command(name = "serverless-bridge")]
#[command(about = "Serve the catalog behind function invocations or on a local port", long_about = None)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, env = "BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Serve on a local port instead of waiting for invocations.
    #[arg(long)]
    local: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let mut config = resolve_config(cli.config.as_deref())?;
    if cli.local {
        config.mode = RunMode::Local;
    }

    init_logging(&config.observability, config.mode)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        mode = ?config.mode,
        "serverless-bridge starting"
    );

    let bootstrapper = Bootstrapper::new(
        CatalogApp::new(config.catalog.clone()),
        pipeline::standard(&config.pipeline),
    )
    .with_timeouts(config.timeouts.clone())
    .with_body_limit(config.pipeline.body_limit_bytes);

    match config.mode {
        RunMode::Local => run_local(&config, bootstrapper).await?,
        RunMode::Invocation => runtime::run(InvocationAdapter::new(bootstrapper)).await?,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run_local(
    config: &BridgeConfig,
    bootstrapper: Bootstrapper<CatalogApp>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let server = bootstrapper.build().await?;

    let listener = TcpListener::bind(&config.local.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    spawn_signal_listener(&shutdown);

    LocalServer::new(server).run(listener, &shutdown).await?;
    Ok(())
}
