//! keymint license key server.
//!
//! Issues, validates, and administers HWID-bound license keys over HTTP,
//! persisting to a flat JSON file.
//!
//! Usage:
//!   KEYMINT_ADMIN_TOKEN=... keymint-server --port 10000

use anyhow::{Context, Result};
use clap::Parser;
use keymint_server::{build_router, AppState, Config};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "keymint-server")]
#[command(about = "HWID-bound license key server")]
struct Args {
    /// Port to listen on (overrides KEYMINT_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the key snapshot file (overrides KEYMINT_DATA_FILE)
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let mut config = Config::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(data_file) = args.data_file {
        config.data_file = data_file;
    }

    info!("keymint server starting");
    info!("key snapshot: {}", config.data_file.display());
    if config.webhook_url.is_some() {
        info!("webhook notifications enabled");
    }

    let state = AppState::from_config(&config);
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("HTTP server failed")?;

    Ok(())
}
