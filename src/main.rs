use anyhow::{Context, Result};
use clap::Parser;
use live_broadcast::{create_router, AppState, BroadcastSession, Config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Live audio ingest: one producer in over WebSocket, HLS out
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/live-broadcast")]
    config: String,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the web root holding `live/` and `ffmpeg/`
    #[arg(long)]
    web_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load(&cli.config)?;
    if let Some(bind) = cli.bind {
        cfg.service.http.bind = bind;
    }
    if let Some(port) = cli.port {
        cfg.service.http.port = port;
    }
    if let Some(web_root) = cli.web_root {
        cfg.broadcast.web_root = web_root;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let session = Arc::new(BroadcastSession::new(cfg.broadcast.to_broadcast_config())?);
    let app = create_router(AppState::new(session.clone()));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);
    info!("Producer endpoint: ws://{}/ws/stream", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")?;

    info!("Shutting down");
    session.stop().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
