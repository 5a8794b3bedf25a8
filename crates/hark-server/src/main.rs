//! # hark-server
//!
//! Serving binary for the hark speech-to-text inference handler:
//! loads the model once at startup, then serves `/ping`,
//! `/invocations`, and `/metrics`.

mod metrics;
mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hark_handler::{load_model, HandlerConfig, HttpObjectStore};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::routes::{router, AppState};

/// Hark inference server.
#[derive(Parser, Debug)]
#[command(name = "hark-server", about = "Speech-to-text inference server")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind.
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Model artifact directory (overrides HARK_MODEL_DIR).
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Configuration errors are fatal before we ever bind: a server
    // without valid config must never report ready.
    let mut config = HandlerConfig::from_env().context("invalid startup configuration")?;
    if let Some(model_dir) = cli.model_dir {
        config.model_dir = model_dir;
    }
    info!(
        device = %config.device,
        chunk_length_s = config.chunk_length_s,
        model_dir = %config.model_dir.display(),
        "starting hark-server"
    );

    let metrics_handle = metrics::install_recorder();

    // One engine per process, loaded off the request-serving path;
    // failure here is fatal.
    let engine = load_model(&config).await.context("model load failed")?;
    let store = Arc::new(HttpObjectStore::new(config.s3_endpoint.clone()));

    let state = AppState {
        engine,
        store,
        metrics: metrics_handle,
    };

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .context("invalid bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, router(state))
        .await
        .context("server error")?;

    Ok(())
}
