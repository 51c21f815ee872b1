//! HTTP API over the download pipelines (axum).

pub mod error;
mod router;
mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::ServerConfig;
use crate::downloader::MediaEngine;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;

/// Bind, serve until Ctrl-C, then drain in-flight requests
pub async fn serve(config: ServerConfig, engine: Arc<dyn MediaEngine>) -> Result<()> {
    let bind = config.bind_addr()?;

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("cannot create output dir {}", config.output_dir.display()))?;

    let state = AppState::new(engine.clone(), config.output_dir.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("bind failed: {bind}"))?;

    info!(
        target: "web",
        engine = engine.name(),
        output = %config.output_dir.display(),
        "listening on http://{bind}/"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!(target: "web", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!(target: "web", "shutdown requested");
}
