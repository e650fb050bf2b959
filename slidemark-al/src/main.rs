//! slidemark-al - Active-Learning Session Service
//!
//! Interactive per-slide nucleus classification: accumulates labeled
//! samples, drives training/inference jobs on the model server, and
//! streams session progress to connected UIs via SSE.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use slidemark_al::services::{HttpModelServer, HttpSlideStore};
use slidemark_al::{AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting slidemark-al (Active-Learning Session) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Model server: {}", config.model_server_url);
    info!("Slide store: {}", config.slide_store_url);

    let model_server = Arc::new(
        HttpModelServer::new(config.model_server_url.clone())
            .map_err(|e| anyhow::anyhow!("Failed to build model server client: {}", e))?,
    );
    let slide_store = Arc::new(
        HttpSlideStore::new(config.slide_store_url.clone())
            .map_err(|e| anyhow::anyhow!("Failed to build slide store client: {}", e))?,
    );

    let bind = config.bind.clone();
    let state = AppState::new(config, model_server, slide_store);

    // Best-effort initial catalogue load; the server may not be up yet
    match state.registry.refresh().await {
        Ok((total, valid)) => info!(total, valid, "Model catalogue loaded"),
        Err(e) => warn!(error = %e, "Initial catalogue load failed, continuing empty"),
    }

    let app = slidemark_al::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
