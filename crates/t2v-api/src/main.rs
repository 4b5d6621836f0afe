//! Axum API server binary.

use anyhow::Context;
use tracing::{info, warn};

use t2v_api::{create_router, metrics, ApiConfig, AppState};
use t2v_pipeline::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting t2v-api");

    let config = ApiConfig::from_env();
    info!(
        "API config: host={}, port={}, production={}",
        config.host,
        config.port,
        config.is_production()
    );

    let state = AppState::new(config.clone())
        .await
        .context("failed to create application state")?;

    if state.pipeline.registry().is_empty() {
        warn!("No model configs found; every generation request will be rejected");
    }

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("failed to install metrics recorder")?)
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    let addr = config.bind_addr().context("invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
