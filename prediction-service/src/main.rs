//! Survival Prediction Service
//!
//! Serves a pre-trained survival classifier over HTTP.
//!
//! Endpoints:
//! - GET / - Usage banner
//! - GET /input_ex - Example request body
//! - POST /predict - Annotate a JSON array of passengers with predictions
//! - GET /health - Health check
//! - GET /metrics - Prometheus metrics

mod config;
mod error;
mod handlers;
mod metrics;
mod routes;
mod state;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    survival_core::init(env!("CARGO_PKG_NAME"), config.log_format, config.debug);

    let metrics = if config.metrics_enabled {
        Some(metrics::init_metrics().context("failed to install metrics recorder")?)
    } else {
        None
    };

    let app = routes::create_router(AppState::new(&config, metrics));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        addr = %addr,
        model_path = %config.model_path.display(),
        policy = ?config.load_policy(),
        "Prediction service listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
