//! Router construction

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/input_ex", get(handlers::input_example))
        // Batches are unbounded; axum's 2 MB default would reject large ones.
        .route(
            "/predict",
            post(handlers::predict).layer(DefaultBodyLimit::disable()),
        )
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::render_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
