//! Prometheus metrics for prediction service observability
//!
//! Exposes metrics at /metrics endpoint for scraping by Prometheus. Without an
//! installed recorder the recording helpers are no-ops.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Metric names
pub const REQUESTS_TOTAL: &str = "prediction_requests_total";
pub const ROWS_PREDICTED: &str = "prediction_rows_total";
pub const ARTIFACT_FAILURES: &str = "prediction_artifact_failures_total";
pub const MODEL_LOAD_LATENCY: &str = "prediction_model_load_seconds";
pub const INFERENCE_LATENCY: &str = "prediction_inference_seconds";

/// Install the Prometheus recorder and describe the service metrics
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(REQUESTS_TOTAL, "Total number of requests by endpoint and outcome");
    describe_counter!(ROWS_PREDICTED, "Total number of records annotated with a prediction");
    describe_counter!(ARTIFACT_FAILURES, "Model artifact load failures");
    describe_histogram!(MODEL_LOAD_LATENCY, "Model artifact load latency in seconds");
    describe_histogram!(INFERENCE_LATENCY, "Model inference latency in seconds");

    tracing::info!("Metrics system initialized");
    Ok(handle)
}

/// Record a handled request
pub fn record_request(endpoint: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    counter!(REQUESTS_TOTAL, "endpoint" => endpoint, "outcome" => outcome).increment(1);
}

/// Record a successful model load
pub fn record_model_load(elapsed: Duration) {
    histogram!(MODEL_LOAD_LATENCY).record(elapsed.as_secs_f64());
}

/// Record a failed model load
pub fn record_artifact_failure() {
    counter!(ARTIFACT_FAILURES).increment(1);
}

/// Record a completed inference over `rows` records
pub fn record_inference(elapsed: Duration, rows: usize) {
    histogram!(INFERENCE_LATENCY).record(elapsed.as_secs_f64());
    counter!(ROWS_PREDICTED).increment(rows as u64);
}
