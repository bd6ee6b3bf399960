//! HTTP handlers

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use feature_pipeline::preprocess;
use ml_bridge::Predictor;
use passenger_proto::{decode_batch, encode_batch, Value};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::state::AppState;

/// Field appended to every record of a prediction response
pub const PREDICTION_FIELD: &str = "prediction";

pub const USAGE: &str = "Welcome to the survival prediction API. \
POST a JSON array of passengers to /predict to get a prediction for each one. \
GET /input_ex for an example of how the input should look.";

pub const INPUT_EXAMPLE: &str = r#"[
    {"PassengerId": 1, "Pclass": 1, "Name": "Jessica Andersson", "Sex": "female", "Age": 26, "Cabin": "C07", "Embarked": "S"},
    {"PassengerId": 2, "Pclass": 3, "Name": "Erik Lindqvist", "Sex": "male", "Age": null, "Cabin": null, "Embarked": "C"}
]"#;

/// Usage banner
pub async fn index() -> &'static str {
    metrics::record_request("/", true);
    USAGE
}

/// Example request body
pub async fn input_example() -> &'static str {
    metrics::record_request("/input_ex", true);
    INPUT_EXAMPLE
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus scrape endpoint
pub async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics are disabled").into_response(),
    }
}

/// Annotate every posted record with a survival prediction
pub async fn predict(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let result = predict_batch(&state, &body).await;
    metrics::record_request("/predict", result.is_ok());

    let body = result?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Decode, preprocess, infer and re-encode one request body.
///
/// The response holds the original records, fields untouched and in order,
/// each with a `prediction` field appended.
pub async fn predict_batch(state: &AppState, body: &[u8]) -> AppResult<Vec<u8>> {
    let mut batch = decode_batch(body)?;
    let features = preprocess(&batch, &state.pipeline)?.select_numeric();
    debug!(
        rows = features.row_count(),
        columns = ?features.columns(),
        "Feature matrix ready"
    );

    let started = Instant::now();
    let model = state.store.load().await.inspect_err(|_| {
        metrics::record_artifact_failure();
    })?;
    metrics::record_model_load(started.elapsed());

    let started = Instant::now();
    let labels = model.predict(&features)?;
    metrics::record_inference(started.elapsed(), labels.len());

    if labels.len() != batch.len() {
        return Err(AppError::Internal(format!(
            "model returned {} labels for {} records",
            labels.len(),
            batch.len()
        )));
    }

    for (record, label) in batch.iter_mut().zip(labels) {
        record.insert(PREDICTION_FIELD, Value::Int(label));
    }
    info!(rows = batch.len(), model = model.kind(), "Batch predicted");

    encode_batch(&batch).map_err(|e| AppError::Internal(format!("failed to encode response: {e}")))
}
