//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use feature_pipeline::SchemaError;
use ml_bridge::{ArtifactError, PredictError};
use passenger_proto::DecodeError;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Predict(#[from] PredictError),

    // Infrastructure errors
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Decode(_) | Self::Schema(_) => StatusCode::BAD_REQUEST,
            Self::Predict(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Artifact(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Decode(_) | Self::Schema(_) | Self::Predict(_) => {
                tracing::warn!(error = %self, "Rejected prediction request");
                self.to_string()
            }
            Self::Artifact(e) => {
                tracing::error!(error = %e, "Model artifact error");
                "Model artifact is unavailable".to_string()
            }
            Self::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
