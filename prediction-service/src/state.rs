//! Shared application state for the prediction service.

use std::sync::Arc;

use feature_pipeline::PipelineConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use ml_bridge::ModelStore;

use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Source of the model artifact
    pub store: Arc<ModelStore>,

    /// Preprocessing parameters the model was trained with
    pub pipeline: Arc<PipelineConfig>,

    /// Prometheus handle, present when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: &Config, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            store: Arc::new(ModelStore::new(&config.model_path, config.load_policy())),
            pipeline: Arc::new(PipelineConfig::titanic()),
            metrics,
        }
    }
}
