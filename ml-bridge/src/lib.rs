//! ML Bridge - survival model artifact and inference
//!
//! The model is trained offline and shipped as a JSON artifact on disk. This
//! crate deserializes it, checks its structure, and runs it over a
//! [`FeatureMatrix`](feature_pipeline::FeatureMatrix).
//!
//! # Example
//!
//! ```ignore
//! use ml_bridge::{LoadPolicy, ModelStore, Predictor};
//!
//! let store = ModelStore::new("model_titanic_survival.json", LoadPolicy::EveryRequest);
//! let model = store.load().await?;
//! let labels = model.predict(&features)?;
//! ```

pub mod artifact;
pub mod store;

// Re-export main types for convenience
pub use artifact::{
    DecisionTree, Label, LogisticRegression, ModelArtifact, PredictError, Predictor, TreeNode,
};
pub use store::{read_artifact, ArtifactError, LoadPolicy, ModelStore, DEFAULT_MODEL_PATH};
