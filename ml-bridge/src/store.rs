//! Loading the model artifact from disk.
//!
//! By default the artifact is re-read on every call, so replacing the file
//! takes effect on the next request. [`LoadPolicy::Cached`] keeps the first
//! successfully loaded artifact for the lifetime of the store instead.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::artifact::ModelArtifact;

/// Default artifact location, relative to the working directory
pub const DEFAULT_MODEL_PATH: &str = "model_titanic_survival.json";

/// Errors that can occur while loading the model artifact
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("model artifact not found at {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read model artifact {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact {} is malformed: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model artifact is invalid: {0}")]
    Invalid(String),
}

/// When the artifact is read from disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Re-read the artifact on every load
    #[default]
    EveryRequest,
    /// Read once, then share the loaded artifact; failed loads are retried
    Cached,
}

/// Source of the model artifact for request handlers
#[derive(Debug)]
pub struct ModelStore {
    path: PathBuf,
    policy: LoadPolicy,
    cached: OnceCell<Arc<ModelArtifact>>,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>, policy: LoadPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            cached: OnceCell::new(),
        }
    }

    /// Load the artifact according to the store's [`LoadPolicy`].
    pub async fn load(&self) -> Result<Arc<ModelArtifact>, ArtifactError> {
        match self.policy {
            LoadPolicy::EveryRequest => read_artifact(&self.path).await.map(Arc::new),
            LoadPolicy::Cached => self
                .cached
                .get_or_try_init(|| async {
                    let artifact = read_artifact(&self.path).await?;
                    info!(path = %self.path.display(), "Model artifact cached");
                    Ok::<_, ArtifactError>(Arc::new(artifact))
                })
                .await
                .cloned(),
        }
    }
}

/// Read, deserialize and validate the artifact at `path`.
pub async fn read_artifact(path: &Path) -> Result<ModelArtifact, ArtifactError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ArtifactError::Missing(path.to_path_buf())
        } else {
            ArtifactError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let artifact: ModelArtifact =
        serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    artifact.validate()?;

    debug!(
        path = %path.display(),
        kind = artifact.kind(),
        features = artifact.features().len(),
        "Model artifact loaded"
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TREE: &str = r#"{
        "kind": "decision_tree",
        "features": ["female"],
        "nodes": [
            { "split": { "feature": 0, "threshold": 0.5, "left": 1, "right": 2 } },
            { "leaf": { "label": 0 } },
            { "leaf": { "label": 1 } }
        ]
    }"#;

    #[tokio::test]
    async fn test_read_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, TREE).unwrap();

        let artifact = read_artifact(&path).await.unwrap();
        assert_eq!(artifact.kind(), "decision_tree");
        assert_eq!(artifact.features(), &["female".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_artifact(&dir.path().join("absent.json")).await.unwrap_err();
        assert!(matches!(err, ArtifactError::Missing(_)));
        assert!(err.to_string().contains("absent.json"));
    }

    #[tokio::test]
    async fn test_malformed_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"\x80\x04\x95pickle").unwrap();

        let err = read_artifact(&path).await.unwrap_err();
        assert!(matches!(err, ArtifactError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_invalid_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, r#"{"kind": "decision_tree", "features": [], "nodes": []}"#).unwrap();

        let err = read_artifact(&path).await.unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_every_request_policy_rereads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, TREE).unwrap();

        let store = ModelStore::new(&path, LoadPolicy::EveryRequest);
        assert!(store.load().await.is_ok());

        fs::remove_file(&path).unwrap();
        assert!(matches!(store.load().await, Err(ArtifactError::Missing(_))));
    }

    #[tokio::test]
    async fn test_cached_policy_keeps_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let store = ModelStore::new(&path, LoadPolicy::Cached);

        // A failed load is not cached.
        assert!(store.load().await.is_err());

        fs::write(&path, TREE).unwrap();
        let first = store.load().await.unwrap();

        fs::remove_file(&path).unwrap();
        let second = store.load().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
