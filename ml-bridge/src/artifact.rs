//! Serialized survival models and their inference.
//!
//! # Format
//!
//! The artifact is a JSON object tagged by `kind`:
//!
//! ```json
//! { "kind": "logistic_regression",
//!   "features": ["Pclass", "Age", "female"],
//!   "coefficients": [-0.9, -0.03, 2.5],
//!   "intercept": 1.2,
//!   "threshold": 0.5 }
//! ```
//!
//! ```json
//! { "kind": "decision_tree",
//!   "features": ["female", "Pclass"],
//!   "nodes": [
//!     { "split": { "feature": 0, "threshold": 0.5, "left": 1, "right": 2 } },
//!     { "leaf": { "label": 0 } },
//!     { "leaf": { "label": 1 } } ] }
//! ```
//!
//! Features are matched to input columns by name, so column order in the
//! request does not matter.

use feature_pipeline::FeatureMatrix;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::store::ArtifactError;

/// Class label produced by the model (0 = did not survive, 1 = survived)
pub type Label = i64;

/// Errors raised while running a model over a feature matrix
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("model expects feature '{0}', which is missing or not numeric in the input")]
    MissingFeature(String),

    #[error("feature '{feature}' in row {row} is not a finite number")]
    NonFinite { row: usize, feature: String },

    #[error("model structure is invalid: {0}")]
    InvalidModel(String),
}

/// Anything that maps feature rows to labels, one label per row, same order.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<Label>, PredictError>;
}

/// A deserialized model artifact
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTree),
}

/// Binary logistic regression over named features
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    pub features: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Probability at or above which the positive label is returned
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

/// Binary decision tree stored as a flat node list rooted at index 0
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DecisionTree {
    pub features: Vec<String>,
    pub nodes: Vec<TreeNode>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, else to `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { label: Label },
}

impl ModelArtifact {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::LogisticRegression(_) => "logistic_regression",
            Self::DecisionTree(_) => "decision_tree",
        }
    }

    /// Feature names the model was trained on.
    pub fn features(&self) -> &[String] {
        match self {
            Self::LogisticRegression(m) => &m.features,
            Self::DecisionTree(m) => &m.features,
        }
    }

    /// Check internal consistency.
    ///
    /// A validated tree always terminates: every child index is in range and
    /// strictly greater than its parent.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let features = self.features();
        let unique: HashSet<&String> = features.iter().collect();
        if unique.len() != features.len() {
            return Err(ArtifactError::Invalid("duplicate feature names".to_string()));
        }

        match self {
            Self::LogisticRegression(m) => m.validate(),
            Self::DecisionTree(m) => m.validate(),
        }
    }
}

impl Predictor for ModelArtifact {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<Label>, PredictError> {
        match self {
            Self::LogisticRegression(m) => m.predict(features),
            Self::DecisionTree(m) => m.predict(features),
        }
    }
}

impl LogisticRegression {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.coefficients.len() != self.features.len() {
            return Err(ArtifactError::Invalid(format!(
                "{} coefficients for {} features",
                self.coefficients.len(),
                self.features.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ArtifactError::Invalid("non-finite weight".to_string()));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ArtifactError::Invalid(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Positive-class probability for one aligned feature row.
    pub fn probability(&self, row: &[f64]) -> f64 {
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>();
        1.0 / (1.0 + (-z).exp())
    }
}

impl Predictor for LogisticRegression {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<Label>, PredictError> {
        if self.coefficients.len() != self.features.len() {
            return Err(PredictError::InvalidModel(
                "coefficient count does not match feature count".to_string(),
            ));
        }
        aligned_rows(&self.features, features)?
            .iter()
            .map(|row| Ok(Label::from(self.probability(row) >= self.threshold)))
            .collect()
    }
}

impl DecisionTree {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.nodes.is_empty() {
            return Err(ArtifactError::Invalid("decision tree has no nodes".to_string()));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = *node
            {
                if feature >= self.features.len() {
                    return Err(ArtifactError::Invalid(format!(
                        "node {index} splits on unknown feature {feature}"
                    )));
                }
                if !threshold.is_finite() {
                    return Err(ArtifactError::Invalid(format!(
                        "node {index} has a non-finite threshold"
                    )));
                }
                for child in [left, right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(ArtifactError::Invalid(format!(
                            "node {index} points to invalid child {child}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn classify(&self, row: &[f64]) -> Result<Label, PredictError> {
        let mut index = 0;
        // Bounded walk: an unvalidated tree may contain a cycle.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { label }) => return Ok(*label),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = row.get(*feature).ok_or_else(|| {
                        PredictError::InvalidModel(format!("unknown feature index {feature}"))
                    })?;
                    index = if *x <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(PredictError::InvalidModel(format!(
                        "node index {index} out of range"
                    )))
                }
            }
        }
        Err(PredictError::InvalidModel("tree walk did not reach a leaf".to_string()))
    }
}

impl Predictor for DecisionTree {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<Label>, PredictError> {
        aligned_rows(&self.features, features)?
            .iter()
            .map(|row| self.classify(row))
            .collect()
    }
}

/// Reorder matrix rows into the model's feature order, rejecting missing
/// columns and non-finite cells.
fn aligned_rows(
    model_features: &[String],
    matrix: &FeatureMatrix,
) -> Result<Vec<Vec<f64>>, PredictError> {
    let indices = model_features
        .iter()
        .map(|name| {
            matrix
                .column_index(name)
                .ok_or_else(|| PredictError::MissingFeature(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    matrix
        .rows()
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            indices
                .iter()
                .zip(model_features)
                .map(|(&column, name)| {
                    let x = row[column];
                    if x.is_finite() {
                        Ok(x)
                    } else {
                        Err(PredictError::NonFinite {
                            row: row_index,
                            feature: name.clone(),
                        })
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_pipeline::{preprocess, PipelineConfig};
    use passenger_proto::decode_batch;

    fn features(json: &str) -> FeatureMatrix {
        let batch = decode_batch(json.as_bytes()).unwrap();
        preprocess(&batch, &PipelineConfig::titanic())
            .unwrap()
            .select_numeric()
    }

    fn sex_tree() -> ModelArtifact {
        serde_json::from_str(
            r#"{
                "kind": "decision_tree",
                "features": ["female", "Pclass"],
                "nodes": [
                    { "split": { "feature": 0, "threshold": 0.5, "left": 1, "right": 2 } },
                    { "leaf": { "label": 0 } },
                    { "split": { "feature": 1, "threshold": 2.5, "left": 3, "right": 4 } },
                    { "leaf": { "label": 1 } },
                    { "leaf": { "label": 0 } }
                ]
            }"#,
        )
        .unwrap()
    }

    const PASSENGERS: &str = r#"[
        {"Pclass":1,"Sex":"female","Age":26,"Cabin":"C07","Embarked":"S"},
        {"Pclass":3,"Sex":"male","Age":null,"Cabin":null,"Embarked":null},
        {"Pclass":3,"Sex":"female","Age":14,"Cabin":null,"Embarked":"Q"}
    ]"#;

    #[test]
    fn test_decision_tree_predicts_per_row() {
        let model = sex_tree();
        model.validate().unwrap();
        assert_eq!(model.kind(), "decision_tree");
        assert_eq!(model.predict(&features(PASSENGERS)).unwrap(), vec![1, 0, 0]);
    }

    #[test]
    fn test_logistic_regression_threshold() {
        let model: ModelArtifact = serde_json::from_str(
            r#"{
                "kind": "logistic_regression",
                "features": ["male", "Age"],
                "coefficients": [-2.0, -0.01],
                "intercept": 1.0
            }"#,
        )
        .unwrap();
        model.validate().unwrap();

        // female, 26: z = 0.74 -> 0.68; male, 28: z = -1.28 -> 0.22; female, 14: z = 0.86 -> 0.70
        assert_eq!(model.predict(&features(PASSENGERS)).unwrap(), vec![1, 0, 1]);
    }

    #[test]
    fn test_missing_feature() {
        let model: ModelArtifact = serde_json::from_str(
            r#"{"kind": "logistic_regression", "features": ["Fare"], "coefficients": [0.1], "intercept": 0.0}"#,
        )
        .unwrap();
        let err = model.predict(&features(PASSENGERS)).unwrap_err();
        assert_eq!(err, PredictError::MissingFeature("Fare".to_string()));
    }

    #[test]
    fn test_non_finite_input() {
        let matrix = features(
            r#"[{"Pclass":1,"Sex":"female","Age":2,"Cabin":null,"Embarked":"C"},
                {"Pclass":null,"Sex":"male","Age":40,"Cabin":null,"Embarked":"C"}]"#,
        );
        let err = sex_tree().predict(&matrix).unwrap_err();
        assert_eq!(
            err,
            PredictError::NonFinite {
                row: 1,
                feature: "Pclass".to_string()
            }
        );
    }

    #[test]
    fn test_empty_matrix_predicts_nothing() {
        assert!(sex_tree().predict(&features("[]")).unwrap().is_empty());
    }

    #[test]
    fn test_validate_rejects_backward_child() {
        let model = ModelArtifact::DecisionTree(DecisionTree {
            features: vec!["female".to_string()],
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.5,
                    left: 1,
                    right: 0,
                },
                TreeNode::Leaf { label: 0 },
            ],
        });
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("invalid child 0"));

        // Unvalidated cycles still terminate at predict time.
        let err = model.predict(&features(PASSENGERS)).unwrap_err();
        assert!(matches!(err, PredictError::InvalidModel(_)));
    }

    #[test]
    fn test_validate_rejects_coefficient_mismatch() {
        let model = ModelArtifact::LogisticRegression(LogisticRegression {
            features: vec!["Age".to_string(), "male".to_string()],
            coefficients: vec![0.5],
            intercept: 0.0,
            threshold: 0.5,
        });
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_features() {
        let model = ModelArtifact::LogisticRegression(LogisticRegression {
            features: vec!["Age".to_string(), "Age".to_string()],
            coefficients: vec![0.5, 0.5],
            intercept: 0.0,
            threshold: 0.5,
        });
        assert!(model.validate().unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let result = serde_json::from_str::<ModelArtifact>(r#"{"kind": "random_forest", "trees": []}"#);
        assert!(result.is_err());
    }
}
