//! Feature preprocessing for survival prediction.
//!
//! Turns a batch of passenger records into the fixed feature schema the model
//! was trained on:
//!
//! 1. keep `Pclass`, `Sex`, `Age`, `Cabin`, `Embarked`
//! 2. `Cabin` becomes a presence flag
//! 3. null `Age` is filled with a constant
//! 4. `Embarked` is one-hot encoded over `C`, `Q`, `S`
//! 5. `Sex` is one-hot encoded over `female`, `male`
//!
//! The one-hot columns are declared up front, so a batch that only contains
//! `Embarked = "C"` still yields zero-filled `Embarked_Q` and `Embarked_S`.

pub mod steps;
pub mod table;

use passenger_proto::Record;
use thiserror::Error;
use tracing::debug;

pub use steps::{
    filter_columns, impute_constant, indicator_column_name, one_hot, presence_indicator,
};
pub use table::{Column, FeatureMatrix, Table};

pub const PCLASS: &str = "Pclass";
pub const SEX: &str = "Sex";
pub const AGE: &str = "Age";
pub const CABIN: &str = "Cabin";
pub const EMBARKED: &str = "Embarked";

/// Fill value for a missing `Age`, the median age of the training set.
pub const DEFAULT_AGE: f64 = 28.0;

pub const EMBARKED_CATEGORIES: [&str; 3] = ["C", "Q", "S"];
pub const SEX_CATEGORIES: [&str; 2] = ["female", "male"];

/// Numeric columns every preprocessed table carries.
pub const FEATURE_COLUMNS: [&str; 8] = [
    PCLASS,
    CABIN,
    AGE,
    "Embarked_C",
    "Embarked_Q",
    "Embarked_S",
    "female",
    "male",
];

/// Errors raised when the input records do not fit the pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("required column '{0}' is missing from the input records")]
    MissingColumn(String),
}

/// Pipeline parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub columns_to_keep: Vec<String>,
    pub default_age: f64,
}

impl PipelineConfig {
    /// The configuration the survival model was trained with.
    pub fn titanic() -> Self {
        Self {
            columns_to_keep: [PCLASS, SEX, AGE, CABIN, EMBARKED]
                .iter()
                .map(ToString::to_string)
                .collect(),
            default_age: DEFAULT_AGE,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::titanic()
    }
}

/// Run every preprocessing step over `batch`.
///
/// The returned table has one row per record, in input order. Besides the
/// [`FEATURE_COLUMNS`] it keeps the raw `Sex` and `Embarked` strings, which
/// [`Table::select_numeric`] leaves out of the model input.
pub fn preprocess(batch: &[Record], config: &PipelineConfig) -> Result<Table, SchemaError> {
    let mut table = filter_columns(batch, &config.columns_to_keep)?;
    presence_indicator(&mut table, CABIN)?;
    impute_constant(&mut table, AGE, config.default_age)?;
    one_hot(&mut table, EMBARKED, Some(EMBARKED), &EMBARKED_CATEGORIES)?;
    one_hot(&mut table, SEX, None, &SEX_CATEGORIES)?;

    debug!(
        rows = table.row_count(),
        columns = table.column_names().count(),
        "Preprocessed batch"
    );
    Ok(table)
}
