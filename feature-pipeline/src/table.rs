//! Columnar view of a batch and the numeric matrix fed to the model.

use passenger_proto::Value;

/// A named column of per-row values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// Columnar table derived from a batch.
///
/// Every column holds exactly `row_count()` values; row `i` of every column
/// belongs to record `i` of the source batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// An empty table with `rows` rows and no columns yet.
    pub const fn with_rows(rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            rows,
        }
    }

    pub const fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| &mut c.values)
    }

    /// Add a column, replacing any existing column of the same name in place.
    pub(crate) fn set_column(&mut self, name: impl Into<String>, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows, "column length must match row count");
        let name = name.into();
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column { name, values }),
        }
    }

    /// Row `index` as a record, columns in table order.
    #[cfg(test)]
    pub(crate) fn row(&self, index: usize) -> Option<passenger_proto::Record> {
        (index < self.rows).then(|| {
            self.columns
                .iter()
                .map(|c| (c.name.clone(), c.values[index].clone()))
                .collect()
        })
    }

    /// Keep only numeric columns and convert them to a dense `f64` matrix.
    ///
    /// A column is numeric when each cell is an integer, a float, or null, and
    /// at least one cell is non-null. Nulls become `NaN`. In a zero-row table
    /// every column qualifies.
    pub fn select_numeric(&self) -> FeatureMatrix {
        let numeric: Vec<&Column> = self
            .columns
            .iter()
            .filter(|c| is_numeric(&c.values, self.rows))
            .collect();

        let rows = (0..self.rows)
            .map(|i| {
                numeric
                    .iter()
                    .map(|c| c.values[i].as_f64().unwrap_or(f64::NAN))
                    .collect()
            })
            .collect();

        FeatureMatrix {
            columns: numeric.iter().map(|c| c.name.clone()).collect(),
            rows,
        }
    }
}

fn is_numeric(values: &[Value], rows: usize) -> bool {
    let all_numeric_or_null = values
        .iter()
        .all(|v| v.is_null() || v.as_f64().is_some());
    all_numeric_or_null && (rows == 0 || values.iter().any(|v| !v.is_null()))
}

/// Numeric model input with named columns, one row per record.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}
