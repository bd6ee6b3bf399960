//! Individual preprocessing steps.
//!
//! Each step is total over well-formed input: the only failure is a column the
//! step operates on being absent from the table.

use passenger_proto::{Record, Value};

use crate::table::Table;
use crate::SchemaError;

/// Project `batch` onto `columns`, in the given order.
///
/// A column counts as present if at least one record carries the field; records
/// lacking it contribute `Null`. A column absent from every record of a
/// non-empty batch is a [`SchemaError::MissingColumn`].
pub fn filter_columns(batch: &[Record], columns: &[String]) -> Result<Table, SchemaError> {
    let mut table = Table::with_rows(batch.len());
    for name in columns {
        if !batch.is_empty() && !batch.iter().any(|record| record.contains(name)) {
            return Err(SchemaError::MissingColumn(name.clone()));
        }
        let values = batch
            .iter()
            .map(|record| record.get(name).cloned().unwrap_or(Value::Null))
            .collect();
        table.set_column(name.as_str(), values);
    }
    Ok(table)
}

/// Replace `column` with a 1/0 flag: 1 for any non-null value, 0 for null.
pub fn presence_indicator(table: &mut Table, column: &str) -> Result<(), SchemaError> {
    let values = existing(table, column)?;
    for value in values.iter_mut() {
        *value = Value::Int(i64::from(!value.is_null()));
    }
    Ok(())
}

/// Replace nulls in `column` with `fill`; other values are left untouched.
pub fn impute_constant(table: &mut Table, column: &str, fill: f64) -> Result<(), SchemaError> {
    let values = existing(table, column)?;
    for value in values.iter_mut().filter(|v| v.is_null()) {
        *value = Value::Float(fill);
    }
    Ok(())
}

/// Append one 1/0 indicator column per declared category of `column`.
///
/// Every declared category gets a column even when no row carries it. Rows
/// whose value is null, not a string, or outside `categories` get 0 in every
/// indicator column. The source column is kept as-is.
pub fn one_hot(
    table: &mut Table,
    column: &str,
    prefix: Option<&str>,
    categories: &[&str],
) -> Result<(), SchemaError> {
    let source = table
        .column(column)
        .ok_or_else(|| SchemaError::MissingColumn(column.to_string()))?;

    let indicators: Vec<(String, Vec<Value>)> = categories
        .iter()
        .map(|category| {
            let values = source
                .iter()
                .map(|v| Value::Int(i64::from(v.as_str() == Some(*category))))
                .collect();
            (indicator_column_name(prefix, category), values)
        })
        .collect();

    for (name, values) in indicators {
        table.set_column(name, values);
    }
    Ok(())
}

/// Name of the indicator column for `category`: `prefix_category`, or just
/// `category` without a prefix.
pub fn indicator_column_name(prefix: Option<&str>, category: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}_{category}"),
        None => category.to_string(),
    }
}

fn existing<'a>(table: &'a mut Table, column: &str) -> Result<&'a mut Vec<Value>, SchemaError> {
    table
        .column_mut(column)
        .ok_or_else(|| SchemaError::MissingColumn(column.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(columns: &[&str]) -> Vec<String> {
        columns.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_filter_columns_projects_in_order() {
        let batch = vec![Record::new()
            .with("Name", "Jessica Andersson")
            .with("Age", 26)
            .with("Pclass", 1)];
        let table = filter_columns(&batch, &names(&["Pclass", "Age"])).unwrap();

        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["Pclass", "Age"]);
        assert!(table.column("Name").is_none());
    }

    #[test]
    fn test_filter_columns_missing_everywhere() {
        let batch = vec![Record::new().with("Pclass", 1)];
        let err = filter_columns(&batch, &names(&["Pclass", "Cabin"])).unwrap_err();
        assert_eq!(err, SchemaError::MissingColumn("Cabin".to_string()));
    }

    #[test]
    fn test_filter_columns_missing_in_some_rows_is_null() {
        let batch = vec![
            Record::new().with("Cabin", "B5"),
            Record::new().with("Pclass", 2),
        ];
        let table = filter_columns(&batch, &names(&["Cabin"])).unwrap();
        assert_eq!(
            table.column("Cabin"),
            Some(&[Value::from("B5"), Value::Null][..])
        );
    }

    #[test]
    fn test_filter_columns_empty_batch() {
        let table = filter_columns(&[], &names(&["Pclass", "Sex"])).unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_names().count(), 2);
    }

    #[test]
    fn test_presence_indicator_any_non_null() {
        let batch: Vec<Record> = [
            Value::from("C07"),
            Value::from(""),
            Value::Int(0),
            Value::Bool(false),
            Value::Null,
        ]
        .into_iter()
        .map(|v| Record::new().with("Cabin", v))
        .collect();
        let mut table = filter_columns(&batch, &names(&["Cabin"])).unwrap();
        presence_indicator(&mut table, "Cabin").unwrap();

        let flags: Vec<_> = table.column("Cabin").unwrap().to_vec();
        assert_eq!(
            flags,
            vec![
                Value::Int(1),
                Value::Int(1),
                Value::Int(1),
                Value::Int(1),
                Value::Int(0)
            ]
        );
    }

    #[test]
    fn test_impute_constant_only_touches_nulls() {
        let batch = vec![
            Record::new().with("Age", 0.92),
            Record::new().with("Age", None::<f64>),
            Record::new().with("Age", 71),
        ];
        let mut table = filter_columns(&batch, &names(&["Age"])).unwrap();
        impute_constant(&mut table, "Age", 28.0).unwrap();

        assert_eq!(
            table.column("Age").unwrap(),
            &[Value::Float(0.92), Value::Float(28.0), Value::Int(71)]
        );
    }

    #[test]
    fn test_one_hot_synthesizes_absent_categories() {
        let batch = vec![
            Record::new().with("Embarked", "S"),
            Record::new().with("Embarked", "S"),
        ];
        let mut table = filter_columns(&batch, &names(&["Embarked"])).unwrap();
        one_hot(&mut table, "Embarked", Some("Embarked"), &["C", "Q", "S"]).unwrap();

        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["Embarked", "Embarked_C", "Embarked_Q", "Embarked_S"]
        );
        assert!(table
            .column("Embarked_C")
            .unwrap()
            .iter()
            .all(|v| *v == Value::Int(0)));
        assert!(table
            .column("Embarked_S")
            .unwrap()
            .iter()
            .all(|v| *v == Value::Int(1)));
    }

    #[test]
    fn test_one_hot_unknown_values_are_all_zero() {
        let batch = vec![
            Record::new().with("Sex", "X"),
            Record::new().with("Sex", None::<&str>),
            Record::new().with("Sex", 1),
            Record::new().with("Sex", "Male"),
        ];
        let mut table = filter_columns(&batch, &names(&["Sex"])).unwrap();
        one_hot(&mut table, "Sex", None, &["female", "male"]).unwrap();

        for row in 0..table.row_count() {
            let record = table.row(row).unwrap();
            assert_eq!(record.get("female"), Some(&Value::Int(0)));
            assert_eq!(record.get("male"), Some(&Value::Int(0)));
        }
    }

    #[test]
    fn test_missing_column_for_step() {
        let mut table = Table::with_rows(1);
        assert_eq!(
            presence_indicator(&mut table, "Cabin"),
            Err(SchemaError::MissingColumn("Cabin".to_string()))
        );
        assert!(one_hot(&mut table, "Sex", None, &["female"]).is_err());
    }

    #[test]
    fn test_indicator_column_name() {
        assert_eq!(indicator_column_name(Some("Embarked"), "Q"), "Embarked_Q");
        assert_eq!(indicator_column_name(None, "female"), "female");
    }
}
