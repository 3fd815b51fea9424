//! Record cleaning and type conversion pipelines.
//!
//! Both pipelines own a private copy of their input. Stages consume the
//! pipeline and hand back a new one, so a chain never aliases the caller's data:
//!
//! ```
//! use serde_json::json;
//! use tlnk::transform::DataCleaner;
//!
//! let rows = json!([{"name": " Alice ", "age": "30"}, {"name": "", "age": "25"}]);
//! let cleaned = DataCleaner::from_json(&rows)
//!     .unwrap()
//!     .drop_nulls(Some(&["name"]))
//!     .strip_whitespace(None)
//!     .into_records();
//! assert_eq!(cleaned.len(), 1);
//! assert_eq!(cleaned[0]["name"], "Alice");
//! ```

pub mod cleaner;
pub mod converter;

pub use cleaner::{DataCleaner, Summary};
pub use converter::{DType, DataConverter, Schema};

use serde_json::Value;

use crate::error::PipelineError;
use crate::utils::dtype::to_str;

/// One row of extracted data. Field order is insertion order.
pub type Record = serde_json::Map<String, Value>;

/// Owned snapshot of the input records plus the size it started with.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Dataset {
    pub(crate) records: Vec<Record>,
    pub(crate) original_count: usize,
}

impl Dataset {
    pub(crate) fn new(records: &[Record]) -> Self {
        Self {
            records: records.to_vec(),
            original_count: records.len(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn columns(&self) -> Vec<String> {
        self.records
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl TryFrom<Value> for Dataset {
    type Error = PipelineError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let rows = match value {
            Value::Array(rows) => rows,
            other => {
                return Err(PipelineError::Validation(format!(
                    "Data must be a list of records, got {}",
                    kind(&other)
                )))
            }
        };
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| match row {
                Value::Object(record) => Ok(record),
                other => Err(PipelineError::Validation(format!(
                    "Row {i} must be a record, got {}",
                    kind(&other)
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let original_count = records.len();
        Ok(Self {
            records,
            original_count,
        })
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A field is empty when it is missing, null, or stringifies to whitespace.
pub(crate) fn field_is_empty(row: &Record, column: &str) -> bool {
    row.get(column).map_or(true, |v| to_str(v, "").is_empty())
}

/// The explicitly requested columns, or every column of `row` when none (or an
/// empty list) were given.
pub(crate) fn target_columns(row: &Record, columns: Option<&[&str]>) -> Vec<String> {
    match columns {
        Some(cols) if !cols.is_empty() => cols.iter().map(|c| c.to_string()).collect(),
        _ => row.keys().cloned().collect(),
    }
}
