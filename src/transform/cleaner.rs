use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

use super::{field_is_empty, target_columns, Dataset, Record};
use crate::error::PipelineError;
use crate::utils::text::clean_whitespace;

/// Row counts before and after cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub original_count: usize,
    pub cleaned_count: usize,
    pub dropped: usize,
    pub columns: Vec<String>,
}

/// Cleans and normalizes a list of records through chained stages.
///
/// ```
/// use serde_json::json;
/// use tlnk::transform::DataCleaner;
///
/// let rows = json!([
///     {"id": 1, "name": "Alice"},
///     {"id": 1, "name": "Alice"},
///     {"id": 2, "name": null},
/// ]);
/// let summary = DataCleaner::from_json(&rows)
///     .unwrap()
///     .drop_nulls(Some(&["name"]))
///     .drop_duplicates(Some(&["id"]))
///     .summary();
/// assert_eq!(summary.cleaned_count, 1);
/// assert_eq!(summary.dropped, 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DataCleaner {
    data: Dataset,
}

impl DataCleaner {
    pub fn new(records: &[Record]) -> Self {
        Self {
            data: Dataset::new(records),
        }
    }

    /// Builds a cleaner from a JSON array of objects.
    pub fn from_json(value: &Value) -> Result<Self, PipelineError> {
        Self::try_from(value.clone())
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn original_count(&self) -> usize {
        self.data.original_count
    }

    /// Column names of the first remaining record.
    pub fn columns(&self) -> Vec<String> {
        self.data.columns()
    }

    /// Keeps a record only if all checked columns are non-empty. Without
    /// columns, every field of the record is checked.
    pub fn drop_nulls(mut self, columns: Option<&[&str]>) -> Self {
        let before = self.count();
        self.data.records.retain(|row| {
            target_columns(row, columns)
                .iter()
                .all(|c| !field_is_empty(row, c))
        });
        debug!("drop_nulls: {} -> {} rows", before, self.count());
        self
    }

    /// Removes repeated records, keeping the first occurrence. Identity is the
    /// values at `keys`, or the whole record when no keys are given.
    pub fn drop_duplicates(mut self, keys: Option<&[&str]>) -> Self {
        let before = self.count();
        let mut seen = HashSet::new();
        self.data
            .records
            .retain(|row| seen.insert(row_identity(row, keys)));
        debug!("drop_duplicates: {} -> {} rows", before, self.count());
        self
    }

    /// Collapses internal whitespace and trims string values.
    pub fn strip_whitespace(mut self, columns: Option<&[&str]>) -> Self {
        for row in &mut self.data.records {
            for col in target_columns(row, columns) {
                if let Some(Value::String(s)) = row.get_mut(&col) {
                    *s = clean_whitespace(s);
                }
            }
        }
        self
    }

    /// Renames keys found in `mapping`; others pass through. When two keys land
    /// on the same name, the later one in the record's key order wins and the
    /// name keeps the position where it first appeared.
    pub fn rename_columns<I, K, V>(mut self, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mapping: HashMap<String, String> = mapping
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.data.records = std::mem::take(&mut self.data.records)
            .into_iter()
            .map(|row| {
                let mut renamed = Record::with_capacity(row.len());
                for (key, value) in row {
                    let key = mapping.get(&key).cloned().unwrap_or(key);
                    renamed.insert(key, value);
                }
                renamed
            })
            .collect();
        self
    }

    /// Projects every record onto `columns`, in that order. Missing fields become null.
    pub fn select_columns(mut self, columns: &[&str]) -> Self {
        for row in &mut self.data.records {
            let selected: Record = columns
                .iter()
                .map(|c| (c.to_string(), row.get(*c).cloned().unwrap_or(Value::Null)))
                .collect();
            *row = selected;
        }
        self
    }

    /// Replaces empty values with `value`. Explicit columns missing from a record are added.
    pub fn fill_null(mut self, value: impl Into<Value>, columns: Option<&[&str]>) -> Self {
        let value = value.into();
        for row in &mut self.data.records {
            for col in target_columns(row, columns) {
                if field_is_empty(row, &col) {
                    row.insert(col, value.clone());
                }
            }
        }
        self
    }

    pub fn to_list(&self) -> &[Record] {
        &self.data.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.data.records
    }

    pub fn summary(&self) -> Summary {
        Summary {
            original_count: self.data.original_count,
            cleaned_count: self.count(),
            dropped: self.data.original_count.saturating_sub(self.count()),
            columns: self.columns(),
        }
    }
}

impl TryFrom<Value> for DataCleaner {
    type Error = PipelineError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Ok(Self {
            data: Dataset::try_from(value)?,
        })
    }
}

impl From<Vec<Record>> for DataCleaner {
    fn from(records: Vec<Record>) -> Self {
        let original_count = records.len();
        Self {
            data: Dataset {
                records,
                original_count,
            },
        }
    }
}

impl fmt::Display for DataCleaner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataCleaner(rows={}, columns={:?})", self.count(), self.columns())
    }
}

/// Hashable identity of a record. Values are rendered as JSON, so the joined
/// form is unambiguous.
fn row_identity(row: &Record, keys: Option<&[&str]>) -> String {
    match keys {
        Some(keys) if !keys.is_empty() => keys
            .iter()
            .map(|k| row.get(*k).unwrap_or(&Value::Null).to_string())
            .collect::<Vec<_>>()
            .join(","),
        _ => {
            let mut pairs: Vec<(&String, &Value)> = row.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));
            pairs
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), v))
                .collect::<Vec<_>>()
                .join(",")
        }
    }
}
