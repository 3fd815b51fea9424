use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::{Dataset, Record};
use crate::error::{CastError, PipelineError};
use crate::utils::dtype;

/// Target type of a column in a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Int,
    Float,
    Bool,
    Str,
    Date,
}

impl DType {
    /// All tags, in the order `cast` applies them.
    pub const ALL: [DType; 5] = [DType::Int, DType::Float, DType::Bool, DType::Str, DType::Date];

    pub fn as_str(self) -> &'static str {
        match self {
            DType::Int => "int",
            DType::Float => "float",
            DType::Bool => "bool",
            DType::Str => "str",
            DType::Date => "date",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|t| t.as_str()).collect()
    }
}

impl FromStr for DType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PipelineError::UnknownType {
                dtype: s.to_string(),
                expected: Self::names(),
            })
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered column -> type mapping for [`DataConverter::cast`]. Every tag is
/// validated when the schema is built, so a cast never starts on a bad schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<(String, DType)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or retypes a column. A retyped column keeps its original position.
    pub fn with(mut self, column: impl Into<String>, dtype: DType) -> Self {
        let column = column.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = dtype,
            None => self.columns.push((column, dtype)),
        }
        self
    }

    /// Parses `(column, tag)` pairs, failing on the first unknown tag.
    pub fn parse<I, K, V>(pairs: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        pairs.into_iter().try_fold(Self::new(), |schema, (column, tag)| {
            Ok(schema.with(column, tag.as_ref().parse()?))
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<DType> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, t)| *t)
    }

    /// Columns grouped by type, in [`DType::ALL`] order. Empty groups are skipped.
    pub fn groups(&self) -> Vec<(DType, Vec<&str>)> {
        DType::ALL
            .into_iter()
            .map(|dtype| {
                let cols = self
                    .columns
                    .iter()
                    .filter(|(_, t)| *t == dtype)
                    .map(|(c, _)| c.as_str())
                    .collect::<Vec<_>>();
                (dtype, cols)
            })
            .filter(|(_, cols)| !cols.is_empty())
            .collect()
    }
}

/// Converts column types through chained stages.
///
/// Values that cannot be converted become null; a bad value never aborts the run.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConverter {
    data: Dataset,
}

impl DataConverter {
    pub fn new(records: &[Record]) -> Self {
        Self {
            data: Dataset::new(records),
        }
    }

    pub fn from_json(value: &Value) -> Result<Self, PipelineError> {
        Self::try_from(value.clone())
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }

    pub fn original_count(&self) -> usize {
        self.data.original_count
    }

    pub fn columns(&self) -> Vec<String> {
        self.data.columns()
    }

    fn convert(mut self, columns: &[&str], f: impl Fn(&Value) -> Value) -> Self {
        for row in &mut self.data.records {
            for col in columns {
                if let Some(v) = row.get_mut(*col) {
                    *v = f(v);
                }
            }
        }
        self
    }

    pub fn to_int(self, columns: &[&str]) -> Self {
        self.convert(columns, |v| {
            dtype::to_int(v, None).map_or(Value::Null, Value::from)
        })
    }

    /// Non-finite results become null since JSON cannot hold them.
    pub fn to_float(self, columns: &[&str]) -> Self {
        self.convert(columns, |v| {
            dtype::to_float(v, None)
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number)
        })
    }

    /// Unrecognised values become null, never `false`.
    pub fn to_bool(self, columns: &[&str]) -> Self {
        self.convert(columns, |v| Value::from(dtype::to_bool(v)))
    }

    pub fn to_str(self, columns: &[&str]) -> Self {
        self.convert(columns, |v| Value::String(dtype::to_str(v, "")))
    }

    pub fn to_date_iso(self, columns: &[&str]) -> Self {
        self.convert(columns, |v| {
            dtype::to_date_iso(v).map_or(Value::Null, Value::String)
        })
    }

    /// Applies every group of `schema`.
    pub fn cast(self, schema: &Schema) -> Self {
        schema
            .groups()
            .into_iter()
            .fold(self, |conv, (dtype, cols)| {
                debug!("cast: {} -> {:?}", dtype, cols);
                match dtype {
                    DType::Int => conv.to_int(&cols),
                    DType::Float => conv.to_float(&cols),
                    DType::Bool => conv.to_bool(&cols),
                    DType::Str => conv.to_str(&cols),
                    DType::Date => conv.to_date_iso(&cols),
                }
            })
    }

    /// Parses `(column, tag)` pairs and casts. Unknown tags fail before any
    /// value is converted, and the error hands the converter back unchanged.
    pub fn try_cast<I, K, V>(self, schema: I) -> Result<Self, CastError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        match Schema::parse(schema) {
            Ok(schema) => Ok(self.cast(&schema)),
            Err(source) => Err(CastError {
                converter: self,
                source,
            }),
        }
    }

    pub fn to_list(&self) -> &[Record] {
        &self.data.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.data.records
    }
}

impl TryFrom<Value> for DataConverter {
    type Error = PipelineError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Ok(Self {
            data: Dataset::try_from(value)?,
        })
    }
}

impl From<Vec<Record>> for DataConverter {
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

impl fmt::Display for DataConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataConverter(rows={}, columns={:?})", self.count(), self.columns())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!([
            {"age": "30", "price": "1,500.00", "active": "yes", "date": "15/01/2024"},
            {"age": "25", "price": "800.00",   "active": "no",  "date": "2024-02-20"},
        ])
    }

    fn converter() -> DataConverter {
        DataConverter::from_json(&sample()).unwrap()
    }

    #[test]
    fn test_invalid_raises() {
        let err = DataConverter::from_json(&json!("not a list")).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn test_to_int() {
        let result = converter().to_int(&["age"]).into_records();
        assert_eq!(result[0]["age"], json!(30));
        assert!(result[0]["age"].is_i64());
    }

    #[test]
    fn test_to_float() {
        let result = converter().to_float(&["price"]).into_records();
        assert_eq!(result[0]["price"].as_f64(), Some(1500.0));
        assert!(result[0]["price"].is_f64());
    }

    #[test]
    fn test_to_bool() {
        let result = converter().to_bool(&["active"]).into_records();
        assert_eq!(result[0]["active"], json!(true));
        assert_eq!(result[1]["active"], json!(false));
    }

    #[test]
    fn test_to_bool_unknown_becomes_null() {
        let rows = json!([{"flag": "maybe"}]);
        let result = DataConverter::from_json(&rows).unwrap().to_bool(&["flag"]).into_records();
        assert_eq!(result[0]["flag"], Value::Null);
    }

    #[test]
    fn test_to_str() {
        let rows = json!([{"n": 42, "s": "  x ", "z": null}]);
        let result = DataConverter::from_json(&rows)
            .unwrap()
            .to_str(&["n", "s", "z"])
            .into_records();
        assert_eq!(result[0]["n"], "42");
        assert_eq!(result[0]["s"], "x");
        assert_eq!(result[0]["z"], "");
    }

    #[test]
    fn test_to_date_iso() {
        let result = converter().to_date_iso(&["date"]).into_records();
        assert_eq!(result[0]["date"], "2024-01-15");
        assert_eq!(result[1]["date"], "2024-02-20");
    }

    #[test]
    fn test_absent_columns_are_not_added() {
        let result = converter().to_int(&["missing"]).into_records();
        assert!(!result[0].contains_key("missing"));
    }

    #[test]
    fn test_bad_values_degrade_to_null() {
        let rows = json!([{"age": "thirty"}, {"age": "31"}]);
        let result = DataConverter::from_json(&rows).unwrap().to_int(&["age"]).into_records();
        assert_eq!(result[0]["age"], Value::Null);
        assert_eq!(result[1]["age"], 31);
    }

    #[test]
    fn test_cast() {
        let result = converter()
            .try_cast([("age", "int"), ("price", "float"), ("active", "bool"), ("date", "date")])
            .unwrap()
            .into_records();
        assert!(result[0]["age"].is_i64());
        assert!(result[0]["price"].is_f64());
        assert!(result[0]["active"].is_boolean());
        assert_eq!(result[0]["date"], "2024-01-15");
    }

    #[test]
    fn test_cast_invalid_raises_before_mutation() {
        let err = converter()
            .try_cast([("age", "int"), ("price", "unknown")])
            .unwrap_err();
        assert_eq!(
            err.source,
            PipelineError::UnknownType {
                dtype: "unknown".to_string(),
                expected: vec!["int", "float", "bool", "str", "date"],
            }
        );
        assert_eq!(err.converter.to_list()[0]["age"], "30");
    }

    #[test]
    fn test_pipeline_continues_after_failed_cast() {
        let conv = match converter().try_cast([("price", "decimal")]) {
            Ok(_) => panic!("unknown tag must fail"),
            Err(err) => err.into_converter(),
        };
        let result = conv.to_int(&["age"]).into_records();
        assert_eq!(result[0]["age"], 30);
        assert_eq!(result[0]["price"], "1,500.00");
    }

    #[test]
    fn test_schema_parse_and_groups() {
        let schema = Schema::parse([("b", "str"), ("a", "int"), ("c", "int"), ("b", "date")]).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.get("b"), Some(DType::Date));
        assert_eq!(
            schema.groups(),
            vec![(DType::Int, vec!["a", "c"]), (DType::Date, vec!["b"])]
        );
    }

    #[test]
    fn test_dtype_from_str() {
        assert_eq!("float".parse::<DType>(), Ok(DType::Float));
        assert!("Int".parse::<DType>().is_err());
    }

    #[test]
    fn test_no_mutate() {
        let original = json!([{"age": "30"}]);
        let _ = DataConverter::from_json(&original).unwrap().to_int(&["age"]).into_records();
        assert_eq!(original[0]["age"], "30");
    }

    #[test]
    fn test_display() {
        assert!(converter().to_string().starts_with("DataConverter(rows=2"));
    }
}
