use ::scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::error::{ParserError, PipelineError};
use crate::transform::{Dataset, Record};

fn selector(css: &str) -> Result<Selector, ParserError> {
    Selector::parse(css).map_err(|e| ParserError::Selector(format!("{css}: {e:?}")))
}

/// Text of an element with each text node trimmed and blank nodes dropped.
fn element_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).filter(|t| !t.is_empty()).collect()
}

/// CSS-selector queries over an HTML document.
pub struct HtmlParser {
    document: Html,
}

impl HtmlParser {
    pub fn new(html: &str) -> Result<Self, ParserError> {
        if html.trim().is_empty() {
            return Err(ParserError::EmptyDocument);
        }
        Ok(Self {
            document: Html::parse_document(html),
        })
    }

    pub fn find_text(&self, css: &str) -> Result<Option<String>, ParserError> {
        let sel = selector(css)?;
        Ok(self.document.select(&sel).next().map(element_text))
    }

    pub fn find_all_text(&self, css: &str) -> Result<Vec<String>, ParserError> {
        let sel = selector(css)?;
        Ok(self.document.select(&sel).map(element_text).collect())
    }

    pub fn find_attr(&self, css: &str, attr: &str) -> Result<Option<String>, ParserError> {
        let sel = selector(css)?;
        Ok(self
            .document
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr(attr))
            .map(str::to_string))
    }

    /// Non-empty values of `attr` across all matches.
    pub fn find_all_attr(&self, css: &str, attr: &str) -> Result<Vec<String>, ParserError> {
        let sel = selector(css)?;
        Ok(self
            .document
            .select(&sel)
            .filter_map(|el| el.value().attr(attr))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Reads the first table matching `css` into records keyed by its `th` cells.
    /// Rows without `td` cells (such as the header row) are skipped.
    pub fn find_table(&self, css: &str) -> Result<Vec<Record>, ParserError> {
        let table_sel = selector(css)?;
        let th = selector("th")?;
        let tr = selector("tr")?;
        let td = selector("td")?;

        let Some(table) = self.document.select(&table_sel).next() else {
            return Ok(Vec::new());
        };
        let headers: Vec<String> = table.select(&th).map(element_text).collect();
        if headers.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<Record> = table
            .select(&tr)
            .filter_map(|row| {
                let cells: Vec<String> = row.select(&td).map(element_text).collect();
                if cells.is_empty() {
                    return None;
                }
                Some(
                    headers
                        .iter()
                        .cloned()
                        .zip(cells.into_iter().map(Value::String))
                        .collect(),
                )
            })
            .collect();
        debug!("find_table({}): {} rows x {} columns", css, rows.len(), headers.len());
        Ok(rows)
    }
}

impl fmt::Display for HtmlParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self
            .find_text("title")
            .ok()
            .flatten()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "untitled".to_string());
        write!(f, "HtmlParser(title={title:?})")
    }
}

/// One step of a path into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKey {
    Key(String),
    Index(usize),
}

impl From<&str> for PathKey {
    fn from(key: &str) -> Self {
        PathKey::Key(key.to_string())
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        PathKey::Index(index)
    }
}

/// Field lookup and flattening over decoded JSON.
pub struct JsonParser {
    data: Value,
}

impl JsonParser {
    pub fn new(data: Value) -> Result<Self, ParserError> {
        if data.is_null() {
            return Err(ParserError::NullData);
        }
        Ok(Self { data })
    }

    pub fn from_slice(bytes: &[u8]) -> crate::error::Result<Self> {
        let data: Value = serde_json::from_slice(bytes)?;
        Ok(Self::new(data)?)
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Walks `path`; a key on an array or an index on an object is a miss.
    pub fn get<I, K>(&self, path: I) -> Option<&Value>
    where
        I: IntoIterator<Item = K>,
        K: Into<PathKey>,
    {
        path.into_iter()
            .try_fold(&self.data, |current, key| {
                let key: PathKey = key.into();
                match (key, current) {
                    (PathKey::Key(k), Value::Object(map)) => map.get(&k),
                    (PathKey::Index(i), Value::Array(items)) => items.get(i),
                    _ => None,
                }
            })
    }

    pub fn get_or<I, K>(&self, path: I, default: Value) -> Value
    where
        I: IntoIterator<Item = K>,
        K: Into<PathKey>,
    {
        self.get(path).cloned().unwrap_or(default)
    }

    /// Dotted lookup such as `data.items.0.name`. Numeric segments index arrays.
    /// An empty path is the document root.
    pub fn get_dotted(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(&self.data);
        }
        path.split('.').try_fold(&self.data, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Leaf values keyed by their joined path, in document order.
    pub fn flatten(&self, sep: &str) -> Record {
        let mut out = Record::new();
        flatten_into(&self.data, String::new(), sep, &mut out);
        out
    }

    pub fn keys(&self) -> Vec<String> {
        self.data
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// The array of objects at the dotted `path`, as records.
    pub fn records(&self, path: &str) -> Result<Vec<Record>, PipelineError> {
        let value = self
            .get_dotted(path)
            .ok_or_else(|| PipelineError::Validation(format!("No value at path {path:?}")))?;
        Ok(Dataset::try_from(value.clone())?.records)
    }
}

fn flatten_into(value: &Value, prefix: String, sep: &str, out: &mut Record) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}{sep}{key}")
        }
    };
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                flatten_into(v, join(k), sep, out);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten_into(v, join(&i.to_string()), sep, out);
            }
        }
        leaf => {
            out.insert(prefix, leaf.clone());
        }
    }
}

impl fmt::Display for JsonParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.data {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        };
        write!(f, "JsonParser(type={kind})")
    }
}
