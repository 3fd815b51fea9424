use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ScraperError};
use crate::scraper::HttpClient;
use crate::transform::Schema;
use crate::utils::retry::RetryPolicy;

/// A cleaning job: where the records come from, how to clean and cast them,
/// and where to write the result.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub clean: CleanConfig,
    /// Column -> type tag (`int`, `float`, `bool`, `str`, `date`).
    #[serde(default)]
    pub cast: BTreeMap<String, String>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    #[default]
    Json,
    Html,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Local JSON file holding the records.
    pub file: Option<PathBuf>,
    /// Remote document, fetched with the `[http]` settings.
    pub url: Option<String>,
    #[serde(default)]
    pub format: SourceFormat,
    /// Dotted path to the record array inside a JSON document; empty means the root.
    #[serde(default)]
    pub json_path: String,
    #[serde(default = "default_table_selector")]
    pub table_selector: String,
}

fn default_table_selector() -> String {
    "table".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            headers: BTreeMap::new(),
        }
    }
}

impl HttpConfig {
    pub fn client(&self) -> Result<HttpClient> {
        let mut client = HttpClient::builder()
            .base_url(self.base_url.as_str())
            .timeout(Duration::from_secs(self.timeout_secs))
            .retry_policy(RetryPolicy::new(
                self.max_retries,
                Duration::from_millis(self.retry_delay_ms),
                2.0,
            ))
            .build()?;
        for (name, value) in &self.headers {
            client.set_header(name, value)?;
        }
        Ok(client)
    }
}

/// `true` targets every column, `false` disables the stage, a list targets those columns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Columns {
    All(bool),
    Only(Vec<String>),
}

impl Columns {
    /// `None` when the stage is off; `Some(None)` for every column.
    pub fn selected(&self) -> Option<Option<Vec<&str>>> {
        match self {
            Columns::All(true) => Some(None),
            Columns::All(false) => None,
            Columns::Only(cols) => Some(Some(cols.iter().map(String::as_str).collect())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FillNullConfig {
    pub value: serde_json::Value,
    pub columns: Option<Vec<String>>,
}

/// Cleaning stages. Column names after `rename` refer to the new names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CleanConfig {
    pub strip_whitespace: Option<Columns>,
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
    pub drop_nulls: Option<Columns>,
    pub fill_null: Option<FillNullConfig>,
    pub drop_duplicates: Option<Columns>,
    pub select: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_pretty() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            pretty: default_pretty(),
        }
    }
}

impl JobConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: JobConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        match (&self.source.file, &self.source.url) {
            (Some(_), Some(_)) => {
                return Err(ScraperError::Config(
                    "source must set either 'file' or 'url', not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(ScraperError::Config(
                    "source must set 'file' or 'url'".to_string(),
                ))
            }
            _ => {}
        }
        if self.source.file.is_some() && self.source.format == SourceFormat::Html {
            return Err(ScraperError::Config(
                "file sources must be JSON".to_string(),
            ));
        }
        self.schema()?;
        Ok(())
    }

    pub fn schema(&self) -> Result<Schema> {
        Schema::parse(&self.cast).map_err(|e| ScraperError::Config(format!("[cast] {e}")))
    }
}
