use thiserror::Error;

use crate::transform::DataConverter;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} returned by {url}")]
    Status { status: u16, url: String },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ScraperError {
    /// Whether a retry could plausibly succeed: transport failures, 5xx and 429.
    pub fn is_transient(&self) -> bool {
        match self {
            ScraperError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ScraperError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Failures raised by the HTML/JSON extraction helpers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("HTML content cannot be empty")]
    EmptyDocument,

    #[error("JSON data cannot be null")]
    NullData,

    #[error("Invalid CSS selector: {0}")]
    Selector(String),
}

/// The only two ways a record pipeline can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown type: {dtype:?}. Use: {expected:?}")]
    UnknownType {
        dtype: String,
        expected: Vec<&'static str>,
    },
}

/// A rejected [`DataConverter::try_cast`], carrying the converter back untouched.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct CastError {
    pub converter: DataConverter,
    pub source: PipelineError,
}

impl CastError {
    pub fn into_converter(self) -> DataConverter {
        self.converter
    }
}

impl From<CastError> for PipelineError {
    fn from(err: CastError) -> Self {
        err.source
    }
}

impl From<CastError> for ScraperError {
    fn from(err: CastError) -> Self {
        ScraperError::Pipeline(err.source)
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
