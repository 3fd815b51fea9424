//! Scraping toolkit: an HTTP fetch wrapper, HTML/JSON extraction helpers and
//! a record cleaning/conversion pipeline.

pub mod config;
pub mod error;
pub mod job;
pub mod logging;
pub mod scraper;
pub mod transform;
pub mod utils;

pub use error::{CastError, ParserError, PipelineError, Result, ScraperError};
pub use crate::scraper::{HtmlParser, HttpClient, JsonParser};
pub use transform::{DType, DataCleaner, DataConverter, Record, Schema, Summary};
