use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::config::{JobConfig, SourceFormat};
use crate::error::{Result, ScraperError};
use crate::scraper::{HtmlParser, JsonParser};
use crate::transform::{DataCleaner, DataConverter, Record, Summary};

/// Outcome of a job run.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub summary: Summary,
    pub records: Vec<Record>,
}

/// Loads records from the configured source, runs the cleaning stages and the
/// cast, and optionally writes the result as JSON.
pub struct Job {
    config: JobConfig,
}

impl Job {
    pub fn new(config: JobConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<JobResult> {
        info!("📡 Loading records...");
        let records = self.load_records().await?;
        info!("✅ Loaded {} records", records.len());

        info!("🔧 Cleaning records...");
        let result = self.process(records)?;
        info!(
            "✅ Cleaned {} -> {} records ({} dropped)",
            result.summary.original_count, result.summary.cleaned_count, result.summary.dropped
        );

        if let Some(path) = &self.config.output.path {
            write_json(path, &result.records, self.config.output.pretty)?;
            info!("💾 Saved records to {}", path.display());
        }
        Ok(result)
    }

    async fn load_records(&self) -> Result<Vec<Record>> {
        let source = &self.config.source;
        if let Some(path) = &source.file {
            debug!("Reading records from {}", path.display());
            let bytes = fs::read(path)?;
            return Ok(JsonParser::from_slice(&bytes)?.records(&source.json_path)?);
        }
        let url = source
            .url
            .as_deref()
            .ok_or_else(|| ScraperError::Config("source must set 'file' or 'url'".to_string()))?;
        let client = self.config.http.client()?;
        let body = client.get_text(url, &[]).await?;
        match source.format {
            SourceFormat::Json => Ok(JsonParser::from_slice(body.as_bytes())?.records(&source.json_path)?),
            SourceFormat::Html => Ok(HtmlParser::new(&body)?.find_table(&source.table_selector)?),
        }
    }

    /// Applies the configured stages in the order strip, rename, drop_nulls,
    /// fill_null, drop_duplicates, select, then casts.
    pub fn process(&self, records: Vec<Record>) -> Result<JobResult> {
        let clean = &self.config.clean;
        let mut cleaner = DataCleaner::from(records);

        if let Some(cols) = clean.strip_whitespace.as_ref().and_then(|c| c.selected()) {
            cleaner = cleaner.strip_whitespace(cols.as_deref());
        }
        if !clean.rename.is_empty() {
            cleaner = cleaner.rename_columns(&clean.rename);
        }
        if let Some(cols) = clean.drop_nulls.as_ref().and_then(|c| c.selected()) {
            cleaner = cleaner.drop_nulls(cols.as_deref());
        }
        if let Some(fill) = &clean.fill_null {
            let cols: Option<Vec<&str>> = fill
                .columns
                .as_ref()
                .map(|c| c.iter().map(String::as_str).collect());
            cleaner = cleaner.fill_null(fill.value.clone(), cols.as_deref());
        }
        if let Some(cols) = clean.drop_duplicates.as_ref().and_then(|c| c.selected()) {
            cleaner = cleaner.drop_duplicates(cols.as_deref());
        }
        if let Some(select) = &clean.select {
            let cols: Vec<&str> = select.iter().map(String::as_str).collect();
            cleaner = cleaner.select_columns(&cols);
        }

        let summary = cleaner.summary();
        let schema = self.config.schema()?;
        let records = DataConverter::from(cleaner.into_records())
            .cast(&schema)
            .into_records();
        Ok(JobResult { summary, records })
    }
}

/// Writes records as a JSON array, creating parent directories as needed.
pub fn write_json(path: &Path, records: &[Record], pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let content = if pretty {
        serde_json::to_string_pretty(records)?
    } else {
        serde_json::to_string(records)?
    };
    fs::write(path, content)?;
    Ok(())
}
