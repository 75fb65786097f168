//! Export of scraped results.
//!
//! Both exports describe the same two-column table, `URL` and `Content`,
//! with one row per [`PageResult`] in the order supplied:
//!
//! - [`xlsx`]: spreadsheet workbook, the default export
//! - [`json`]: array of `{"URL": ..., "Content": ...}` objects
//!
//! Serializers are pure and return bytes; [`write_export`] puts them on disk.

use crate::error::ExportError;
use crate::models::PageResult;
use clap::ValueEnum;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub mod json;
pub mod xlsx;

/// Column headers, in order.
pub const COLUMNS: [&str; 2] = ["URL", "Content"];

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Json => "json",
        }
    }

    /// Serialize `results` in this format.
    pub fn render(self, results: &[PageResult]) -> Result<Vec<u8>, ExportError> {
        match self {
            Self::Xlsx => xlsx::write_workbook(results),
            Self::Json => json::write_json(results),
        }
    }
}

/// The tabular view of a result set: header row first, then one row per result.
pub fn table_rows(results: &[PageResult]) -> Vec<[&str; 2]> {
    std::iter::once(COLUMNS)
        .chain(results.iter().map(|r| [r.url.as_str(), r.content.as_str()]))
        .collect()
}

/// Write an already-rendered export to `path`.
#[instrument(level = "info", skip(bytes), fields(bytes = bytes.len()))]
pub async fn write_export(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    fs::write(path, bytes).await?;
    info!(path = %path.display(), "Wrote export");
    Ok(())
}
