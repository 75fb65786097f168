//! Data models shared across the pipeline.
//!
//! - [`PageResult`]: one exported row, `{ URL, Content }`
//! - [`ScrapeJob`]: an in-flight URL bound to its position in the input
//! - [`Progress`]: the event handed to the caller after each completed job
//! - [`ScrapeConfig`]: pipeline settings resolved from the command line
//!
//! Serialized field names are `URL` and `Content` so the JSON export carries
//! the same column headers as the spreadsheet.

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prefix marking a row whose page could not be scraped.
pub const ERROR_PREFIX: &str = "Error: ";

/// The scraped outcome for one sitemap entry.
///
/// `content` is either the extracted readable text or a failure description
/// starting with [`ERROR_PREFIX`]. Which one it is comes from `failed`, not
/// from the text: a page may well begin with the words "Error: ".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageResult {
    /// The page URL exactly as listed in the sitemap.
    #[serde(rename = "URL")]
    pub url: String,
    /// Extracted text or an `"Error: ..."` descriptor.
    #[serde(rename = "Content")]
    pub content: String,
    /// Set when the page could not be scraped. Not part of the export.
    #[serde(skip)]
    failed: bool,
}

impl PageResult {
    pub fn success(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
            failed: false,
        }
    }

    /// Build an error row from any displayable failure.
    pub fn failure(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            url: url.into(),
            content: format!("{ERROR_PREFIX}{reason}"),
            failed: true,
        }
    }

    pub fn from_fetch_error(url: impl Into<String>, err: &FetchError) -> Self {
        Self::failure(url, err)
    }

    pub fn is_error(&self) -> bool {
        self.failed
    }
}

/// A URL waiting for, or being processed by, a worker.
///
/// `index` is the URL's position in the sitemap and is the slot its result
/// is written to, whatever order jobs complete in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeJob {
    pub index: usize,
    pub url: String,
}

/// Progress event emitted once per completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Jobs completed so far, including this one. Strictly increasing.
    pub completed: usize,
    /// Total number of jobs in the run.
    pub total: usize,
    /// URL of the job that just completed.
    pub url: String,
}

/// Settings for one scrape run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeConfig {
    /// Maximum number of pages in flight at once.
    pub concurrency: usize,
    /// Per-page fetch timeout.
    pub timeout: Duration,
    /// Optional caller-chosen cap on the number of URLs scraped.
    pub limit: Option<usize>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout: Duration::from_secs(10),
            limit: None,
        }
    }
}

impl ScrapeConfig {
    /// Apply the explicit cap, if any. Never drops URLs on its own.
    pub fn apply_limit(&self, mut urls: Vec<String>) -> Vec<String> {
        if let Some(limit) = self.limit {
            urls.truncate(limit);
        }
        urls
    }
}
