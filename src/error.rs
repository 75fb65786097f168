//! Error types for every stage of the pipeline.
//!
//! Only [`SitemapError`] and [`ScrapeError`] abort a run. A [`FetchError`]
//! never leaves the worker that produced it: it is rendered into the
//! `Content` column of that page's row as `"Error: <description>"`.

use std::time::Duration;
use thiserror::Error;

/// Failure to obtain the list of page URLs.
#[derive(Debug, Error)]
pub enum SitemapError {
    /// The sitemap server answered with a non-success status.
    #[error("failed to fetch sitemap: HTTP status {0}")]
    Status(u16),

    /// The request never produced a response (DNS, connect, TLS, timeout...).
    #[error("failed to fetch sitemap: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body was not well-formed XML.
    #[error("failed to parse sitemap: {0}")]
    Parse(String),
}

/// Failure to retrieve a single page. Local to one job.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),
}

/// Run-level failure of the coordinator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScrapeError {
    #[error("scrape run was cancelled before all pages completed")]
    Cancelled,
}

/// Failure to serialize or write the export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("spreadsheet export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not write export file: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_descriptions() {
        assert_eq!(
            FetchError::Timeout(Duration::from_secs(10)).to_string(),
            "request timed out after 10s"
        );
        assert_eq!(FetchError::HttpStatus(500).to_string(), "HTTP status 500");
        assert_eq!(
            FetchError::Network("connection refused".into()).to_string(),
            "network error: connection refused"
        );
    }

    #[test]
    fn test_sitemap_status_error_carries_code() {
        assert_eq!(
            SitemapError::Status(404).to_string(),
            "failed to fetch sitemap: HTTP status 404"
        );
    }
}
