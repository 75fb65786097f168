//! Command-line interface definitions for the sitemap scraper.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Tuning options can also be provided via environment variables.

use crate::models::ScrapeConfig;
use crate::outputs::ExportFormat;
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the sitemap scraper.
///
/// # Examples
///
/// ```sh
/// # Scrape every page into ./sitemap_scraped_output.xlsx
/// sitemap_scraper https://example.com/sitemap.xml
///
/// # First 20 pages, 4 at a time, JSON into ./exports
/// sitemap_scraper https://example.com/sitemap.xml -l 20 -c 4 -f json -o ./exports
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// URL of the XML sitemap to scrape
    pub sitemap_url: String,

    /// Directory the export file is written to
    #[arg(short, long, env = "SCRAPER_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Maximum number of pages fetched at the same time
    #[arg(short, long, env = "SCRAPER_CONCURRENCY", default_value_t = 10)]
    pub concurrency: usize,

    /// Per-page fetch timeout in seconds
    #[arg(short, long, env = "SCRAPER_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Only scrape the first N URLs of the sitemap
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Export format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Xlsx)]
    pub format: ExportFormat,

    /// Keep up to N scraped pages in an in-memory LRU cache
    #[arg(long)]
    pub cache_capacity: Option<NonZeroUsize>,

    /// Print each row (truncated) after the export is written
    #[arg(long)]
    pub preview: bool,
}

impl Cli {
    pub fn scrape_config(&self) -> ScrapeConfig {
        ScrapeConfig {
            concurrency: self.concurrency.max(1),
            timeout: Duration::from_secs(self.timeout_secs),
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["sitemap_scraper", "https://example.com/sitemap.xml"]);

        assert_eq!(cli.sitemap_url, "https://example.com/sitemap.xml");
        assert_eq!(cli.format, ExportFormat::Xlsx);
        assert!(cli.cache_capacity.is_none());
        assert!(!cli.preview);
        assert_eq!(cli.scrape_config(), ScrapeConfig::default());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "sitemap_scraper",
            "https://example.com/sitemap.xml",
            "-o",
            "/tmp/exports",
            "-c",
            "0",
            "-t",
            "3",
            "-l",
            "20",
            "-f",
            "json",
        ]);

        assert_eq!(cli.output_dir, PathBuf::from("/tmp/exports"));
        assert_eq!(cli.format, ExportFormat::Json);
        let config = cli.scrape_config();
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.limit, Some(20));
    }

    #[test]
    fn test_cli_cache_capacity_must_be_positive() {
        let parsed = Cli::try_parse_from([
            "sitemap_scraper",
            "https://example.com/sitemap.xml",
            "--cache-capacity",
            "0",
        ]);
        assert!(parsed.is_err());

        let cli = Cli::parse_from([
            "sitemap_scraper",
            "https://example.com/sitemap.xml",
            "--cache-capacity",
            "64",
            "--preview",
        ]);
        assert_eq!(cli.cache_capacity, NonZeroUsize::new(64));
        assert!(cli.preview);
    }
}
