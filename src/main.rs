//! # Sitemap Scraper
//!
//! Fetches an XML sitemap, scrapes every listed page concurrently, extracts
//! the readable text (headings, paragraphs, list items) and exports one row
//! per page to a spreadsheet.
//!
//! ## Usage
//!
//! ```sh
//! sitemap_scraper https://example.com/sitemap.xml -o ./exports
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Indexing**: fetch the sitemap and collect its `<loc>` URLs
//! 2. **Fetching**: download every page on a bounded worker pool (10 at a time by default)
//! 3. **Extraction**: strip boilerplate and keep readable text per page
//! 4. **Output**: write the `URL` / `Content` table in input order
//!
//! A sitemap failure stops the run before any page is fetched. Page failures
//! only mark their own row with `Error: ...`.

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cache;
mod cli;
mod coordinator;
mod error;
mod extractor;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cache::PageCache;
use cli::Cli;
use coordinator::ScrapeCoordinator;
use outputs::write_export;
use scrapers::page::{HttpFetcher, build_client};
use scrapers::sitemap::SitemapParser;
use utils::{PREVIEW_CHARS, ensure_writable_dir, output_filename, preview};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("sitemap_scraper starting up");

    // Parse CLI
    let args = Cli::parse();
    let config = args.scrape_config();
    debug!(?args, ?config, "Parsed CLI arguments");

    // Early check: ensure the output dir is writable before any network work
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Index the sitemap ----
    let client = build_client(config.timeout)?;
    let urls = match SitemapParser::new(client.clone(), config.timeout)
        .parse(&args.sitemap_url)
        .await
    {
        Ok(urls) => urls,
        Err(e) => {
            error!(sitemap = %args.sitemap_url, error = %e, "Could not read sitemap; nothing was scraped");
            return Err(e.into());
        }
    };
    info!(count = urls.len(), sitemap = %args.sitemap_url, "Found URLs in sitemap");

    if urls.is_empty() {
        warn!("Sitemap lists no pages; no export written");
        return Ok(());
    }

    let found = urls.len();
    let urls = config.apply_limit(urls);
    if urls.len() < found {
        warn!(found, limit = urls.len(), "Scraping only the first URLs as requested by --limit");
    }

    // ---- Scrape pages ----
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; cancelling scrape");
            on_interrupt.cancel();
        }
    });

    let mut coordinator = ScrapeCoordinator::new(
        HttpFetcher::new(client, config.timeout),
        config.concurrency,
    );
    if let Some(capacity) = args.cache_capacity {
        coordinator = coordinator.with_cache(Arc::new(PageCache::new(capacity)));
    }

    let results = match coordinator
        .run(urls, &cancel, |p| {
            info!(completed = p.completed, total = p.total, url = %p.url, "Scraped page");
        })
        .await
    {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, "Scrape did not finish; no export written");
            return Err(e.into());
        }
    };

    // ---- Export ----
    let filename = output_filename(&args.sitemap_url, args.format.extension());
    let path = args.output_dir.join(&filename);
    let bytes = args.format.render(&results)?;
    if let Err(e) = write_export(&path, &bytes).await {
        error!(path = %path.display(), error = %e, "Failed writing export");
        return Err(e.into());
    }

    let failed = results.iter().filter(|r| r.is_error()).count();
    info!(
        path = %path.display(),
        rows = results.len(),
        failed,
        format = ?args.format,
        "Scraping complete"
    );

    if args.preview {
        for row in &results {
            println!("{}\n{}\n", row.url, preview(&row.content, PREVIEW_CHARS));
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
