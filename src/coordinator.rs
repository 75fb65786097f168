//! Concurrent fetch + extract over the whole URL list.
//!
//! # Architecture
//!
//! ```text
//!             job queue                         completions
//! urls ──▶ [ScrapeJob; n] ──▶ worker 0..k ──▶ mpsc ──▶ aggregator ──▶ Vec<PageResult>
//!                               │                          │
//!                          PageFetcher               progress callback
//!                          + extract()
//! ```
//!
//! - Every URL becomes one [`ScrapeJob`] carrying its input position.
//! - `k = min(concurrency, n)` worker tasks pull jobs from a shared queue, so
//!   at most `concurrency` pages are in flight. The rest wait in the queue.
//! - Workers never share mutable state. Each finished job is sent to the
//!   aggregator (the `run` future itself), which owns the result slots and the
//!   completed-count and invokes the progress callback.
//! - Results are written into the slot of their job's index, so the output
//!   order is the input order whatever order pages complete in.
//! - A failed fetch becomes an `"Error: ..."` row; it never stops other jobs.
//! - Cancelling the token stops workers from taking new jobs, aborts the ones
//!   in flight, and makes `run` return [`ScrapeError::Cancelled`] with no
//!   partial results.

use crate::cache::PageCache;
use crate::error::ScrapeError;
use crate::extractor::extract;
use crate::models::{PageResult, Progress, ScrapeJob};
use crate::scrapers::page::PageFetcher;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, mpsc};
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// A finished job on its way to the aggregator.
#[derive(Debug)]
struct Completion {
    index: usize,
    result: PageResult,
}

type JobQueue = Arc<Mutex<mpsc::UnboundedReceiver<ScrapeJob>>>;

/// Runs scrape jobs on a bounded pool of worker tasks.
pub struct ScrapeCoordinator<F> {
    fetcher: Arc<F>,
    concurrency: usize,
    cache: Option<Arc<PageCache>>,
}

impl<F> ScrapeCoordinator<F>
where
    F: PageFetcher + 'static,
{
    /// `concurrency` below 1 is treated as 1.
    pub fn new(fetcher: F, concurrency: usize) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            concurrency: concurrency.max(1),
            cache: None,
        }
    }

    /// Consult and fill `cache` for every job.
    pub fn with_cache(mut self, cache: Arc<PageCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Scrape every URL and return one [`PageResult`] per URL, in input order.
    ///
    /// `progress` is called once per completed job with a strictly increasing
    /// `completed` count.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::Cancelled`] if `cancel` fires before every job is done.
    #[instrument(level = "info", skip_all, fields(total = urls.len(), concurrency = self.concurrency))]
    pub async fn run<P>(
        &self,
        urls: Vec<String>,
        cancel: &CancellationToken,
        mut progress: P,
    ) -> Result<Vec<PageResult>, ScrapeError>
    where
        P: FnMut(Progress),
    {
        let t0 = Instant::now();
        let total = urls.len();
        if cancel.is_cancelled() {
            return Err(ScrapeError::Cancelled);
        }
        if total == 0 {
            return Ok(Vec::new());
        }

        let (job_tx, job_rx) = mpsc::unbounded_channel();
        for (index, url) in urls.iter().enumerate() {
            // The receiver is alive until the workers exit, so this cannot fail.
            let _ = job_tx.send(ScrapeJob {
                index,
                url: url.clone(),
            });
        }
        drop(job_tx);
        let jobs: JobQueue = Arc::new(Mutex::new(job_rx));

        let workers = self.concurrency.min(total);
        let (done_tx, mut done_rx) = mpsc::channel::<Completion>(workers);
        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            pool.spawn(worker(
                worker_id,
                Arc::clone(&self.fetcher),
                self.cache.clone(),
                Arc::clone(&jobs),
                done_tx.clone(),
                cancel.clone(),
            ));
        }
        drop(done_tx);
        info!(total, workers, "Started scrape workers");

        let mut slots: Vec<Option<PageResult>> = vec![None; total];
        let mut completed = 0usize;
        loop {
            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(completed, total, "Scrape cancelled; abandoning in-flight pages");
                    pool.abort_all();
                    return Err(ScrapeError::Cancelled);
                }
                message = done_rx.recv() => message,
            };
            let Some(Completion { index, result }) = message else {
                break;
            };

            completed += 1;
            debug!(completed, total, url = %result.url, "Page complete");
            progress(Progress {
                completed,
                total,
                url: result.url.clone(),
            });
            slots[index] = Some(result);
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Scrape worker ended abnormally");
            }
        }

        // A worker that panicked mid-job leaves its slot empty.
        let results: Vec<PageResult> = slots
            .into_iter()
            .zip(urls)
            .map(|(slot, url)| {
                slot.unwrap_or_else(|| {
                    completed += 1;
                    progress(Progress {
                        completed,
                        total,
                        url: url.clone(),
                    });
                    PageResult::failure(url, "worker stopped before this page was scraped")
                })
            })
            .collect();

        let failed = results.iter().filter(|r| r.is_error()).count();
        info!(
            total,
            succeeded = total - failed,
            failed,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Completed scrape run"
        );
        if let Some(cache) = &self.cache {
            debug!(cached_pages = cache.len().await, "Page cache size after run");
        }
        Ok(results)
    }
}

async fn worker<F: PageFetcher>(
    worker_id: usize,
    fetcher: Arc<F>,
    cache: Option<Arc<PageCache>>,
    jobs: JobQueue,
    done: mpsc::Sender<Completion>,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let Some(job) = jobs.lock().await.recv().await else {
            break;
        };

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = scrape_page(fetcher.as_ref(), cache.as_deref(), &job.url) => result,
        };
        if done
            .send(Completion {
                index: job.index,
                result,
            })
            .await
            .is_err()
        {
            break;
        }
    }
    debug!(worker_id, "Scrape worker finished");
}

/// Fetch and extract one page. Never fails: problems become an error row.
async fn scrape_page<F: PageFetcher>(
    fetcher: &F,
    cache: Option<&PageCache>,
    url: &str,
) -> PageResult {
    if let Some(cache) = cache {
        if let Some(hit) = cache.get(url).await {
            debug!(%url, "Page served from cache");
            return hit;
        }
    }

    let result = match fetcher.fetch(url).await {
        Ok(html) => match task::spawn_blocking(move || extract(&html)).await {
            Ok(content) => PageResult::success(url, content),
            Err(e) => {
                error!(%url, error = %e, "Content extraction task failed");
                PageResult::failure(url, format!("content extraction failed: {e}"))
            }
        },
        Err(e) => {
            warn!(%url, error = %e, "Page fetch failed");
            PageResult::from_fetch_error(url, &e)
        }
    };

    if let Some(cache) = cache {
        cache.insert(&result).await;
    }
    result
}
