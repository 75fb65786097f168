//! Bounded in-memory cache of scraped pages.
//!
//! The cache is handed to the coordinator explicitly; nothing is memoized
//! behind the caller's back. Entries are evicted least-recently-used once
//! `capacity` is reached. Only successful results are stored, so a page that
//! failed is fetched again the next time it is requested.

use crate::models::PageResult;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use tracing::debug;

/// URL-keyed LRU cache of [`PageResult`]s, safe to share between workers.
#[derive(Debug)]
pub struct PageCache {
    entries: Mutex<LruCache<String, PageResult>>,
}

impl PageCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up a URL, marking it as recently used.
    pub async fn get(&self, url: &str) -> Option<PageResult> {
        self.entries.lock().await.get(url).cloned()
    }

    /// Store a result. Error rows are ignored.
    pub async fn insert(&self, result: &PageResult) {
        if result.is_error() {
            return;
        }
        let mut entries = self.entries.lock().await;
        if let Some((evicted, _)) = entries.push(result.url.clone(), result.clone()) {
            if evicted != result.url {
                debug!(url = %evicted, "Evicted page from cache");
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
