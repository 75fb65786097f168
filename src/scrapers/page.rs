//! Page fetching with a per-request timeout and charset-aware decoding.
//!
//! # Architecture
//!
//! - [`PageFetcher`]: the seam the coordinator depends on; one URL in, page
//!   text or a [`FetchError`] out
//! - [`HttpFetcher`]: the `reqwest` implementation used at runtime
//! - [`decode_body`]: bytes to text using the best charset signal available
//!
//! # Charset resolution
//!
//! 1. byte-order mark, which overrides every label
//! 2. `charset=` parameter of the `Content-Type` header
//! 3. `<meta charset>`, `<meta http-equiv ... charset=...>` or
//!    `<?xml encoding="..."?>` within the first 1024 bytes
//! 4. UTF-8
//!
//! Undecodable bytes become U+FFFD; decoding never fails.

use crate::error::FetchError;
use crate::utils::error_chain;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// How far into a body to look for an in-document charset declaration.
const SNIFF_WINDOW: usize = 1024;

static DECLARED_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i-u)(?:<meta[^>]*charset|<\?xml[^>]*encoding)\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .unwrap()
});

/// Retrieves the text of one page.
///
/// Implementations must be shareable across worker tasks and must turn every
/// transport problem into a [`FetchError`] instead of panicking.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Build the HTTP client shared by the sitemap parser and the page fetcher.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(timeout)
        .build()
}

/// [`PageFetcher`] backed by a `reqwest` client.
///
/// Any non-2xx status is a [`FetchError::HttpStatus`]. The timeout covers the
/// whole exchange, body included.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(error_chain(&err))
        }
    }
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Page returned non-success status");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;

        debug!(
            bytes = bytes.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(decode_body(&bytes, content_type.as_deref()))
    }
}

/// Decode a response body to text. See the module docs for the signal order.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .or_else(|| sniff_declared_charset(bytes))
        .unwrap_or(UTF_8);

    // `decode` gives a BOM priority over the label and replaces bad sequences.
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(encoding = used.name(), "Replaced malformed byte sequences while decoding");
    }
    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| Encoding::for_label(value.trim().trim_matches('"').as_bytes()))
}

fn sniff_declared_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(SNIFF_WINDOW)];
    DECLARED_CHARSET
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
}
