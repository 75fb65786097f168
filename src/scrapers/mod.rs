//! Network phases of a scrape.
//!
//! A run follows a two-phase pattern:
//!
//! 1. **Indexing** ([`sitemap`]): fetch the sitemap and list its page URLs
//! 2. **Fetching** ([`page`]): download each page's markup
//!
//! Both phases share one `reqwest::Client` built by [`page::build_client`],
//! and both decode bodies with [`page::decode_body`].

pub mod page;
pub mod sitemap;
