//! Sitemap indexing.
//!
//! Fetches an XML sitemap and returns the text of every `<loc>` element in
//! document order. Elements are matched by local name, so namespaced
//! sitemaps (`<sm:loc>`) and documents without the sitemap namespace both
//! work. Duplicates are kept: each one becomes its own job downstream.
//!
//! Sitemap index files are not followed; their `<loc>` entries are returned
//! like any other URL.

use crate::error::SitemapError;
use crate::scrapers::page::decode_body;
use crate::utils::truncate_for_log;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Fetches and parses sitemaps with a shared HTTP client.
///
/// The whole sitemap request, body included, is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct SitemapParser {
    client: Client,
    timeout: Duration,
}

impl SitemapParser {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetch `sitemap_url` and return its page URLs.
    ///
    /// # Errors
    ///
    /// - [`SitemapError::Status`] for a non-success response
    /// - [`SitemapError::Transport`] when no response was received in time
    /// - [`SitemapError::Parse`] when the body is not well-formed XML
    #[instrument(level = "info", skip(self))]
    pub async fn parse(&self, sitemap_url: &str) -> Result<Vec<String>, SitemapError> {
        let response = self
            .client
            .get(sitemap_url)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Sitemap request failed");
            return Err(SitemapError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?;
        let xml = decode_body(&bytes, content_type.as_deref());

        let urls = parse_locations(&xml).inspect_err(|e| {
            warn!(error = %e, body_preview = %truncate_for_log(&xml, 200), "Sitemap is not valid XML");
        })?;

        info!(count = urls.len(), "Indexed sitemap URLs");
        debug!(urls = ?urls, "Sitemap URLs");
        Ok(urls)
    }
}

/// Collect the trimmed text of every `<loc>` element, in document order.
///
/// Empty `<loc>` elements are skipped. Text, CDATA and entity references
/// inside a `<loc>` are concatenated before trimming.
pub fn parse_locations(xml: &str) -> Result<Vec<String>, SitemapError> {
    let mut reader = Reader::from_str(xml);
    let mut urls = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"loc" => {
                current = Some(String::new());
            }
            Ok(Event::Text(e)) => {
                if let Some(buf) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| SitemapError::Parse(err.to_string()))?;
                    buf.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"loc" => {
                if let Some(buf) = current.take() {
                    let url = buf.trim();
                    if !url.is_empty() {
                        urls.push(url.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(SitemapError::Parse(format!(
                    "{e} at byte {}",
                    reader.error_position()
                )));
            }
        }
    }

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::page::build_client;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>
      https://example.com/
    </loc>
    <lastmod>2024-01-01</lastmod>
  </url>
  <url><loc>https://example.com/about</loc></url>
  <url><loc>https://example.com/blog?page=2&amp;sort=new</loc></url>
  <url><loc>https://example.com/about</loc></url>
</urlset>"#;

    fn parser() -> SitemapParser {
        let timeout = Duration::from_secs(5);
        SitemapParser::new(build_client(timeout).unwrap(), timeout)
    }

    #[test]
    fn test_parse_locations_in_order_with_duplicates() {
        let urls = parse_locations(SITEMAP).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://example.com/",
                "https://example.com/about",
                "https://example.com/blog?page=2&sort=new",
                "https://example.com/about",
            ]
        );
    }

    #[test]
    fn test_parse_locations_matches_local_name() {
        let xml = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
            <sm:url><sm:loc>https://a.test/1</sm:loc></sm:url>
            <other><deep><loc><![CDATA[https://a.test/2]]></loc></deep></other>
        </sm:urlset>"#;
        assert_eq!(
            parse_locations(xml).unwrap(),
            vec!["https://a.test/1", "https://a.test/2"]
        );
    }

    #[test]
    fn test_parse_locations_without_loc_is_empty() {
        assert!(parse_locations("<urlset></urlset>").unwrap().is_empty());
        assert!(parse_locations("<urlset><url><loc>  </loc></url></urlset>").unwrap().is_empty());
    }

    #[test]
    fn test_parse_locations_rejects_mismatched_tags() {
        let err = parse_locations("<urlset><url><loc>https://a.test/</url></urlset>").unwrap_err();
        assert!(matches!(err, SitemapError::Parse(_)));
    }

    #[tokio::test]
    async fn test_parse_fetches_sitemap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(SITEMAP, "application/xml"))
            .mount(&server)
            .await;

        let urls = parser()
            .parse(&format!("{}/sitemap.xml", server.uri()))
            .await
            .unwrap();
        assert_eq!(urls.len(), 4);
        assert_eq!(urls[0], "https://example.com/");
    }

    #[tokio::test]
    async fn test_parse_non_success_status_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = parser()
            .parse(&format!("{}/sitemap.xml", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, SitemapError::Status(404)));
    }

    #[tokio::test]
    async fn test_parse_slow_sitemap_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(SITEMAP, "application/xml")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let timeout = Duration::from_millis(200);
        let parser = SitemapParser::new(build_client(timeout).unwrap(), timeout);
        let started = std::time::Instant::now();
        let err = parser
            .parse(&format!("{}/sitemap.xml", server.uri()))
            .await
            .unwrap_err();

        assert!(
            matches!(&err, SitemapError::Transport(e) if e.is_timeout()),
            "{err:?}"
        );
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
