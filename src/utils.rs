//! Utility functions for naming, string truncation, error rendering and file
//! system checks.
//!
//! - Export filename derivation from the sitemap URL
//! - Char-boundary-safe truncation for logs and the results preview
//! - Flattening an error and its sources into one line
//! - Output directory validation

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Suffix appended to the sitemap's file stem to name the export.
pub const OUTPUT_SUFFIX: &str = "_scraped_output";

/// Stem used when the sitemap URL has no usable basename.
pub const FALLBACK_STEM: &str = "sitemap";

/// Number of characters of each row shown by the results preview.
pub const PREVIEW_CHARS: usize = 1500;

/// Derive the export file name from the sitemap URL.
///
/// The last path segment is percent-decoded and its extension stripped, then
/// [`OUTPUT_SUFFIX`] and `extension` are appended. URLs without a basename
/// fall back to [`FALLBACK_STEM`].
///
/// # Examples
///
/// ```ignore
/// assert_eq!(output_filename("https://a.test/sitemap.xml", "xlsx"), "sitemap_scraped_output.xlsx");
/// assert_eq!(output_filename("https://a.test/", "xlsx"), "sitemap_scraped_output.xlsx");
/// ```
pub fn output_filename(sitemap_url: &str, extension: &str) -> String {
    let stem = Url::parse(sitemap_url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(str::to_owned)
        })
        .map(|segment| {
            urlencoding::decode(&segment)
                .map(|s| s.into_owned())
                .unwrap_or(segment)
        })
        .and_then(|name| {
            Path::new(&name)
                .file_stem()
                .and_then(|s| s.to_str())
                .map(sanitize_stem)
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string());

    format!("{stem}{OUTPUT_SUFFIX}.{extension}")
}

fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if c.is_control() || matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters and suffixed with the number
/// of bytes dropped.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((end, _)) => format!("{}…(+{} bytes)", &s[..end], s.len() - end),
    }
}

/// Shorten row content for the on-screen preview, marking cuts with `...`.
pub fn preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        None => content.to_string(),
        Some((end, _)) => format!("{}...", &content[..end]),
    }
}

/// Render an error followed by each of its sources, separated by `: `.
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !rendered.contains(&cause_text) {
            rendered.push_str(": ");
            rendered.push_str(&cause_text);
        }
        source = cause.source();
    }
    rendered
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a scratch file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let scratch_path = path.join("..__write_check__");
    stdfs::File::create(&scratch_path)?;
    let _ = stdfs::remove_file(&scratch_path);
    info!("Output directory is writable");
    Ok(())
}
