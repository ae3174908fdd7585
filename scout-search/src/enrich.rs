//! Page enrichment: visit a result link and read its article details.
//!
//! Replaces the result-page title and snippet with the linked page's
//! `<title>`, first `<time>` element and paragraph text, and records how
//! long the page took to load.

use crate::error::SearchError;
use crate::http::HttpSession;
use crate::types::{SearchResult, UNKNOWN_AUTHOR, UNKNOWN_PUBLISHED_AT};
use scraper::{Html, Selector};
use std::time::Instant;

/// Details read from a visited page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDetails {
    /// Text of the `<title>` element, empty when missing.
    pub title: String,
    /// Text of the first `<time>` element.
    pub published_at: Option<String>,
    /// Non-empty paragraph texts joined by newlines, capped in length.
    pub content: String,
}

/// Visits result links through a shared session.
#[derive(Debug, Clone)]
pub struct Enricher {
    session: HttpSession,
    max_chars: usize,
}

impl Enricher {
    /// Create an enricher that caps page content at `max_chars` characters.
    pub fn new(session: HttpSession, max_chars: usize) -> Self {
        Self { session, max_chars }
    }

    /// Fetch `result.link` and fold the page details into the record.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Fetch`] or [`SearchError::Timeout`] if the
    /// page cannot be loaded.
    pub async fn enrich(&self, mut result: SearchResult) -> Result<SearchResult, SearchError> {
        let started = Instant::now();

        let html = self
            .session
            .get(&result.link)
            .send()
            .await
            .map_err(|e| SearchError::from_reqwest("page request failed", e))?
            .error_for_status()
            .map_err(|e| SearchError::Fetch(format!("page HTTP error: {e}")))?
            .text()
            .await
            .map_err(|e| SearchError::from_reqwest("page read failed", e))?;

        let details = parse_page(&html, self.max_chars);

        if !details.title.is_empty() {
            result.title = details.title;
        }
        result.published_at = details
            .published_at
            .unwrap_or_else(|| UNKNOWN_PUBLISHED_AT.to_owned());
        if !details.content.is_empty() {
            result.summary = details.content;
        }
        result.author = UNKNOWN_AUTHOR.to_owned();
        result.elapsed = started.elapsed();

        tracing::trace!(
            elapsed_ms = u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX),
            "page enriched"
        );
        Ok(result)
    }
}

/// Read title, first `<time>` and paragraph text from a page.
pub fn parse_page(html: &str, max_chars: usize) -> PageDetails {
    let cleaned = strip_boilerplate_tags(html);
    let document = Html::parse_document(&cleaned);

    let title = first_text(&document, "title").unwrap_or_default();
    let published_at = first_text(&document, "time").filter(|t| !t.is_empty());

    let content = match Selector::parse("p") {
        Ok(sel) => document
            .select(&sel)
            .map(|p| normalise_whitespace(&p.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Err(_) => String::new(),
    };

    PageDetails {
        title,
        published_at,
        content: truncate_to_limit(&content, max_chars),
    }
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| normalise_whitespace(&el.text().collect::<String>()))
}

/// Remove non-content elements and everything inside them.
fn strip_boilerplate_tags(html: &str) -> String {
    let tags = ["script", "style", "noscript", "svg", "iframe"];

    let mut result = html.to_owned();
    for tag in &tags {
        result = strip_tag(&result, tag);
    }
    result
}

/// Remove all instances of a specific HTML tag and its content.
fn strip_tag(html: &str, tag: &str) -> String {
    let mut result = String::with_capacity(html.len());
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let open_tag = format!("<{tag}");
    let close_tag = format!("</{tag}>");

    let mut pos = 0;
    loop {
        let start = match lower[pos..].find(&open_tag) {
            Some(offset) => pos + offset,
            None => {
                result.push_str(&html[pos..]);
                break;
            }
        };

        // Reject prefixes of longer tag names (`<navigator>` for `nav`).
        let after_tag = start + open_tag.len();
        if after_tag < lower.len() {
            let next_byte = lower.as_bytes()[after_tag];
            if !matches!(next_byte, b' ' | b'>' | b'/' | b'\n' | b'\r' | b'\t') {
                result.push_str(&html[pos..after_tag]);
                pos = after_tag;
                continue;
            }
        }

        result.push_str(&html[pos..start]);

        let end = match lower[start..].find(&close_tag) {
            Some(offset) => start + offset + close_tag.len(),
            None => match lower[start..].find('>') {
                Some(offset) => start + offset + 1,
                None => html.len(),
            },
        };

        pos = end;
    }

    result
}

/// Collapse all runs of whitespace into single spaces.
fn normalise_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters.
fn truncate_to_limit(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_owned(),
        None => text.to_owned(),
    }
}
