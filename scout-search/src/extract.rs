//! Result extraction from the provider's HTML result page.
//!
//! [`extract`] locates the result blocks once and hands back an
//! [`Extraction`] iterator. Each block is turned into a [`SearchResult`]
//! only when the iterator is advanced, so a caller that stops early (for
//! example after the per-query cap) never parses the remaining blocks.

use crate::error::SearchError;
use crate::media::media_names;
use crate::types::SearchResult;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Container of a single organic result.
const BLOCK_SELECTOR: &str = "div.g";
const TITLE_SELECTOR: &str = "h3";
const LINK_SELECTOR: &str = "a[href]";
const SNIPPET_SELECTOR: &str = "div.VwiC3b, span.aCOpRe, div[data-sncf], div.IsZvec";
const DATE_SELECTOR: &str = "span.LEwnzc, span.MUxGbd.wuQ4Ob";
const SOURCE_SELECTOR: &str = "span.VuuXrf";

/// Base used to resolve provider-relative redirect links.
const REDIRECT_BASE: &str = "https://www.google.com";

/// Parse `html` into a lazy sequence of results in document order.
///
/// Markup without any result blocks, including an empty string, yields an
/// empty sequence rather than an error.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] only if an internal selector fails to
/// compile.
pub fn extract(html: &str) -> Result<Extraction, SearchError> {
    let selectors = BlockSelectors::new()?;
    let document = Html::parse_document(html);

    let blocks: Vec<String> = document
        .select(&selectors.block)
        // Grouped results nest blocks; only the innermost hold one result each.
        .filter(|block| !has_block_descendant(block, &selectors.block))
        .map(|block| block.html())
        .collect();

    tracing::debug!(blocks = blocks.len(), "result blocks located");

    Ok(Extraction {
        blocks: blocks.into_iter(),
        selectors,
        seen_links: HashSet::new(),
    })
}

/// Lazy, finite, non-restartable sequence of extracted results.
pub struct Extraction {
    blocks: std::vec::IntoIter<String>,
    selectors: BlockSelectors,
    seen_links: HashSet<String>,
}

impl std::fmt::Debug for Extraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extraction")
            .field("remaining_blocks", &self.blocks.len())
            .finish()
    }
}

impl Iterator for Extraction {
    type Item = SearchResult;

    fn next(&mut self) -> Option<SearchResult> {
        for block in self.blocks.by_ref() {
            let Some(result) = self.selectors.parse_block(&block) else {
                continue;
            };
            if self.seen_links.insert(result.link.clone()) {
                return Some(result);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.blocks.len()))
    }
}

impl std::iter::FusedIterator for Extraction {}

struct BlockSelectors {
    block: Selector,
    title: Selector,
    link: Selector,
    snippet: Selector,
    date: Selector,
    source: Selector,
}

impl BlockSelectors {
    fn new() -> Result<Self, SearchError> {
        Ok(Self {
            block: compile(BLOCK_SELECTOR, "result")?,
            title: compile(TITLE_SELECTOR, "title")?,
            link: compile(LINK_SELECTOR, "link")?,
            snippet: compile(SNIPPET_SELECTOR, "snippet")?,
            date: compile(DATE_SELECTOR, "date")?,
            source: compile(SOURCE_SELECTOR, "source")?,
        })
    }

    fn parse_block(&self, block_html: &str) -> Option<SearchResult> {
        let fragment = Html::parse_fragment(block_html);
        let root = fragment.root_element();

        let title_el = root.select(&self.title).next()?;
        let title = element_text(&title_el);
        if title.is_empty() {
            return None;
        }

        // Prefer the anchor wrapping the title, as the result page does.
        let href = root
            .select(&self.link)
            .find(|a| a.select(&self.title).next().is_some())
            .or_else(|| root.select(&self.link).next())
            .and_then(|a| a.value().attr("href"))?;
        let link = resolve_link(href)?;

        let summary = root
            .select(&self.snippet)
            .next()
            .map(|el| element_text(&el))
            .unwrap_or_default();

        let published_at = root
            .select(&self.date)
            .next()
            .map(|el| {
                element_text(&el)
                    .trim_end_matches(|c: char| c == '—' || c == '-' || c == '·' || c.is_whitespace())
                    .to_owned()
            })
            .unwrap_or_default();

        let author = root
            .select(&self.source)
            .next()
            .map(|el| element_text(&el))
            .unwrap_or_default();

        Some(SearchResult {
            title,
            author,
            published_at,
            media: media_names(&link),
            summary,
            link,
            elapsed: Duration::ZERO,
        })
    }
}

fn compile(selector: &str, what: &str) -> Result<Selector, SearchError> {
    Selector::parse(selector)
        .map_err(|e| SearchError::Parse(format!("invalid {what} selector: {e:?}")))
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_block_descendant(el: &ElementRef<'_>, block: &Selector) -> bool {
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|inner| block.matches(&inner))
}

/// Turn a result href into an absolute target URL.
///
/// Redirect wrappers like `/url?q=https%3A%2F%2Fexample.com&sa=U` are
/// unwrapped; other provider-relative links (related searches, image
/// tabs) are rejected.
fn resolve_link(href: &str) -> Option<String> {
    if href.starts_with("/url?") {
        let wrapped = Url::parse(REDIRECT_BASE).ok()?.join(href).ok()?;
        let target = wrapped
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")
            .map(|(_, value)| value.into_owned())?;
        return resolve_link(&target);
    }

    // Keep the link as written; re-serializing would percent-encode it.
    let parsed = Url::parse(href).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(href.to_owned()),
        _ => None,
    }
}
