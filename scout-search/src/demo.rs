//! Demo mode: fixed sample results returned without any network I/O.

use crate::crawl::{CrawlOutcome, SearchBackend};
use crate::error::SearchError;
use crate::media::media_names;
use crate::types::{ResolvedRange, SearchResult};
use async_trait::async_trait;
use std::time::Duration;

/// Backend that answers every search with [`sample_results`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoBackend;

#[async_trait]
impl SearchBackend for DemoBackend {
    async fn search(
        &self,
        keyword_sets: &[Vec<String>],
        range: &ResolvedRange,
    ) -> Result<CrawlOutcome, SearchError> {
        tracing::debug!(sets = keyword_sets.len(), range = %range.label, "serving demo results");
        Ok(CrawlOutcome {
            results: sample_results(),
            duration: Duration::ZERO,
            warnings: Vec::new(),
        })
    }

    fn name(&self) -> &'static str {
        "demo"
    }
}

/// The canned records shown in demo mode.
pub fn sample_results() -> Vec<SearchResult> {
    [
        (
            "Central bank holds rates steady amid inflation concerns",
            "Reuters Staff",
            "2024-03-01 14:05",
            "Policymakers left the benchmark rate unchanged and signalled that cuts would depend on further evidence that inflation is easing.",
            "https://www.reuters.com/markets/rates/central-bank-holds-rates-2024-03-01/",
            820,
        ),
        (
            "Markets rally after policy statement",
            "Associated Press",
            "2024-03-01 16:30",
            "Stocks rose broadly after the statement, with technology shares leading gains as bond yields slipped.",
            "https://apnews.com/article/markets-rally-policy-statement",
            640,
        ),
        (
            "Analysts split on timing of first rate cut",
            "",
            "2024-03-02 09:10",
            "Economists surveyed disagreed on whether the first cut would come in the second or third quarter.",
            "https://www.bloomberg.com/news/articles/2024-03-02/analysts-split-on-rate-cut-timing",
            910,
        ),
    ]
    .into_iter()
    .map(|(title, author, published_at, summary, link, elapsed_ms)| SearchResult {
        title: title.to_owned(),
        author: author.to_owned(),
        published_at: published_at.to_owned(),
        media: media_names(link),
        summary: summary.to_owned(),
        link: link.to_owned(),
        elapsed: Duration::from_millis(elapsed_ms),
    })
    .collect()
}
