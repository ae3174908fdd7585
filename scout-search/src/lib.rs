//! # scout-search
//!
//! Scrapes a search provider's HTML result page for a time window and
//! turns it into structured records.
//!
//! ## Design
//!
//! - One GET per query against the provider's `/search` page with a custom
//!   date range filter
//! - CSS-selector extraction into a lazy record iterator
//! - Link filtering (excluded hosts, CJK links) and a per-query cap
//! - Optional enrichment that visits each link for its title, `<time>`
//!   and paragraphs
//! - Queries run one after another; a failing query does not sink the batch
//!
//! ## Security
//!
//! - Queries are logged only at trace level
//! - No network listeners; this is a library

pub mod config;
pub mod crawl;
pub mod demo;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod http;
pub mod media;
pub mod types;

pub use config::SearchConfig;
pub use crawl::{CrawlOutcome, Crawler, SearchBackend};
pub use demo::DemoBackend;
pub use error::{Result, SearchError};
pub use extract::{extract, Extraction};
pub use fetch::{build_query, Fetcher};
pub use types::{MediaName, ResolvedRange, SearchResult, TimeRange};

/// Fetch and extract results for a single query.
///
/// Convenience wrapper for one-off searches: builds a [`Fetcher`], fetches
/// the result page for `query` within `range`, and collects every
/// extracted record without filtering.
///
/// # Errors
///
/// Returns [`SearchError::Config`] for an invalid configuration,
/// [`SearchError::Fetch`] or [`SearchError::Timeout`] if the page cannot
/// be fetched.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> scout_search::Result<()> {
/// use scout_search::{SearchConfig, TimeRange};
///
/// let range = TimeRange::LastThreeDays.resolve_today();
/// let results = scout_search::search("\"rate cut\"", &range, &SearchConfig::default()).await?;
/// for result in &results {
///     println!("{}: {}", result.title, result.link);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(
    query: &str,
    range: &ResolvedRange,
    config: &SearchConfig,
) -> Result<Vec<SearchResult>> {
    let fetcher = Fetcher::new(config.clone())?;
    let html = fetcher.fetch(query, range).await?;
    Ok(extract(&html)?.collect())
}
