//! Crawler: run the fetch → extract → filter → enrich pipeline over a
//! list of keyword sets, one query at a time.

use crate::config::SearchConfig;
use crate::enrich::Enricher;
use crate::error::SearchError;
use crate::extract::extract;
use crate::fetch::{build_query, Fetcher};
use crate::filter::LinkFilter;
use crate::types::{ResolvedRange, SearchResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Results of one crawl over every keyword set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlOutcome {
    /// Results in query order, then document order.
    pub results: Vec<SearchResult>,
    /// Wall-clock time for the whole crawl.
    #[serde(rename = "duration_ms", with = "crate::types::duration_millis")]
    pub duration: Duration,
    /// One message per query that failed while others succeeded.
    pub warnings: Vec<String>,
}

/// Source of search results for a batch of keyword sets.
///
/// [`Crawler`] scrapes the live provider; [`crate::demo::DemoBackend`]
/// returns canned data without any network I/O.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run every keyword set against `range` and gather the results.
    ///
    /// # Errors
    ///
    /// Returns the first [`SearchError`] if every keyword set fails.
    async fn search(
        &self,
        keyword_sets: &[Vec<String>],
        range: &ResolvedRange,
    ) -> Result<CrawlOutcome, SearchError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Live backend scraping the configured provider.
#[derive(Debug, Clone)]
pub struct Crawler {
    fetcher: Fetcher,
    enricher: Option<Enricher>,
    filter: LinkFilter,
    max_per_query: usize,
}

impl Crawler {
    /// Build a crawler from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an invalid configuration or
    /// [`SearchError::Fetch`] if the HTTP client cannot be built.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let fetcher = Fetcher::new(config.clone())?;
        let enricher = config
            .fetch_pages
            .then(|| Enricher::new(fetcher.session().clone(), config.max_summary_chars));
        Ok(Self {
            fetcher,
            enricher,
            filter: LinkFilter::from_config(&config),
            max_per_query: config.max_results_per_query,
        })
    }

    /// Run the pipeline for every keyword set in order.
    ///
    /// Keyword sets that produce an empty query are skipped. A failing
    /// query is logged and recorded as a warning; the crawl only fails
    /// when no query succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first query's error if every query failed.
    pub async fn run(
        &self,
        keyword_sets: &[Vec<String>],
        range: &ResolvedRange,
    ) -> Result<CrawlOutcome, SearchError> {
        let started = Instant::now();
        let mut outcome = CrawlOutcome::default();
        let mut first_error = None;
        let mut succeeded = 0usize;

        for keywords in keyword_sets {
            let query = build_query(keywords);
            if query.is_empty() {
                continue;
            }

            match self.run_query(&query, range).await {
                Ok(results) => {
                    succeeded += 1;
                    tracing::debug!(count = results.len(), "query returned results");
                    outcome.results.extend(results);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "query failed");
                    outcome.warnings.push(format!("{}: {err}", keywords.join(" ")));
                    first_error.get_or_insert(err);
                }
            }
        }

        if succeeded == 0 {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        outcome.duration = started.elapsed();
        tracing::info!(
            results = outcome.results.len(),
            failed = outcome.warnings.len(),
            duration_ms = u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
            "crawl finished"
        );
        Ok(outcome)
    }

    async fn run_query(
        &self,
        query: &str,
        range: &ResolvedRange,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let started = Instant::now();
        let html = self.fetcher.fetch(query, range).await?;

        let mut candidates: Vec<SearchResult> = extract(&html)?
            .filter(|r| self.filter.allows(&r.link))
            .take(self.max_per_query)
            .collect();

        let serp_elapsed = started.elapsed();
        for candidate in &mut candidates {
            candidate.elapsed = serp_elapsed;
        }

        let Some(enricher) = &self.enricher else {
            return Ok(candidates);
        };

        let mut enriched = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match enricher.enrich(candidate).await {
                Ok(result) => enriched.push(result),
                Err(err) => tracing::debug!(error = %err, "dropping unreachable page"),
            }
        }
        Ok(enriched)
    }
}

#[async_trait]
impl SearchBackend for Crawler {
    async fn search(
        &self,
        keyword_sets: &[Vec<String>],
        range: &ResolvedRange,
    ) -> Result<CrawlOutcome, SearchError> {
        self.run(keyword_sets, range).await
    }

    fn name(&self) -> &'static str {
        "live"
    }
}
