//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls where queries are sent, how many results are
//! kept per query, timeouts and whether linked pages are visited. It is
//! serde-compatible so the application can embed it in its TOML file.

use crate::error::SearchError;
use serde::{Deserialize, Serialize};

/// Configuration for fetching and post-processing search results.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Scheme and host of the search provider, without trailing slash.
    pub base_url: String,
    /// Results requested from the provider per page (`num` parameter).
    pub results_per_page: u32,
    /// Interface language requested from the provider (`hl` parameter).
    pub language: String,
    /// Maximum results kept per query after link filtering.
    pub max_results_per_query: usize,
    /// HTTP request timeout in seconds, applied to every outbound call.
    pub timeout_seconds: u64,
    /// Visit each kept link to read its title, `<time>` and paragraphs.
    pub fetch_pages: bool,
    /// Character cap for summaries taken from visited pages.
    pub max_summary_chars: usize,
    /// Hosts whose links are dropped (substring match on the host).
    pub excluded_domains: Vec<String>,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.google.com".into(),
            results_per_page: 30,
            language: "en".into(),
            max_results_per_query: 10,
            timeout_seconds: 30,
            fetch_pages: false,
            max_summary_chars: 4_000,
            excluded_domains: vec![
                "wikipedia.org".into(),
                "youtube.com".into(),
                "instagram.com".into(),
            ],
            user_agent: None,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `base_url` must be an absolute http(s) URL
    /// - `results_per_page` must be greater than 0
    /// - `max_results_per_query` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| SearchError::Config(format!("base_url is not a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SearchError::Config(
                "base_url must use http or https".into(),
            ));
        }
        if self.results_per_page == 0 {
            return Err(SearchError::Config(
                "results_per_page must be greater than 0".into(),
            ));
        }
        if self.max_results_per_query == 0 {
            return Err(SearchError::Config(
                "max_results_per_query must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// `base_url` without any trailing slash.
    pub(crate) fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
