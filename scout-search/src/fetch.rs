//! Search Fetcher: one GET against the provider's result page.

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http::HttpSession;
use crate::types::ResolvedRange;

/// Fetches raw result-page HTML for a query and a resolved time range.
#[derive(Debug, Clone)]
pub struct Fetcher {
    session: HttpSession,
    config: SearchConfig,
}

impl Fetcher {
    /// Create a fetcher with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the configuration is invalid, or
    /// [`SearchError::Fetch`] if the client cannot be built.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let session = HttpSession::new(&config)?;
        Ok(Self { session, config })
    }

    /// The session used for requests, shared with page enrichment.
    pub fn session(&self) -> &HttpSession {
        &self.session
    }

    /// Issue a single GET for `query` restricted to `range` and return the
    /// raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Fetch`] on transport failure or a non-success
    /// status, and [`SearchError::Timeout`] when the client deadline elapses.
    pub async fn fetch(&self, query: &str, range: &ResolvedRange) -> Result<String, SearchError> {
        tracing::trace!(query, range = %range.label, "fetching result page");

        let url = format!("{}/search", self.config.trimmed_base_url());
        let num = self.config.results_per_page.to_string();
        let tbs = range.tbs();

        let response = self
            .session
            .get(&url)
            .query(&[
                ("q", query),
                ("num", num.as_str()),
                ("hl", self.config.language.as_str()),
                ("tbs", tbs.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::from_reqwest("result page request failed", e))?
            .error_for_status()
            .map_err(|e| SearchError::Fetch(format!("result page HTTP error: {e}")))?;

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::from_reqwest("result page read failed", e))?;

        tracing::trace!(bytes = html.len(), "result page received");
        Ok(html)
    }
}

/// Build the provider query for one keyword set.
///
/// Every keyword is wrapped in double quotes so the provider matches it as
/// an exact phrase. Embedded quotes are dropped.
pub fn build_query<S: AsRef<str>>(keywords: &[S]) -> String {
    keywords
        .iter()
        .map(|kw| kw.as_ref().trim().replace('"', ""))
        .filter(|kw| !kw.is_empty())
        .map(|kw| format!("\"{kw}\""))
        .collect::<Vec<_>>()
        .join(" ")
}
