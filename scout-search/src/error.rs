//! Error types for the scout-search crate.
//!
//! Messages are stable and safe to show to users. Queries are never
//! embedded in error text.

/// Errors that can occur while fetching or parsing search results.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Network or transport failure reaching the search provider, or a
    /// non-success HTTP status.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The request exceeded the configured client deadline.
    #[error("search timed out: {0}")]
    Timeout(String),

    /// Unexpected result markup (selector construction, malformed page).
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid search configuration or time range.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Classify a [`reqwest::Error`] into [`SearchError::Timeout`] or
    /// [`SearchError::Fetch`], prefixing the message with `context`.
    pub(crate) fn from_reqwest(context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(format!("{context}: {err}"))
        } else {
            Self::Fetch(format!("{context}: {err}"))
        }
    }
}

/// Convenience type alias for scout-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
