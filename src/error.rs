//! Error types for the scout application.

/// Top-level error type for the web application.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP listener error (bind, local address).
    #[error("server error: {0}")]
    Server(String),

    /// Search layer error.
    #[error("search error: {0}")]
    Search(#[from] scout_search::SearchError),

    /// Analysis layer error.
    #[error("analysis error: {0}")]
    Analysis(#[from] crate::analysis::AnalysisError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ScoutError>;
