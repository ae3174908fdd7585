//! Scout: keyword-combination news search with LLM-assisted analysis.
//!
//! Users enter keyword groups, pick a time window and get news results
//! scraped from a search provider's result page. They can then select
//! records and ask an OpenAI-compatible model about them.
//!
//! # Architecture
//!
//! - **Combiner**: shuffles keywords into fixed-size query lines
//! - **Search** (`scout-search` crate): fetch, extract, filter and
//!   optionally enrich results per query
//! - **Analysis**: one chat completion request per question
//! - **Server**: axum routes serving the page and JSON endpoints, holding
//!   the latest search snapshot

pub mod analysis;
pub mod combiner;
pub mod config;
pub mod error;
pub mod server;

pub use analysis::{AnalysisError, Analyst};
pub use config::{AnalysisConfig, CombinerConfig, ScoutConfig, ServerConfig};
pub use error::{Result, ScoutError};
pub use server::{ApiError, AppState, ScoutServer, SearchSnapshot};
