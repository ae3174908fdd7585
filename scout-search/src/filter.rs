//! Link filtering applied between extraction and enrichment.
//!
//! Drops links on excluded hosts and links containing CJK ideographs.

use crate::config::SearchConfig;
use url::Url;

/// Decides which result links are kept.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    excluded_domains: Vec<String>,
}

impl LinkFilter {
    /// Create a filter rejecting links whose host contains any of `excluded_domains`.
    pub fn new(excluded_domains: Vec<String>) -> Self {
        Self { excluded_domains }
    }

    /// Create a filter from the search configuration.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.excluded_domains.clone())
    }

    /// Returns `true` if `link` should be kept.
    pub fn allows(&self, link: &str) -> bool {
        if link.is_empty() || contains_cjk(link) {
            return false;
        }
        let host = Url::parse(link)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .unwrap_or_else(|| link.to_ascii_lowercase());
        !self
            .excluded_domains
            .iter()
            .any(|domain| host.contains(domain.as_str()))
    }
}

/// CJK unified ideographs in the basic block (U+4E00..=U+9FA5).
fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fa5}').contains(&c))
}
