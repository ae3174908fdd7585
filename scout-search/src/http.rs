//! HTTP session shared by result-page fetches and page enrichment.
//!
//! One [`reqwest::Client`] carries the cookie jar, deadline and redirect
//! policy. The User-Agent is not baked into the client: every request
//! built through [`HttpSession::get`] draws a fresh one from
//! [`USER_AGENTS`] unless the configuration pins a fixed value.

use crate::config::SearchConfig;
use crate::error::SearchError;
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Duration;

/// Desktop browser User-Agents drawn from per request.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
];

const MAX_REDIRECTS: usize = 10;

/// Client plus User-Agent policy.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: reqwest::Client,
    fixed_user_agent: Option<String>,
}

impl HttpSession {
    /// Build a session from the scraping configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Fetch`] if the client cannot be constructed.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            // Consent interstitials set cookies the next request must carry.
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| SearchError::Fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config.user_agent.clone()))
    }

    /// Wrap an existing client. `fixed_user_agent` disables rotation.
    pub fn with_client(client: reqwest::Client, fixed_user_agent: Option<String>) -> Self {
        let fixed_user_agent = fixed_user_agent
            .map(|ua| ua.trim().to_owned())
            .filter(|ua| !ua.is_empty());
        Self {
            client,
            fixed_user_agent,
        }
    }

    /// User-Agent for the next request.
    pub fn user_agent(&self) -> &str {
        match &self.fixed_user_agent {
            Some(ua) => ua,
            None => random_user_agent(),
        }
    }

    /// Start a browser-like GET for `url`.
    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header(USER_AGENT, self.user_agent())
            .header(ACCEPT, "text/html,application/xhtml+xml")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
    }
}

/// Pick one entry of [`USER_AGENTS`] at random.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}
