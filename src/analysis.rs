//! Analysis Requester: ask an OpenAI-compatible chat completion endpoint
//! about a selection of search results.
//!
//! A single non-streaming request per question, no retries. The API key
//! comes from [`AnalysisConfig`] at construction time.
//!
//! # Examples
//!
//! ```rust,no_run
//! use scout::analysis::Analyst;
//! use scout::config::AnalysisConfig;
//!
//! # async fn example() -> Result<(), scout::analysis::AnalysisError> {
//! let config = AnalysisConfig {
//!     api_key: Some("sk-...".into()),
//!     ..Default::default()
//! };
//! let analyst = Analyst::new(config)?;
//! let results = scout_search::demo::sample_results();
//! let answer = analyst.analyze("What did the central bank decide?", &results).await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use scout_search::SearchResult;
use serde::Deserialize;

use crate::config::AnalysisConfig;

/// Stable error codes for programmatic error handling.
///
/// These codes appear in API error bodies and never change.
pub mod error_codes {
    /// Missing or rejected API key.
    pub const AUTH_FAILED: &str = "AUTH_FAILED";

    /// The provider returned an error or an unusable response.
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";

    /// The request exceeded the configured deadline.
    pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";

    /// The request could not be sent (DNS, connection, TLS).
    pub const REQUEST_FAILED: &str = "REQUEST_FAILED";

    /// Invalid analysis configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
}

/// Errors produced by the Analysis Requester.
///
/// The Display impl formats as `[CODE] message`.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Missing, blank or rejected API key.
    #[error("[{}] {}", error_codes::AUTH_FAILED, .0)]
    Auth(String),

    /// Provider-side failure.
    #[error("[{}] {}", error_codes::UPSTREAM_ERROR, .0)]
    Upstream(String),

    /// The request deadline elapsed.
    #[error("[{}] {}", error_codes::TIMEOUT_ERROR, .0)]
    Timeout(String),

    /// Transport failure before a response arrived.
    #[error("[{}] {}", error_codes::REQUEST_FAILED, .0)]
    Request(String),

    /// Invalid configuration.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    Config(String),
}

impl AnalysisError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth(_) => error_codes::AUTH_FAILED,
            Self::Upstream(_) => error_codes::UPSTREAM_ERROR,
            Self::Timeout(_) => error_codes::TIMEOUT_ERROR,
            Self::Request(_) => error_codes::REQUEST_FAILED,
            Self::Config(_) => error_codes::CONFIG_INVALID,
        }
    }

    /// Returns the inner message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Auth(m) | Self::Upstream(m) | Self::Timeout(m) | Self::Request(m) | Self::Config(m) => m,
        }
    }
}

/// System prompt: intelligence-analyst persona answering from the
/// supplied results.
pub const SYSTEM_PROMPT: &str = "你是一名情报分析助理，需要基于提供的搜索结果回答用户问题。\
请引用相关来源并用简洁的中文要点回复，最后附上你的不确定性说明。";

/// Message shown when the API key is missing.
pub const MISSING_KEY_MESSAGE: &str =
    "未检测到 OPENAI_API_KEY 环境变量，请在环境中配置有效的 OpenAI API Key（可在 .env 文件中设置）。";

/// Build the user message: the question followed by one block per result.
pub fn build_user_message(question: &str, results: &[SearchResult], summary_chars: usize) -> String {
    let context = results
        .iter()
        .map(|res| {
            let summary: String = res.summary.chars().take(summary_chars).collect();
            format!(
                "标题：{}\n来源：{}\n链接：{}\n摘要：{}",
                res.title, res.media, res.link, summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("用户问题：{question}\n可用资料：\n{context}")
}

/// Build the JSON body for the Chat Completions API.
pub fn build_completions_request(
    config: &AnalysisConfig,
    question: &str,
    results: &[SearchResult],
) -> serde_json::Value {
    serde_json::json!({
        "model": config.model,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": build_user_message(question, results, config.summary_chars)},
        ],
        "temperature": config.temperature,
        "max_tokens": config.max_tokens,
        "stream": false,
    })
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Calls the completion endpoint with a constructed prompt.
pub struct Analyst {
    config: AnalysisConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for Analyst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyst")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .field("has_api_key", &self.has_api_key())
            .finish()
    }
}

impl Analyst {
    /// Create an analyst. A missing API key is not an error here; it is
    /// reported by [`Analyst::analyze`].
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] for a zero timeout or if the HTTP
    /// client cannot be built.
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        if config.timeout_seconds == 0 {
            return Err(AnalysisError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AnalysisError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    /// Whether a non-blank API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Ask `question` about `results` and return the answer text.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Auth`] when no key is configured (checked before
    ///   any network call) or the provider rejects it (401/403)
    /// - [`AnalysisError::Timeout`] when the deadline elapses
    /// - [`AnalysisError::Request`] on transport failure
    /// - [`AnalysisError::Upstream`] on any other provider failure or an
    ///   empty answer
    pub async fn analyze(
        &self,
        question: &str,
        results: &[SearchResult],
    ) -> Result<String, AnalysisError> {
        let Some(api_key) = self.api_key() else {
            return Err(AnalysisError::Auth(MISSING_KEY_MESSAGE.into()));
        };

        let url = self.config.completions_url();
        let body = build_completions_request(&self.config, question, results);

        tracing::debug!(model = %self.config.model, selected = results.len(), "requesting analysis");

        let mut request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json");
        if let Some(org_id) = &self.config.org_id {
            request = request.header("OpenAI-Organization", org_id);
        }

        let response = request.json(&body).send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body_text));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| match map_transport_error(e) {
                AnalysisError::Request(m) => {
                    AnalysisError::Upstream(format!("invalid completion response: {m}"))
                }
                other => other,
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AnalysisError::Upstream("provider returned no answer".into()))
    }
}

fn map_transport_error(err: reqwest::Error) -> AnalysisError {
    if err.is_timeout() {
        AnalysisError::Timeout(format!("completion request timed out: {err}"))
    } else {
        AnalysisError::Request(format!("completion request failed: {err}"))
    }
}

/// Map an HTTP error status to the appropriate [`AnalysisError`].
fn map_http_error(status: reqwest::StatusCode, body: &str) -> AnalysisError {
    let message = extract_error_message(body);
    match status.as_u16() {
        401 | 403 => AnalysisError::Auth(format!("provider rejected the API key: {message}")),
        408 | 504 => AnalysisError::Timeout(format!("provider timed out: {message}")),
        code => AnalysisError::Upstream(format!("provider HTTP {code}: {message}")),
    }
}

/// Extract an error message from an OpenAI-style error body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}
