//! HTTP front end: the static page plus the JSON endpoints it calls.
//!
//! ## Endpoints
//!
//! - `GET /` serves the single-page UI
//! - `GET /health` reports liveness
//! - `GET /api/search` runs a crawl and stores the result as the latest snapshot
//! - `POST /api/analyze` asks the LLM about selected records of that snapshot
//! - `POST /api/combinations` shuffles keywords into query lines
//! - `POST /api/reshuffle` shuffles existing query lines

use axum::Router;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use chrono::NaiveDate;
use scout_search::{Crawler, DemoBackend, SearchBackend, SearchError, SearchResult, TimeRange};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::analysis::{AnalysisError, Analyst};
use crate::combiner::{generate_combinations, parse_keyword_sets, reshuffle};
use crate::config::{ScoutConfig, ServerConfig};
use crate::error::ScoutError;

const INDEX_HTML: &str = include_str!("../static/index.html");

const MISSING_KEYWORDS_MESSAGE: &str = "请至少提供一组关键字（每行一组，组内以空格分隔）。";
const MISSING_QUESTION_MESSAGE: &str = "请输入提问内容。";
const MISSING_SELECTION_MESSAGE: &str = "请至少选择一条搜索结果进行分析。";
const NO_RESULTS_MESSAGE: &str = "未获取到搜索结果，请检查关键字或稍后再试。";
const NO_SNAPSHOT_MESSAGE: &str = "当前没有搜索结果，请先执行搜索。";
const STALE_SNAPSHOT_MESSAGE: &str = "搜索结果已更新，请基于最新结果重新选择。";

/// Stable error codes used in API error bodies.
pub mod error_codes {
    /// Missing or malformed request input.
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    /// The referenced search is not the latest one.
    pub const STALE_SEARCH: &str = "STALE_SEARCH";
    /// The result page could not be fetched.
    pub const FETCH_ERROR: &str = "FETCH_ERROR";
    /// The result page could not be parsed.
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A record in a snapshot, addressed by its 0-based position.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotEntry {
    /// Position in the snapshot.
    pub id: usize,
    /// The record itself.
    #[serde(flatten)]
    pub result: SearchResult,
}

/// The latest search outcome, as returned by `GET /api/search`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSnapshot {
    /// Identifies this snapshot for later analysis requests.
    pub search_id: Uuid,
    /// Keyword sets that were searched, one per query.
    pub keyword_sets: Vec<Vec<String>>,
    /// Display label of the time range.
    pub range_label: String,
    /// First day of the range, inclusive.
    pub start_date: NaiveDate,
    /// Last day of the range, inclusive.
    pub end_date: NaiveDate,
    /// Results in query order.
    pub results: Vec<SnapshotEntry>,
    /// Wall-clock time of the whole crawl.
    pub duration_ms: u64,
    /// Non-fatal problems worth showing to the user.
    pub warnings: Vec<String>,
    /// Whether the results are demo samples.
    pub demo: bool,
}

impl SearchSnapshot {
    /// Records for the given ids. Unknown ids are skipped; order and
    /// duplicates follow `ids`.
    pub fn select(&self, ids: &[usize]) -> Vec<SearchResult> {
        ids.iter()
            .filter_map(|&id| self.results.get(id))
            .map(|entry| entry.result.clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error returned by an API handler.
///
/// Serialized as `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("[{}] {}", error_codes::INVALID_REQUEST, .0)]
    Validation(String),

    /// The analysis referenced a search that is not the latest.
    #[error("[{}] {}", error_codes::STALE_SEARCH, .0)]
    StaleSnapshot(String),

    /// Search layer failure.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Analysis layer failure.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::StaleSnapshot(_) => StatusCode::CONFLICT,
            Self::Search(SearchError::Config(_)) => StatusCode::BAD_REQUEST,
            Self::Search(SearchError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Search(SearchError::Fetch(_) | SearchError::Parse(_)) => StatusCode::BAD_GATEWAY,
            Self::Analysis(AnalysisError::Auth(_)) => StatusCode::UNAUTHORIZED,
            Self::Analysis(AnalysisError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Analysis(AnalysisError::Upstream(_) | AnalysisError::Request(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Analysis(AnalysisError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Search(SearchError::Config(_)) => {
                error_codes::INVALID_REQUEST
            }
            Self::StaleSnapshot(_) => error_codes::STALE_SEARCH,
            Self::Search(SearchError::Fetch(_)) => error_codes::FETCH_ERROR,
            Self::Search(SearchError::Parse(_)) => error_codes::PARSE_ERROR,
            Self::Search(SearchError::Timeout(_)) => crate::analysis::error_codes::TIMEOUT_ERROR,
            Self::Analysis(e) => e.code(),
        }
    }

    /// Human-readable message without the code prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Validation(m) | Self::StaleSnapshot(m) => m.clone(),
            Self::Search(e) => e.to_string(),
            Self::Analysis(e) => e.message().to_owned(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(code = self.code(), "request failed: {self}");
        } else {
            tracing::debug!(code = self.code(), "request rejected: {self}");
        }
        let body = serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.message(),
            }
        });
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    live: Arc<dyn SearchBackend>,
    demo: Arc<dyn SearchBackend>,
    demo_mode: bool,
    analyst: Arc<Analyst>,
    default_group_size: usize,
    snapshot: Arc<RwLock<Option<SearchSnapshot>>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("live", &self.live.name())
            .field("demo_mode", &self.demo_mode)
            .field("analyst", &self.analyst)
            .field("default_group_size", &self.default_group_size)
            .finish()
    }
}

impl AppState {
    /// Assemble state from an explicit live backend and analyst.
    pub fn new(
        live: Arc<dyn SearchBackend>,
        analyst: Analyst,
        demo_mode: bool,
        default_group_size: usize,
    ) -> Self {
        Self {
            live,
            demo: Arc::new(DemoBackend),
            demo_mode,
            analyst: Arc::new(analyst),
            default_group_size: default_group_size.max(1),
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    /// Build the live crawler and analyst from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Search`] or [`ScoutError::Analysis`] if either
    /// component rejects its section.
    pub fn from_config(config: &ScoutConfig) -> crate::error::Result<Self> {
        let crawler = Crawler::new(config.search.clone())?;
        let analyst = Analyst::new(config.analysis.clone())?;
        if !analyst.has_api_key() {
            tracing::warn!("OPENAI_API_KEY is not set; analysis requests will be rejected");
        }
        Ok(Self::new(
            Arc::new(crawler),
            analyst,
            config.demo,
            config.combiner.default_group_size,
        ))
    }

    /// The latest snapshot, if any search has completed.
    pub async fn latest_snapshot(&self) -> Option<SearchSnapshot> {
        self.snapshot.read().await.clone()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/search", get(handle_search))
        .route("/api/analyze", post(handle_analyze))
        .route("/api/combinations", post(handle_combinations))
        .route("/api/reshuffle", post(handle_reshuffle))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Running HTTP server. The serving task is aborted on drop.
pub struct ScoutServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ScoutServer {
    /// Bind `{config.host}:{config.port}` (port `0` auto-assigns) and serve
    /// in a background task.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Server`] if the listener cannot bind.
    pub async fn start(state: AppState, config: &ServerConfig) -> crate::error::Result<Self> {
        let app = router(state);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| ScoutError::Server(format!("bind {bind_addr} failed: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| ScoutError::Server(format!("failed to get local addr: {e}")))?;

        info!("scout listening on http://{addr}");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ScoutServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    keywords: String,
    #[serde(default = "default_range")]
    range: String,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    demo: bool,
}

fn default_range() -> String {
    "custom".to_owned()
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

async fn handle_search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchSnapshot>, ApiError> {
    let Query(params) = params?;
    let keyword_sets = parse_keyword_sets(&params.keywords);
    if keyword_sets.is_empty() {
        return Err(ApiError::Validation(MISSING_KEYWORDS_MESSAGE.into()));
    }

    let range = TimeRange::parse(
        params.range.trim(),
        non_blank(params.start.as_ref()),
        non_blank(params.end.as_ref()),
    )?
    .resolve_today();

    let demo = state.demo_mode || params.demo;
    let backend = if demo { &state.demo } else { &state.live };

    info!(
        backend = backend.name(),
        queries = keyword_sets.len(),
        range = %range.label,
        "search started"
    );

    let outcome = backend.search(&keyword_sets, &range).await?;

    let mut warnings = outcome.warnings;
    if outcome.results.is_empty() {
        warnings.push(NO_RESULTS_MESSAGE.to_owned());
    }

    let snapshot = SearchSnapshot {
        search_id: Uuid::new_v4(),
        keyword_sets,
        range_label: range.label,
        start_date: range.start,
        end_date: range.end,
        results: outcome
            .results
            .into_iter()
            .enumerate()
            .map(|(id, result)| SnapshotEntry { id, result })
            .collect(),
        duration_ms: u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
        warnings,
        demo,
    };

    info!(
        search_id = %snapshot.search_id,
        results = snapshot.results.len(),
        duration_ms = snapshot.duration_ms,
        "search finished"
    );

    *state.snapshot.write().await = Some(snapshot.clone());
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    search_id: Option<Uuid>,
    #[serde(default)]
    question: String,
    #[serde(default)]
    selected: Vec<SelectedId>,
}

/// A result id as sent by the page: a number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SelectedId {
    Index(usize),
    Text(String),
}

impl SelectedId {
    fn index(&self) -> Option<usize> {
        match self {
            Self::Index(id) => Some(*id),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    answer: String,
}

async fn handle_analyze(
    State(state): State<AppState>,
    request: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = request?;
    let ids: Vec<usize> = request
        .selected
        .iter()
        .filter_map(SelectedId::index)
        .collect();
    let question = request.question.trim();
    if question.is_empty() {
        return Err(ApiError::Validation(MISSING_QUESTION_MESSAGE.into()));
    }
    if request.selected.is_empty() {
        return Err(ApiError::Validation(MISSING_SELECTION_MESSAGE.into()));
    }

    let selected = {
        let guard = state.snapshot.read().await;
        let Some(snapshot) = guard.as_ref() else {
            return Err(ApiError::StaleSnapshot(NO_SNAPSHOT_MESSAGE.into()));
        };
        if request.search_id != Some(snapshot.search_id) {
            return Err(ApiError::StaleSnapshot(STALE_SNAPSHOT_MESSAGE.into()));
        }
        snapshot.select(&ids)
    };

    if selected.is_empty() {
        return Err(ApiError::Validation(MISSING_SELECTION_MESSAGE.into()));
    }

    let answer = state.analyst.analyze(question, &selected).await?;
    Ok(Json(AnalyzeResponse { answer }))
}

#[derive(Debug, Deserialize)]
struct CombinationsRequest {
    #[serde(default)]
    keywords: String,
    #[serde(default)]
    group_size: Option<usize>,
}

async fn handle_combinations(
    State(state): State<AppState>,
    request: Result<Json<CombinationsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = request?;
    let group_size = request.group_size.unwrap_or(state.default_group_size);
    let combinations = generate_combinations(&request.keywords, group_size);
    Ok(Json(serde_json::json!({ "combinations": combinations })))
}

#[derive(Debug, Deserialize)]
struct ReshuffleRequest {
    #[serde(default)]
    lines: Vec<String>,
}

async fn handle_reshuffle(
    request: Result<Json<ReshuffleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = request?;
    Ok(Json(serde_json::json!({ "lines": reshuffle(&request.lines) })))
}
