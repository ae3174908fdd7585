//! HTTP API integration tests.
//!
//! Each test starts a server on an auto-assigned port and drives it with
//! `reqwest`. The search provider and the LLM endpoint are `wiremock`
//! servers, so no test touches the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;
use scout::analysis::Analyst;
use scout::config::{AnalysisConfig, ServerConfig};
use scout::server::{AppState, ScoutServer};
use scout_search::{
    CrawlOutcome, Crawler, ResolvedRange, SearchBackend, SearchConfig, SearchError,
};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESULTS_PAGE: &str = r#"<html><body><div id="search">
  <div class="g">
    <a href="https://www.reuters.com/markets/fed-holds/"><h3>Fed holds rates</h3></a>
    <span class="VuuXrf">Reuters</span>
    <div class="VwiC3b">The Federal Reserve left its benchmark rate unchanged.</div>
  </div>
  <div class="g">
    <a href="/url?q=https://apnews.com/article/markets&amp;sa=U"><h3>Stocks climb</h3></a>
    <div class="VwiC3b">Equities rose after the decision.</div>
  </div>
  <div class="g">
    <a href="https://en.wikipedia.org/wiki/Federal_Reserve"><h3>Federal Reserve - Wikipedia</h3></a>
  </div>
</div></body></html>"#;

/// Backend that only counts how often it was called.
#[derive(Default)]
struct CountingBackend {
    calls: AtomicUsize,
}

#[async_trait]
impl SearchBackend for CountingBackend {
    async fn search(
        &self,
        _keyword_sets: &[Vec<String>],
        _range: &ResolvedRange,
    ) -> Result<CrawlOutcome, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CrawlOutcome::default())
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

fn server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
    }
}

fn analysis_config(base_url: &str, api_key: Option<&str>) -> AnalysisConfig {
    AnalysisConfig {
        api_key: api_key.map(str::to_owned),
        base_url: base_url.to_owned(),
        ..Default::default()
    }
}

async fn start(
    live: Arc<dyn SearchBackend>,
    analysis: AnalysisConfig,
    demo_mode: bool,
) -> (ScoutServer, String) {
    let analyst = Analyst::new(analysis).expect("analyst");
    let state = AppState::new(live, analyst, demo_mode, 2);
    let server = ScoutServer::start(state, &server_config())
        .await
        .expect("server start");
    let base = format!("http://{}", server.addr());
    (server, base)
}

fn live_crawler(provider: &MockServer) -> Arc<dyn SearchBackend> {
    let config = SearchConfig {
        base_url: provider.uri(),
        ..Default::default()
    };
    Arc::new(Crawler::new(config).expect("crawler"))
}

async fn get_json(url: &str) -> (StatusCode, Value) {
    let response = reqwest::get(url).await.expect("request");
    let status = response.status();
    (status, response.json().await.expect("json body"))
}

async fn post_json(url: &str, body: Value) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .expect("request");
    let status = response.status();
    (status, response.json().await.expect("json body"))
}

async fn demo_search(base: &str) -> Value {
    let (status, body) = get_json(&format!("{base}/api/search?keywords=fed%20rates&range=3d&demo=true")).await;
    assert_eq!(status, StatusCode::OK);
    body
}

// ────────────────────────────────────────────────────────────────────────────
// Page and health
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn index_and_health() {
    let (_server, base) = start(Arc::new(CountingBackend::default()), AnalysisConfig::default(), false).await;

    let page = reqwest::get(format!("{base}/")).await.expect("index");
    assert_eq!(page.status(), StatusCode::OK);
    let html = page.text().await.expect("html");
    assert!(html.contains("/api/search"));

    let (status, body) = get_json(&format!("{base}/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// ────────────────────────────────────────────────────────────────────────────
// Search
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn demo_flag_never_hits_the_provider() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
        .expect(0)
        .mount(&provider)
        .await;

    let (_server, base) = start(live_crawler(&provider), AnalysisConfig::default(), false).await;
    let body = demo_search(&base).await;

    assert_eq!(body["demo"], true);
    assert_eq!(body["range_label"], "最近三天");
    let results = body["results"].as_array().expect("results");
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["id"], 0);
    assert_eq!(results[1]["id"], 1);
    assert!(body["search_id"].is_string());

    provider.verify().await;
}

#[tokio::test]
async fn demo_mode_server_ignores_live_backend() {
    let live = Arc::new(CountingBackend::default());
    let (_server, base) = start(live.clone(), AnalysisConfig::default(), true).await;

    let (status, body) = get_json(&format!("{base}/api/search?keywords=ecb&range=1d")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["demo"], true);
    assert_eq!(live.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn live_search_filters_and_numbers_results() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "\"fed\" \"rates\""))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
        .expect(1)
        .mount(&provider)
        .await;

    let (_server, base) = start(live_crawler(&provider), AnalysisConfig::default(), false).await;
    let (status, body) = get_json(&format!(
        "{base}/api/search?keywords=fed%20rates&range=custom&start=2024-03-01&end=2024-03-05"
    ))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["demo"], false);
    assert_eq!(body["start_date"], "2024-03-01");
    assert_eq!(body["end_date"], "2024-03-05");
    assert_eq!(body["keyword_sets"], json!([["fed", "rates"]]));

    let results = body["results"].as_array().expect("results");
    assert_eq!(results.len(), 2, "wikipedia link should be filtered");
    assert_eq!(results[0]["title"], "Fed holds rates");
    assert_eq!(results[0]["media"]["cn"], "路透社");
    assert_eq!(results[1]["link"], "https://apnews.com/article/markets");
    assert_eq!(results[1]["id"], 1);
}

#[tokio::test]
async fn empty_results_add_a_warning() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&provider)
        .await;

    let (_server, base) = start(live_crawler(&provider), AnalysisConfig::default(), false).await;
    let (status, body) = get_json(&format!("{base}/api/search?keywords=obscure&range=1m")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["results"].as_array().expect("results").is_empty());
    let warnings = body["warnings"].as_array().expect("warnings");
    assert!(warnings.iter().any(|w| w.as_str().is_some_and(|w| w.contains("未获取到搜索结果"))));
}

#[tokio::test]
async fn blank_keywords_rejected() {
    let live = Arc::new(CountingBackend::default());
    let (_server, base) = start(live.clone(), AnalysisConfig::default(), false).await;

    let (status, body) = get_json(&format!("{base}/api/search?keywords=%20%0A%20&range=1d")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    assert!(body["error"]["message"].as_str().expect("message").contains("关键字"));
    assert_eq!(live.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn inverted_custom_range_rejected() {
    let (_server, base) = start(Arc::new(CountingBackend::default()), AnalysisConfig::default(), false).await;

    let (status, body) = get_json(&format!(
        "{base}/api/search?keywords=fed&range=custom&start=2024-03-05&end=2024-03-01"
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn provider_failure_maps_to_bad_gateway() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&provider)
        .await;

    let (_server, base) = start(live_crawler(&provider), AnalysisConfig::default(), false).await;
    let (status, body) = get_json(&format!("{base}/api/search?keywords=fed&range=1d")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "FETCH_ERROR");
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn analyze_without_key_is_auth_error() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&llm)
        .await;

    let (_server, base) = start(
        Arc::new(CountingBackend::default()),
        analysis_config(&llm.uri(), None),
        false,
    )
    .await;
    let snapshot = demo_search(&base).await;

    let (status, body) = post_json(
        &format!("{base}/api/analyze"),
        json!({"search_id": snapshot["search_id"], "question": "发生了什么？", "selected": [0]}),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_FAILED");
    assert!(body["error"]["message"].as_str().expect("message").contains("OPENAI_API_KEY"));
    llm.verify().await;
}

#[tokio::test]
async fn analyze_returns_model_answer() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "  - 美联储维持利率不变  "},
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&llm)
        .await;

    let (_server, base) = start(
        Arc::new(CountingBackend::default()),
        analysis_config(&llm.uri(), Some("sk-test")),
        false,
    )
    .await;
    let snapshot = demo_search(&base).await;

    let (status, body) = post_json(
        &format!("{base}/api/analyze"),
        json!({"search_id": snapshot["search_id"], "question": "央行做了什么？", "selected": [0, 2, 42]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "- 美联储维持利率不变");
}

#[tokio::test]
async fn analyze_stale_search_is_conflict() {
    let (_server, base) = start(
        Arc::new(CountingBackend::default()),
        analysis_config("http://127.0.0.1:9", Some("sk-test")),
        false,
    )
    .await;

    let first = demo_search(&base).await;
    let _second = demo_search(&base).await;

    let (status, body) = post_json(
        &format!("{base}/api/analyze"),
        json!({"search_id": first["search_id"], "question": "问题", "selected": [0]}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "STALE_SEARCH");
}

#[tokio::test]
async fn analyze_before_any_search_is_conflict() {
    let (_server, base) = start(Arc::new(CountingBackend::default()), AnalysisConfig::default(), false).await;

    let (status, body) = post_json(
        &format!("{base}/api/analyze"),
        json!({"question": "问题", "selected": [0]}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "STALE_SEARCH");
}

#[tokio::test]
async fn analyze_validates_question_and_selection() {
    let (_server, base) = start(Arc::new(CountingBackend::default()), AnalysisConfig::default(), false).await;
    let snapshot = demo_search(&base).await;
    let url = format!("{base}/api/analyze");

    let (status, body) = post_json(
        &url,
        json!({"search_id": snapshot["search_id"], "question": "   ", "selected": [0]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "请输入提问内容。");

    let (status, body) = post_json(
        &url,
        json!({"search_id": snapshot["search_id"], "question": "问题", "selected": []}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "请至少选择一条搜索结果进行分析。");

    let (status, _) = post_json(
        &url,
        json!({"search_id": snapshot["search_id"], "question": "问题", "selected": [7, 8]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_accepts_string_ids() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "要点"}}]
        })))
        .expect(1)
        .mount(&llm)
        .await;

    let (_server, base) = start(
        Arc::new(CountingBackend::default()),
        analysis_config(&llm.uri(), Some("sk-test")),
        false,
    )
    .await;
    let snapshot = demo_search(&base).await;

    let (status, body) = post_json(
        &format!("{base}/api/analyze"),
        json!({"search_id": snapshot["search_id"], "question": "问题", "selected": ["1", "x"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "要点");
}

#[tokio::test]
async fn malformed_analyze_body_is_json_error() {
    let (_server, base) = start(Arc::new(CountingBackend::default()), AnalysisConfig::default(), false).await;

    let (status, body) = post_json(
        &format!("{base}/api/analyze"),
        json!({"search_id": "not-a-uuid", "question": "问题", "selected": [0]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    assert!(body["error"]["message"].as_str().is_some_and(|m| !m.is_empty()));

    let response = reqwest::Client::new()
        .post(format!("{base}/api/analyze"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn malformed_search_query_is_json_error() {
    let live = Arc::new(CountingBackend::default());
    let (_server, base) = start(live.clone(), AnalysisConfig::default(), false).await;

    let (status, body) = get_json(&format!("{base}/api/search?keywords=fed&range=1d&demo=yes")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    assert_eq!(live.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn latest_snapshot_tracks_the_last_search() {
    let analyst = Analyst::new(AnalysisConfig::default()).expect("analyst");
    let state = AppState::new(Arc::new(CountingBackend::default()), analyst, true, 2);
    let server = ScoutServer::start(state.clone(), &server_config())
        .await
        .expect("server start");
    let base = format!("http://{}", server.addr());

    assert!(state.latest_snapshot().await.is_none());

    let _first = demo_search(&base).await;
    let second = demo_search(&base).await;

    let latest = state.latest_snapshot().await.expect("snapshot stored");
    assert_eq!(second["search_id"], latest.search_id.to_string());
    assert_eq!(latest.results.len(), 3);
}

// ────────────────────────────────────────────────────────────────────────────
// Combiner
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn combinations_group_keywords() {
    let (_server, base) = start(Arc::new(CountingBackend::default()), AnalysisConfig::default(), false).await;

    let (status, body) = post_json(
        &format!("{base}/api/combinations"),
        json!({"keywords": "fed ecb boj rates", "group_size": 2}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let combos = body["combinations"].as_array().expect("combinations");
    assert_eq!(combos.len(), 2);

    let mut tokens: Vec<&str> = combos
        .iter()
        .flat_map(|c| c.as_str().expect("string").split(' '))
        .collect();
    tokens.sort_unstable();
    assert_eq!(tokens, vec!["boj", "ecb", "fed", "rates"]);
}

#[tokio::test]
async fn combinations_use_default_group_size() {
    let (_server, base) = start(Arc::new(CountingBackend::default()), AnalysisConfig::default(), false).await;

    let (_, body) = post_json(
        &format!("{base}/api/combinations"),
        json!({"keywords": "a b c d e f"}),
    )
    .await;
    assert_eq!(body["combinations"].as_array().expect("combinations").len(), 3);
}

#[tokio::test]
async fn negative_group_size_is_json_error() {
    let (_server, base) = start(Arc::new(CountingBackend::default()), AnalysisConfig::default(), false).await;

    let (status, body) = post_json(
        &format!("{base}/api/combinations"),
        json!({"keywords": "a b", "group_size": -1}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn reshuffle_keeps_lines() {
    let (_server, base) = start(Arc::new(CountingBackend::default()), AnalysisConfig::default(), false).await;

    let (status, body) = post_json(
        &format!("{base}/api/reshuffle"),
        json!({"lines": ["fed rates", "", "  ecb  ", "boj yen"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let mut lines: Vec<&str> = body["lines"]
        .as_array()
        .expect("lines")
        .iter()
        .map(|l| l.as_str().expect("string"))
        .collect();
    lines.sort_unstable();
    assert_eq!(lines, vec!["boj yen", "ecb", "fed rates"]);
}
