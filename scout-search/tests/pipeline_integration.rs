//! Integration tests for the crawl pipeline.
//!
//! These tests serve result pages and articles from a local mock server
//! (no external network calls). Live provider tests are marked `#[ignore]`
//! for manual/periodic validation.

use scout_search::filter::LinkFilter;
use scout_search::{extract, Crawler, SearchBackend, SearchConfig, TimeRange};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESULT_PAGE: &str = r#"<!DOCTYPE html>
<html><body><div id="rso">
  <div class="g"><a href="/url?q=https://www.reuters.com/world/story-one&amp;sa=U"><h3>Story one</h3></a>
    <span class="VuuXrf">Reuters</span><div class="VwiC3b"><span class="LEwnzc">2 days ago — </span>First summary.</div></div>
  <div class="g"><a href="https://www.youtube.com/watch?v=abc"><h3>Video</h3></a></div>
  <div class="g"><a href="https://example.cn/新闻"><h3>Mirror</h3></a></div>
  <div class="g"><a href="https://www.nytimes.com/2024/03/01/story-two.html"><h3>Story two</h3></a>
    <div class="VwiC3b">Second summary.</div></div>
</div></body></html>"#;

#[test]
fn extract_then_filter_keeps_news_links_in_order() {
    let filter = LinkFilter::from_config(&SearchConfig::default());
    let results: Vec<_> = extract(RESULT_PAGE)
        .expect("extract")
        .filter(|r| filter.allows(&r.link))
        .collect();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].link, "https://www.reuters.com/world/story-one");
    assert_eq!(results[0].published_at, "2 days ago");
    assert_eq!(results[0].media.cn, "路透社");
    assert_eq!(results[1].title, "Story two");
    assert_eq!(results[1].media.cn, "纽约时报");
}

#[tokio::test]
async fn crawler_as_backend_reports_duration_and_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULT_PAGE))
        .expect(2)
        .mount(&server)
        .await;

    let backend: Box<dyn SearchBackend> = Box::new(
        Crawler::new(SearchConfig {
            base_url: server.uri(),
            timeout_seconds: 5,
            ..Default::default()
        })
        .expect("crawler"),
    );

    let sets = vec![
        vec!["central".to_owned(), "bank".to_owned()],
        vec!["inflation".to_owned()],
    ];
    let range = TimeRange::LastMonth.resolve_today();
    let outcome = backend.search(&sets, &range).await.expect("search");

    // Two queries, two kept results each; no cross-query dedup.
    assert_eq!(outcome.results.len(), 4);
    assert!(outcome.warnings.is_empty());
    assert_eq!(backend.name(), "live");
}

#[tokio::test]
#[ignore] // Live network test, run with `cargo test -- --ignored`
async fn live_search() {
    let range = TimeRange::LastThreeDays.resolve_today();
    let results = scout_search::search("\"rust\" \"release\"", &range, &SearchConfig::default())
        .await
        .expect("live search should work");
    for r in &results {
        assert!(!r.title.is_empty());
        assert!(r.link.starts_with("http"));
    }
}
