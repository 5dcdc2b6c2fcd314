//! End-to-end resolve tests against a mock extraction service

use scrape_relay::cache::EntryStatus;
use scrape_relay::config::{Config, ExtractionMode};
use scrape_relay::fetch::{HttpExtractor, HttpSessionFactory, Orchestrator, ResolveOptions};
use scrape_relay::{ContentType, RelayError};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type HttpOrchestrator = Orchestrator<HttpSessionFactory, HttpExtractor>;

/// Creates a test configuration pointing at the mock service
fn create_test_config(endpoint: &str, mode: ExtractionMode, pool_size: u32) -> Config {
    let mut config = Config::default();
    config.extractor.endpoint = endpoint.to_string();
    config.extractor.mode = mode;
    config.extractor.request_timeout_ms = 5_000;
    config.pool.size = pool_size;
    config
}

fn build(config: &Config) -> HttpOrchestrator {
    Orchestrator::from_config(
        config,
        HttpSessionFactory::from_config(&config.extractor),
        HttpExtractor::from_config(&config.extractor),
    )
}

fn options() -> ResolveOptions {
    ResolveOptions::default().with_timeout(Duration::from_secs(10))
}

fn entry_status(orch: &HttpOrchestrator, url: &str) -> Option<EntryStatus> {
    let url = Url::parse(url).unwrap();
    orch.cache()
        .entry(&orch.fingerprint(&url))
        .map(|entry| entry.status)
}

#[tokio::test]
async fn test_sequential_requests_extract_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-url"))
        .and(body_json(json!({ "url": "https://example.com/a" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "markdown": "# Example\n\nBody text"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let orch = build(&create_test_config(&server.uri(), ExtractionMode::Markdown, 2));

    let first = orch.resolve("https://example.com/a", options()).await.unwrap();
    let second = orch.resolve("www.example.com/a/", options()).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.raw_content, "# Example\n\nBody text");
    assert_eq!(first.content_type, ContentType::Markdown);
    assert_eq!(first.title.as_deref(), Some("Example"));
    assert_eq!(
        entry_status(&orch, "https://example.com/a"),
        Some(EntryStatus::Ready)
    );
}

#[tokio::test]
async fn test_service_receives_url_as_requested() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-url"))
        .and(body_json(json!({
            "url": "https://www.example.com/docs/?ref=home&b=2&a=1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "markdown": "# Docs" })))
        .expect(1)
        .mount(&server)
        .await;

    let orch = build(&create_test_config(&server.uri(), ExtractionMode::Markdown, 1));

    let artifact = orch
        .resolve("www.example.com/docs/?ref=home&b=2&a=1", options())
        .await
        .unwrap();
    assert_eq!(artifact.url, "https://www.example.com/docs/?ref=home&b=2&a=1");
    assert_eq!(
        entry_status(&orch, "https://example.com/docs?a=1&b=2"),
        Some(EntryStatus::Ready)
    );
}

#[tokio::test]
async fn test_concurrent_requests_share_one_extraction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-url"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "markdown": "# Shared" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let orch = build(&create_test_config(&server.uri(), ExtractionMode::Markdown, 4));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let orch = orch.clone();
            tokio::spawn(async move { orch.resolve("https://example.com/shared", options()).await })
        })
        .collect();

    let mut artifacts = Vec::new();
    for handle in handles {
        artifacts.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(artifacts.len(), 10);
    assert!(artifacts.iter().all(|a| Arc::ptr_eq(a, &artifacts[0])));
}

#[tokio::test]
async fn test_specialized_domain_never_reaches_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "markdown": "x" })))
        .expect(0)
        .mount(&server)
        .await;

    let orch = build(&create_test_config(&server.uri(), ExtractionMode::Markdown, 1));

    let result = orch
        .resolve("https://en.wikipedia.org/wiki/Rust", options())
        .await;
    assert!(matches!(
        result,
        Err(RelayError::SpecializedScraperExists { ref url }) if url == "https://en.wikipedia.org/wiki/Rust"
    ));
    assert!(orch.cache().is_empty());
}

#[tokio::test]
async fn test_conflict_response_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-url"))
        .respond_with(ResponseTemplate::new(409))
        .expect(2)
        .mount(&server)
        .await;

    let orch = build(&create_test_config(&server.uri(), ExtractionMode::Markdown, 1));

    for _ in 0..2 {
        let result = orch.resolve("https://blocked.com/x", options()).await;
        assert!(matches!(
            result,
            Err(RelayError::SpecializedScraperExists { .. })
        ));
    }
    assert!(orch.cache().is_empty());
}

#[tokio::test]
async fn test_server_error_is_recoverable_and_session_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-url"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let orch = build(&create_test_config(&server.uri(), ExtractionMode::Markdown, 1));

    let first = orch.resolve("https://example.com/down", options()).await;
    assert!(matches!(first, Err(RelayError::Recoverable { .. })));
    assert!(first.unwrap_err().is_retryable());
    assert_eq!(
        entry_status(&orch, "https://example.com/down"),
        Some(EntryStatus::Failed)
    );

    let stats = orch.pool().stats();
    assert_eq!(stats.idle, 1);
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.closed_total, 0);

    // Negatively cached: the service is not asked again
    let second = orch.resolve("https://example.com/down", options()).await;
    assert!(matches!(second, Err(RelayError::Recoverable { .. })));
}

#[tokio::test]
async fn test_unreachable_service_is_recoverable() {
    let server = MockServer::start().await;
    let endpoint = server.uri();
    drop(server);

    let orch = build(&create_test_config(&endpoint, ExtractionMode::Markdown, 1));

    let result = orch.resolve("https://example.com/a", options()).await;
    assert!(matches!(result, Err(RelayError::Recoverable { .. })));
}

#[tokio::test]
async fn test_malformed_responses_are_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-url"))
        .and(body_json(json!({ "url": "https://example.com/not-json" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/scrape-url"))
        .and(body_json(json!({ "url": "https://example.com/wrong-field" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "html": "<p>x</p>" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/scrape-url"))
        .and(body_json(json!({ "url": "https://example.com/empty" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "markdown": "   " })))
        .mount(&server)
        .await;

    let orch = build(&create_test_config(&server.uri(), ExtractionMode::Markdown, 2));

    for url in [
        "https://example.com/not-json",
        "https://example.com/wrong-field",
        "https://example.com/empty",
    ] {
        let result = orch.resolve(url, options()).await;
        assert!(
            matches!(result, Err(RelayError::Fatal { .. })),
            "{} should be fatal, got {:?}",
            url,
            result
        );
        assert!(!result.unwrap_err().is_retryable());
        assert_eq!(entry_status(&orch, url), Some(EntryStatus::Failed));
    }
}

#[tokio::test]
async fn test_force_refresh_extracts_again() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "markdown": "# Fresh" })))
        .expect(2)
        .mount(&server)
        .await;

    let orch = build(&create_test_config(&server.uri(), ExtractionMode::Markdown, 1));

    let first = orch.resolve("https://example.com/a", options()).await.unwrap();
    let refreshed = orch
        .resolve("https://example.com/a", options().force_refresh())
        .await
        .unwrap();

    assert!(!Arc::ptr_eq(&first, &refreshed));
    assert_eq!(refreshed.raw_content, "# Fresh");
}

#[tokio::test]
async fn test_force_refresh_clears_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-url"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/scrape-url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "markdown": "# Back" })))
        .mount(&server)
        .await;

    let orch = build(&create_test_config(&server.uri(), ExtractionMode::Markdown, 1));

    assert!(orch.resolve("https://example.com/a", options()).await.is_err());
    let artifact = orch
        .resolve("https://example.com/a", options().force_refresh())
        .await
        .unwrap();
    assert_eq!(artifact.raw_content, "# Back");
}

#[tokio::test]
async fn test_clean_html_mode() {
    let server = MockServer::start().await;
    let html = "<html><head><title>Clean</title></head><body><p>text</p></body></html>";
    Mock::given(method("POST"))
        .and(path("/clean-html"))
        .and(body_json(json!({ "url": "https://example.com/a" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "html": html })))
        .expect(1)
        .mount(&server)
        .await;

    let orch = build(&create_test_config(&server.uri(), ExtractionMode::CleanHtml, 1));

    let artifact = orch.resolve("example.com/a", options()).await.unwrap();
    assert_eq!(artifact.raw_content, html);
    assert_eq!(artifact.content_type, ContentType::Html);
    assert_eq!(artifact.title.as_deref(), Some("Clean"));
}

#[tokio::test]
async fn test_modes_cache_separately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "markdown": "# Md" })))
        .expect(1)
        .mount(&server)
        .await;

    let markdown = build(&create_test_config(&server.uri(), ExtractionMode::Markdown, 1));
    let clean = build(&create_test_config(&server.uri(), ExtractionMode::CleanHtml, 1));

    let url = Url::parse("https://example.com/a").unwrap();
    assert_ne!(markdown.fingerprint(&url), clean.fingerprint(&url));
    markdown.resolve("https://example.com/a", options()).await.unwrap();
}

#[tokio::test]
async fn test_raw_mode_fetches_page_directly() {
    let server = MockServer::start().await;
    let html = "<html><head><title>Raw Page</title></head><body>hi</body></html>";
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "a": 1 })))
        .mount(&server)
        .await;

    let orch = build(&create_test_config(&server.uri(), ExtractionMode::Raw, 1));

    let page = format!("{}/page", server.uri());
    let artifact = orch.resolve(&page, options()).await.unwrap();
    assert_eq!(artifact.raw_content, html);
    assert_eq!(artifact.title.as_deref(), Some("Raw Page"));
    orch.resolve(&page, options()).await.unwrap();

    let data = format!("{}/data.json", server.uri());
    let result = orch.resolve(&data, options()).await;
    assert!(matches!(result, Err(RelayError::Fatal { .. })));
}

#[tokio::test]
async fn test_single_session_serializes_distinct_urls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-url"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "markdown": "# Slow" }))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let orch = build(&create_test_config(&server.uri(), ExtractionMode::Markdown, 1));

    let started = Instant::now();
    let (a, b) = tokio::join!(
        orch.resolve("https://example.com/one", options()),
        orch.resolve("https://example.com/two", options())
    );
    a.unwrap();
    b.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(800));
    let stats = orch.pool().stats();
    assert_eq!(stats.open, 1);
    assert_eq!(stats.idle, 1);
}

#[tokio::test]
async fn test_resolve_after_shutdown_fails() {
    let server = MockServer::start().await;
    let orch = build(&create_test_config(&server.uri(), ExtractionMode::Markdown, 1));

    orch.shutdown().await;
    let result = orch.resolve("https://example.com/a", options()).await;
    assert!(matches!(result, Err(RelayError::PoolClosed)));
    assert!(orch.cache().is_empty());
}

#[tokio::test]
async fn test_invalid_input_rejected() {
    let server = MockServer::start().await;
    let orch = build(&create_test_config(&server.uri(), ExtractionMode::Markdown, 1));

    let result = orch.resolve("ftp://example.com/file", options()).await;
    assert!(matches!(result, Err(RelayError::Url(_))));
    assert!(!result.unwrap_err().is_retryable());
}
