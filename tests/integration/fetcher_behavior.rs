//! Integration tests for the registry client: count probe and page retries

use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sekolah_scraper::fetcher::RegistryClient;

use super::common::page_body;

#[tokio::test]
async fn test_total_count_reads_declared_total() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("page", "1"))
        .and(query_param("perPage", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(231_665, [1])))
        .expect(1)
        .mount(&server)
        .await;

    let client = RegistryClient::new(server.uri()).unwrap();
    assert_eq!(client.total_count().await, 231_665);
}

#[tokio::test]
async fn test_total_count_degrades_to_zero_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1) // no retry on the count probe
        .mount(&server)
        .await;

    let client = RegistryClient::new(server.uri()).unwrap();
    assert_eq!(client.total_count().await, 0);
}

#[tokio::test]
async fn test_total_count_zero_when_field_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "dataSekolah": [] })),
        )
        .mount(&server)
        .await;

    let client = RegistryClient::new(server.uri()).unwrap();
    assert_eq!(client.total_count().await, 0);
}

#[tokio::test]
async fn test_fetch_page_returns_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("page", "2"))
        .and(query_param("perPage", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(250, 101..=200)))
        .mount(&server)
        .await;

    let client = RegistryClient::new(server.uri()).unwrap();
    let records = client.fetch_page(2, 100).await;
    assert_eq!(records.len(), 100);
    assert_eq!(records[0].npsn().as_deref(), Some("00000101"));
}

#[tokio::test]
async fn test_empty_page_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(250, [])))
        .expect(1)
        .mount(&server)
        .await;

    let client = RegistryClient::new(server.uri())
        .unwrap()
        .with_retry_backoff(Duration::from_millis(10));
    assert!(client.fetch_page(9, 100).await.is_empty());
}

#[tokio::test]
async fn test_retry_exhaustion_degrades_to_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3) // one attempt per allowed retry
        .mount(&server)
        .await;

    let client = RegistryClient::new(server.uri())
        .unwrap()
        .with_max_retries(3)
        .with_retry_backoff(Duration::from_millis(10));
    assert!(client.fetch_page(5, 100).await.is_empty());
}

#[tokio::test]
async fn test_malformed_payload_degrades_to_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(2)
        .mount(&server)
        .await;

    let client = RegistryClient::new(server.uri())
        .unwrap()
        .with_max_retries(2)
        .with_retry_backoff(Duration::from_millis(10));
    assert!(client.fetch_page(1, 100).await.is_empty());
}

#[tokio::test]
async fn test_backoff_observed_before_second_attempt() {
    let server = MockServer::start().await;

    // First attempt fails, second succeeds. Mount order matters: the
    // one-shot failure consumes the first matching request.
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(250, 1..=100)))
        .mount(&server)
        .await;

    let backoff = Duration::from_millis(150);
    let client = RegistryClient::new(server.uri())
        .unwrap()
        .with_max_retries(3)
        .with_retry_backoff(backoff);

    let started = Instant::now();
    let records = client.fetch_page(1, 100).await;
    let elapsed = started.elapsed();

    assert_eq!(records.len(), 100);
    assert!(
        elapsed >= backoff,
        "expected at least one backoff delay, elapsed {elapsed:?}"
    );
}
