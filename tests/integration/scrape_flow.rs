//! End-to-end scrape runs against a mock registry

use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sekolah_scraper::fetcher::RegistryClient;
use sekolah_scraper::resume::{CheckpointStore, StagingStore};
use sekolah_scraper::scrape::{RunOutcome, ScrapeExecutor};
use sekolah_scraper::shutdown::ShutdownCoordinator;

use super::common::{expected_npsns, mount_count, mount_page, npsn_set, page_body};

fn executor(server: &MockServer, dir: &TempDir) -> ScrapeExecutor {
    let client = RegistryClient::new(server.uri())
        .unwrap()
        .with_retry_backoff(Duration::from_millis(10));
    ScrapeExecutor::new(
        client,
        CheckpointStore::new(dir.path().join("checkpoint.json")),
        StagingStore::new(dir.path().join("staging.csv")),
        dir.path().join("dataset.csv"),
    )
    .with_page_delay(Duration::ZERO)
}

#[tokio::test]
async fn test_full_scrape_writes_deduplicated_dataset() {
    let server = MockServer::start().await;
    mount_count(&server, 250).await;
    mount_page(&server, 1, 250, 1..=100).await;
    mount_page(&server, 2, 250, 101..=200).await;
    mount_page(&server, 3, 250, 201..=250).await;

    let dir = TempDir::new().unwrap();
    let outcome = executor(&server, &dir).run().await.unwrap();

    let summary = match outcome {
        RunOutcome::Completed(summary) => summary,
        other => panic!("expected Completed, got {other:?}"),
    };
    assert_eq!(summary.records_fetched, 250);
    assert_eq!(summary.records_written, 250);
    assert_eq!(summary.duplicates_removed, 0);
    assert_eq!(summary.pages_failed, 0);

    let dataset = dir.path().join("dataset.csv");
    assert_eq!(npsn_set(&dataset), expected_npsns(1..=250));

    // The dataset carries a BOM and the canonical header order.
    let bytes = std::fs::read(&dataset).unwrap();
    assert_eq!(&bytes[..3], b"\xef\xbb\xbf");
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    assert!(text.starts_with("npsn,sekolah,bentuk,status,alamat_jalan"));

    // Run artifacts are cleaned up after finalization.
    assert!(!dir.path().join("checkpoint.json").exists());
    assert!(!dir.path().join("staging.csv").exists());
}

#[tokio::test]
async fn test_duplicate_npsn_across_pages_keeps_first() {
    let server = MockServer::start().await;
    mount_count(&server, 150).await;
    mount_page(&server, 1, 150, 1..=100).await;
    // Page 2 re-serves school 100 alongside the rest.
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("page", "2"))
        .and(query_param("perPage", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(150, 100..=150)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let outcome = executor(&server, &dir).run().await.unwrap();

    let summary = match outcome {
        RunOutcome::Completed(summary) => summary,
        other => panic!("expected Completed, got {other:?}"),
    };
    assert_eq!(summary.records_fetched, 151);
    assert_eq!(summary.records_written, 150);
    assert_eq!(summary.duplicates_removed, 1);

    assert_eq!(
        npsn_set(&dir.path().join("dataset.csv")),
        expected_npsns(1..=150)
    );
}

#[tokio::test]
async fn test_planning_abort_produces_no_output() {
    let server = MockServer::start().await;
    mount_count(&server, 0).await;

    let dir = TempDir::new().unwrap();
    let outcome = executor(&server, &dir).run().await.unwrap();

    assert!(matches!(outcome, RunOutcome::Aborted { .. }));
    assert!(!dir.path().join("dataset.csv").exists());
}

#[tokio::test]
async fn test_failed_page_degrades_and_run_completes() {
    let server = MockServer::start().await;
    mount_count(&server, 250).await;
    mount_page(&server, 1, 250, 1..=100).await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("page", "2"))
        .and(query_param("perPage", "100"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, 3, 250, 201..=250).await;

    let dir = TempDir::new().unwrap();
    let outcome = executor(&server, &dir).run().await.unwrap();

    let summary = match outcome {
        RunOutcome::Completed(summary) => summary,
        other => panic!("expected Completed, got {other:?}"),
    };
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.records_written, 150);

    let written = npsn_set(&dir.path().join("dataset.csv"));
    let mut expected = expected_npsns(1..=100);
    expected.extend(expected_npsns(201..=250));
    assert_eq!(written, expected);
}

#[tokio::test]
async fn test_projection_omits_columns_absent_from_data() {
    let server = MockServer::start().await;
    mount_count(&server, 2).await;
    // Records carry only a subset of the canonical columns.
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("page", "1"))
        .and(query_param("perPage", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "total_data": 2,
            "dataSekolah": [
                { "npsn": "00000001", "sekolah": "SD SATU" },
                { "npsn": "00000002", "sekolah": "SD DUA" },
            ],
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let outcome = executor(&server, &dir).run().await.unwrap();
    assert!(matches!(outcome, RunOutcome::Completed(_)));

    let bytes = std::fs::read(dir.path().join("dataset.csv")).unwrap();
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header, "npsn,sekolah");
}

#[tokio::test]
async fn test_pre_requested_shutdown_interrupts_before_first_page() {
    let server = MockServer::start().await;
    mount_count(&server, 250).await;

    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();

    let dir = TempDir::new().unwrap();
    let outcome = executor(&server, &dir)
        .with_shutdown(shutdown)
        .run()
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Interrupted));
    assert!(!dir.path().join("dataset.csv").exists());
    // Only the count probe reached the server; no page was fetched.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
