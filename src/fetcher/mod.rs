//! Registry API access
//!
//! Two operations against the paginated registry endpoint: a one-shot count
//! probe used for page planning, and a retried page fetch. Both degrade
//! rather than abort — the count probe returns 0 on failure (the caller
//! treats that as "unable to proceed"), and an exhausted page fetch returns
//! an empty page so the run can continue.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::scrape::config::{MAX_RETRIES, REQUEST_TIMEOUT, RETRY_BACKOFF};
use crate::SchoolRecord;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Request-level fault (timeout, connection error)
    #[error("network error: {0}")]
    NetworkError(String),

    /// Non-success HTTP status
    #[error("unexpected status {0}")]
    StatusError(u16),

    /// Malformed response payload
    #[error("parse error: {0}")]
    ParseError(String),

    /// HTTP client construction failed
    #[error("client error: {0}")]
    ClientError(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// One page of the registry response.
#[derive(Debug, Deserialize)]
struct PageResponse {
    /// Declared size of the full record set. Absent on some error bodies.
    #[serde(default)]
    total_data: Option<u64>,

    /// The records for this page.
    #[serde(default, rename = "dataSekolah")]
    data_sekolah: Vec<SchoolRecord>,
}

/// HTTP client for the school registry API.
pub struct RegistryClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl RegistryClient {
    /// Create a client for the given base URL with a bounded request timeout.
    pub fn new(base_url: impl Into<String>) -> FetcherResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FetcherError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            max_retries: MAX_RETRIES,
            retry_backoff: RETRY_BACKOFF,
        })
    }

    /// Set maximum attempts per page request.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Override the delay between retry attempts.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Query the declared total record count with a minimal one-record page.
    ///
    /// Single attempt, no retry: a transient failure here returns 0, which
    /// the orchestrator treats as "unable to plan" and aborts the run.
    pub async fn total_count(&self) -> u64 {
        match self.request_page(1, 1).await {
            Ok(response) => response.total_data.unwrap_or_else(|| {
                warn!("count probe response carried no total_data field");
                0
            }),
            Err(e) => {
                warn!(error = %e, "count probe failed");
                0
            }
        }
    }

    /// Fetch one page of records.
    ///
    /// Up to `max_retries` attempts with a constant backoff between them.
    /// A 200 response with an empty `dataSekolah` array is a genuine empty
    /// page and is returned as-is without retrying. Exhausting all attempts
    /// returns an empty page; the failure is logged, not raised.
    pub async fn fetch_page(&self, page: u64, page_size: u64) -> Vec<SchoolRecord> {
        for attempt in 1..=self.max_retries {
            match self.request_page(page, page_size).await {
                Ok(response) => {
                    debug!(
                        page,
                        records = response.data_sekolah.len(),
                        attempt,
                        "page fetched"
                    );
                    return response.data_sekolah;
                }
                Err(e) => {
                    warn!(
                        page,
                        attempt,
                        max_attempts = self.max_retries,
                        error = %e,
                        "page request failed"
                    );
                    if attempt < self.max_retries {
                        sleep(self.retry_backoff).await;
                    }
                }
            }
        }

        warn!(page, "giving up on page after retries");
        Vec::new()
    }

    async fn request_page(&self, page: u64, page_size: u64) -> FetcherResult<PageResponse> {
        let params = [("page", page.to_string()), ("perPage", page_size.to_string())];

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| FetcherError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetcherError::StatusError(status.as_u16()));
        }

        response
            .json::<PageResponse>()
            .await
            .map_err(|e| FetcherError::ParseError(e.to_string()))
    }
}
