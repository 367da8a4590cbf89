//! # Sekolah Scraper Library
//!
//! A resumable scraper for the Indonesian national school registry API.
//! Fetches the paginated record set one page at a time, accumulates it into a
//! deduplicated tabular dataset, and writes the result to a UTF-8 (with BOM)
//! CSV file.
//!
//! ## Features
//!
//! - **Resume Capability**: progress is checkpointed every few pages so an
//!   interrupted run can pick up where it left off without re-fetching
//!   already-staged pages
//! - **Retry with Backoff**: transient page failures are retried with a
//!   constant backoff and degrade to an empty page rather than aborting
//! - **Idempotent Output**: the final dataset is deduplicated by NPSN (the
//!   national school identifier) with first occurrence winning
//! - **Schemaless Records**: registry fields pass through verbatim; the
//!   output header is derived from the fields actually observed
//!
//! ## Quick Start
//!
//! ```no_run
//! use sekolah_scraper::fetcher::RegistryClient;
//! use sekolah_scraper::resume::{CheckpointStore, StagingStore};
//! use sekolah_scraper::scrape::ScrapeExecutor;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RegistryClient::new("https://api-sekolah-indonesia.vercel.app/sekolah")?;
//! let executor = ScrapeExecutor::new(
//!     client,
//!     CheckpointStore::new("scraping_checkpoint.json"),
//!     StagingStore::new("temp_scraped_data.csv"),
//!     "data_sekolah_indonesia.csv",
//! );
//! let outcome = executor.run().await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - HTTP access to the registry API (count probe + page fetch)
//! - [`scrape`] - Scrape orchestration: the page loop, flushing, finalization
//! - [`resume`] - Checkpoint and staging persistence for interrupted runs
//! - [`output`] - Dedup, column projection, and CSV dataset writing
//! - [`cli`] - Command-line front end
//! - [`shutdown`] - Cooperative interruption handling

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// CLI command implementation
pub mod cli;

/// Registry API access
pub mod fetcher;

/// Dataset finalization and CSV writing
pub mod output;

/// Checkpoint and staging persistence
pub mod resume;

/// Scrape orchestration
pub mod scrape;

/// Cooperative interruption handling
pub mod shutdown;

/// Canonical column order for the final dataset.
///
/// Columns absent from every fetched record are dropped at finalization;
/// fields outside this list are kept in staging but not in the final output.
pub const CANONICAL_COLUMNS: [&str; 14] = [
    "npsn",
    "sekolah",
    "bentuk",
    "status",
    "alamat_jalan",
    "kecamatan",
    "kabupaten_kota",
    "propinsi",
    "kode_kec",
    "kode_kab_kota",
    "kode_prop",
    "lintang",
    "bujur",
    "id",
];

/// One school entity as returned by the registry API.
///
/// The registry guarantees nothing about field presence, so a record is a
/// plain field map rather than a fixed struct. Values are kept verbatim as
/// JSON values until they are rendered into CSV cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchoolRecord(BTreeMap<String, Value>);

impl SchoolRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from field/value pairs.
    pub fn from_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Set a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Raw value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The NPSN identifier rendered as text, if present and non-null.
    ///
    /// NPSN is the dedup key for the final dataset. The registry serves it
    /// as a string, but numbers are tolerated since fields pass through
    /// without validation.
    pub fn npsn(&self) -> Option<String> {
        let cell = self.cell("npsn");
        if cell.is_empty() {
            None
        } else {
            Some(cell)
        }
    }

    /// Names of the fields present on this record.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether the record has a value for `field` (null counts as absent).
    pub fn has_field(&self, field: &str) -> bool {
        matches!(self.0.get(field), Some(v) if !v.is_null())
    }

    /// Render a field as a CSV cell. Missing and null fields become the
    /// empty string; scalars lose their JSON quoting.
    pub fn cell(&self, field: &str) -> String {
        match self.0.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
