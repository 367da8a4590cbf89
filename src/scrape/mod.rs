//! Scrape orchestration
//!
//! Drives the complete scrape workflow:
//!
//! 1. **Resume decision**: load any prior checkpoint and ask the injected
//!    decision function whether to continue from it
//! 2. **Planning**: probe the registry for the total record count and
//!    compute the page range
//! 3. **Fetching**: walk the pages in order, flushing checkpoint + staging
//!    at a fixed interval and taking backup snapshots at a coarser one
//! 4. **Finalization**: dedup by NPSN, project to the canonical columns,
//!    write the final dataset, delete checkpoint and staging
//!
//! The orchestrator never panics its way out of a run: planning failure and
//! operator interruption come back as [`RunOutcome`] variants, and only
//! local-state IO failures surface as [`ScrapeError`].

pub mod config;
pub mod executor;

pub use executor::{ResumeDecision, RunOutcome, RunSummary, ScrapeExecutor};

use crate::output::OutputError;
use crate::resume::ResumeError;

/// Scrape errors
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Checkpoint or staging persistence failed
    #[error("resume state error: {0}")]
    ResumeError(#[from] ResumeError),

    /// Final dataset could not be written
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),
}
