//! CLI error types and conversions

use crate::fetcher::FetcherError;
use crate::output::OutputError;
use crate::resume::ResumeError;
use crate::scrape::ScrapeError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Fetcher error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Scrape error
    #[error("scrape error: {0}")]
    ScrapeError(#[from] ScrapeError),

    /// Resume state error
    #[error("resume state error: {0}")]
    ResumeError(#[from] ResumeError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),
}
