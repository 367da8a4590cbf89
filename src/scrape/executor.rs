//! Scrape executor: the resumable page loop and finalization

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::config::{BACKUP_INTERVAL_PAGES, CHECKPOINT_INTERVAL_PAGES, PAGE_DELAY};
use super::ScrapeError;
use crate::fetcher::RegistryClient;
use crate::output::{dedup_by_npsn, project_columns, write_table};
use crate::resume::{Checkpoint, CheckpointStore, StagingStore};
use crate::shutdown::SharedShutdown;
use crate::SchoolRecord;

/// Injected resume decision: shown the found checkpoint, answers whether to
/// continue from it. The CLI wires this to a stdin prompt; tests pass
/// closures.
pub type ResumeDecision = Box<dyn Fn(&Checkpoint) -> bool + Send + Sync>;

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The full page range was processed and the dataset written.
    Completed(RunSummary),
    /// Planning failed before any page was fetched. Existing checkpoint and
    /// staging are left intact for a future attempt.
    Aborted {
        /// Why the run could not proceed.
        reason: String,
    },
    /// An operator interrupt was observed mid-loop. Whatever was flushed at
    /// the last checkpoint boundary is preserved for resumption.
    Interrupted,
}

/// Counters for a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Records accumulated before deduplication (including staged ones).
    pub records_fetched: usize,
    /// Records in the final dataset.
    pub records_written: usize,
    /// Duplicates dropped at finalization.
    pub duplicates_removed: usize,
    /// Pages that yielded no records (genuinely empty or failed retries).
    pub pages_failed: u64,
    /// Where the final dataset was written.
    pub output_path: PathBuf,
}

/// Orchestrates a resumable scrape of the full registry.
pub struct ScrapeExecutor {
    client: RegistryClient,
    checkpoints: CheckpointStore,
    staging: StagingStore,
    output_path: PathBuf,
    page_size: u64,
    page_delay: Duration,
    flush_interval: u64,
    backup_interval: u64,
    resume: bool,
    should_resume: ResumeDecision,
    shutdown: Option<SharedShutdown>,
    progress: bool,
}

impl ScrapeExecutor {
    /// Create an executor with default pacing and a resume decision that
    /// always accepts.
    pub fn new(
        client: RegistryClient,
        checkpoints: CheckpointStore,
        staging: StagingStore,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            checkpoints,
            staging,
            output_path: output_path.into(),
            page_size: super::config::DEFAULT_PER_PAGE,
            page_delay: PAGE_DELAY,
            flush_interval: CHECKPOINT_INTERVAL_PAGES,
            backup_interval: BACKUP_INTERVAL_PAGES,
            resume: true,
            should_resume: Box::new(|_| true),
            shutdown: None,
            progress: false,
        }
    }

    /// Set the page size used for planning and fetching.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Override the fixed inter-page delay.
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Override how often checkpoint + staging are flushed (in pages).
    pub fn with_flush_interval(mut self, pages: u64) -> Self {
        self.flush_interval = pages.max(1);
        self
    }

    /// Override how often backup snapshots are taken (in pages).
    pub fn with_backup_interval(mut self, pages: u64) -> Self {
        self.backup_interval = pages.max(1);
        self
    }

    /// Enable or disable resuming from a prior checkpoint entirely.
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Inject the resume decision consulted when a checkpoint is found.
    pub fn with_resume_decision(mut self, decision: ResumeDecision) -> Self {
        self.should_resume = decision;
        self
    }

    /// Attach a shared shutdown handle polled once per page.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Show an interactive progress bar over the page range.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Run the scrape to completion, interruption, or abort.
    ///
    /// Only checkpoint/staging/output IO failures come back as `Err`; every
    /// network-level problem is degraded or retried below this boundary.
    pub async fn run(&self) -> Result<RunOutcome, ScrapeError> {
        let mut records: Vec<SchoolRecord> = Vec::new();
        let mut start_page: u64 = 1;

        if self.resume {
            if let Some(checkpoint) = self.checkpoints.load() {
                if (self.should_resume)(&checkpoint) {
                    start_page = checkpoint.last_page + 1;
                    records = self.staging.load_records();
                    info!(
                        start_page,
                        staged = records.len(),
                        checkpoint_timestamp = %checkpoint.timestamp,
                        "resuming from checkpoint"
                    );
                } else {
                    info!("checkpoint declined, starting from scratch");
                    self.checkpoints.clear()?;
                    self.staging.clear()?;
                }
            }
        }

        let total_count = self.client.total_count().await;
        if total_count == 0 {
            warn!("could not determine total record count, aborting run");
            return Ok(RunOutcome::Aborted {
                reason: "could not determine total record count".to_string(),
            });
        }

        let total_pages = super::config::total_pages(total_count, self.page_size);
        info!(
            total_count,
            total_pages, start_page, "scrape planned"
        );

        let bar = self.create_progress_bar(start_page, total_pages);

        let mut pages_failed: u64 = 0;
        for page in start_page..=total_pages {
            if let Some(shutdown) = &self.shutdown {
                if shutdown.is_shutdown_requested() {
                    if let Some(bar) = &bar {
                        bar.abandon();
                    }
                    info!(page, "interrupt observed, stopping run");
                    return Ok(RunOutcome::Interrupted);
                }
            }

            let page_records = self.client.fetch_page(page, self.page_size).await;
            if page_records.is_empty() {
                // Failed and genuinely-empty pages are indistinguishable
                // here; both advance the checkpoint (see DESIGN.md).
                warn!(page, "no data obtained for page");
                pages_failed += 1;
            } else {
                records.extend(page_records);
            }

            if let Some(bar) = &bar {
                bar.inc(1);
                bar.set_message(format!("{} records", records.len()));
            }

            if page % self.flush_interval == 0 {
                self.checkpoints
                    .save(&Checkpoint::new(page, total_pages, records.len() as u64))?;
                self.staging.save_records(&records)?;
                debug!(page, staged = records.len(), "progress flushed");
            }

            if page % self.backup_interval == 0 {
                self.staging.write_backup(page, &records)?;
            }

            sleep(self.page_delay).await;
        }

        if let Some(bar) = &bar {
            bar.finish_and_clear();
        }

        self.finalize(records, pages_failed).map(RunOutcome::Completed)
    }

    /// Dedup, project, write the final dataset, and clean up run artifacts.
    fn finalize(
        &self,
        records: Vec<SchoolRecord>,
        pages_failed: u64,
    ) -> Result<RunSummary, ScrapeError> {
        let records_fetched = records.len();
        let (unique, duplicates_removed) = dedup_by_npsn(records);
        let columns = project_columns(&unique);
        write_table(&self.output_path, &columns, &unique)?;

        self.checkpoints.clear()?;
        self.staging.clear()?;

        info!(
            records_written = unique.len(),
            duplicates_removed,
            pages_failed,
            path = %self.output_path.display(),
            "scrape finalized"
        );

        Ok(RunSummary {
            records_fetched,
            records_written: unique.len(),
            duplicates_removed,
            pages_failed,
            output_path: self.output_path.clone(),
        })
    }

    fn create_progress_bar(&self, start_page: u64, total_pages: u64) -> Option<ProgressBar> {
        if !self.progress {
            return None;
        }
        let remaining = (total_pages + 1).saturating_sub(start_page);
        let bar = ProgressBar::new(remaining);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({percent}%) {msg}",
                )
                .expect("hardcoded template is valid")
                .progress_chars("#>-"),
        );
        Some(bar)
    }
}
