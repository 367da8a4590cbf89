//! Scrape command: argument parsing, the resume prompt, and reporting

use clap::Parser;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info};

use super::CliError;
use crate::fetcher::RegistryClient;
use crate::output::read_table;
use crate::resume::{Checkpoint, CheckpointStore, StagingStore};
use crate::scrape::config::{
    DEFAULT_API_BASE, DEFAULT_CHECKPOINT_FILE, DEFAULT_OUTPUT_FILE, DEFAULT_PER_PAGE,
    DEFAULT_STAGING_FILE, MAX_RETRIES,
};
use crate::scrape::{RunOutcome, RunSummary, ScrapeExecutor};
use crate::shutdown::SharedShutdown;
use crate::SchoolRecord;

/// Resume modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeMode {
    /// Resume from a checkpoint if one is found (after confirmation)
    On,
    /// Ignore any existing checkpoint
    Off,
    /// Delete checkpoint and staging, then start fresh
    Reset,
}

impl FromStr for ResumeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "on" => Ok(ResumeMode::On),
            "off" => Ok(ResumeMode::Off),
            "reset" => Ok(ResumeMode::Reset),
            _ => Err(format!("Invalid resume mode: {s}. Valid options: on, off, reset")),
        }
    }
}

/// Sekolah Scraper CLI
#[derive(Parser, Debug)]
#[command(name = "sekolah-scraper")]
#[command(about = "Scrape the Indonesian school registry into a CSV dataset", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Registry API base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub base_url: String,

    /// Records requested per page
    #[arg(long, default_value_t = DEFAULT_PER_PAGE, value_parser = clap::value_parser!(u64).range(1..=1000))]
    pub per_page: u64,

    /// Final dataset path
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Checkpoint file path
    #[arg(long, default_value = DEFAULT_CHECKPOINT_FILE)]
    pub checkpoint_file: PathBuf,

    /// Staging file path (backup snapshots land next to it)
    #[arg(long, default_value = DEFAULT_STAGING_FILE)]
    pub staging_file: PathBuf,

    /// Resume mode: on, off, or reset
    #[arg(long, default_value = "on")]
    pub resume: ResumeMode,

    /// Answer yes to the resume prompt automatically
    #[arg(long, default_value_t = false)]
    pub yes: bool,

    /// Maximum attempts per page request
    #[arg(long, default_value_t = MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_retries: u32,

    /// Delay between page requests in milliseconds
    #[arg(long, default_value_t = 500)]
    pub page_delay_ms: u64,
}

impl Cli {
    /// Run the scrape and report the outcome.
    ///
    /// Planning failure and operator interruption are reported, not raised;
    /// only IO-level failures bubble up to the caller.
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<(), CliError> {
        println!("Sekolah Scraper - Indonesian school registry");
        println!("Output: {}", self.output.display());

        let client = RegistryClient::new(&self.base_url)?.with_max_retries(self.max_retries);
        let checkpoints = CheckpointStore::new(&self.checkpoint_file);
        let staging = StagingStore::new(&self.staging_file);

        if self.resume == ResumeMode::Reset {
            info!("reset requested, clearing checkpoint and staging");
            checkpoints.clear()?;
            staging.clear()?;
        }

        let decision: crate::scrape::ResumeDecision = if self.yes {
            Box::new(|checkpoint: &Checkpoint| {
                describe_checkpoint(checkpoint);
                println!("Resuming automatically (--yes).");
                true
            })
        } else {
            Box::new(prompt_resume)
        };

        let executor = ScrapeExecutor::new(client, checkpoints, staging, &self.output)
            .with_page_size(self.per_page)
            .with_page_delay(Duration::from_millis(self.page_delay_ms))
            .with_resume(self.resume == ResumeMode::On)
            .with_resume_decision(decision)
            .with_shutdown(shutdown)
            .with_progress(true);

        match executor.run().await? {
            RunOutcome::Completed(summary) => {
                report_completion(&summary);
                Ok(())
            }
            RunOutcome::Aborted { reason } => {
                eprintln!("\nScrape aborted: {reason}");
                eprintln!("Any existing checkpoint was left in place for a later attempt.");
                Ok(())
            }
            RunOutcome::Interrupted => {
                println!("\nScrape interrupted.");
                println!("Checkpoint and staging data are preserved.");
                println!("Run again to resume from the last flush.");
                Ok(())
            }
        }
    }
}

fn describe_checkpoint(checkpoint: &Checkpoint) {
    println!("\nCheckpoint found!");
    println!("   Last page: {}/{}", checkpoint.last_page, checkpoint.total_pages);
    println!("   Records staged: {}", checkpoint.data_count);
    println!("   Timestamp: {}", checkpoint.timestamp);
}

/// The real stdin resume prompt. Anything other than `y` declines, which
/// deletes the prior checkpoint and staging.
fn prompt_resume(checkpoint: &Checkpoint) -> bool {
    describe_checkpoint(checkpoint);
    print!("\nResume from checkpoint? (y/n): ");
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        error!("could not read resume answer, starting from scratch");
        return false;
    }
    answer.trim().eq_ignore_ascii_case("y")
}

fn report_completion(summary: &RunSummary) {
    println!("\nScrape completed successfully!");
    println!("Output: {}", summary.output_path.display());
    println!("Records written: {}", summary.records_written);
    if summary.duplicates_removed > 0 {
        println!("Duplicates removed: {}", summary.duplicates_removed);
    }
    if summary.pages_failed > 0 {
        println!("Pages with no data: {}", summary.pages_failed);
    }

    // Statistics are read back from the written dataset so they reflect
    // exactly what landed on disk.
    match read_table(&summary.output_path) {
        Ok(records) => print_statistics(&records),
        Err(e) => error!(error = %e, "could not read dataset back for statistics"),
    }
}

fn print_statistics(records: &[SchoolRecord]) {
    if records.is_empty() {
        return;
    }

    println!("\n{}", "=".repeat(60));
    println!("DATASET STATISTICS");
    println!("{}", "=".repeat(60));
    println!("Total schools: {}", records.len());
    println!("Columns: {}", crate::output::superset_columns(records).len());

    if records.iter().any(|r| r.has_field("bentuk")) {
        println!("\nBy level:");
        for (level, count) in count_by(records, "bentuk") {
            let percentage = (count as f64 / records.len() as f64) * 100.0;
            println!("   {level:5} : {count:7} schools ({percentage:5.2}%)");
        }
    }

    if records.iter().any(|r| r.has_field("status")) {
        println!("\nBy status:");
        for (status, count) in count_by(records, "status") {
            let status_name = if status == "N" { "Negeri" } else { "Swasta" };
            let percentage = (count as f64 / records.len() as f64) * 100.0;
            println!("   {status_name:7} : {count:7} schools ({percentage:5.2}%)");
        }
    }

    if records.iter().any(|r| r.has_field("propinsi")) {
        println!("\nTop 10 provinces:");
        for (i, (province, count)) in count_by(records, "propinsi").into_iter().take(10).enumerate()
        {
            println!("   {:2}. {province:30} : {count:6} schools", i + 1);
        }
    }

    println!("\n{}", "=".repeat(60));
}

/// Count non-empty values of `field`, most frequent first.
fn count_by(records: &[SchoolRecord], field: &str) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        let value = record.cell(field);
        if !value.is_empty() {
            *counts.entry(value).or_insert(0) += 1;
        }
    }
    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}
