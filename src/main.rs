//! Main entry point for the sekolah-scraper CLI

use clap::Parser;
use sekolah_scraper::cli::Cli;
use sekolah_scraper::shutdown::ShutdownCoordinator;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    // Check if JSON output is requested via environment variable
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sekolah_scraper=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    // The Ctrl+C listener only flips a flag; the scrape loop observes it at
    // the next page boundary and exits through its normal Interrupted path.
    let shutdown = ShutdownCoordinator::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - finishing current page, progress is saved");
                shutdown.request_shutdown();
            }
        }
    });

    if let Err(e) = cli.execute(shutdown).await {
        error!("Scrape failed: {}", e);
        eprintln!("\nError: {e}");
        eprintln!("Checkpoint and staging data may still be present; run again to resume.");
        std::process::exit(1);
    }
}
