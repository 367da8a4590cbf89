//! Scrape configuration constants

use std::time::Duration;

/// Default base URL of the school registry API.
pub const DEFAULT_API_BASE: &str = "https://api-sekolah-indonesia.vercel.app/sekolah";

/// Records requested per page. 100 is the largest page the registry serves
/// reliably; larger values get silently truncated.
pub const DEFAULT_PER_PAGE: u64 = 100;

/// Maximum attempts per page request. Three attempts covers the registry's
/// occasional 5xx hiccups; a page that fails all attempts degrades to an
/// empty page rather than aborting the run.
pub const MAX_RETRIES: u32 = 3;

/// Delay between retry attempts. The registry rate-limits aggressively, so
/// the backoff is a flat 2 seconds rather than exponential.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Delay after every page, success or failure, to bound the request rate.
pub const PAGE_DELAY: Duration = Duration::from_millis(500);

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Flush checkpoint + staging every N pages.
pub const CHECKPOINT_INTERVAL_PAGES: u64 = 10;

/// Write an immutable backup snapshot every N pages. Backups are never
/// cleaned up automatically.
pub const BACKUP_INTERVAL_PAGES: u64 = 100;

/// Default path of the final dataset.
pub const DEFAULT_OUTPUT_FILE: &str = "data_sekolah_indonesia.csv";

/// Default path of the checkpoint file.
pub const DEFAULT_CHECKPOINT_FILE: &str = "scraping_checkpoint.json";

/// Default path of the staging file.
pub const DEFAULT_STAGING_FILE: &str = "temp_scraped_data.csv";

/// Compute the number of pages needed to cover `total_count` records.
pub fn total_pages(total_count: u64, page_size: u64) -> u64 {
    total_count.div_ceil(page_size)
}
