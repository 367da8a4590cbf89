//! CLI command implementation

pub mod error;
pub mod scrape;

pub use error::CliError;
pub use scrape::{Cli, ResumeMode};
