//! Checkpoint and staging persistence
//!
//! A run's durable footprint is two files plus optional backups:
//!
//! - the checkpoint: a small JSON marker of how far the page loop got
//! - the staging file: a CSV dump of every record fetched so far
//! - numbered backup snapshots taken at coarse page boundaries
//!
//! Both stores are deliberately lenient on load — missing or corrupt state
//! is treated as absent, never raised — so a damaged file only costs
//! progress, not the ability to run. Both are deleted once the final
//! dataset has been written.

pub mod checkpoint;
pub mod staging;

pub use checkpoint::{Checkpoint, CheckpointStore};
pub use staging::StagingStore;

/// Errors related to resume state
#[derive(Debug, thiserror::Error)]
pub enum ResumeError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Staging table error
    #[error("staging error: {0}")]
    StagingError(String),
}
