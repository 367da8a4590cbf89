//! Checkpoint persistence for the page loop
//!
//! The checkpoint records "all pages up to and including `last_page` have
//! been durably staged". It is rewritten whole at every flush interval and
//! deleted on successful finalization.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::ResumeError;

/// Durable marker of fetch progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Highest page number that has been staged.
    pub last_page: u64,
    /// Total number of pages planned for the run.
    pub total_pages: u64,
    /// Number of records in the staging store at the time of writing.
    pub data_count: u64,
    /// ISO-8601 time this checkpoint was written.
    pub timestamp: String,
}

impl Checkpoint {
    /// Create a checkpoint stamped with the current time.
    pub fn new(last_page: u64, total_pages: u64, data_count: u64) -> Self {
        Self {
            last_page,
            total_pages,
            data_count,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// File-backed store for the run checkpoint.
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Create a store backed by the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the checkpoint, replacing any previous one.
    ///
    /// Writes to a temp file in the same directory and renames it into
    /// place so a process kill mid-write leaves the previous checkpoint
    /// intact.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), ResumeError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ResumeError::IoError(e.to_string()))?;
            }
        }

        let json = serde_json::to_string_pretty(checkpoint)
            .map_err(|e| ResumeError::SerializationError(e.to_string()))?;

        let parent_dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
            .map_err(|e| ResumeError::IoError(format!("Failed to create temp file: {e}")))?;

        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| ResumeError::IoError(format!("Failed to write to temp file: {e}")))?;
        temp_file
            .flush()
            .map_err(|e| ResumeError::IoError(format!("Failed to flush temp file: {e}")))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| ResumeError::IoError(format!("Failed to sync temp file: {e}")))?;

        temp_file
            .persist(&self.path)
            .map_err(|e| ResumeError::IoError(format!("Failed to persist temp file: {e}")))?;

        debug!(
            path = %self.path.display(),
            last_page = checkpoint.last_page,
            data_count = checkpoint.data_count,
            "checkpoint saved"
        );
        Ok(())
    }

    /// Load the checkpoint, if one exists.
    ///
    /// Missing and unreadable files are both `None`: corrupt local state is
    /// treated as absent so a damaged checkpoint only restarts the run
    /// instead of wedging it.
    pub fn load(&self) -> Option<Checkpoint> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(checkpoint) => Some(checkpoint),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "checkpoint unreadable, treating as absent"
                );
                None
            }
        }
    }

    /// Delete the checkpoint file if present.
    pub fn clear(&self) -> Result<(), ResumeError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| ResumeError::IoError(e.to_string()))?;
            debug!(path = %self.path.display(), "checkpoint cleared");
        }
        Ok(())
    }
}
