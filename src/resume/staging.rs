//! Staging persistence for fetched-but-not-finalized records
//!
//! The staging file is a full rewrite of the entire in-memory accumulation
//! at every flush, not an append log. A kill mid-write can therefore corrupt
//! at most the current rewrite; the previous flush (or backup snapshot)
//! still covers everything up to the last checkpoint.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::ResumeError;
use crate::output::csv::{read_table, superset_columns, write_table};
use crate::SchoolRecord;

/// File-backed store for the staged record accumulation.
pub struct StagingStore {
    path: PathBuf,
}

impl StagingStore {
    /// Create a store backed by the given path. Backups land next to it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize the full accumulation, replacing any previous staging file.
    ///
    /// The header is the superset of fields observed across all records, so
    /// nothing fetched is lost even if it falls outside the canonical
    /// output columns.
    pub fn save_records(&self, records: &[SchoolRecord]) -> Result<(), ResumeError> {
        let columns = superset_columns(records);
        write_table(&self.path, &columns, records)
            .map_err(|e| ResumeError::StagingError(e.to_string()))?;
        debug!(
            path = %self.path.display(),
            records = records.len(),
            "staging flushed"
        );
        Ok(())
    }

    /// Load previously staged records.
    ///
    /// Missing or unreadable staging is an empty accumulation, never an
    /// error — the run restarts from whatever the checkpoint claims.
    pub fn load_records(&self) -> Vec<SchoolRecord> {
        if !self.path.exists() {
            return Vec::new();
        }
        match read_table(&self.path) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "staging unreadable, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Write an immutable backup snapshot named by page number.
    ///
    /// Backups are never deleted by the scraper; they are the operator's
    /// safety net if both the staging file and a later run go wrong.
    pub fn write_backup(
        &self,
        page: u64,
        records: &[SchoolRecord],
    ) -> Result<PathBuf, ResumeError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let backup_path = dir.join(format!("backup_page_{page}.csv"));

        let columns = superset_columns(records);
        write_table(&backup_path, &columns, records)
            .map_err(|e| ResumeError::StagingError(e.to_string()))?;

        info!(
            path = %backup_path.display(),
            records = records.len(),
            "backup snapshot written"
        );
        Ok(backup_path)
    }

    /// Delete the staging file if present. Backups are left alone.
    pub fn clear(&self) -> Result<(), ResumeError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| ResumeError::IoError(e.to_string()))?;
            debug!(path = %self.path.display(), "staging cleared");
        }
        Ok(())
    }
}
