//! CSV table codec, dedup, and column projection
//!
//! All tabular artifacts (staging, backups, final dataset) share one format:
//! UTF-8 with a byte-order mark, comma-delimited, header row first. The BOM
//! matches the upstream dataset convention so spreadsheet tools pick the
//! encoding up correctly.

use csv::{ReaderBuilder, WriterBuilder};
use serde_json::Value;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputResult};
use crate::{SchoolRecord, CANONICAL_COLUMNS};

/// UTF-8 byte-order mark written at the start of every tabular file.
const BOM: &[u8] = b"\xef\xbb\xbf";

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// Union of all fields observed across `records`: canonical columns first
/// (in canonical order), then any extra fields in name order.
///
/// Used for the staging header, which must not lose fields the final
/// projection would drop.
pub fn superset_columns(records: &[SchoolRecord]) -> Vec<String> {
    let observed: HashSet<&str> = records
        .iter()
        .flat_map(|record| record.field_names())
        .collect();

    let mut columns: Vec<String> = CANONICAL_COLUMNS
        .iter()
        .filter(|column| observed.contains(**column))
        .map(|column| column.to_string())
        .collect();

    let mut extras: Vec<String> = observed
        .iter()
        .filter(|field| !CANONICAL_COLUMNS.contains(*field))
        .map(|field| field.to_string())
        .collect();
    extras.sort();
    columns.extend(extras);

    columns
}

/// Canonical columns that appear in at least one record, in canonical order.
///
/// Columns absent from all input records are simply omitted — no null-filled
/// placeholder column is produced. Fields outside the canonical list are
/// dropped from the final dataset.
pub fn project_columns(records: &[SchoolRecord]) -> Vec<String> {
    let observed: HashSet<&str> = records
        .iter()
        .flat_map(|record| record.field_names())
        .collect();

    CANONICAL_COLUMNS
        .iter()
        .filter(|column| observed.contains(**column))
        .map(|column| column.to_string())
        .collect()
}

/// Drop records whose NPSN was already seen, keeping the first occurrence.
///
/// Records without an NPSN dedup among themselves the same way. Returns the
/// surviving records and the number removed.
pub fn dedup_by_npsn(records: Vec<SchoolRecord>) -> (Vec<SchoolRecord>, usize) {
    let initial = records.len();
    let mut seen: HashSet<Option<String>> = HashSet::new();
    let unique: Vec<SchoolRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.npsn()))
        .collect();

    let removed = initial - unique.len();
    if removed > 0 {
        debug!(removed, "dropped duplicate records by npsn");
    }
    (unique, removed)
}

/// Write `records` to `path` as a whole-file rewrite with the given columns.
pub fn write_table(path: &Path, columns: &[String], records: &[SchoolRecord]) -> OutputResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;
        }
    }

    let file = File::create(path)
        .map_err(|e| OutputError::IoError(format!("Failed to create file: {e}")))?;
    let mut buf_writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);
    buf_writer
        .write_all(BOM)
        .map_err(|e| OutputError::IoError(format!("Failed to write BOM: {e}")))?;

    let mut writer = WriterBuilder::new().from_writer(buf_writer);
    writer
        .write_record(columns)
        .map_err(|e| OutputError::CsvError(format!("Failed to write header: {e}")))?;

    for record in records {
        let row: Vec<String> = columns.iter().map(|column| record.cell(column)).collect();
        writer
            .write_record(&row)
            .map_err(|e| OutputError::CsvError(format!("Failed to write row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| OutputError::FlushError(format!("Failed to flush: {e}")))?;

    let buf_writer = writer
        .into_inner()
        .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {e}")))?;
    let file = buf_writer
        .into_inner()
        .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {e}")))?;
    file.sync_all()
        .map_err(|e| OutputError::IoError(format!("Failed to sync file: {e}")))?;

    info!(
        path = %path.display(),
        rows = records.len(),
        columns = columns.len(),
        "table written"
    );
    Ok(())
}

/// Read a table previously written by [`write_table`] back into records.
///
/// Empty cells are treated as absent fields, not empty-string values, so a
/// staging round trip preserves which fields a record actually had.
pub fn read_table(path: &Path) -> OutputResult<Vec<SchoolRecord>> {
    let bytes = std::fs::read(path)
        .map_err(|e| OutputError::IoError(format!("Failed to open file: {e}")))?;

    // Skip the BOM if present; csv does not strip it from the first header.
    let body = bytes.strip_prefix(BOM).unwrap_or(&bytes);

    let mut csv_reader = ReaderBuilder::new().from_reader(body);

    let header: Vec<String> = csv_reader
        .headers()
        .map_err(|e| OutputError::CsvError(format!("Failed to read header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row.map_err(|e| OutputError::CsvError(format!("Failed to read row: {e}")))?;
        let mut record = SchoolRecord::new();
        for (column, cell) in header.iter().zip(row.iter()) {
            if !cell.is_empty() {
                record.insert(column.clone(), Value::String(cell.to_string()));
            }
        }
        records.push(record);
    }

    Ok(records)
}
