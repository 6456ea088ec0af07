//! Writers for flattened records: CSV for spreadsheets, JSON for everything
//! else. Both take the records produced by [`crate::flatten::normalize`] and
//! an output sink, so tests can write to memory and the binary to disk.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::dataset::FlatRecord;

#[derive(Debug, Error)]
pub enum OutputError {
    /// A record's dimension names differ from the first record's. Every row
    /// of a CSV shares one header, so mixed record shapes cannot be written.
    #[error("record {row}: columns {found:?} do not match header {header:?}")]
    ColumnMismatch {
        row: usize,
        header: Vec<String>,
        found: Vec<String>,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write `records` as CSV: one column per dimension plus a trailing `value`
/// column, blank cells for missing values. Writes nothing when `records` is
/// empty.
pub fn write_csv<W: Write>(records: &[FlatRecord], writer: W) -> Result<(), OutputError> {
    let Some(first) = records.first() else {
        return Ok(());
    };

    let mut wtr = csv::Writer::from_writer(writer);

    let header: Vec<&str> = first.columns().chain(std::iter::once("value")).collect();
    wtr.write_record(&header)?;

    for (row, record) in records.iter().enumerate() {
        if !record.columns().eq(first.columns()) {
            return Err(OutputError::ColumnMismatch {
                row,
                header: first.columns().map(str::to_string).collect(),
                found: record.columns().map(str::to_string).collect(),
            });
        }

        let value_cell = record.value().map(|v| v.to_string()).unwrap_or_default();
        let cells: Vec<String> = record
            .labels()
            .map(str::to_string)
            .chain(std::iter::once(value_cell))
            .collect();
        wtr.write_record(&cells)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write `records` as a pretty-printed JSON array of objects.
pub fn write_json<W: Write>(records: &[FlatRecord], writer: W) -> Result<(), OutputError> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

pub fn write_csv_path(records: &[FlatRecord], path: &Path) -> Result<(), OutputError> {
    let file = create_output_file(path)?;
    write_csv(records, BufWriter::new(file))?;
    debug!(path = %path.display(), rows = records.len(), "wrote csv");
    Ok(())
}

pub fn write_json_path(records: &[FlatRecord], path: &Path) -> Result<(), OutputError> {
    let file = create_output_file(path)?;
    write_json(records, BufWriter::new(file))?;
    debug!(path = %path.display(), rows = records.len(), "wrote json");
    Ok(())
}

fn create_output_file(path: &Path) -> Result<File, OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}
