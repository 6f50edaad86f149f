//! Sample loading from CSV files
//!
//! Each group lives in its own CSV file with a header row. One named column
//! (by default `Purchase`) is read as the sample; empty cells and common
//! missing-value markers are dropped.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::{AbTestError, Result};
use crate::sample::Sample;

/// Column read when none is specified
pub const DEFAULT_COLUMN: &str = "Purchase";

/// Cell contents treated as missing (compared case-insensitively)
const MISSING_MARKERS: [&str; 5] = ["na", "n/a", "nan", "null", "none"];

/// Load one column of a CSV file as a sample
///
/// # Errors
///
/// - [`AbTestError::Io`] / [`AbTestError::Csv`] if the file cannot be read
/// - [`AbTestError::InvalidInput`] if the column does not exist
/// - [`AbTestError::Parse`] if a present cell is not a number
pub fn load_column(path: &Path, column: &str) -> Result<Sample> {
    let file = std::fs::File::open(path)?;
    let sample = read_column(file, column)?;
    debug!(
        path = %path.display(),
        column,
        n = sample.len(),
        "loaded sample"
    );
    Ok(sample)
}

/// Read one column from CSV data with a header row
///
/// # Errors
///
/// See [`load_column`].
pub fn read_column<R: Read>(reader: R, column: &str) -> Result<Sample> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let index = reader
        .headers()?
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| AbTestError::invalid(format!("column '{column}' not found")))?;

    let mut cells = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let raw = record.get(index).unwrap_or("");
        cells.push(parse_cell(raw, row + 1, column)?);
    }

    Sample::from_optional(cells)
}

fn parse_cell(raw: &str, row: usize, column: &str) -> Result<Option<f64>> {
    if raw.is_empty() || MISSING_MARKERS.iter().any(|m| raw.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|_| AbTestError::Parse {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}
