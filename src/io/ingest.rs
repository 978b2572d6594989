//! Delimited-text ingest.
//!
//! Turns a data file into typed numeric columns and an events file into an
//! [`EventsTable`]. Everything is validated once, here:
//!
//! - the delimiter is sniffed from the header line (`,` first, then `;`)
//! - header names are trimmed and a UTF-8 BOM is stripped
//! - required columns must exist (schema error otherwise)
//! - every cell of a required column must parse as a finite number; the
//!   error carries the 1-based file line
//!
//! No fitting logic lives here.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::FitError;
use crate::fit::EventsTable;

/// Pick the field delimiter from a header line.
pub fn detect_delimiter(header: &str) -> Result<u8, FitError> {
    if header.contains(',') {
        Ok(b',')
    } else if header.contains(';') {
        Ok(b';')
    } else {
        Err(FitError::FileFormat {
            path: String::new(),
            reason: format!("no `,` or `;` delimiter in header line `{}`", header.trim()),
        })
    }
}

/// Read the first line of `path` and detect its delimiter.
pub fn sniff_delimiter(path: &Path) -> Result<u8, FitError> {
    let file = open(path)?;
    let mut header = String::new();
    BufReader::new(file)
        .read_line(&mut header)
        .map_err(|source| FitError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    detect_delimiter(&header).map_err(|e| match e {
        FitError::FileFormat { reason, .. } => FitError::FileFormat {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })
}

/// Numeric columns loaded from a data file.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: HashMap<String, Vec<f64>>,
    len: usize,
}

impl DataTable {
    /// Samples per column.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn column(&self, name: &str) -> Result<&[f64], FitError> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| FitError::Schema(format!("column `{name}` was not loaded")))
    }
}

/// Load the `required` columns of a data file as `f64`.
pub fn load_data_table(path: &Path, required: &[String]) -> Result<DataTable, FitError> {
    let delimiter = sniff_delimiter(path)?;
    let mut reader = reader(path, delimiter)?;
    let headers = read_headers(&mut reader, path)?;
    let header_map = build_header_map(&headers);

    let mut indices = Vec::with_capacity(required.len());
    for name in required {
        let idx = header_map.get(name.as_str()).ok_or_else(|| {
            FitError::Schema(format!(
                "missing column `{name}` in {} (available: {})",
                path.display(),
                headers.join(", ")
            ))
        })?;
        indices.push((name.clone(), *idx));
    }

    let mut columns: HashMap<String, Vec<f64>> =
        required.iter().map(|name| (name.clone(), Vec::new())).collect();
    let mut len = 0usize;

    for (row, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = row + 2;
        let record = result.map_err(|e| file_format(path, format!("line {line}: {e}")))?;

        for (name, idx) in &indices {
            let cell = record.get(*idx).map(str::trim).unwrap_or("");
            let value = parse_cell(cell)
                .ok_or_else(|| file_format(path, format!("line {line}: column `{name}`: invalid number `{cell}`")))?;
            if let Some(col) = columns.get_mut(name) {
                col.push(value);
            }
        }
        len += 1;
    }

    tracing::debug!(path = %path.display(), rows = len, columns = required.len(), "data table loaded");
    Ok(DataTable { columns, len })
}

/// Load an events file as raw strings.
pub fn load_events_table(path: &Path) -> Result<EventsTable, FitError> {
    let delimiter = sniff_delimiter(path)?;
    let mut reader = reader(path, delimiter)?;
    let headers = read_headers(&mut reader, path)?;

    let mut rows = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let line = row + 2;
        let record = result.map_err(|e| file_format(path, format!("line {line}: {e}")))?;
        rows.push(record.iter().map(|s| s.trim().to_string()).collect());
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "events table loaded");
    Ok(EventsTable::new(headers, rows))
}

fn open(path: &Path) -> Result<File, FitError> {
    File::open(path).map_err(|source| FitError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn reader(path: &Path, delimiter: u8) -> Result<csv::Reader<File>, FitError> {
    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(open(path)?))
}

fn read_headers(reader: &mut csv::Reader<File>, path: &Path) -> Result<Vec<String>, FitError> {
    let headers = reader
        .headers()
        .map_err(|e| file_format(path, format!("failed to read header: {e}")))?;
    Ok(headers.iter().map(normalize_header_name).collect())
}

fn build_header_map(headers: &[String]) -> HashMap<&str, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a BOM.
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

fn parse_cell(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn file_format(path: &Path, reason: String) -> FitError {
    FitError::FileFormat {
        path: path.display().to_string(),
        reason,
    }
}
