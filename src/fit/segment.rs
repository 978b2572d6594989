//! Event-driven segmentation.
//!
//! The events table is column-oriented: every column except the label column
//! names one event, and its first two rows hold the `from` / `to` sample
//! indices of that event (half-open).
//!
//! ```text
//! event-name,step1,step2
//! from,0,100
//! to,100,200
//! ```

use crate::domain::{Segment, TimeSeries};
use crate::error::FitError;

/// Accepted spellings of the label column.
const LABEL_COLUMNS: [&str; 2] = ["event-name", "<event-name>"];

/// Raw events table: trimmed header names plus string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl EventsTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Event column names in header order.
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.headers
            .iter()
            .map(String::as_str)
            .filter(|h| !is_label_column(h))
    }
}

fn is_label_column(name: &str) -> bool {
    LABEL_COLUMNS.contains(&name)
}

/// Turn the events table into validated segments.
///
/// `only` restricts the result to the named events (in header order); an
/// empty selection keeps every event.
pub fn segments(events: &EventsTable, data_len: usize, only: &[String]) -> Result<Vec<Segment>, FitError> {
    if events.rows.len() < 2 {
        return Err(FitError::Schema(format!(
            "events table needs at least 2 rows (from, to), got {}",
            events.rows.len()
        )));
    }

    if let Some(missing) = only
        .iter()
        .find(|name| !events.event_names().any(|h| h == name.as_str()))
    {
        return Err(FitError::Schema(format!("event `{missing}` not found in events table")));
    }

    let mut out = Vec::new();
    for (col, name) in events.headers.iter().enumerate() {
        if is_label_column(name) {
            continue;
        }
        if !only.is_empty() && !only.iter().any(|o| o == name) {
            continue;
        }
        let from = index_cell(events, 0, col, name)?;
        let to = index_cell(events, 1, col, name)?;
        out.push(Segment::new(name.clone(), from, to, data_len)?);
    }

    if out.is_empty() {
        return Err(FitError::Schema("events table defines no events".to_string()));
    }
    tracing::debug!(count = out.len(), "segments resolved");
    Ok(out)
}

fn index_cell(events: &EventsTable, row: usize, col: usize, name: &str) -> Result<usize, FitError> {
    let cell = events.rows[row]
        .get(col)
        .map(|s| s.trim())
        .ok_or_else(|| FitError::Schema(format!("event `{name}`: row {} is missing a value", row + 1)))?;
    cell.parse::<usize>().map_err(|_| {
        FitError::Schema(format!(
            "event `{name}`: row {} value `{cell}` is not a non-negative integer index",
            row + 1
        ))
    })
}

/// Sub-series covered by `segment`.
pub fn segment_series(series: &TimeSeries, segment: &Segment) -> Result<TimeSeries, FitError> {
    series.slice(segment)
}
