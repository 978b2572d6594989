//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built once at load time from validated CSV columns
//! - handed to the estimators as plain slices
//! - exported to JSON after fitting

use std::ops::Range;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Step-response model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ModelKind {
    /// First-order lag.
    #[serde(rename = "PT1")]
    #[value(name = "PT1", alias = "pt1")]
    Pt1,
    /// Critically damped second-order lag (`T1 = T2 = T`).
    #[serde(rename = "PT2")]
    #[value(name = "PT2", alias = "pt2")]
    Pt2,
}

impl ModelKind {
    /// Human-readable label for terminal output and figure titles.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Pt1 => "PT1",
            ModelKind::Pt2 => "PT2",
        }
    }
}

/// Ordered `(time, value)` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    time: Vec<f64>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build a series, enforcing equal lengths, `len >= 2` and strictly
    /// increasing time.
    pub fn new(time: Vec<f64>, values: Vec<f64>) -> Result<Self, FitError> {
        if time.len() != values.len() {
            return Err(FitError::InputMismatch {
                what: "time/value length",
                expected: time.len(),
                found: values.len(),
            });
        }
        if time.len() < 2 {
            return Err(FitError::DegenerateInput(format!(
                "a time series needs at least 2 samples, got {}",
                time.len()
            )));
        }
        if time.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(FitError::DegenerateInput(
                "time must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { time, values })
    }

    /// Series whose time axis is the sample index `0, 1, …, n-1`.
    pub fn indexed(values: Vec<f64>) -> Result<Self, FitError> {
        let time = (0..values.len()).map(|i| i as f64).collect();
        Self::new(time, values)
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Sub-series covering `segment`.
    pub fn slice(&self, segment: &Segment) -> Result<TimeSeries, FitError> {
        if segment.to > self.len() {
            return Err(FitError::Schema(format!(
                "segment `{}` [{}, {}) exceeds series length {}",
                segment.name,
                segment.from,
                segment.to,
                self.len()
            )));
        }
        let range = segment.range();
        TimeSeries::new(self.time[range.clone()].to_vec(), self.values[range].to_vec())
    }
}

/// A named half-open index range `[from, to)` into a parent series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub from: usize,
    pub to: usize,
}

impl Segment {
    /// Validate `0 <= from < to <= parent_len`.
    pub fn new(name: impl Into<String>, from: usize, to: usize, parent_len: usize) -> Result<Self, FitError> {
        let name = name.into();
        if from >= to {
            return Err(FitError::Schema(format!(
                "event `{name}`: from index {from} must be smaller than to index {to}"
            )));
        }
        if to > parent_len {
            return Err(FitError::Schema(format!(
                "event `{name}`: to index {to} exceeds data length {parent_len}"
            )));
        }
        Ok(Self { name, from, to })
    }

    pub fn range(&self) -> Range<usize> {
        self.from..self.to
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.to == self.from
    }
}

/// Fitted PT1/PT2 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PtParams {
    /// Gain.
    pub k: f64,
    /// Time-constant (`> 0`).
    pub t: f64,
}

impl PtParams {
    pub fn new(k: f64, t: f64) -> Self {
        Self { k, t }
    }
}

impl Default for PtParams {
    /// The unit guess used on normalized data.
    fn default() -> Self {
        Self { k: 1.0, t: 1.0 }
    }
}

/// First-order MISO ARX coefficients `[b00, b01, b10, b11, …, bn0, bn1, a1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ArxParams {
    coefficients: Vec<f64>,
}

impl ArxParams {
    /// Wrap a coefficient vector; its length must be `2 * channels + 1` with
    /// at least one channel.
    pub fn from_coefficients(coefficients: Vec<f64>) -> Result<Self, FitError> {
        if coefficients.len() < 3 || coefficients.len() % 2 == 0 {
            return Err(FitError::Schema(format!(
                "ARX parameter vector must have odd length >= 3, got {}",
                coefficients.len()
            )));
        }
        Ok(Self { coefficients })
    }

    /// Number of input channels the parameters describe.
    pub fn channels(&self) -> usize {
        (self.coefficients.len() - 1) / 2
    }

    /// `(bn0, bn1)` for channel `n`.
    pub fn b(&self, n: usize) -> (f64, f64) {
        (self.coefficients[2 * n], self.coefficients[2 * n + 1])
    }

    /// Autoregressive coefficient.
    pub fn a1(&self) -> f64 {
        self.coefficients[self.coefficients.len() - 1]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.coefficients
    }
}

impl TryFrom<Vec<f64>> for ArxParams {
    type Error = FitError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        ArxParams::from_coefficients(value)
    }
}

impl From<ArxParams> for Vec<f64> {
    fn from(value: ArxParams) -> Self {
        value.coefficients
    }
}

/// Ordered input channels, aligned sample-for-sample with the output.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSet {
    channels: Vec<Vec<f64>>,
}

impl InputSet {
    pub fn new(channels: Vec<Vec<f64>>) -> Result<Self, FitError> {
        let Some(first) = channels.first() else {
            return Err(FitError::Schema("at least one input channel is required".to_string()));
        };
        let n = first.len();
        if let Some(bad) = channels.iter().find(|c| c.len() != n) {
            return Err(FitError::InputMismatch {
                what: "input channel length",
                expected: n,
                found: bad.len(),
            });
        }
        Ok(Self { channels })
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fit diagnostics comparing observed and simulated output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub n: usize,
    pub rmse: f64,
    pub max_abs_error: f64,
}

/// PT pipeline configuration, derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct PtConfig {
    pub data_path: PathBuf,
    pub events_path: PathBuf,
    pub output_dir: PathBuf,
    /// `(column, model)` pairs, one per fitted column.
    pub targets: Vec<(String, ModelKind)>,
    /// Optional time column; the row index is used otherwise.
    pub time_column: Option<String>,
    /// Restrict fitting to these events (all events when empty).
    pub events: Vec<String>,
    pub guess: PtParams,
    /// Isolate per-segment failures instead of aborting the run.
    pub keep_going: bool,
    pub export: Option<PathBuf>,
    pub show: bool,
}

/// ARX pipeline configuration.
#[derive(Debug, Clone)]
pub struct ArxConfig {
    pub data_path: PathBuf,
    pub output_dir: PathBuf,
    pub input_columns: Vec<String>,
    pub output_column: String,
    /// Initial output state for the simulation.
    pub y0: f64,
    pub export: Option<PathBuf>,
    pub show: bool,
}

/// Synthetic dataset configuration.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub output_dir: PathBuf,
    pub model: ModelKind,
    /// Samples per step response.
    pub samples: usize,
    /// Time span of each step response.
    pub span: f64,
    pub gain: f64,
    pub time_constant: f64,
    /// Noise amplitude relative to `max(y)`.
    pub noise: f64,
    pub seed: u64,
    pub delimiter: u8,
}
