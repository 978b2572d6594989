//! Scale normalization for step-response fitting.
//!
//! Both axes are shifted to start at zero and divided by their maximum, so
//! the fitted segment lives in roughly `[0, 1] × [0, 1]` regardless of the
//! physical units. This keeps the unit start guess `(K, T) = (1, 1)`
//! meaningful and the solver well conditioned.

use crate::error::FitError;

/// Normalized axes plus the factors needed to map parameters back.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub t: Vec<f64>,
    pub y: Vec<f64>,
    /// `max(t - t[0])`.
    pub t_scale: f64,
    /// `max(y - y[0])`.
    pub y_scale: f64,
}

/// Zero both origins and divide by the respective maximum.
pub fn normalize(t: &[f64], y: &[f64]) -> Result<Normalized, FitError> {
    if t.len() != y.len() {
        return Err(FitError::InputMismatch {
            what: "time/output length",
            expected: t.len(),
            found: y.len(),
        });
    }
    if t.len() < 2 {
        return Err(FitError::DegenerateInput(format!(
            "normalization needs at least 2 samples, got {}",
            t.len()
        )));
    }

    let t_shifted: Vec<f64> = t.iter().map(|v| v - t[0]).collect();
    let y_shifted: Vec<f64> = y.iter().map(|v| v - y[0]).collect();

    let t_scale = max_of(&t_shifted);
    let y_scale = max_of(&y_shifted);
    if !(t_scale.is_finite() && t_scale > 0.0) {
        return Err(FitError::DegenerateInput(format!(
            "time axis has no positive range (max = {t_scale})"
        )));
    }
    if !(y_scale.is_finite() && y_scale > 0.0) {
        return Err(FitError::DegenerateInput(format!(
            "output has no positive range above its first sample (max = {y_scale})"
        )));
    }

    Ok(Normalized {
        t: t_shifted.iter().map(|v| v / t_scale).collect(),
        y: y_shifted.iter().map(|v| v / y_scale).collect(),
        t_scale,
        y_scale,
    })
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
