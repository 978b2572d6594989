//! Synthetic step-response datasets.
//!
//! Two concatenated step responses driven by two inputs, the same shape the
//! estimators are exercised with:
//!
//! - `u1 = 3` throughout, `u2` steps from 0 to 2 at the midpoint
//! - first half: step response with `(K, T)`
//! - second half: `(0.4 K, 0.6 T)`, starting from the first half's final value
//!
//! Noise is Gaussian with amplitude `level · max(y)`.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{GenerateConfig, PtParams, Segment};
use crate::error::FitError;
use crate::models::ptgen;

/// Gain ratio of the second step relative to the first.
const SECOND_STEP_GAIN: f64 = 0.4;
/// Time-constant ratio of the second step relative to the first.
const SECOND_STEP_TIME: f64 = 0.6;

#[derive(Debug, Clone)]
pub struct SyntheticData {
    pub time: Vec<f64>,
    pub u1: Vec<f64>,
    pub u2: Vec<f64>,
    pub y: Vec<f64>,
    pub events: Vec<Segment>,
}

/// `n` evenly spaced points over `[start, stop]` (inclusive).
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n as f64 - 1.0);
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Add zero-mean Gaussian noise with amplitude `level · max(y)` pointwise.
pub fn add_noise<R: Rng + ?Sized>(y: &[f64], level: f64, rng: &mut R) -> Result<Vec<f64>, FitError> {
    let y_max = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let amplitude = (level * y_max).abs();
    if y.is_empty() || amplitude == 0.0 {
        return Ok(y.to_vec());
    }

    let normal = Normal::new(0.0, amplitude)
        .map_err(|e| FitError::DegenerateInput(format!("noise distribution error: {e}")))?;
    Ok(y.iter().map(|v| v + normal.sample(rng)).collect())
}

/// Build the two-step dataset described in the module docs.
pub fn two_step_dataset(config: &GenerateConfig) -> Result<SyntheticData, FitError> {
    let n = config.samples;
    let t_arr = linspace(0.0, config.span, n);

    let first = ptgen(
        config.model,
        &t_arr,
        PtParams::new(config.gain, config.time_constant),
        0.0,
    )?;
    let offset = first.last().copied().unwrap_or(0.0);
    let second = ptgen(
        config.model,
        &t_arr,
        PtParams::new(config.gain * SECOND_STEP_GAIN, config.time_constant * SECOND_STEP_TIME),
        offset,
    )?;

    let clean: Vec<f64> = first.into_iter().chain(second).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let y = add_noise(&clean, config.noise, &mut rng)?;

    let dt = if n > 1 { config.span / (n as f64 - 1.0) } else { 0.0 };
    let time = (0..2 * n).map(|i| i as f64 * dt).collect();
    let u1 = vec![3.0; 2 * n];
    let u2 = std::iter::repeat_n(0.0, n).chain(std::iter::repeat_n(2.0, n)).collect();

    let events = vec![
        Segment::new("step1", 0, n, 2 * n)?,
        Segment::new("step2", n, 2 * n, 2 * n)?,
    ];

    Ok(SyntheticData {
        time,
        u1,
        u2,
        y,
        events,
    })
}
