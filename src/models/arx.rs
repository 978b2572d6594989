//! First-order MISO ARX simulation.
//!
//! Recurrence, with `y[0] = y0` held fixed:
//!
//! ```text
//! y[k] = a1 y[k-1] + y[0] + Σn (bn0 un[k] + bn1 un[k-1])     k = 1 … N-1
//! ```
//!
//! The initial condition is not part of the output, so `N` input samples
//! produce `N - 1` output samples.

use crate::domain::{ArxParams, InputSet};
use crate::error::FitError;

/// Simulate the ARX recurrence driven by `inputs`.
pub fn arxgen(inputs: &InputSet, params: &ArxParams, y0: f64) -> Result<Vec<f64>, FitError> {
    if inputs.channel_count() != params.channels() {
        return Err(FitError::InputMismatch {
            what: "ARX input channel count",
            expected: params.channels(),
            found: inputs.channel_count(),
        });
    }

    let n = inputs.len();
    let a1 = params.a1();
    let mut out = Vec::with_capacity(n.saturating_sub(1));
    let mut prev = y0;
    for k in 1..n {
        let mut y = a1 * prev + y0;
        for (idx, u) in inputs.channels().iter().enumerate() {
            let (b0, b1) = params.b(idx);
            y += b0 * u[k] + b1 * u[k - 1];
        }
        out.push(y);
        prev = y;
    }
    Ok(out)
}
