//! Fit diagnostics and terminal output.

pub mod format;

pub use format::*;

use crate::domain::FitQuality;
use crate::error::FitError;

/// Compare observed against simulated output sample-for-sample.
pub fn compare(observed: &[f64], simulated: &[f64]) -> Result<FitQuality, FitError> {
    if observed.len() != simulated.len() {
        return Err(FitError::InputMismatch {
            what: "observed/simulated length",
            expected: observed.len(),
            found: simulated.len(),
        });
    }
    if observed.is_empty() {
        return Err(FitError::DegenerateInput("nothing to compare".to_string()));
    }

    let mut sse = 0.0;
    let mut max_abs_error: f64 = 0.0;
    for (o, s) in observed.iter().zip(simulated) {
        let r = o - s;
        sse += r * r;
        max_abs_error = max_abs_error.max(r.abs());
    }
    let n = observed.len();
    Ok(FitQuality {
        n,
        rmse: (sse / n as f64).sqrt(),
        max_abs_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_basic() {
        let q = compare(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 3.0, 6.0]).unwrap();
        assert_eq!(q.n, 4);
        assert!((q.rmse - 1.0).abs() < 1e-12);
        assert!((q.max_abs_error - 2.0).abs() < 1e-12);
    }

    #[test]
    fn compare_rejects_bad_shapes() {
        assert!(matches!(compare(&[1.0], &[1.0, 2.0]), Err(FitError::InputMismatch { .. })));
        assert!(matches!(compare(&[], &[]), Err(FitError::DegenerateInput(_))));
    }
}
