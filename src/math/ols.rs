//! Linear least squares via the Moore–Penrose pseudo-inverse.
//!
//! We solve
//!
//! ```text
//! minimize ‖X β - y‖²
//! ```
//!
//! through the SVD of `X`. Singular values below
//! `max(rows, cols) · ε · σ_max` are treated as zero, so rank-deficient or
//! underdetermined systems yield the minimum-norm solution instead of an
//! error. (Nalgebra's `QR::solve` is intended for square systems and will
//! panic for non-square matrices.)

use nalgebra::{DMatrix, DVector};

use crate::error::FitError;

/// Cutoff below which a singular value counts as zero.
pub fn singular_value_cutoff(x: &DMatrix<f64>, sigma_max: f64) -> f64 {
    x.nrows().max(x.ncols()) as f64 * f64::EPSILON * sigma_max
}

/// Solve `X β ≈ y` in the least-squares sense with the pseudo-inverse.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>, FitError> {
    if x.nrows() != y.len() {
        return Err(FitError::InputMismatch {
            what: "regression rows/target length",
            expected: x.nrows(),
            found: y.len(),
        });
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(FitError::DegenerateInput("empty regression matrix".to_string()));
    }

    let svd = x.clone().svd(true, true);
    let sigma_max = svd.singular_values.max();
    if !sigma_max.is_finite() {
        return Err(FitError::DegenerateInput(
            "regression matrix contains non-finite values".to_string(),
        ));
    }
    // An all-zero design has the zero vector as its minimum-norm solution.
    if sigma_max == 0.0 {
        return Ok(DVector::zeros(x.ncols()));
    }

    let pinv = svd
        .pseudo_inverse(singular_value_cutoff(x, sigma_max))
        .map_err(|e| FitError::DegenerateInput(format!("pseudo-inverse failed: {e}")))?;
    Ok(pinv * y)
}
