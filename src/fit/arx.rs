//! First-order MISO ARX estimation.
//!
//! For `N` samples the regression has `N - 1` rows, one per transition
//! `k → k+1`:
//!
//! ```text
//! [u0[k+1], u0[k], u1[k+1], u1[k], …, y[k]] · θ ≈ y[k+1]
//! ```
//!
//! `θ` is solved with the SVD pseudo-inverse. Constant inputs produce
//! collinear columns; those yield the minimum-norm solution rather than an
//! error.

use nalgebra::{DMatrix, DVector};

use crate::domain::{ArxParams, InputSet};
use crate::error::FitError;
use crate::math::solve_least_squares;

/// Regression matrix and target for [`fit_arx`].
pub fn regression(inputs: &InputSet, y: &[f64]) -> Result<(DMatrix<f64>, DVector<f64>), FitError> {
    if y.len() != inputs.len() {
        return Err(FitError::InputMismatch {
            what: "input/output length",
            expected: inputs.len(),
            found: y.len(),
        });
    }
    if y.len() < 2 {
        return Err(FitError::DegenerateInput(format!(
            "ARX estimation needs at least 2 samples, got {}",
            y.len()
        )));
    }

    let rows = y.len() - 1;
    let cols = 2 * inputs.channel_count() + 1;
    let mut x = DMatrix::zeros(rows, cols);
    for k in 0..rows {
        for (n, u) in inputs.channels().iter().enumerate() {
            x[(k, 2 * n)] = u[k + 1];
            x[(k, 2 * n + 1)] = u[k];
        }
        x[(k, cols - 1)] = y[k];
    }
    let target = DVector::from_column_slice(&y[1..]);
    Ok((x, target))
}

/// Estimate `[b00, b01, …, bn0, bn1, a1]` from inputs and measured output.
pub fn fit_arx(inputs: &InputSet, y: &[f64]) -> Result<ArxParams, FitError> {
    let (x, target) = regression(inputs, y)?;
    if x.nrows() < x.ncols() {
        tracing::debug!(
            rows = x.nrows(),
            cols = x.ncols(),
            "underdetermined ARX regression, returning minimum-norm solution"
        );
    }

    let theta = solve_least_squares(&x, &target)?;
    ArxParams::from_coefficients(theta.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::two_step_dataset;
    use crate::domain::{GenerateConfig, ModelKind};
    use crate::models::arxgen;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn recovers_noise_free_arx_system() {
        let mut rng = StdRng::seed_from_u64(3);
        let n = 60;
        let u0: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let u1: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..2.0)).collect();
        let inputs = InputSet::new(vec![u0, u1]).unwrap();
        let truth = ArxParams::from_coefficients(vec![0.5, -0.2, 0.1, 0.3, 0.7]).unwrap();

        let simulated = arxgen(&inputs, &truth, 0.0).unwrap();
        let y: Vec<f64> = std::iter::once(0.0).chain(simulated).collect();

        let fitted = fit_arx(&inputs, &y).unwrap();
        for (a, b) in fitted.as_slice().iter().zip(truth.as_slice()) {
            assert!((a - b).abs() < 1e-9, "{:?} vs {:?}", fitted, truth);
        }
    }

    /// Fit on the noisy two-step dataset, simulate, compare with the clean
    /// sequence.
    fn two_step_error(seed: u64) -> f64 {
        let config = |noise| GenerateConfig {
            output_dir: std::env::temp_dir(),
            model: ModelKind::Pt1,
            samples: 100,
            span: 200.0,
            gain: 30.0,
            time_constant: 40.0,
            noise,
            seed,
            delimiter: b',',
        };
        let noisy = two_step_dataset(&config(0.02)).unwrap();
        let clean = two_step_dataset(&config(0.0)).unwrap();
        let inputs = InputSet::new(vec![noisy.u1.clone(), noisy.u2.clone()]).unwrap();

        let params = fit_arx(&inputs, &noisy.y).unwrap();
        let simulated = arxgen(&inputs, &params, clean.y[0]).unwrap();
        assert_eq!(simulated.len(), clean.y.len() - 1);

        let y_max = clean.y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let worst = simulated
            .iter()
            .zip(&clean.y[1..])
            .map(|(s, c)| (s - c).abs())
            .fold(0.0, f64::max);
        worst / y_max
    }

    #[test]
    fn two_step_round_trip_tracks_clean_output() {
        let seeds = 8;
        let mut total = 0.0;
        for seed in 0..seeds {
            let err = two_step_error(seed);
            assert!(err < 0.15, "seed {seed}: relative error {err}");
            total += err;
        }
        let mean = total / seeds as f64;
        assert!(mean < 0.10, "mean relative error {mean}");
    }

    #[test]
    fn regression_layout() {
        let inputs = InputSet::new(vec![vec![1.0, 2.0, 3.0]]).unwrap();
        let (x, target) = regression(&inputs, &[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(x.shape(), (2, 3));
        assert_eq!(x.row(0).iter().copied().collect::<Vec<_>>(), vec![2.0, 1.0, 10.0]);
        assert_eq!(x.row(1).iter().copied().collect::<Vec<_>>(), vec![3.0, 2.0, 20.0]);
        assert_eq!(target.as_slice(), &[20.0, 30.0]);
    }

    #[test]
    fn short_or_mismatched_input_is_rejected() {
        let inputs = InputSet::new(vec![vec![1.0, 2.0, 3.0]]).unwrap();
        assert!(matches!(
            fit_arx(&inputs, &[1.0, 2.0]),
            Err(FitError::InputMismatch { .. })
        ));

        let single = InputSet::new(vec![vec![1.0]]).unwrap();
        assert!(matches!(fit_arx(&single, &[1.0]), Err(FitError::DegenerateInput(_))));
    }

    #[test]
    fn underdetermined_system_still_fits() {
        let inputs = InputSet::new(vec![vec![1.0, 2.0, 4.0]]).unwrap();
        let params = fit_arx(&inputs, &[0.0, 1.0, 3.0]).unwrap();
        assert_eq!(params.channels(), 1);
        let y = arxgen(&inputs, &params, 0.0).unwrap();
        assert!((y[0] - 1.0).abs() < 1e-9);
        assert!((y[1] - 3.0).abs() < 1e-9);
    }
}
