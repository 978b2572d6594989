//! PT1 / PT2 parameter estimation.
//!
//! Given a step-response segment `(t, y)`:
//! - normalize both axes (origin at the first sample, maximum scaled to 1)
//! - fit `(K, T)` on the normalized data with Levenberg–Marquardt
//! - map the result back: `K = max(y - y[0]) · K*`, `T = max(t - t[0]) · T*`
//!
//! The output offset always comes from `y[0]`, for PT1 and PT2 alike.

use nalgebra::{DMatrix, DVector};

use crate::domain::{ModelKind, PtParams, TimeSeries};
use crate::error::FitError;
use crate::math::{LeastSquaresProblem, LmOptions, minimize, normalize};
use crate::models::{gradient, response};

/// Options for a single PT fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PtFitOptions {
    /// Start point on the normalized scale.
    pub guess: PtParams,
    pub solver: LmOptions,
}

impl Default for PtFitOptions {
    fn default() -> Self {
        Self {
            guess: PtParams::default(),
            solver: LmOptions::default(),
        }
    }
}

/// Result of a PT fit in physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PtFit {
    pub model: ModelKind,
    pub params: PtParams,
    pub iterations: usize,
    /// `½ Σ r²` on the normalized scale.
    pub normalized_cost: f64,
}

struct StepResponseProblem<'a> {
    model: ModelKind,
    t: &'a [f64],
    y: &'a [f64],
}

impl LeastSquaresProblem for StepResponseProblem<'_> {
    fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            self.t.len(),
            self.t
                .iter()
                .zip(self.y)
                .map(|(&t, &y)| response(self.model, t, p[0], p[1]) - y),
        )
    }

    fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
        let mut j = DMatrix::zeros(self.t.len(), 2);
        for (i, &t) in self.t.iter().enumerate() {
            let [dk, dt] = gradient(self.model, t, p[0], p[1]);
            j[(i, 0)] = dk;
            j[(i, 1)] = dt;
        }
        j
    }

    fn is_feasible(&self, p: &DVector<f64>) -> bool {
        p[0].is_finite() && p[1].is_finite() && p[1] > 0.0
    }
}

/// Fit `model` to the samples `(t, y)`.
pub fn fit_pt(model: ModelKind, t: &[f64], y: &[f64], options: &PtFitOptions) -> Result<PtFit, FitError> {
    if t.len() != y.len() {
        return Err(FitError::InputMismatch {
            what: "time/output length",
            expected: t.len(),
            found: y.len(),
        });
    }

    let norm = normalize(t, y)?;
    let problem = StepResponseProblem {
        model,
        t: &norm.t,
        y: &norm.y,
    };
    let initial = DVector::from_vec(vec![options.guess.k, options.guess.t]);
    let report = minimize(&problem, initial, &options.solver)?;

    let params = PtParams::new(norm.y_scale * report.params[0], norm.t_scale * report.params[1]);
    tracing::debug!(
        model = model.display_name(),
        k = params.k,
        t = params.t,
        iterations = report.iterations,
        "pt fit done"
    );

    Ok(PtFit {
        model,
        params,
        iterations: report.iterations,
        normalized_cost: report.cost,
    })
}

/// [`fit_pt`] on a validated series.
pub fn fit_series(model: ModelKind, series: &TimeSeries, options: &PtFitOptions) -> Result<PtFit, FitError> {
    fit_pt(model, series.time(), series.values(), options)
}
