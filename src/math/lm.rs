//! Levenberg–Marquardt nonlinear least squares.
//!
//! Minimizes `½ ‖r(p)‖²` for a residual function `r` with a known Jacobian.
//! Each iteration solves the damped normal equations
//!
//! ```text
//! (JᵀJ + λ · diag(JᵀJ)) δ = -Jᵀr
//! ```
//!
//! by Cholesky. Accepted steps shrink `λ` by 10, rejected steps grow it by 10.
//! Trial points outside the problem's feasible region are rejected like any
//! step that fails to reduce the cost.
//!
//! Convergence tests (MINPACK-style):
//! - gradient: `max |Jᵀr| <= gtol`
//! - step: `‖δ‖ <= xtol (‖p‖ + xtol)` (checked for rejected trials too, so a
//!   solver sitting on the numerical optimum terminates instead of inflating λ
//!   forever)
//! - cost: relative reduction of an accepted step `<= ftol`

use nalgebra::{DMatrix, DVector};

use crate::error::FitError;

/// Lower bound on the diagonal used for Marquardt scaling.
const DIAG_FLOOR: f64 = 1e-12;
const MIN_LAMBDA: f64 = 1e-15;
const MAX_LAMBDA: f64 = 1e16;

/// A residual function with an analytic Jacobian.
pub trait LeastSquaresProblem {
    /// `r(p)`, one entry per observation.
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;

    /// `∂r/∂p`, shape `observations × parameters`.
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;

    /// Whether `params` may be evaluated at all.
    fn is_feasible(&self, _params: &DVector<f64>) -> bool {
        true
    }
}

/// Solver tolerances and limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmOptions {
    pub max_iterations: usize,
    pub gtol: f64,
    pub xtol: f64,
    pub ftol: f64,
    pub initial_lambda: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            gtol: 1e-12,
            xtol: 1e-10,
            ftol: 1e-15,
            initial_lambda: 1e-3,
        }
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    ZeroResidual,
    Gradient,
    StepSize,
    CostReduction,
}

/// Converged solver state.
#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: DVector<f64>,
    /// `½ ‖r‖²` at `params`.
    pub cost: f64,
    pub iterations: usize,
    pub termination: Termination,
}

/// Run Levenberg–Marquardt from `initial`.
pub fn minimize<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    opts: &LmOptions,
) -> Result<LmReport, FitError> {
    if !problem.is_feasible(&initial) {
        return Err(FitError::Domain(format!(
            "initial guess {:?} is outside the feasible region",
            initial.as_slice()
        )));
    }

    let mut params = initial;
    let mut residuals = problem.residuals(&params);
    let mut cost = 0.5 * residuals.norm_squared();
    if !cost.is_finite() {
        return Err(FitError::FitConvergence {
            iterations: 0,
            reason: "non-finite cost at the initial guess".to_string(),
        });
    }

    let mut lambda = opts.initial_lambda;

    for iteration in 0..opts.max_iterations {
        if cost == 0.0 {
            return converged(params, cost, iteration, Termination::ZeroResidual);
        }

        let jacobian = problem.jacobian(&params);
        let jtj = jacobian.tr_mul(&jacobian);
        let gradient = jacobian.tr_mul(&residuals);
        if gradient.amax() <= opts.gtol {
            return converged(params, cost, iteration, Termination::Gradient);
        }

        loop {
            let mut damped = jtj.clone();
            for i in 0..damped.nrows() {
                damped[(i, i)] += lambda * jtj[(i, i)].max(DIAG_FLOOR);
            }

            if let Some(chol) = damped.cholesky() {
                let step = chol.solve(&(-&gradient));
                let step_small = step.norm() <= opts.xtol * (params.norm() + opts.xtol);
                let trial = &params + &step;

                if problem.is_feasible(&trial) {
                    let trial_residuals = problem.residuals(&trial);
                    let trial_cost = 0.5 * trial_residuals.norm_squared();

                    if trial_cost.is_finite() && trial_cost < cost {
                        let reduction = (cost - trial_cost) / cost;
                        params = trial;
                        residuals = trial_residuals;
                        cost = trial_cost;
                        lambda = (lambda / 10.0).max(MIN_LAMBDA);
                        tracing::trace!(iteration, cost, lambda, "step accepted");

                        if step_small {
                            return converged(params, cost, iteration + 1, Termination::StepSize);
                        }
                        if reduction <= opts.ftol {
                            return converged(params, cost, iteration + 1, Termination::CostReduction);
                        }
                        break;
                    }
                }

                if step_small {
                    return converged(params, cost, iteration + 1, Termination::StepSize);
                }
            }

            lambda *= 10.0;
            if lambda > MAX_LAMBDA {
                return Err(FitError::FitConvergence {
                    iterations: iteration + 1,
                    reason: format!("no descent step found (damping exceeded {MAX_LAMBDA:e})"),
                });
            }
        }
    }

    Err(FitError::FitConvergence {
        iterations: opts.max_iterations,
        reason: format!("iteration limit reached (cost = {cost:e})"),
    })
}

fn converged(
    params: DVector<f64>,
    cost: f64,
    iterations: usize,
    termination: Termination,
) -> Result<LmReport, FitError> {
    tracing::debug!(iterations, cost, ?termination, "levenberg-marquardt converged");
    Ok(LmReport {
        params,
        cost,
        iterations,
        termination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `y = a · e^{b x}` sampled without noise.
    struct Exponential {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for Exponential {
        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_iterator(
                self.x.len(),
                self.x.iter().zip(&self.y).map(|(&x, &y)| p[0] * (p[1] * x).exp() - y),
            )
        }

        fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
            let mut j = DMatrix::zeros(self.x.len(), 2);
            for (i, &x) in self.x.iter().enumerate() {
                let e = (p[1] * x).exp();
                j[(i, 0)] = e;
                j[(i, 1)] = p[0] * x * e;
            }
            j
        }
    }

    #[test]
    fn recovers_exponential_parameters() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.1).collect();
        let y = x.iter().map(|&x| 2.5 * (-1.3 * x).exp()).collect();
        let problem = Exponential { x, y };

        let report = minimize(&problem, DVector::from_vec(vec![1.0, 0.0]), &LmOptions::default()).unwrap();
        assert!((report.params[0] - 2.5).abs() < 1e-8, "{:?}", report.params);
        assert!((report.params[1] + 1.3).abs() < 1e-8, "{:?}", report.params);
        assert!(report.cost < 1e-12);
    }

    #[test]
    fn iteration_limit_is_a_convergence_error() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.1).collect();
        let y = x.iter().map(|&x| 2.5 * (-1.3 * x).exp()).collect();
        let problem = Exponential { x, y };
        let opts = LmOptions {
            max_iterations: 1,
            ..LmOptions::default()
        };

        let err = minimize(&problem, DVector::from_vec(vec![1.0, 0.0]), &opts).unwrap_err();
        assert!(matches!(err, FitError::FitConvergence { iterations: 1, .. }));
    }

    struct PositiveOnly;

    impl LeastSquaresProblem for PositiveOnly {
        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_vec(vec![p[0] - 1.0])
        }

        fn jacobian(&self, _p: &DVector<f64>) -> DMatrix<f64> {
            DMatrix::from_element(1, 1, 1.0)
        }

        fn is_feasible(&self, p: &DVector<f64>) -> bool {
            p[0] > 0.0
        }
    }

    #[test]
    fn infeasible_initial_guess_is_rejected() {
        let err = minimize(&PositiveOnly, DVector::from_vec(vec![-1.0]), &LmOptions::default()).unwrap_err();
        assert!(matches!(err, FitError::Domain(_)));

        let ok = minimize(&PositiveOnly, DVector::from_vec(vec![3.0]), &LmOptions::default()).unwrap();
        assert!((ok.params[0] - 1.0).abs() < 1e-9);
    }
}
