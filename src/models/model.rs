//! PT1 / PT2 step responses.
//!
//! Closed forms (unit step, zero initial state):
//!
//! - `pt1(t) = K (1 - e^{-t/T})`
//! - `pt2(t) = K (1 - e^{-t/T} - (t/T) e^{-t/T})` (critically damped)
//!
//! The public functions check `T > 0`. The solver works through
//! [`response`] and [`gradient`], which assume the caller already rejected
//! infeasible time-constants.

use crate::domain::{ModelKind, PtParams};
use crate::error::FitError;

fn check_time_constant(t_const: f64) -> Result<(), FitError> {
    if t_const.is_finite() && t_const > 0.0 {
        Ok(())
    } else {
        Err(FitError::Domain(format!(
            "time-constant must be finite and > 0, got {t_const}"
        )))
    }
}

/// First-order step response.
pub fn pt1(t: f64, k: f64, t_const: f64) -> Result<f64, FitError> {
    check_time_constant(t_const)?;
    Ok(response(ModelKind::Pt1, t, k, t_const))
}

/// Critically damped second-order step response.
pub fn pt2(t: f64, k: f64, t_const: f64) -> Result<f64, FitError> {
    check_time_constant(t_const)?;
    Ok(response(ModelKind::Pt2, t, k, t_const))
}

/// `pt1(t) + y0` for every `t` in `times`.
pub fn pt1gen(times: &[f64], k: f64, t_const: f64, y0: f64) -> Result<Vec<f64>, FitError> {
    ptgen(ModelKind::Pt1, times, PtParams::new(k, t_const), y0)
}

/// `pt2(t) + y0` for every `t` in `times`.
pub fn pt2gen(times: &[f64], k: f64, t_const: f64, y0: f64) -> Result<Vec<f64>, FitError> {
    ptgen(ModelKind::Pt2, times, PtParams::new(k, t_const), y0)
}

/// Simulate `kind` over `times`, shifted by `y0`.
pub fn ptgen(kind: ModelKind, times: &[f64], params: PtParams, y0: f64) -> Result<Vec<f64>, FitError> {
    check_time_constant(params.t)?;
    Ok(times
        .iter()
        .map(|&t| response(kind, t, params.k, params.t) + y0)
        .collect())
}

/// Unchecked model evaluation.
pub(crate) fn response(kind: ModelKind, t: f64, k: f64, t_const: f64) -> f64 {
    let x = t / t_const;
    let e = (-x).exp();
    match kind {
        // 1 - e^{-x} computed as -expm1(-x) to keep precision near t = 0.
        ModelKind::Pt1 => k * -(-x).exp_m1(),
        ModelKind::Pt2 => k * (-(-x).exp_m1() - x * e),
    }
}

/// Partial derivatives `[∂y/∂K, ∂y/∂T]`.
///
/// With `x = t/T`:
/// - PT1: `∂K = 1 - e^{-x}`, `∂T = -K x e^{-x} / T`
/// - PT2: `∂K = 1 - (1 + x) e^{-x}`, `∂T = -K x² e^{-x} / T`
pub(crate) fn gradient(kind: ModelKind, t: f64, k: f64, t_const: f64) -> [f64; 2] {
    let x = t / t_const;
    let e = (-x).exp();
    match kind {
        ModelKind::Pt1 => [-(-x).exp_m1(), -k * x * e / t_const],
        ModelKind::Pt2 => [-(-x).exp_m1() - x * e, -k * x * x * e / t_const],
    }
}
