//! Model evaluation for the Wood curve `Y(t) = a·t^b·e^(−c·t)`.
//!
//! The fitter relies on two primitive operations:
//! - predict `Y(t)` given `(a, b, c)` (residuals, integration, plots)
//! - the partial derivatives of `Y` with respect to `(a, b, c)` (Jacobian rows)
//!
//! Numerical notes:
//! - `t` is shifted by `T_EPS` so that `0^b` with `b < 0` and `ln(0)` never occur.

use crate::domain::WoodParams;

/// Shift applied to `t` to keep the model finite at `t = 0`.
pub const T_EPS: f64 = 1e-9;

/// Predict `Y(t)`.
pub fn evaluate(t: f64, params: &WoodParams) -> f64 {
    let t = t + T_EPS;
    params.a * t.powf(params.b) * (-params.c * t).exp()
}

/// Predict `Y(t)` elementwise, preserving input order.
pub fn evaluate_many(ts: &[f64], params: &WoodParams) -> Vec<f64> {
    ts.iter().map(|&t| evaluate(t, params)).collect()
}

/// Partial derivatives `[∂Y/∂a, ∂Y/∂b, ∂Y/∂c]` at `t`.
pub fn gradient(t: f64, params: &WoodParams) -> [f64; 3] {
    let t = t + T_EPS;
    let shape = t.powf(params.b) * (-params.c * t).exp();
    let y = params.a * shape;
    [shape, y * t.ln(), -y * t]
}

/// Analytic peak day `b / c` (not validated).
pub fn peak_time(params: &WoodParams) -> f64 {
    params.b / params.c
}
