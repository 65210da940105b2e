//! Levenberg–Marquardt minimizer for small nonlinear least-squares problems.
//!
//! Each iteration solves the damped linear problem
//!
//! ```text
//! minimize ‖J δ + r‖² + λ ‖D δ‖²
//! ```
//!
//! as an ordinary least-squares system on `[J; √λ·D]` (see [`solve_least_squares`]),
//! where `D` holds running maxima of the Jacobian column norms (Marquardt scaling).
//! That keeps steps sensible when parameters live on very different scales, as the
//! Wood parameters do (`a ~ 10`, `c ~ 1e-3`).
//!
//! Damping follows Nielsen's gain-ratio update. Termination tests mirror MINPACK:
//! relative cost reduction (`ftol`), relative step size (`xtol`), and an optional
//! scaled-gradient test (`gtol`).

use nalgebra::{DMatrix, DVector};
use thiserror::Error;
use tracing::trace;

use crate::math::solve_least_squares;

/// A residual vector `r(x)` and its Jacobian `∂r/∂x`.
pub trait LeastSquaresProblem {
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;
}

/// Optimizer settings.
#[derive(Debug, Clone)]
pub struct LmOptions {
    /// Budget of residual evaluations (including the initial one).
    pub max_evaluations: usize,
    pub ftol: f64,
    pub xtol: f64,
    /// Scaled gradient tolerance; `0` disables the test.
    pub gtol: f64,
    pub initial_damping: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 10_000,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 0.0,
            initial_damping: 1e-3,
        }
    }
}

/// Why the optimizer stopped successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    ZeroResiduals,
    CostReduction,
    SmallStep,
    Gradient,
}

#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: DVector<f64>,
    /// Final residual vector at `params`.
    pub residuals: DVector<f64>,
    /// Final Jacobian at `params`.
    pub jacobian: DMatrix<f64>,
    /// Sum of squared residuals.
    pub sse: f64,
    pub evaluations: usize,
    pub iterations: usize,
    pub termination: Termination,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LmError {
    #[error("{residuals} residual(s) cannot determine {params} parameter(s)")]
    Underdetermined { residuals: usize, params: usize },

    #[error("residuals are not finite at the initial guess")]
    NonFiniteStart,

    #[error("no convergence within {limit} function evaluations")]
    MaxEvaluations { limit: usize },

    #[error("damped normal equations are singular")]
    SingularSystem,

    #[error("damping diverged without reducing the residuals")]
    Stalled,
}

/// Minimum gain ratio for accepting a step.
const ACCEPT_RATIO: f64 = 1e-4;

/// Upper bound on `λ`; beyond this no step can make progress.
const MAX_DAMPING: f64 = 1e32;

/// Minimize `‖r(x)‖²` starting from `initial`.
pub fn minimize<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    opts: &LmOptions,
) -> Result<LmReport, LmError> {
    let n_params = initial.len();
    let mut x = initial;
    let mut r = problem.residuals(&x);
    let mut evaluations = 1usize;

    if r.len() < n_params {
        return Err(LmError::Underdetermined {
            residuals: r.len(),
            params: n_params,
        });
    }
    if !all_finite(&r) {
        return Err(LmError::NonFiniteStart);
    }

    let mut sse = r.norm_squared();
    let mut jac = problem.jacobian(&x);
    let mut scale = column_norms(&jac).map(|v| if v > 0.0 && v.is_finite() { v } else { 1.0 });

    let mut damping = opts.initial_damping;
    let mut nu = 2.0;
    let mut iterations = 0usize;

    loop {
        if sse == 0.0 {
            return Ok(report(x, r, jac, sse, evaluations, iterations, Termination::ZeroResiduals));
        }

        if opts.gtol > 0.0 {
            let grad = jac.transpose() * &r;
            let rnorm = sse.sqrt();
            let gmax = grad
                .iter()
                .zip(scale.iter())
                .map(|(g, s)| (g / (s * rnorm)).abs())
                .fold(0.0_f64, f64::max);
            if gmax <= opts.gtol {
                return Ok(report(x, r, jac, sse, evaluations, iterations, Termination::Gradient));
            }
        }

        if evaluations >= opts.max_evaluations {
            return Err(LmError::MaxEvaluations {
                limit: opts.max_evaluations,
            });
        }
        iterations += 1;

        let step = damped_step(&jac, &r, &scale, damping).ok_or(LmError::SingularSystem)?;
        let candidate = &x + &step;
        let r_new = problem.residuals(&candidate);
        evaluations += 1;

        let sse_new = if all_finite(&r_new) {
            r_new.norm_squared()
        } else {
            f64::INFINITY
        };
        let predicted = sse - (&r + &jac * &step).norm_squared();
        let actual = sse - sse_new;
        let rho = if predicted > 0.0 { actual / predicted } else { -1.0 };

        let step_norm = scaled_norm(&step, &scale);
        let x_norm = scaled_norm(&x, &scale);
        let small_step = step_norm <= opts.xtol * (x_norm + opts.xtol);

        trace!(iterations, evaluations, sse, sse_new, damping, rho, "lm step");

        if rho > ACCEPT_RATIO {
            let previous = sse;
            x = candidate;
            r = r_new;
            sse = sse_new;
            jac = problem.jacobian(&x);
            for (s, v) in scale.iter_mut().zip(column_norms(&jac).iter()) {
                if v.is_finite() {
                    *s = s.max(*v);
                }
            }

            damping *= (1.0 / 3.0_f64).max(1.0 - (2.0 * rho - 1.0).powi(3));
            nu = 2.0;

            if actual <= opts.ftol * previous && predicted <= opts.ftol * previous {
                return Ok(report(x, r, jac, sse, evaluations, iterations, Termination::CostReduction));
            }
            if small_step {
                return Ok(report(x, r, jac, sse, evaluations, iterations, Termination::SmallStep));
            }
        } else {
            // A rejected step this small means we are already at the minimum.
            if small_step {
                return Ok(report(x, r, jac, sse, evaluations, iterations, Termination::SmallStep));
            }
            damping *= nu;
            nu *= 2.0;
            if !damping.is_finite() || damping > MAX_DAMPING {
                return Err(LmError::Stalled);
            }
        }
    }
}

fn report(
    params: DVector<f64>,
    residuals: DVector<f64>,
    jacobian: DMatrix<f64>,
    sse: f64,
    evaluations: usize,
    iterations: usize,
    termination: Termination,
) -> LmReport {
    LmReport {
        params,
        residuals,
        jacobian,
        sse,
        evaluations,
        iterations,
        termination,
    }
}

/// Solve `[J; √λ·diag(D)] δ = [−r; 0]` in the least-squares sense.
fn damped_step(
    jac: &DMatrix<f64>,
    r: &DVector<f64>,
    scale: &DVector<f64>,
    damping: f64,
) -> Option<DVector<f64>> {
    let (m, n) = jac.shape();
    let mut a = DMatrix::<f64>::zeros(m + n, n);
    let mut rhs = DVector::<f64>::zeros(m + n);

    for i in 0..m {
        for j in 0..n {
            a[(i, j)] = jac[(i, j)];
        }
        rhs[i] = -r[i];
    }
    let sqrt_damping = damping.sqrt();
    for j in 0..n {
        a[(m + j, j)] = sqrt_damping * scale[j];
    }

    solve_least_squares(&a, &rhs)
}

fn column_norms(jac: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(jac.ncols(), jac.column_iter().map(|c| c.norm()))
}

fn scaled_norm(v: &DVector<f64>, scale: &DVector<f64>) -> f64 {
    v.component_mul(scale).norm()
}

fn all_finite(v: &DVector<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// `y = p0 · exp(−p1 · x)` sampled without noise.
    struct ExpDecay {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl ExpDecay {
        fn new(p0: f64, p1: f64) -> Self {
            let x: Vec<f64> = (0..12).map(|i| i as f64 * 0.5).collect();
            let y = x.iter().map(|&t| p0 * (-p1 * t).exp()).collect();
            Self { x, y }
        }
    }

    impl LeastSquaresProblem for ExpDecay {
        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_iterator(
                self.x.len(),
                self.x
                    .iter()
                    .zip(&self.y)
                    .map(|(&t, &y)| p[0] * (-p[1] * t).exp() - y),
            )
        }

        fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
            let mut jac = DMatrix::zeros(self.x.len(), 2);
            for (i, &t) in self.x.iter().enumerate() {
                let e = (-p[1] * t).exp();
                jac[(i, 0)] = e;
                jac[(i, 1)] = -p[0] * t * e;
            }
            jac
        }
    }

    #[test]
    fn recovers_exponential_decay() {
        let problem = ExpDecay::new(5.0, 0.7);
        let report = minimize(&problem, DVector::from_vec(vec![1.0, 0.1]), &LmOptions::default()).unwrap();
        assert_relative_eq!(report.params[0], 5.0, max_relative = 1e-6);
        assert_relative_eq!(report.params[1], 0.7, max_relative = 1e-6);
        assert!(report.sse < 1e-12);
        assert!(report.evaluations <= LmOptions::default().max_evaluations);
    }

    #[test]
    fn exact_start_stops_immediately() {
        let problem = ExpDecay::new(2.0, 0.3);
        let report = minimize(&problem, DVector::from_vec(vec![2.0, 0.3]), &LmOptions::default()).unwrap();
        assert_eq!(report.termination, Termination::ZeroResiduals);
        assert_eq!(report.evaluations, 1);
    }

    #[test]
    fn evaluation_budget_is_reported() {
        let problem = ExpDecay::new(5.0, 0.7);
        let opts = LmOptions {
            max_evaluations: 2,
            ..LmOptions::default()
        };
        let err = minimize(&problem, DVector::from_vec(vec![1.0, 0.1]), &opts).unwrap_err();
        assert_eq!(err, LmError::MaxEvaluations { limit: 2 });
    }

    #[test]
    fn rejects_underdetermined_problems() {
        let problem = ExpDecay {
            x: vec![1.0],
            y: vec![1.0],
        };
        let err = minimize(&problem, DVector::from_vec(vec![1.0, 0.1]), &LmOptions::default()).unwrap_err();
        assert_eq!(err, LmError::Underdetermined { residuals: 1, params: 2 });
    }
}
