//! Nonlinear least-squares fit of the Wood model.
//!
//! Given observations `(dᵢ, yᵢ)` we minimize
//!
//! ```text
//! Σ (a·dᵢ^b·e^(−c·dᵢ) − yᵢ)²
//! ```
//!
//! with Levenberg–Marquardt from a fixed initial guess. The model is mildly
//! ill-conditioned (`a` and `c` trade off against each other), so the optimizer
//! gets a generous evaluation budget.
//!
//! A fit either converges to finite, identifiable parameters or fails; partial or
//! clamped parameters are never returned.

use std::collections::BTreeSet;

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::domain::{FitQuality, MIN_OBSERVATIONS, Observation, WoodParams};
use crate::error::{AnalysisError, FitFailure};
use crate::math::{LeastSquaresProblem, LmOptions, Termination, minimize, scaled_condition_ratio};
use crate::models::{evaluate, gradient};

/// A 3-parameter curve needs at least this many distinct days.
const MIN_DISTINCT_DAYS: usize = 3;

/// Scaled condition ratio below which the Jacobian is treated as singular.
const SINGULAR_RATIO: f64 = 1e-10;

/// Fitting options.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Starting point for the optimizer.
    pub initial: WoodParams,
    /// Optimizer settings, including the evaluation budget.
    pub lm: LmOptions,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            initial: WoodParams::INITIAL_GUESS,
            lm: LmOptions::default(),
        }
    }
}

/// A converged fit.
#[derive(Debug, Clone)]
pub struct WoodFit {
    pub params: WoodParams,
    pub quality: FitQuality,
    pub termination: Termination,
}

struct WoodProblem {
    days: Vec<f64>,
    yields: Vec<f64>,
}

impl WoodProblem {
    fn new(observations: &[Observation]) -> Self {
        Self {
            days: observations.iter().map(|o| o.day as f64).collect(),
            yields: observations.iter().map(|o| o.yield_).collect(),
        }
    }
}

fn params_from(v: &DVector<f64>) -> WoodParams {
    WoodParams::new(v[0], v[1], v[2])
}

impl LeastSquaresProblem for WoodProblem {
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
        let p = params_from(params);
        DVector::from_iterator(
            self.days.len(),
            self.days
                .iter()
                .zip(&self.yields)
                .map(|(&t, &y)| evaluate(t, &p) - y),
        )
    }

    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64> {
        let p = params_from(params);
        let mut jac = DMatrix::<f64>::zeros(self.days.len(), 3);
        for (i, &t) in self.days.iter().enumerate() {
            let g = gradient(t, &p);
            for j in 0..3 {
                jac[(i, j)] = g[j];
            }
        }
        jac
    }
}

/// Fit Wood parameters to the observations.
pub fn fit_wood(observations: &[Observation], opts: &FitOptions) -> Result<WoodFit, AnalysisError> {
    let n = observations.len();
    if n < MIN_OBSERVATIONS {
        return Err(AnalysisError::InsufficientData {
            found: n,
            required: MIN_OBSERVATIONS,
        });
    }
    ensure_identifiable(observations)?;

    let problem = WoodProblem::new(observations);
    let initial = DVector::from_row_slice(&opts.initial.to_array());

    let report = minimize(&problem, initial, &opts.lm).map_err(|e| {
        warn!(error = %e, n, "Wood fit did not converge");
        FitFailure::from(e)
    })?;

    let params = params_from(&report.params);
    if !params.is_finite() {
        return Err(FitFailure::NonFiniteParameters.into());
    }
    if scaled_condition_ratio(&report.jacobian) < SINGULAR_RATIO {
        return Err(FitFailure::SingularJacobian.into());
    }

    let mean = problem.yields.iter().sum::<f64>() / n as f64;
    let sst: f64 = problem.yields.iter().map(|y| (y - mean).powi(2)).sum();
    let quality = FitQuality {
        sse: report.sse,
        rmse: (report.sse / n as f64).sqrt(),
        r_squared: 1.0 - report.sse / sst,
        n,
        evaluations: report.evaluations,
        iterations: report.iterations,
    };

    debug!(
        a = params.a,
        b = params.b,
        c = params.c,
        sse = quality.sse,
        evaluations = report.evaluations,
        termination = ?report.termination,
        "Wood fit converged"
    );

    Ok(WoodFit {
        params,
        quality,
        termination: report.termination,
    })
}

/// Reject datasets whose shape cannot pin down `(a, b, c)`.
fn ensure_identifiable(observations: &[Observation]) -> Result<(), FitFailure> {
    let distinct: BTreeSet<u32> = observations.iter().map(|o| o.day).collect();
    if distinct.len() < MIN_DISTINCT_DAYS {
        return Err(FitFailure::TooFewDistinctDays {
            distinct: distinct.len(),
            required: MIN_DISTINCT_DAYS,
        });
    }

    let (min, max) = observations
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), o| {
            (lo.min(o.yield_), hi.max(o.yield_))
        });
    if max - min <= f64::EPSILON * max.abs().max(1.0) {
        return Err(FitFailure::ConstantYields { value: max });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::LmError;
    use approx::assert_relative_eq;

    fn synthetic(days: &[u32], params: &WoodParams) -> Vec<Observation> {
        days.iter()
            .map(|&day| Observation {
                day,
                yield_: evaluate(day as f64, params),
            })
            .collect()
    }

    fn assert_params_close(got: &WoodParams, want: &WoodParams, tol: f64) {
        assert_relative_eq!(got.a, want.a, max_relative = tol);
        assert_relative_eq!(got.b, want.b, max_relative = tol);
        assert_relative_eq!(got.c, want.c, max_relative = tol);
    }

    #[test]
    fn noise_free_data_recovers_parameters() {
        let truth = WoodParams::new(20.0, 0.25, 0.004);
        let obs = synthetic(&[10, 30, 50, 80, 110, 150, 200, 250, 300], &truth);

        let fit = fit_wood(&obs, &FitOptions::default()).unwrap();
        assert_params_close(&fit.params, &truth, 1e-3);
        assert!(fit.quality.sse < 1e-8);
        assert!(fit.quality.r_squared > 0.999_999);
        assert_eq!(fit.quality.n, 9);
    }

    #[test]
    fn exactly_five_observations_are_enough() {
        let truth = WoodParams::new(20.0, 0.25, 0.004);
        let obs = synthetic(&[10, 30, 50, 80, 110], &truth);

        let fit = fit_wood(&obs, &FitOptions::default()).unwrap();
        assert_params_close(&fit.params, &truth, 1e-3);
    }

    #[test]
    fn unordered_and_repeated_days_are_accepted() {
        let truth = WoodParams::new(25.0, 0.18, 0.0035);
        let obs = synthetic(&[200, 10, 90, 90, 300, 45, 150], &truth);

        let fit = fit_wood(&obs, &FitOptions::default()).unwrap();
        assert_params_close(&fit.params, &truth, 1e-3);
    }

    #[test]
    fn four_observations_are_rejected() {
        let truth = WoodParams::new(20.0, 0.25, 0.004);
        let obs = synthetic(&[10, 30, 50, 80], &truth);

        let err = fit_wood(&obs, &FitOptions::default()).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { found: 4, required: 5 });
    }

    #[test]
    fn constant_yields_do_not_fit() {
        let obs: Vec<Observation> = [10, 20, 30, 40, 50]
            .iter()
            .map(|&day| Observation { day, yield_: 30.0 })
            .collect();

        let err = fit_wood(&obs, &FitOptions::default()).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::FitConvergence(FitFailure::ConstantYields { value: 30.0 })
        );
    }

    #[test]
    fn two_distinct_days_do_not_fit() {
        let obs = vec![
            Observation { day: 10, yield_: 20.0 },
            Observation { day: 10, yield_: 21.0 },
            Observation { day: 10, yield_: 22.0 },
            Observation { day: 50, yield_: 30.0 },
            Observation { day: 50, yield_: 31.0 },
        ];

        let err = fit_wood(&obs, &FitOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::FitConvergence(FitFailure::TooFewDistinctDays { distinct: 2, .. })
        ));
    }

    #[test]
    fn exhausted_budget_is_a_fit_failure() {
        let truth = WoodParams::new(20.0, 0.25, 0.004);
        let obs = synthetic(&[10, 30, 50, 80, 110, 150, 200, 250, 300], &truth);
        let opts = FitOptions {
            lm: LmOptions {
                max_evaluations: 2,
                ..LmOptions::default()
            },
            ..FitOptions::default()
        };

        let err = fit_wood(&obs, &opts).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::FitConvergence(FitFailure::Optimizer(LmError::MaxEvaluations { limit: 2 }))
        );
    }
}
