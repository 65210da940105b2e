//! Reporting utilities: per-observation residuals and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{Observation, ObservationResidual, WoodParams};
use crate::models::evaluate;

/// Compute fitted values and residuals (`observed − fitted`) for each observation.
///
/// Output order follows the input order.
pub fn compute_residuals(observations: &[Observation], params: &WoodParams) -> Vec<ObservationResidual> {
    observations
        .iter()
        .map(|&observation| {
            let fitted = evaluate(observation.day as f64, params);
            ObservationResidual {
                observation,
                fitted,
                residual: observation.yield_ - fitted,
            }
        })
        .collect()
}
