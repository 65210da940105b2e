//! Performance indicators derived from a fitted Wood curve.
//!
//! - peak day `b / c` and the yield there
//! - cumulative yield `∫₁^L Y(t) dt` (adaptive quadrature)
//! - persistency: yield at day 250 as a percentage of peak yield
//!
//! Day 250 is a fixed convention and does not follow `L`; when `L < 250` the
//! curve is simply extrapolated past the configured horizon.

use tracing::warn;

use crate::domain::{Indicators, LactationLength, REFERENCE_DAY, WoodParams};
use crate::error::AnalysisError;
use crate::math::{QuadOptions, integrate};
use crate::models::{evaluate, peak_time};

/// Lower integration bound; day 0 is excluded to stay clear of `t^b` near zero.
pub const INTEGRATION_START_DAY: f64 = 1.0;

/// Derive indicators for converged parameters.
pub fn derive_indicators(
    params: &WoodParams,
    length: LactationLength,
    quad: &QuadOptions,
) -> Result<Indicators, AnalysisError> {
    let peak_time = peak_time(params);
    if !peak_time.is_finite() || peak_time <= 0.0 {
        return Err(AnalysisError::DegenerateFit { peak_time });
    }
    let peak_yield = evaluate(peak_time, params);

    let total = integrate(
        |t| evaluate(t, params),
        INTEGRATION_START_DAY,
        length.days() as f64,
        quad,
    )?;
    if !total.converged {
        warn!(
            abs_error = total.abs_error,
            intervals = total.intervals,
            "cumulative yield integral hit the subdivision limit; keeping best estimate"
        );
    }

    let yield_at_reference_day = evaluate(REFERENCE_DAY, params);

    Ok(Indicators {
        peak_time,
        peak_yield,
        total_yield: total.value,
        yield_at_reference_day,
        persistency_pct: persistency_pct(yield_at_reference_day, peak_yield),
    })
}

/// `100 · reference / peak`, or 0 when the peak is not positive.
pub fn persistency_pct(yield_at_reference_day: f64, peak_yield: f64) -> f64 {
    if peak_yield > 0.0 {
        100.0 * yield_at_reference_day / peak_yield
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::T_EPS;
    use approx::assert_relative_eq;

    fn length(days: u32) -> LactationLength {
        LactationLength::new(days).unwrap()
    }

    #[test]
    fn indicators_follow_closed_forms() {
        let params = WoodParams::new(20.0, 0.25, 0.004);
        let ind = derive_indicators(&params, length(305), &QuadOptions::default()).unwrap();

        assert_relative_eq!(ind.peak_time, 62.5, max_relative = 1e-12);
        assert_relative_eq!(ind.peak_yield, evaluate(62.5, &params), max_relative = 1e-12);
        assert_relative_eq!(ind.yield_at_reference_day, evaluate(250.0, &params), max_relative = 1e-12);
        assert_relative_eq!(
            ind.persistency_pct,
            100.0 * evaluate(250.0, &params) / evaluate(62.5, &params),
            max_relative = 1e-12
        );
        assert!(ind.persistency_pct > 0.0 && ind.persistency_pct <= 100.0);
    }

    #[test]
    fn total_yield_matches_exponential_closed_form() {
        // With b = 0 the curve is a·e^(−c·(t+ε)).
        let (a, c) = (30.0, 0.003);
        let params = WoodParams::new(a, 0.0, c);
        // b = 0 has no interior peak, so integrate directly.
        let r = integrate(|t| evaluate(t, &params), 1.0, 305.0, &QuadOptions::default()).unwrap();
        let exact = a / c * ((-c * (1.0 + T_EPS)).exp() - (-c * (305.0 + T_EPS)).exp());
        assert_relative_eq!(r.value, exact, max_relative = 1e-10);
    }

    #[test]
    fn total_yield_is_monotone_in_lactation_length() {
        let params = WoodParams::new(20.0, 0.25, 0.004);
        let mut prev = f64::NEG_INFINITY;
        for days in (LactationLength::MIN..=LactationLength::MAX).step_by(5) {
            let ind = derive_indicators(&params, length(days), &QuadOptions::default()).unwrap();
            assert!(ind.total_yield >= prev, "L={days}: {} < {prev}", ind.total_yield);
            prev = ind.total_yield;
        }
    }

    #[test]
    fn reference_day_does_not_follow_short_lactations() {
        let params = WoodParams::new(20.0, 0.25, 0.004);
        let short = derive_indicators(&params, length(200), &QuadOptions::default()).unwrap();
        let long = derive_indicators(&params, length(400), &QuadOptions::default()).unwrap();
        assert_eq!(short.yield_at_reference_day, long.yield_at_reference_day);
        assert_eq!(short.persistency_pct, long.persistency_pct);
        assert!(short.total_yield < long.total_yield);
    }

    #[test]
    fn zero_decline_rate_is_degenerate() {
        let params = WoodParams::new(20.0, 0.25, 0.0);
        let err = derive_indicators(&params, length(305), &QuadOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateFit { peak_time } if peak_time.is_infinite()));
    }

    #[test]
    fn negative_peak_time_is_degenerate() {
        let params = WoodParams::new(20.0, 0.25, -0.004);
        let err = derive_indicators(&params, length(305), &QuadOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateFit { peak_time } if peak_time < 0.0));

        let params = WoodParams::new(20.0, 0.0, 0.0);
        let err = derive_indicators(&params, length(305), &QuadOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateFit { peak_time } if peak_time.is_nan()));
    }

    #[test]
    fn persistency_guards_non_positive_peak() {
        assert_eq!(persistency_pct(10.0, 0.0), 0.0);
        assert_eq!(persistency_pct(10.0, -1.0), 0.0);
        assert_relative_eq!(persistency_pct(30.0, 40.0), 75.0);
    }
}
