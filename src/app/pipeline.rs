//! Shared analysis pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! parse -> fit -> indicators -> residuals -> curve grid
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use tracing::info;

use crate::domain::{AnalysisConfig, AnalysisResult, CurveGrid, LactationLength, Observation, WoodParams};
use crate::error::AnalysisError;
use crate::fit::{derive_indicators, fit_wood};
use crate::io::{parse_observations, parse_text};
use crate::models::evaluate_many;
use crate::report::compute_residuals;

/// Run a full analysis over `day,yield` lines.
pub fn analyze<I, S>(lines: I, config: &AnalysisConfig) -> Result<AnalysisResult, AnalysisError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    analyze_observations(parse_observations(lines)?, config)
}

/// Run a full analysis over a block of dataset text (see [`parse_text`]).
pub fn analyze_text(text: &str, config: &AnalysisConfig) -> Result<AnalysisResult, AnalysisError> {
    analyze_observations(parse_text(text)?, config)
}

/// Run the fit and derive everything a front-end displays.
pub fn analyze_observations(
    observations: Vec<Observation>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let fit = fit_wood(&observations, &config.fit)?;
    let indicators = derive_indicators(&fit.params, config.lactation_length, &config.quadrature)?;
    let residuals = compute_residuals(&observations, &fit.params);
    let curve = curve_grid(&fit.params, config.lactation_length, config.curve_points);

    info!(
        n = observations.len(),
        lactation_length = config.lactation_length.days(),
        peak_time = indicators.peak_time,
        peak_yield = indicators.peak_yield,
        total_yield = indicators.total_yield,
        persistency_pct = indicators.persistency_pct,
        "analysis complete"
    );

    Ok(AnalysisResult {
        params: fit.params,
        indicators,
        quality: fit.quality,
        lactation_length: config.lactation_length,
        observations,
        residuals,
        curve,
    })
}

/// Evenly spaced samples of the fitted curve on `[1, L]`.
pub fn curve_grid(params: &WoodParams, length: LactationLength, points: usize) -> CurveGrid {
    let n = points.max(2);
    let (d0, d1) = (1.0, length.days() as f64);
    let day: Vec<f64> = (0..n)
        .map(|i| d0 + (d1 - d0) * i as f64 / (n as f64 - 1.0))
        .collect();
    let y = evaluate_many(&day, params);
    CurveGrid { day, y }
}
