//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{AnalysisResult, Indicators, ObservationResidual, REFERENCE_DAY, WoodParams};

/// Format the full run summary (dataset, fit diagnostics, parameters, indicators).
pub fn format_summary(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let q = &result.quality;

    out.push_str("=== lacta - Wood Lactation Curve ===\n");
    out.push_str(&format!("Lactation length: {} days\n", result.lactation_length));

    let (day_min, day_max) = day_range(&result.residuals);
    out.push_str(&format!(
        "Observations: n={} | day=[{day_min}, {day_max}]\n",
        result.observations.len()
    ));

    out.push_str("\nFit diagnostics:\n");
    out.push_str(&format!(
        "  SSE={:.3} RMSE={:.3} kg/day R²={:.4} (iterations={}, evaluations={})\n",
        q.sse, q.rmse, q.r_squared, q.iterations, q.evaluations
    ));

    out.push_str("\nModel parameters:\n");
    out.push_str(&format_params(&result.params));

    out.push_str("\nIndicators:\n");
    out.push_str(&format_indicators(&result.indicators, result.lactation_length.days()));
    out.push('\n');

    out
}

/// `a`, `b`, `c` one per line.
pub fn format_params(params: &WoodParams) -> String {
    format!(
        "  a = {:.4}\n  b = {:.4}\n  c = {:.4}\n",
        params.a, params.b, params.c
    )
}

pub fn format_indicators(ind: &Indicators, lactation_length: u32) -> String {
    let mut out = String::new();
    out.push_str(&format!("  Peak yield:       {:.2} kg/day\n", ind.peak_yield));
    out.push_str(&format!("  Time to peak:     {:.1} days\n", ind.peak_time));
    out.push_str(&format!(
        "  Total yield:      {:.0} kg (days 1-{lactation_length})\n",
        ind.total_yield
    ));
    out.push_str(&format!(
        "  Persistency:      {:.1} % (day {REFERENCE_DAY:.0} vs peak)\n",
        ind.persistency_pct
    ));
    out
}

/// Format the observed/fitted/residual table.
pub fn format_observations(rows: &[ObservationResidual]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>6} {:>12} {:>12} {:>12}\n", "day", "observed", "fitted", "residual"));
    out.push_str(&format!("{:-<6} {:-<12} {:-<12} {:-<12}\n", "", "", "", ""));

    for r in rows {
        out.push_str(&format!(
            "{:>6} {:>12.2} {:>12.2} {:>12.2}\n",
            r.observation.day, r.observation.yield_, r.fitted, r.residual
        ));
    }

    out
}

fn day_range(rows: &[ObservationResidual]) -> (u32, u32) {
    rows.iter()
        .map(|r| r.observation.day)
        .fold(None, |acc, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
        .unwrap_or((0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;

    #[test]
    fn indicators_use_fixed_precision() {
        let ind = Indicators {
            peak_time: 83.9712,
            peak_yield: 41.2249,
            total_yield: 10197.33,
            yield_at_reference_day: 27.87,
            persistency_pct: 67.61,
        };
        let text = format_indicators(&ind, 305);
        assert!(text.contains("41.22 kg/day"), "{text}");
        assert!(text.contains("84.0 days"), "{text}");
        assert!(text.contains("10197 kg (days 1-305)"), "{text}");
        assert!(text.contains("67.6 %"), "{text}");
        assert!(text.contains("day 250"), "{text}");
    }

    #[test]
    fn params_use_four_decimals() {
        let text = format_params(&WoodParams::new(9.061875, 0.441589, 0.0052588));
        assert_eq!(text, "  a = 9.0619\n  b = 0.4416\n  c = 0.0053\n");
    }

    #[test]
    fn observation_table_has_one_row_per_observation() {
        let rows = [
            ObservationResidual {
                observation: Observation { day: 15, yield_: 25.5 },
                fitted: 26.0,
                residual: -0.5,
            },
            ObservationResidual {
                observation: Observation { day: 300, yield_: 24.5 },
                fitted: 24.25,
                residual: 0.25,
            },
        ];
        let text = format_observations(&rows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("residual"));
        assert!(lines[2].trim_start().starts_with("15"));
        assert!(lines[2].ends_with("-0.50"), "{text}");
        assert!(lines[3].ends_with("0.25"), "{text}");
        assert_eq!(day_range(&rows), (15, 300));
    }
}
