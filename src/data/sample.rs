//! Example and synthetic lactation datasets.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Observation, WoodParams};
use crate::error::AppError;
use crate::io::parse_text;
use crate::models::evaluate;

/// A typical Holstein test-day record, one `day,yield` pair per line.
pub const EXAMPLE_DATASET: &str = "\
15,25.5
30,35.1
45,40.2
60,42.5
75,41.8
90,40.1
120,38.5
150,36.2
180,34.0
210,31.5
240,29.1
270,26.8
300,24.5";

/// The parsed example dataset.
pub fn example_observations() -> Vec<Observation> {
    parse_text(EXAMPLE_DATASET).unwrap_or_default()
}

/// Render observations in the `day,yield` text form accepted by `parse_text`.
pub fn format_dataset(observations: &[Observation]) -> String {
    observations
        .iter()
        .map(|o| format!("{},{:.2}", o.day, o.yield_))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Settings for synthetic data generation.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub params: WoodParams,
    pub first_day: u32,
    pub last_day: u32,
    pub step: u32,
    /// Log-scale standard deviation of the multiplicative noise (0 = exact curve).
    pub noise: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            params: WoodParams::new(20.0, 0.25, 0.004),
            first_day: 5,
            last_day: 305,
            step: 10,
            noise: 0.05,
            seed: 42,
        }
    }
}

/// Sample the Wood curve on a regular day grid with multiplicative log-normal noise.
///
/// `y = Y(t) · exp(σ·z − σ²/2)` with `z ~ N(0, 1)`, so the noise is mean-preserving
/// and yields stay non-negative.
pub fn simulate(config: &SimulationConfig) -> Result<Vec<Observation>, AppError> {
    if config.first_day == 0 || config.last_day < config.first_day {
        return Err(AppError::new(2, "Invalid day range for simulation (need 1 <= first <= last)."));
    }
    if config.step == 0 {
        return Err(AppError::new(2, "Simulation step must be > 0."));
    }
    if !config.params.is_finite() || config.params.a <= 0.0 {
        return Err(AppError::new(2, "Simulation parameters must be finite with a > 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;
    let mean_correction = 0.5 * config.noise * config.noise;

    let observations = (config.first_day..=config.last_day)
        .step_by(config.step as usize)
        .map(|day| {
            let base = evaluate(day as f64, &config.params);
            let z: f64 = normal.sample(&mut rng);
            Observation {
                day,
                yield_: base * (z - mean_correction).exp(),
            }
        })
        .collect();

    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::analyze_observations;
    use crate::domain::AnalysisConfig;
    use crate::models::peak_time;
    use approx::assert_relative_eq;

    #[test]
    fn example_dataset_parses() {
        let obs = example_observations();
        assert_eq!(obs.len(), 13);
        assert_eq!(obs[0], Observation { day: 15, yield_: 25.5 });
        assert_eq!(obs[12], Observation { day: 300, yield_: 24.5 });
    }

    #[test]
    fn formatted_dataset_parses_back() {
        let text = format_dataset(&example_observations());
        assert!(text.starts_with("15,25.50\n30,35.10"));
        assert_eq!(parse_text(&text).unwrap(), example_observations());
    }

    #[test]
    fn simulation_is_deterministic_per_seed() {
        let config = SimulationConfig::default();
        let a = simulate(&config).unwrap();
        let b = simulate(&config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 31);
        assert_eq!(a[0].day, 5);
        assert_eq!(a[30].day, 305);

        let other = simulate(&SimulationConfig { seed: 7, ..config }).unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn zero_noise_reproduces_the_curve() {
        let config = SimulationConfig {
            noise: 0.0,
            ..SimulationConfig::default()
        };
        for o in simulate(&config).unwrap() {
            assert_relative_eq!(o.yield_, evaluate(o.day as f64, &config.params), max_relative = 1e-12);
        }
    }

    #[test]
    fn noisy_simulation_fits_near_the_truth() {
        let config = SimulationConfig {
            noise: 0.03,
            ..SimulationConfig::default()
        };
        let obs = simulate(&config).unwrap();
        let result = analyze_observations(obs, &AnalysisConfig::default()).unwrap();

        let true_peak = peak_time(&config.params);
        assert_relative_eq!(result.indicators.peak_time, true_peak, max_relative = 0.15);
        assert_relative_eq!(
            result.indicators.peak_yield,
            evaluate(true_peak, &config.params),
            max_relative = 0.05
        );
    }

    #[test]
    fn rejects_bad_settings() {
        let base = SimulationConfig::default();
        assert!(simulate(&SimulationConfig { step: 0, ..base.clone() }).is_err());
        assert!(simulate(&SimulationConfig { first_day: 0, ..base.clone() }).is_err());
        assert!(simulate(&SimulationConfig { last_day: 1, ..base.clone() }).is_err());
        assert!(simulate(&SimulationConfig { noise: -1.0, ..base }).is_err());
    }
}
