//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::fit::FitOptions;
use crate::math::QuadOptions;

/// Smallest dataset accepted for a 3-parameter fit.
pub const MIN_OBSERVATIONS: usize = 5;

/// Day at which persistency is measured.
///
/// Fixed by convention; it does not follow the configured lactation length.
pub const REFERENCE_DAY: f64 = 250.0;

/// Number of samples in the fitted curve grid handed to plotting code.
pub const CURVE_POINTS: usize = 305;

/// One `(day, yield)` measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Days in milk (DIM), starting at 1.
    pub day: u32,
    /// Daily milk yield (kg/day).
    #[serde(rename = "yield")]
    pub yield_: f64,
}

/// Wood model parameters for `Y(t) = a·t^b·e^(−c·t)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WoodParams {
    /// Scale factor.
    pub a: f64,
    /// Pre-peak rise rate.
    pub b: f64,
    /// Post-peak decline rate.
    pub c: f64,
}

impl WoodParams {
    /// Starting point for the optimizer: a typical curve in kg/day over DIM.
    pub const INITIAL_GUESS: WoodParams = WoodParams {
        a: 15.0,
        b: 0.2,
        c: 0.003,
    };

    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite()
    }
}

/// Standard lactation length in days, the upper integration bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct LactationLength(u32);

impl LactationLength {
    pub const MIN: u32 = 100;
    pub const MAX: u32 = 500;
    pub const DEFAULT: u32 = 305;
    /// Increment used by interactive front-ends.
    pub const STEP: u32 = 5;

    pub fn new(days: u32) -> Result<Self, AppError> {
        if !(Self::MIN..=Self::MAX).contains(&days) {
            return Err(AppError::new(
                2,
                format!(
                    "Lactation length must be within [{}, {}] days, got {days}.",
                    Self::MIN,
                    Self::MAX
                ),
            ));
        }
        Ok(Self(days))
    }

    pub fn days(self) -> u32 {
        self.0
    }

    /// Step up or down by `STEP` days, saturating at the bounds.
    pub fn stepped(self, delta: i32) -> Self {
        let next = if delta >= 0 {
            self.0.saturating_add(Self::STEP)
        } else {
            self.0.saturating_sub(Self::STEP)
        };
        Self(next.clamp(Self::MIN, Self::MAX))
    }
}

impl Default for LactationLength {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<u32> for LactationLength {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        LactationLength::new(value).map_err(|e| e.to_string())
    }
}

impl From<LactationLength> for u32 {
    fn from(value: LactationLength) -> Self {
        value.0
    }
}

impl std::fmt::Display for LactationLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Performance indicators derived from fitted parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    /// Day of maximum yield, `b / c`.
    pub peak_time: f64,
    /// Yield at `peak_time` (kg/day).
    pub peak_yield: f64,
    /// Cumulative yield from day 1 to the lactation length (kg).
    pub total_yield: f64,
    /// Model yield at `REFERENCE_DAY` (kg/day).
    pub yield_at_reference_day: f64,
    /// `100 * yield_at_reference_day / peak_yield`, or 0 when the peak is not positive.
    pub persistency_pct: f64,
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub r_squared: f64,
    pub n: usize,
    /// Residual evaluations spent by the optimizer.
    pub evaluations: usize,
    pub iterations: usize,
}

/// A per-observation fitted result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationResidual {
    pub observation: Observation,
    pub fitted: f64,
    pub residual: f64,
}

/// Dense samples of the fitted curve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurveGrid {
    pub day: Vec<f64>,
    pub y: Vec<f64>,
}

impl CurveGrid {
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.day.iter().copied().zip(self.y.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.day.len()
    }

    pub fn is_empty(&self) -> bool {
        self.day.is_empty()
    }
}

/// Configuration of one analysis run.
///
/// Passed explicitly into the pipeline; nothing is read from global state.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub lactation_length: LactationLength,
    /// Number of samples in the output curve grid.
    pub curve_points: usize,
    pub fit: FitOptions,
    pub quadrature: QuadOptions,
}

impl AnalysisConfig {
    pub fn with_length(lactation_length: LactationLength) -> Self {
        Self {
            lactation_length,
            ..Self::default()
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lactation_length: LactationLength::default(),
            curve_points: CURVE_POINTS,
            fit: FitOptions::default(),
            quadrature: QuadOptions::default(),
        }
    }
}

/// Everything a front-end needs to display one analysis.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub params: WoodParams,
    pub indicators: Indicators,
    pub quality: FitQuality,
    pub lactation_length: LactationLength,
    /// Observations in input order.
    pub observations: Vec<Observation>,
    pub residuals: Vec<ObservationResidual>,
    /// Fitted curve on `[1, lactation_length]`.
    pub curve: CurveGrid,
}

/// A saved curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub model: WoodParams,
    pub lactation_length: LactationLength,
    pub indicators: Indicators,
    pub fit_quality: FitQuality,
    pub observations: Vec<Observation>,
    pub grid: CurveGrid,
}
