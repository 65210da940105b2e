//! Error types.
//!
//! Two layers:
//! - [`AnalysisError`]: typed failures of a single analysis run (library API).
//! - [`AppError`]: message + process exit code, used at the binary boundary.

use thiserror::Error;

use crate::math::{LmError, QuadError};

/// Why a line of input could not be turned into an observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseReason {
    MissingSeparator,
    TooManyFields,
    InvalidDay,
    InvalidYield,
}

impl std::fmt::Display for ParseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ParseReason::MissingSeparator => "expected `day,yield` (missing comma)",
            ParseReason::TooManyFields => "expected exactly two comma-separated fields",
            ParseReason::InvalidDay => "day must be an integer >= 1",
            ParseReason::InvalidYield => "yield must be a finite number >= 0",
        };
        f.write_str(msg)
    }
}

/// Reasons a fit is rejected before or after optimization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitFailure {
    #[error(transparent)]
    Optimizer(#[from] LmError),

    #[error("only {distinct} distinct day value(s); at least {required} are needed")]
    TooFewDistinctDays { distinct: usize, required: usize },

    #[error("all yields are identical ({value}); the curve shape is unidentifiable")]
    ConstantYields { value: f64 },

    #[error("optimizer produced non-finite parameters")]
    NonFiniteParameters,

    #[error("Jacobian is singular at the solution")]
    SingularJacobian,
}

/// A failed analysis run. Every variant is terminal: no partial results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("line {line_no} ('{line}'): {reason}")]
    Parse {
        line_no: usize,
        line: String,
        reason: ParseReason,
    },

    #[error("need at least {required} observations for a stable fit, got {found}")]
    InsufficientData { found: usize, required: usize },

    #[error("curve fit failed: {0}")]
    FitConvergence(#[from] FitFailure),

    #[error("degenerate fit: peak time b/c = {peak_time} is not a positive finite day")]
    DegenerateFit { peak_time: f64 },

    #[error("integration failed: {0}")]
    Integration(#[from] QuadError),
}

impl AnalysisError {
    /// Process exit code used by the binary for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            AnalysisError::Parse { .. } => 2,
            AnalysisError::InsufficientData { .. } => 3,
            AnalysisError::FitConvergence(_)
            | AnalysisError::DegenerateFit { .. }
            | AnalysisError::Integration(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_message_names_the_line() {
        let err = AnalysisError::Parse {
            line_no: 3,
            line: "30,abc".to_string(),
            reason: ParseReason::InvalidYield,
        };
        let msg = err.to_string();
        assert!(msg.contains("30,abc"), "{msg}");
        assert!(msg.contains("line 3"), "{msg}");
    }

    #[test]
    fn analysis_errors_map_to_exit_codes() {
        let app: AppError = AnalysisError::InsufficientData { found: 4, required: 5 }.into();
        assert_eq!(app.exit_code(), 3);

        let app: AppError = AnalysisError::DegenerateFit { peak_time: -2.0 }.into();
        assert_eq!(app.exit_code(), 4);
    }
}
