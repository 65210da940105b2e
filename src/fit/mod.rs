//! Curve fitting and derived indicators.
//!
//! Responsibilities:
//!
//! - reject datasets that cannot identify three parameters
//! - estimate Wood parameters by Levenberg–Marquardt
//! - derive peak, persistency and cumulative yield from the fit

pub mod fitter;
pub mod indicators;

pub use fitter::*;
pub use indicators::*;
