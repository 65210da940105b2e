//! Numerical kernels: least squares, Levenberg–Marquardt, and quadrature.

pub mod lm;
pub mod ols;
pub mod quad;

pub use lm::*;
pub use ols::*;
pub use quad::*;
