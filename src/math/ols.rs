//! Linear least squares solver.
//!
//! Every Levenberg–Marquardt step solves a small linear problem of the form:
//!
//! ```text
//! minimize ‖A δ − r‖²
//! ```
//!
//! where `A` stacks the Jacobian on top of the damping rows, so it is always tall
//! (more rows than columns).
//!
//! Implementation choices:
//! - We use SVD to solve the least-squares problem robustly for tall matrices.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - The parameter dimension is tiny (3 columns), so SVD cost is negligible.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Ratio of the smallest to the largest singular value of `x` after scaling
/// every column to unit norm.
///
/// Returns 0 for matrices with an all-zero column.
pub fn scaled_condition_ratio(x: &DMatrix<f64>) -> f64 {
    let mut scaled = x.clone();
    for mut col in scaled.column_iter_mut() {
        let norm = col.norm();
        if !(norm.is_finite() && norm > 0.0) {
            return 0.0;
        }
        col /= norm;
    }

    let sv = scaled.singular_values();
    let max = sv.max();
    let min = sv.min();
    if max > 0.0 && max.is_finite() { min / max } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn condition_ratio_flags_collinear_columns() {
        let good = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        assert!(scaled_condition_ratio(&good) > 1e-3);

        let collinear = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        assert!(scaled_condition_ratio(&collinear) < 1e-12);

        let zero_col = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 2.0, 0.0]);
        assert_eq!(scaled_condition_ratio(&zero_col), 0.0);
    }
}
