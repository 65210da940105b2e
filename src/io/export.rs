//! Export per-observation results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::ObservationResidual;
use crate::error::AppError;

pub const RESULTS_CSV_HEADER: &str = "day,yield_obs,yield_fit,residual";

/// Write per-observation results as CSV to any writer.
pub fn write_results<W: Write>(mut out: W, residuals: &[ObservationResidual]) -> std::io::Result<()> {
    writeln!(out, "{RESULTS_CSV_HEADER}")?;
    for r in residuals {
        writeln!(
            out,
            "{},{:.4},{:.4},{:.4}",
            r.observation.day, r.observation.yield_, r.fitted, r.residual
        )?;
    }
    out.flush()
}

/// Write per-observation results to a CSV file.
pub fn write_results_csv(path: &Path, residuals: &[ObservationResidual]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    write_results(BufWriter::new(file), residuals)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))
}
