//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of one analysis:
//! - Wood parameters and the lactation length they were evaluated over
//! - derived indicators and fit quality
//! - the input observations
//! - a precomputed fitted grid for quick plotting
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::domain::{AnalysisResult, CurveFile};
use crate::error::AppError;

/// Value of the `tool` field in files written by this crate.
pub const CURVE_TOOL: &str = "lacta";

impl From<&AnalysisResult> for CurveFile {
    fn from(result: &AnalysisResult) -> Self {
        CurveFile {
            tool: CURVE_TOOL.to_string(),
            model: result.params,
            lactation_length: result.lactation_length,
            indicators: result.indicators,
            fit_quality: result.quality.clone(),
            observations: result.observations.clone(),
            grid: result.curve.clone(),
        }
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, result: &AnalysisResult) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(BufWriter::new(file), &CurveFile::from(result))
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;

    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid curve JSON: {e}")))?;

    if curve.grid.day.len() != curve.grid.y.len() {
        return Err(AppError::new(
            2,
            format!(
                "Invalid curve JSON: grid has {} days but {} yields",
                curve.grid.day.len(),
                curve.grid.y.len()
            ),
        ));
    }
    Ok(curve)
}
