//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw observations (`Observation`) and the validated `LactationLength`
//! - fit outputs (`WoodParams`, `FitQuality`, `Indicators`, `AnalysisResult`)
//! - the portable curve file schema (`CurveFile`)

pub mod types;

pub use types::*;
