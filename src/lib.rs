//! `lacta-curves` library crate.
//!
//! The binary (`lacta`) is a thin wrapper around this library so that:
//!
//! - the fitting engine is testable without spawning processes or a terminal
//! - front-ends (TUI, plain CLI) share one analysis pipeline
//! - the numerical kernels stay separate from presentation code

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
