//! Command-line parsing for the lactation curve analyzer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::LactationLength;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "lacta", version, about = "Wood lactation curve fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a Wood curve to `day,yield` lines and print indicators, a table and a plot.
    Analyze(AnalyzeArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
    /// Print a synthetic `day,yield` dataset drawn from a known Wood curve.
    Simulate(SimulateArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same analysis pipeline as `lacta analyze`, but lets you edit
    /// the dataset and lactation length in a terminal UI.
    Tui(TuiArgs),
}

/// Lactation length shared by `analyze` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct LengthArg {
    /// Standard lactation length in days (upper bound of the cumulative yield integral).
    #[arg(
        short = 'l',
        long = "length",
        env = "LACTA_LENGTH",
        default_value_t = LactationLength::DEFAULT,
        value_parser = clap::value_parser!(u32).range(LactationLength::MIN as i64..=LactationLength::MAX as i64)
    )]
    pub days: u32,
}

impl LengthArg {
    pub fn lactation_length(&self) -> Result<LactationLength, crate::error::AppError> {
        LactationLength::new(self.days)
    }
}

#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Dataset file with one `day,yield` pair per line (`-` for stdin).
    /// Uses the built-in example dataset when omitted.
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub length: LengthArg,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export per-observation results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export curve (parameters + indicators + fitted grid) to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,

    /// Log fit diagnostics to stderr (same as `RUST_LOG=debug`).
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Options for plotting a saved curve.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Curve JSON file produced by `lacta analyze --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for synthetic data generation.
#[derive(Debug, Parser)]
pub struct SimulateArgs {
    /// Scale parameter `a`.
    #[arg(long, default_value_t = 20.0)]
    pub a: f64,

    /// Rise parameter `b`.
    #[arg(long, default_value_t = 0.25)]
    pub b: f64,

    /// Decline parameter `c`.
    #[arg(long, default_value_t = 0.004)]
    pub c: f64,

    #[arg(long, default_value_t = 5)]
    pub first_day: u32,

    #[arg(long, default_value_t = 305)]
    pub last_day: u32,

    /// Days between test days.
    #[arg(long, default_value_t = 10)]
    pub step: u32,

    /// Log-scale standard deviation of multiplicative noise.
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Parser, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub length: LengthArg,
}
