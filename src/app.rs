//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging for the non-interactive commands
//! - runs the analysis pipeline
//! - prints reports/plots
//! - writes optional exports

use std::io::{self, Write};

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Command, PlotArgs, SimulateArgs, TuiArgs};
use crate::data::{EXAMPLE_DATASET, SimulationConfig, format_dataset, simulate};
use crate::domain::{AnalysisConfig, WoodParams};
use crate::error::AppError;

pub mod pipeline;

pub use pipeline::{analyze, analyze_observations, analyze_text};

/// Entry point for the `lacta` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is the normal case.
    dotenvy::dotenv().ok();

    // We want `lacta` and `lacta -l 300` to behave like `lacta tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Analyze(args) => {
            init_logging(args.verbose);
            handle_analyze(args)
        }
        Command::Plot(args) => {
            init_logging(false);
            handle_plot(args)
        }
        Command::Simulate(args) => {
            init_logging(false);
            handle_simulate(args)
        }
        // No subscriber: log lines would corrupt the alternate screen.
        Command::Tui(args) => handle_tui(args),
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`, or `debug` when verbose).
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = AnalysisConfig::with_length(args.length.lactation_length()?);

    let text = match &args.file {
        Some(path) => crate::io::read_dataset_text(path)?,
        None => {
            debug!("no dataset file given; using the built-in example");
            EXAMPLE_DATASET.to_string()
        }
    };
    let result = analyze_text(&text, &config)?;

    println!("{}", crate::report::format_summary(&result));
    println!("{}", crate::report::format_observations(&result.residuals));

    if !args.no_plot {
        println!("{}", crate::plot::render_ascii_plot(&result, args.width, args.height));
    }

    if let Some(path) = &args.export {
        crate::io::write_results_csv(path, &result.residuals)?;
    }
    if let Some(path) = &args.export_curve {
        crate::io::write_curve_json(path, &result)?;
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::read_curve_json(&args.curve)?;
    let plot = crate::plot::render_ascii_plot_from_curve_file(&curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = SimulationConfig {
        params: WoodParams::new(args.a, args.b, args.c),
        first_day: args.first_day,
        last_day: args.last_day,
        step: args.step,
        noise: args.noise,
        seed: args.seed,
    };
    let observations = simulate(&config)?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", format_dataset(&observations))
        .map_err(|e| AppError::new(2, format!("Failed to write dataset: {e}")))?;
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    crate::tui::run(args.length.lactation_length()?)
}

/// Rewrite argv so `lacta` defaults to `lacta tui`.
///
/// Rules:
/// - `lacta`                      -> `lacta tui`
/// - `lacta -l 300 ...`           -> `lacta tui -l 300 ...`
/// - `lacta --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "analyze" | "plot" | "simulate" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_the_tui() {
        assert_eq!(rewrite_args(argv(&["lacta"])), argv(&["lacta", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["lacta", "-l", "300"])),
            argv(&["lacta", "tui", "-l", "300"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        for args in [
            &["lacta", "analyze", "-f", "data.txt"][..],
            &["lacta", "simulate"][..],
            &["lacta", "--help"][..],
            &["lacta", "-V"][..],
        ] {
            assert_eq!(rewrite_args(argv(args)), argv(args));
        }
    }
}
