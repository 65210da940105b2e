//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - fitted curve: `-` line
//! - peak of the fitted curve: `P`

use crate::domain::{AnalysisResult, CurveFile, Observation, WoodParams};
use crate::models::evaluate;

/// Render a plot for an in-memory analysis.
///
/// The curve is resampled at one point per column over `[1, L]`.
pub fn render_ascii_plot(result: &AnalysisResult, width: usize, height: usize) -> String {
    let (d_min, d_max) = (1.0, result.lactation_length.days() as f64);
    let curve = sample_curve(&result.params, d_min, d_max, width.max(2));
    let peak = (result.indicators.peak_time, result.indicators.peak_yield);
    render_plot(&result.observations, &curve, Some(peak), (d_min, d_max), width, height)
}

/// Render a plot from a saved curve JSON file (stored grid plus its observations).
pub fn render_ascii_plot_from_curve_file(curve: &CurveFile, width: usize, height: usize) -> String {
    let (d_min, d_max) = day_range(curve).unwrap_or((1.0, curve.lactation_length.days() as f64));
    let points: Vec<(f64, f64)> = curve.grid.points().collect();
    let peak = (curve.indicators.peak_time, curve.indicators.peak_yield);
    render_plot(&curve.observations, &points, Some(peak), (d_min, d_max), width, height)
}

fn render_plot(
    observations: &[Observation],
    curve: &[(f64, f64)],
    peak: Option<(f64, f64)>,
    (d_min, d_max): (f64, f64),
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = y_range(observations, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curve first so points can overlay.
    draw_curve(&mut grid, curve, d_min, d_max, y_min, y_max);

    for o in observations {
        let x = map_x(o.day as f64, d_min, d_max, width);
        let y = map_y(o.yield_, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    if let Some((t, y)) = peak.filter(|(t, y)| y.is_finite() && (d_min..=d_max).contains(t)) {
        grid[map_y(y, y_min, y_max, height)][map_x(t, d_min, d_max, width)] = 'P';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: day=[{d_min:.0}, {d_max:.0}] | yield=[{y_min:.2}, {y_max:.2}] kg/day\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn day_range(curve: &CurveFile) -> Option<(f64, f64)> {
    let mut min_d = f64::INFINITY;
    let mut max_d = f64::NEG_INFINITY;
    for &d in &curve.grid.day {
        min_d = min_d.min(d);
        max_d = max_d.max(d);
    }
    if min_d.is_finite() && max_d.is_finite() && max_d > min_d {
        Some((min_d, max_d))
    } else {
        None
    }
}

fn sample_curve(params: &WoodParams, d_min: f64, d_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let t = d_min + u * (d_max - d_min);
            (t, evaluate(t, params))
        })
        .collect()
}

fn y_range(observations: &[Observation], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let ys = observations
        .iter()
        .map(|o| o.yield_)
        .chain(curve.iter().map(|&(_, y)| y))
        .filter(|y| y.is_finite());

    let (min_y, max_y) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], t_min: f64, t_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve.iter().filter(|(_, y)| y.is_finite()) {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, yy, '-'),
            None => grid[yy][x] = '-',
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let (mut x, mut y) = (x0 as isize, y0 as isize);
    let (x1, y1) = (x1 as isize, y1 as isize);

    let dx = (x1 - x).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let dy = -(y1 - y).abs();
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        let cell = usize::try_from(y)
            .ok()
            .zip(usize::try_from(x).ok())
            .and_then(|(row, col)| grid.get_mut(row)?.get_mut(col));
        if let Some(cell) = cell.filter(|c| **c == ' ') {
            *cell = ch;
        }

        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
