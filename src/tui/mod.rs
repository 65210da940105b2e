//! Ratatui-based terminal UI.
//!
//! The TUI shows an editable dataset (pre-filled with the example), the
//! lactation length, the fitted chart, and the indicator/parameter panels.
//! Analysis runs synchronously on each trigger; errors land in the status line.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::analyze_text;
use crate::data::EXAMPLE_DATASET;
use crate::domain::{AnalysisConfig, AnalysisResult, LactationLength, REFERENCE_DAY};
use crate::error::{AnalysisError, AppError};

mod plotters_chart;

use plotters_chart::LactationChart;

const INPUT_HINT: &str = "one `day,yield` pair per line, e.g. 30,35.1 (at least 5 rows)";

/// Start the TUI.
pub fn run(length: LactationLength) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(length);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Controls,
    Dataset,
}

#[derive(Debug, Clone, PartialEq)]
enum Status {
    Info(String),
    Error(String),
}

struct App {
    length: LactationLength,
    dataset: String,
    focus: Focus,
    status: Status,
    result: Option<AnalysisResult>,
}

impl App {
    fn new(length: LactationLength) -> Self {
        let mut app = Self {
            length,
            dataset: EXAMPLE_DATASET.to_string(),
            focus: Focus::Controls,
            status: Status::Info(String::new()),
            result: None,
        };
        app.analyze();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.focus == Focus::Dataset {
            self.handle_dataset_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('e') | KeyCode::Enter => {
                self.focus = Focus::Dataset;
                self.status = Status::Info("Editing dataset. Esc to finish.".to_string());
            }
            KeyCode::Char('a') => self.analyze(),
            KeyCode::Char('x') => {
                self.dataset = EXAMPLE_DATASET.to_string();
                self.analyze();
            }
            KeyCode::Left | KeyCode::Char('-') => self.step_length(-1),
            KeyCode::Right | KeyCode::Char('+') => self.step_length(1),
            _ => {}
        }

        false
    }

    fn handle_dataset_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.focus = Focus::Controls;
                self.status = Status::Info("Press a to analyze.".to_string());
            }
            KeyCode::Enter => self.dataset.push('\n'),
            KeyCode::Backspace => {
                self.dataset.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() || matches!(c, ',' | '.' | ' ' | '-') => {
                self.dataset.push(c);
            }
            _ => {}
        }
    }

    fn step_length(&mut self, delta: i32) {
        let next = self.length.stepped(delta);
        if next == self.length {
            return;
        }
        self.length = next;
        // Only the integral depends on L; refresh an existing result right away.
        if self.result.is_some() {
            self.analyze();
        } else {
            self.status = Status::Info(format!("length: {} days", self.length));
        }
    }

    fn analyze(&mut self) {
        match analyze_text(&self.dataset, &AnalysisConfig::with_length(self.length)) {
            Ok(result) => {
                self.status = Status::Info(format!(
                    "Fitted {} observations (L = {} days).",
                    result.observations.len(),
                    self.length
                ));
                self.result = Some(result);
            }
            Err(err) => {
                self.result = None;
                self.status = Status::Error(error_message(&err));
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let line = Line::from(vec![
            Span::styled("lacta", Style::default().fg(Color::Cyan)),
            Span::raw(" - Wood lactation curve  "),
            Span::styled(
                format!(
                    "length: {} days [{}-{}] ",
                    self.length,
                    LactationLength::MIN,
                    LactationLength::MAX
                ),
                Style::default().fg(Color::Gray),
            ),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(0)])
            .split(area);

        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(7), Constraint::Length(5)])
            .split(columns[0]);

        self.draw_dataset(frame, side[0]);
        self.draw_metrics(frame, side[1]);
        self.draw_params(frame, side[2]);
        self.draw_chart(frame, columns[1]);
    }

    fn draw_dataset(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let editing = self.focus == Focus::Dataset;
        let border = if editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let mut text = self.dataset.clone();
        if editing {
            text.push('_');
        }

        // Keep the cursor end in view.
        let visible = area.height.saturating_sub(2) as usize;
        let scroll = text.lines().count().saturating_sub(visible) as u16;

        let p = Paragraph::new(text)
            .scroll((scroll, 0))
            .block(Block::default().title("Dataset (day,yield)").borders(Borders::ALL).border_style(border));
        frame.render_widget(p, area);
    }

    fn draw_metrics(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = match &self.result {
            Some(r) => {
                let ind = &r.indicators;
                vec![
                    Line::from(format!("Peak yield:   {:.2} kg/day", ind.peak_yield)),
                    Line::from(format!("Time to peak: {:.1} days", ind.peak_time)),
                    Line::from(format!("Total yield:  {:.0} kg", ind.total_yield)),
                    Line::from(format!("Persistency:  {:.1} % (d{REFERENCE_DAY:.0})", ind.persistency_pct)),
                    Line::from(Span::styled(
                        format!("RMSE {:.3}  R² {:.3}", r.quality.rmse, r.quality.r_squared),
                        Style::default().fg(Color::Gray),
                    )),
                ]
            }
            None => vec![Line::from("-")],
        };
        let p = Paragraph::new(Text::from(lines)).block(Block::default().title("Metrics").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_params(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let text = match &self.result {
            Some(r) => format!(
                "a = {:.4}\nb = {:.4}\nc = {:.4}",
                r.params.a, r.params.b, r.params.c
            ),
            None => "-".to_string(),
        };
        let p = Paragraph::new(text).block(Block::default().title("Model parameters").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Lactation curve").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(result) = &self.result else {
            let msg = Paragraph::new("No fit. Fix the dataset and press a.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let series = ChartSeries::from_result(result);
        let (chart_rect, insets) = chart_layout(inner);
        let widget = LactationChart {
            curve: &series.curve,
            points: &series.points,
            guides: &series.guides,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: "day",
            y_label: "kg/day",
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, series.x_bounds, series.y_bounds);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = match self.focus {
            Focus::Controls => "e edit  a analyze  ←/→ length ±5  x example  q quit",
            Focus::Dataset => "type digits , .  Enter newline  Backspace delete  Esc done",
        };
        let (msg, color) = match &self.status {
            Status::Info(msg) => (msg.as_str(), Color::Yellow),
            Status::Error(msg) => (msg.as_str(), Color::Red),
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(msg, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ]);
        let p = Paragraph::new(line)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Status-line text for a failed analysis.
fn error_message(err: &AnalysisError) -> String {
    match err {
        AnalysisError::Parse { .. } | AnalysisError::InsufficientData { .. } => {
            format!("{err}. Expected {INPUT_HINT}.")
        }
        _ => err.to_string(),
    }
}

/// Series handed to the Plotters widget.
struct ChartSeries {
    curve: Vec<(f64, f64)>,
    points: Vec<(f64, f64)>,
    guides: Vec<[(f64, f64); 2]>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

impl ChartSeries {
    fn from_result(result: &AnalysisResult) -> Self {
        let x_bounds = [0.0, result.lactation_length.days() as f64];

        let curve: Vec<(f64, f64)> = result.curve.points().collect();
        let points: Vec<(f64, f64)> = result
            .observations
            .iter()
            .map(|o| (o.day as f64, o.yield_))
            .collect();

        // Yields are non-negative, so the y axis starts at zero.
        let y_max = points
            .iter()
            .chain(&curve)
            .map(|&(_, y)| y)
            .filter(|y| y.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        let y_max = if y_max > 0.0 { y_max } else { 1.0 };
        let y_bounds = [0.0, y_max * 1.05];

        let ind = &result.indicators;
        let guides = vec![
            [(ind.peak_time, y_bounds[0]), (ind.peak_time, ind.peak_yield)],
            [(x_bounds[0], ind.peak_yield), (ind.peak_time, ind.peak_yield)],
        ];

        Self {
            curve,
            points,
            guides,
            x_bounds,
            y_bounds,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{x_val:.0}");
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(Paragraph::new(label).style(style), Rect { x: start, y, width, height: 1 });
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.0}");
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(Paragraph::new(label).style(style), Rect { x: start, y, width, height: 1 });
    }

    let x_label = Paragraph::new("days in milk")
        .alignment(Alignment::Center)
        .style(style);
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("kg/day").style(style.add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(LactationLength::default())
    }

    #[test]
    fn starts_with_the_example_fitted() {
        let app = app();
        assert!(app.result.is_some());
        assert!(matches!(app.status, Status::Info(_)));
        assert_eq!(app.dataset, EXAMPLE_DATASET);
    }

    #[test]
    fn length_steps_by_five_and_refits() {
        let mut app = app();
        let before = app.result.as_ref().unwrap().indicators.total_yield;

        assert!(!app.handle_key(KeyCode::Right));
        assert_eq!(app.length.days(), 310);
        let after = app.result.as_ref().unwrap().indicators.total_yield;
        assert!(after > before);

        app.handle_key(KeyCode::Left);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.length.days(), 300);
    }

    #[test]
    fn bad_input_shows_error_with_hint() {
        let mut app = app();
        app.handle_key(KeyCode::Char('e'));
        assert_eq!(app.focus, Focus::Dataset);
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Char('3'));
        app.handle_key(KeyCode::Char('0'));
        app.handle_key(KeyCode::Char('q')); // ignored while editing
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.focus, Focus::Controls);

        app.handle_key(KeyCode::Char('a'));
        assert!(app.result.is_none());
        let Status::Error(msg) = &app.status else {
            panic!("expected error status, got {:?}", app.status);
        };
        assert!(msg.contains("line 14"), "{msg}");
        assert!(msg.contains("day,yield"), "{msg}");

        // Reset restores the example and a fit.
        app.handle_key(KeyCode::Char('x'));
        assert!(app.result.is_some());
    }

    #[test]
    fn quit_only_from_controls() {
        let mut app = app();
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn chart_series_include_peak_guides() {
        let app = app();
        let result = app.result.as_ref().unwrap();
        let series = ChartSeries::from_result(result);

        assert_eq!(series.points.len(), 13);
        assert_eq!(series.curve.len(), result.curve.len());
        assert_eq!(series.x_bounds, [0.0, 305.0]);
        assert!(series.y_bounds[1] > 42.5);

        let ind = &result.indicators;
        assert_eq!(series.guides[0][1], (ind.peak_time, ind.peak_yield));
        assert_eq!(series.guides[1][0].1, ind.peak_yield);
    }
}
