use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use feedscope_lib::{
    plot::{
        decimate_points, figure_from_snapshot, Bounds, Figure, Renderer, Series,
        Style as PlotStyle,
    },
    stop::StopHandle,
    WindowSnapshot,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    prelude::CrosstermBackend,
    style::{Color, Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame, Terminal,
};

/// Live chart in the terminal's alternate screen.
///
/// Raw mode swallows SIGINT, so `q`, `Esc` and `Ctrl+C` are read as keys and forwarded to
/// the stop handle.
pub struct TerminalRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    stop: StopHandle,
    device: String,
    stop_breaches: usize,
    draws: u64,
}

impl TerminalRenderer {
    pub fn new(device: &str, stop_breaches: usize, stop: StopHandle) -> Result<Self> {
        let terminal = setup_terminal()?;
        Ok(Self {
            terminal,
            stop,
            device: device.to_string(),
            stop_breaches,
            draws: 0,
        })
    }

    fn on_key(&self, key: KeyEvent) {
        let quit = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => true,
            KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
            _ => false,
        };
        if quit {
            self.stop.raise();
        }
    }
}

impl Renderer for TerminalRenderer {
    fn draw(&mut self, snapshot: &WindowSnapshot) -> Result<()> {
        self.draws += 1;
        let fig = figure_from_snapshot(snapshot, self.stop_breaches);
        let status = status_line(snapshot, &self.device, self.draws);
        self.terminal
            .draw(|f| draw(f, &fig, &status))
            .context("drawing chart")?;
        Ok(())
    }

    fn pump_events(&mut self, budget: Duration) -> Result<()> {
        let deadline = Instant::now() + budget;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !event::poll(remaining)? {
                return Ok(());
            }
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.on_key(key);
                }
            }
            if remaining.is_zero() {
                return Ok(());
            }
        }
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        let _ = restore_terminal();
        let _ = self.terminal.show_cursor();
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("initializing terminal")
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

fn status_line(snapshot: &WindowSnapshot, device: &str, draws: u64) -> String {
    let latest = snapshot
        .latest()
        .map(|s| {
            let labels = snapshot.variant.series_labels();
            let values = s.series_values();
            labels
                .iter()
                .zip(values)
                .map(|(label, value)| format!("{label} {value:.4}"))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .unwrap_or_default();
    format!(
        "{device} | {}/{} samples | frame {draws} | {latest} | q to quit",
        snapshot.len(),
        snapshot.capacity
    )
}

fn draw(f: &mut Frame, fig: &Figure, status: &str) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.size());
    draw_chart(f, layout[0], fig);
    let status = Paragraph::new(status)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, layout[1]);
}

fn draw_chart(f: &mut Frame, area: Rect, fig: &Figure) {
    let title = fig.title.clone().unwrap_or_default();
    let block = Block::default().borders(Borders::ALL).title(title);
    let Some(bounds) = fig.bounds() else {
        let waiting = Paragraph::new("Waiting for samples...").block(block);
        f.render_widget(waiting, area);
        return;
    };
    // Braille packs two dots per cell horizontally.
    let max_points = usize::from(area.width.saturating_sub(2)).max(1) * 2;
    let points = series_points(fig, bounds, max_points);
    let datasets = fig
        .series
        .iter()
        .zip(&points)
        .map(|(series, data)| {
            let (name, style) = match series {
                Series::Line(line) => (line.name.clone(), &line.style),
                Series::HLine(h) => (String::new(), &h.style),
            };
            let dataset = Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(line_style(style))
                .data(data);
            if name.is_empty() {
                dataset
            } else {
                dataset.name(name)
            }
        })
        .collect::<Vec<_>>();
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title(fig.x.label.clone().unwrap_or_default())
                .style(Style::default().fg(Color::Gray))
                .bounds(bounds.x)
                .labels(axis_labels(bounds.x, 0)),
        )
        .y_axis(
            Axis::default()
                .title(fig.y.label.clone().unwrap_or_default())
                .style(Style::default().fg(Color::Gray))
                .bounds(bounds.y)
                .labels(axis_labels(bounds.y, 3)),
        );
    f.render_widget(chart, area);
}

/// Chart data per series; reference lines span the visible x range.
fn series_points(fig: &Figure, bounds: Bounds, max_points: usize) -> Vec<Vec<(f64, f64)>> {
    fig.series
        .iter()
        .map(|series| match series {
            Series::Line(line) => decimate_points(&line.points, max_points)
                .into_iter()
                .map(|[x, y]| (x, y))
                .collect(),
            Series::HLine(h) => vec![(bounds.x[0], h.y), (bounds.x[1], h.y)],
        })
        .collect()
}

fn line_style(style: &PlotStyle) -> Style {
    let (r, g, b) = style.color.rgb();
    let base = Style::default().fg(Color::Rgb(r, g, b));
    if style.dash.is_some() {
        base.add_modifier(Modifier::DIM)
    } else {
        base
    }
}

fn axis_labels([lo, hi]: [f64; 2], precision: usize) -> Vec<Span<'static>> {
    let mid = (lo + hi) / 2.0;
    [lo, mid, hi]
        .into_iter()
        .map(|v| Span::raw(format!("{v:.precision$}")))
        .collect()
}
