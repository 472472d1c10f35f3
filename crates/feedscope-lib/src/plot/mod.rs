use std::time::Duration;

use log::debug;

use crate::signal::Variant;
use crate::window::WindowSnapshot;

#[derive(Debug, Clone)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Style {
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }
}

const BLUE: Color = Color(0x1F77B4);
const ORANGE: Color = Color(0xFF7F0E);
const GREEN: Color = Color(0x2CA02C);
const GRAY: Color = Color(0x7F7F7F);

#[derive(Debug, Clone)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Horizontal reference line spanning the x range.
#[derive(Debug, Clone)]
pub struct HLine {
    pub y: f64,
    pub style: Style,
}

#[derive(Debug, Clone)]
pub enum Series {
    Line(LineSeries),
    HLine(HLine),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

#[derive(Debug, Clone)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    pub fn lines(&self) -> impl Iterator<Item = &LineSeries> {
        self.series.iter().filter_map(|s| match s {
            Series::Line(line) => Some(line),
            Series::HLine(_) => None,
        })
    }

    /// Data range of every series with a 5% margin, like an autoscaled view.
    ///
    /// Reference lines count toward the y range. Flat ranges are widened so a constant
    /// signal stays visible. `None` when no line has points.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut x = [f64::INFINITY, f64::NEG_INFINITY];
        let mut y = [f64::INFINITY, f64::NEG_INFINITY];
        for point in self.lines().flat_map(|l| l.points.iter()) {
            x = [x[0].min(point[0]), x[1].max(point[0])];
            y = [y[0].min(point[1]), y[1].max(point[1])];
        }
        if !x[0].is_finite() {
            return None;
        }
        for series in &self.series {
            if let Series::HLine(h) = series {
                y = [y[0].min(h.y), y[1].max(h.y)];
            }
        }
        Some(Bounds {
            x: pad(x),
            y: pad(y),
        })
    }
}

fn pad([lo, hi]: [f64; 2]) -> [f64; 2] {
    let span = hi - lo;
    let margin = if span > f64::EPSILON {
        span * 0.05
    } else {
        (lo.abs() * 0.05).max(0.5)
    };
    [lo - margin, hi + margin]
}

/// Drawing surface fed by the render scheduler.
pub trait Renderer {
    /// Draw the snapshot, rescaling to its value range.
    fn draw(&mut self, snapshot: &WindowSnapshot) -> anyhow::Result<()>;

    /// Let the surface process its own events for at most `budget`.
    fn pump_events(&mut self, _budget: Duration) -> anyhow::Result<()> {
        Ok(())
    }
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

pub fn figure_from_snapshot(snapshot: &WindowSnapshot, stop_breaches: usize) -> Figure {
    let variant = snapshot.variant;
    let mut title = match variant {
        Variant::Rate => "Feed rate".to_string(),
        Variant::Gap => "EMA gap".to_string(),
    };
    if snapshot.stop_reached(stop_breaches) {
        title.push_str(&format!(" | breach x{}: stop", snapshot.breach_run));
    }
    let mut fig = Figure::new(Some(title));
    fig.x.label = Some("T".into());
    fig.y.label = Some(variant.y_label().into());
    let styles = match variant {
        Variant::Rate => [solid(BLUE), solid(ORANGE), solid(GREEN)],
        Variant::Gap => [solid(BLUE), dashed(ORANGE), dashed(GREEN)],
    };
    for ((name, points), style) in variant
        .series_labels()
        .iter()
        .zip(&snapshot.series)
        .zip(styles)
    {
        fig.add_series(Series::Line(LineSeries {
            name: (*name).into(),
            points: points.clone(),
            style,
        }));
    }
    if variant == Variant::Gap {
        fig.add_series(Series::HLine(HLine {
            y: 0.0,
            style: Style {
                dash: Some([1.0, 2.0]),
                color: GRAY,
            },
        }));
    }
    fig
}

fn solid(color: Color) -> Style {
    Style {
        dash: None,
        color,
    }
}

fn dashed(color: Color) -> Style {
    Style {
        dash: Some([4.0, 2.0]),
        color,
    }
}

/// Headless renderer: logs each draw instead of painting it.
#[derive(Debug, Default)]
pub struct LogRenderer {
    stop_breaches: usize,
    draws: u64,
}

impl LogRenderer {
    pub fn new(stop_breaches: usize) -> Self {
        Self {
            stop_breaches,
            draws: 0,
        }
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl Renderer for LogRenderer {
    fn draw(&mut self, snapshot: &WindowSnapshot) -> anyhow::Result<()> {
        self.draws += 1;
        let fig = figure_from_snapshot(snapshot, self.stop_breaches);
        let Some(latest) = snapshot.latest() else {
            return Ok(());
        };
        let values = latest.series_values();
        debug!(
            "draw #{}: {} samples, latest #{} {:?}, bounds {:?}, {}",
            self.draws,
            snapshot.len(),
            latest.index(),
            values,
            fig.bounds(),
            fig.title.as_deref().unwrap_or_default()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{GapSample, RateSample, Sample};
    use crate::window::RollingWindow;

    fn gap_window(samples: &[(f64, f64)]) -> RollingWindow {
        let mut window = RollingWindow::new(Variant::Gap, 16);
        for (i, (diff, var)) in samples.iter().enumerate() {
            window
                .append(Sample::Gap(GapSample::from_variance(i as u64, *diff, *var)))
                .unwrap();
        }
        window
    }

    #[test]
    fn rate_figure_has_three_labelled_lines() {
        let mut window = RollingWindow::new(Variant::Rate, 4);
        window
            .append(Sample::Rate(RateSample {
                index: 0,
                raw_rate: 2.0,
                ema_fast: 1.0,
                ema_slow: 0.5,
            }))
            .unwrap();
        let fig = figure_from_snapshot(&window.snapshot(), 2);
        let names: Vec<_> = fig.lines().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["rawRate", "emaFast", "emaSlow"]);
        assert_eq!(fig.y.label.as_deref(), Some("Rate"));
    }

    #[test]
    fn bounds_follow_the_data() {
        let window = gap_window(&[(0.05, 0.04), (0.10, 0.04), (-0.02, 0.09)]);
        let bounds = figure_from_snapshot(&window.snapshot(), 2).bounds().unwrap();
        assert!(bounds.x[0] < 0.0 && bounds.x[1] > 2.0);
        assert!(bounds.y[0] < -0.39 && bounds.y[1] > 0.39);
    }

    #[test]
    fn flat_series_gets_a_visible_range() {
        let window = gap_window(&[(0.0, 0.0)]);
        let bounds = figure_from_snapshot(&window.snapshot(), 2).bounds().unwrap();
        assert!(bounds.y[1] - bounds.y[0] > 0.0);
        assert!(bounds.x[1] - bounds.x[0] > 0.0);
    }

    #[test]
    fn empty_figure_has_no_bounds() {
        let window = RollingWindow::new(Variant::Rate, 4);
        assert!(figure_from_snapshot(&window.snapshot(), 2).bounds().is_none());
    }

    #[test]
    fn title_flags_stop() {
        let window = gap_window(&[(0.5, 0.01), (0.5, 0.01)]);
        let fig = figure_from_snapshot(&window.snapshot(), 2);
        assert!(fig.title.unwrap().contains("stop"));
    }

    #[test]
    fn decimation_caps_point_count() {
        let points: Vec<[f64; 2]> = (0..600).map(|i| [i as f64, 0.0]).collect();
        let out = decimate_points(&points, 100);
        assert_eq!(out.len(), 100);
        assert_eq!(out[0], [0.0, 0.0]);
        assert_eq!(decimate_points(&points[..10], 100).len(), 10);
    }
}
