use std::time::{Duration, Instant};

use crate::config::PipelineConfig;
use crate::plot::Renderer;
use crate::window::RollingWindow;

pub trait Clock {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Throttles redraws so that sample arrival rate never dictates render cost.
pub struct RenderScheduler<R, C = SystemClock> {
    renderer: R,
    clock: C,
    refresh_interval: Duration,
    yield_budget: Duration,
    last_draw: Option<Instant>,
    last_pump: Option<Instant>,
    drawn_index: Option<u64>,
    draws: u64,
}

impl<R: Renderer> RenderScheduler<R, SystemClock> {
    pub fn new(renderer: R, config: &PipelineConfig) -> Self {
        Self::with_clock(
            renderer,
            SystemClock,
            config.refresh_interval(),
            config.yield_budget(),
        )
    }
}

impl<R: Renderer, C: Clock> RenderScheduler<R, C> {
    pub fn with_clock(
        renderer: R,
        clock: C,
        refresh_interval: Duration,
        yield_budget: Duration,
    ) -> Self {
        Self {
            renderer,
            clock,
            refresh_interval,
            yield_budget,
            last_draw: None,
            last_pump: None,
            drawn_index: None,
            draws: 0,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Called once per appended sample. Returns whether a draw happened.
    pub fn on_sample_appended(&mut self, window: &RollingWindow) -> anyhow::Result<bool> {
        let now = self.clock.now();
        if !due(self.last_draw, now, self.refresh_interval) {
            return Ok(false);
        }
        self.draw(window, now)?;
        Ok(true)
    }

    /// Called when a read produced no sample; keeps the surface's event queue moving.
    pub fn on_idle(&mut self) -> anyhow::Result<()> {
        let now = self.clock.now();
        if due(self.last_pump, now, self.refresh_interval) {
            self.last_pump = Some(now);
            self.renderer.pump_events(self.yield_budget)?;
        }
        Ok(())
    }

    /// Draw any samples appended since the last draw, waiting out the rest of the current
    /// interval first.
    pub fn flush(&mut self, window: &RollingWindow) -> anyhow::Result<bool> {
        let latest = window.latest().map(|s| s.index());
        if latest.is_none() || latest == self.drawn_index {
            return Ok(false);
        }
        if let Some(last) = self.last_draw {
            let elapsed = self.clock.now().saturating_duration_since(last);
            let wait = self.refresh_interval.saturating_sub(elapsed);
            if !wait.is_zero() {
                self.clock.sleep(wait);
            }
        }
        let now = self.clock.now();
        self.draw(window, now)?;
        Ok(true)
    }

    fn draw(&mut self, window: &RollingWindow, now: Instant) -> anyhow::Result<()> {
        let snapshot = window.snapshot();
        self.renderer.draw(&snapshot)?;
        self.draws += 1;
        self.last_draw = Some(now);
        self.last_pump = Some(now);
        self.drawn_index = snapshot.latest().map(|s| s.index());
        self.renderer.pump_events(self.yield_budget)
    }
}

fn due(last: Option<Instant>, now: Instant, interval: Duration) -> bool {
    last.map_or(true, |last| now.saturating_duration_since(last) >= interval)
}
