use log::{info, trace};

use crate::error::PipelineError;
use crate::io::serial::LineSource;
use crate::plot::Renderer;
use crate::schedule::{Clock, RenderScheduler};
use crate::signal::Variant;
use crate::stop::StopSignal;
use crate::window::RollingWindow;

/// Outcome of a single read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Appended(u64),
    /// Timed out with no data.
    Idle,
    /// Line did not parse for this variant.
    Skipped,
    EndOfStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Stopped,
    EndOfStream,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub lines: u64,
    pub idle: u64,
    pub skipped: u64,
    pub appended: u64,
}

/// Reads lines, parses them for one variant and keeps the rolling window.
pub struct IngestLoop<S> {
    source: S,
    window: RollingWindow,
    next_index: u64,
    stats: IngestStats,
}

impl<S: LineSource> IngestLoop<S> {
    pub fn new(source: S, variant: Variant, capacity: usize) -> Self {
        Self {
            source,
            window: RollingWindow::new(variant, capacity),
            next_index: 0,
            stats: IngestStats::default(),
        }
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Read and process one line.
    pub fn step(&mut self) -> Result<Step, PipelineError> {
        let Some(line) = self.source.read_line()? else {
            return Ok(Step::EndOfStream);
        };
        if line.trim().is_empty() {
            self.stats.idle += 1;
            return Ok(Step::Idle);
        }
        self.stats.lines += 1;
        let Ok(record) = self.window.variant().try_parse(&line) else {
            trace!("skipped: {}", line);
            self.stats.skipped += 1;
            return Ok(Step::Skipped);
        };
        let index = self.next_index;
        self.window.append(record.into_sample(index))?;
        self.next_index += 1;
        self.stats.appended += 1;
        Ok(Step::Appended(index))
    }

    /// Loop until the stream ends or `stop` is raised. The source is closed on every exit
    /// path.
    pub fn run<R: Renderer, C: Clock>(
        &mut self,
        scheduler: &mut RenderScheduler<R, C>,
        stop: &StopSignal,
    ) -> Result<ExitReason, PipelineError> {
        let outcome = self.drive(scheduler, stop);
        self.source.close();
        info!(
            "ingest finished: {} samples from {} lines ({} skipped, {} idle reads)",
            self.stats.appended, self.stats.lines, self.stats.skipped, self.stats.idle
        );
        outcome
    }

    fn drive<R: Renderer, C: Clock>(
        &mut self,
        scheduler: &mut RenderScheduler<R, C>,
        stop: &StopSignal,
    ) -> Result<ExitReason, PipelineError> {
        loop {
            if stop.is_raised() {
                info!("Stopping.");
                return Ok(ExitReason::Stopped);
            }
            match self.step()? {
                Step::Appended(_) => {
                    scheduler
                        .on_sample_appended(&self.window)
                        .map_err(PipelineError::Render)?;
                }
                Step::Idle | Step::Skipped => {
                    scheduler.on_idle().map_err(PipelineError::Render)?;
                }
                Step::EndOfStream => {
                    scheduler.flush(&self.window).map_err(PipelineError::Render)?;
                    return Ok(ExitReason::EndOfStream);
                }
            }
        }
    }
}
