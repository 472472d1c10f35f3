//! Streaming ingestion for feeder telemetry: parse `rate`/`gap` lines from a serial
//! device, keep a bounded rolling window and hand throttled snapshots to a renderer.

pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod plot;
pub mod schedule;
pub mod signal;
pub mod stop;
pub mod window;

pub use config::PipelineConfig;
pub use error::{ConfigError, ConnectionError, PipelineError, WindowError};
pub use pipeline::{ExitReason, IngestLoop, IngestStats, Step};
pub use schedule::RenderScheduler;
pub use signal::*;
pub use window::{RollingWindow, WindowSnapshot};
