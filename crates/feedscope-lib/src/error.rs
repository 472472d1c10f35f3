use std::path::PathBuf;

use thiserror::Error;

use crate::signal::Variant;

/// The telemetry device could not be opened, or stopped answering.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("cannot open {address} at {baud_rate} baud: {source}")]
    Open {
        address: String,
        baud_rate: u32,
        #[source]
        source: serialport::Error,
    },
    #[error("reading from {address} failed: {source}")]
    Read {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{address} is closed")]
    Closed { address: String },
}

/// A sample was offered to the rolling window out of sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("expected sample index {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },
    #[error("window holds {expected} samples, got a {got} sample")]
    VariantMismatch { expected: Variant, got: Variant },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("device address is empty")]
    EmptyAddress,
}

/// Fatal outcome of an ingest run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Render(anyhow::Error),
}
