use std::io::{self, BufRead, BufReader, Read};
use std::time::Duration;

use log::{debug, info};
use serialport::SerialPort;

use crate::error::ConnectionError;
use crate::io::line::decode_line;

/// Producer side of the pipeline: something that yields telemetry lines.
pub trait LineSource {
    /// Block for the next line.
    ///
    /// `Ok(Some(""))` means the read timed out with no complete line; `Ok(None)` means the
    /// stream ended.
    fn read_line(&mut self) -> Result<Option<String>, ConnectionError>;

    /// Release the underlying handle. Safe to call more than once.
    fn close(&mut self);
}

/// Line reader over any byte stream, keeping partial lines across read timeouts.
pub struct LineReader<R> {
    address: String,
    inner: Option<BufReader<R>>,
    pending: Vec<u8>,
}

/// Line source over an open serial port.
pub type SerialSource = LineReader<Box<dyn SerialPort>>;

/// Open `address` at `baud_rate` (8N1) with the given read timeout.
pub fn open_serial(
    address: &str,
    baud_rate: u32,
    read_timeout: Duration,
) -> Result<SerialSource, ConnectionError> {
    info!("Opening serial: {} @ {}", address, baud_rate);
    let port = serialport::new(address, baud_rate)
        .timeout(read_timeout)
        .open()
        .map_err(|source| ConnectionError::Open {
            address: address.to_string(),
            baud_rate,
            source,
        })?;
    Ok(LineReader::new(address, port))
}

impl<R: Read> LineReader<R> {
    pub fn new(address: impl Into<String>, reader: R) -> Self {
        Self {
            address: address.into(),
            inner: Some(BufReader::new(reader)),
            pending: Vec::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn take_pending(&mut self) -> String {
        let line = decode_line(&self.pending);
        self.pending.clear();
        line
    }
}

impl<R: Read> LineSource for LineReader<R> {
    fn read_line(&mut self) -> Result<Option<String>, ConnectionError> {
        let reader = self.inner.as_mut().ok_or_else(|| ConnectionError::Closed {
            address: self.address.clone(),
        })?;
        match reader.read_until(b'\n', &mut self.pending) {
            Ok(0) if self.pending.is_empty() => Ok(None),
            Ok(_) => Ok(Some(self.take_pending())),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(Some(String::new()))
            }
            Err(source) => Err(ConnectionError::Read {
                address: self.address.clone(),
                source,
            }),
        }
    }

    fn close(&mut self) {
        if self.inner.take().is_some() {
            debug!("closed {}", self.address);
        }
    }
}
