use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::info;

/// Requests a stop; cheap to clone into interrupt handlers and renderers.
#[derive(Clone)]
pub struct StopHandle {
    tx: Sender<()>,
}

/// Observed by the ingest loop between iterations.
pub struct StopSignal {
    rx: Receiver<()>,
    raised: Cell<bool>,
}

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = bounded(1);
    (
        StopHandle { tx },
        StopSignal {
            rx,
            raised: Cell::new(false),
        },
    )
}

impl StopHandle {
    pub fn raise(&self) {
        // A full channel already carries a pending stop.
        let _ = self.tx.try_send(());
    }
}

impl StopSignal {
    pub fn is_raised(&self) -> bool {
        if !self.raised.get() && self.rx.try_recv().is_ok() {
            self.raised.set(true);
        }
        self.raised.get()
    }
}

/// Route Ctrl+C to `handle`. A second interrupt exits immediately with status 130.
pub fn install_interrupt_handler(handle: StopHandle) -> Result<(), ctrlc::Error> {
    let interrupted = AtomicBool::new(false);
    ctrlc::set_handler(move || {
        if interrupted.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        info!("interrupt received, stopping");
        handle.raise();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_raised_once_observed() {
        let (handle, signal) = stop_channel();
        assert!(!signal.is_raised());
        handle.raise();
        handle.raise();
        assert!(signal.is_raised());
        assert!(signal.is_raised());
    }

    #[test]
    fn dropped_handles_do_not_stop() {
        let (handle, signal) = stop_channel();
        drop(handle);
        assert!(!signal.is_raised());
    }
}
