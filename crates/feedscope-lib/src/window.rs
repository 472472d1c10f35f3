use std::collections::VecDeque;

use crate::error::WindowError;
use crate::signal::{Sample, Variant, SERIES_PER_SAMPLE};

/// Default number of samples kept for charting.
pub const DEFAULT_CAPACITY: usize = 600;

/// Bounded FIFO history of indexed samples plus their chart series.
///
/// Series points are derived once per append and evicted together with their sample, so a
/// redraw only copies.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    variant: Variant,
    capacity: usize,
    samples: VecDeque<Sample>,
    series: [VecDeque<[f64; 2]>; SERIES_PER_SAMPLE],
    next_index: u64,
    breach_run: usize,
}

/// Owned copy of a window, handed to renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    pub variant: Variant,
    pub capacity: usize,
    pub samples: Vec<Sample>,
    /// `[index, value]` points per series, ordered as `Variant::series_labels`.
    pub series: [Vec<[f64; 2]>; SERIES_PER_SAMPLE],
    /// Consecutive breaching gap samples at the head of the window.
    pub breach_run: usize,
}

impl RollingWindow {
    /// A capacity of zero is treated as one.
    pub fn new(variant: Variant, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            variant,
            capacity,
            samples: VecDeque::with_capacity(capacity),
            series: std::array::from_fn(|_| VecDeque::with_capacity(capacity)),
            next_index: 0,
            breach_run: 0,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index the next appended sample must carry.
    pub fn expected_index(&self) -> u64 {
        self.next_index
    }

    pub fn oldest_index(&self) -> Option<u64> {
        self.samples.front().map(Sample::index)
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn breach_run(&self) -> usize {
        self.breach_run
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Append the next sample, evicting the oldest one when full.
    pub fn append(&mut self, sample: Sample) -> Result<(), WindowError> {
        if sample.variant() != self.variant {
            return Err(WindowError::VariantMismatch {
                expected: self.variant,
                got: sample.variant(),
            });
        }
        if sample.index() != self.next_index {
            return Err(WindowError::OutOfOrder {
                expected: self.next_index,
                got: sample.index(),
            });
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
            for series in &mut self.series {
                series.pop_front();
            }
        }
        let x = sample.index() as f64;
        for (series, value) in self.series.iter_mut().zip(sample.series_values()) {
            series.push_back([x, value]);
        }
        self.breach_run = if sample.is_breach() {
            self.breach_run + 1
        } else {
            0
        };
        self.samples.push_back(sample);
        self.next_index += 1;
        Ok(())
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            variant: self.variant,
            capacity: self.capacity,
            samples: self.samples.iter().copied().collect(),
            series: std::array::from_fn(|i| self.series[i].iter().copied().collect()),
            breach_run: self.breach_run,
        }
    }
}

impl WindowSnapshot {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn indices(&self) -> Vec<u64> {
        self.samples.iter().map(Sample::index).collect()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Whether the breach run reached the firmware's stop count.
    pub fn stop_reached(&self, stop_breaches: usize) -> bool {
        stop_breaches > 0 && self.breach_run >= stop_breaches
    }
}
