use crate::error::{CpuWatchError, Result};
use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// Bounded FIFO of samples: the rolling window behind every average.
///
/// Enqueuing into a full window evicts the oldest sample first.
#[derive(Debug, Clone)]
pub struct BoundedAverageQueue {
    items:    VecDeque<f64>,
    capacity: Option<NonZeroUsize>,
}

impl BoundedAverageQueue {
    /// Create a window holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Result<Self> {
        NonZeroUsize::new(capacity)
            .map(Self::with_capacity)
            .ok_or(CpuWatchError::InvalidCapacity)
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            items:    VecDeque::with_capacity(capacity.get()),
            capacity: Some(capacity),
        }
    }

    /// A window that never evicts.
    pub fn unbounded() -> Self {
        Self {
            items:    VecDeque::new(),
            capacity: None,
        }
    }

    /// Push a new sample, evicting the oldest if at capacity.
    pub fn enqueue(&mut self, value: f64) {
        if self.is_full() {
            self.dequeue();
        }
        self.items.push_back(value);
    }

    /// Remove and return the oldest sample.
    pub fn dequeue(&mut self) -> Option<f64> {
        self.items.pop_front()
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity.map(NonZeroUsize::get)
    }

    /// `true` once the window holds `capacity` samples. Never true when unbounded.
    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.items.len() == cap.get())
    }

    /// Samples from oldest to newest.
    pub fn items(&self) -> impl Iterator<Item = f64> + '_ {
        self.items.iter().copied()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Mean of the window rounded to `round_to` decimal places.
    ///
    /// Rounding is half away from zero on the `f64` mean, so `2.345` rounds
    /// according to its binary representation rather than its decimal text.
    ///
    /// # Errors
    /// [`CpuWatchError::EmptyWindow`] if no samples have been enqueued.
    pub fn average(&self, round_to: u32) -> Result<f64> {
        if self.items.is_empty() {
            return Err(CpuWatchError::EmptyWindow);
        }
        let mean = self.items.iter().sum::<f64>() / self.items.len() as f64;
        Ok(round_places(mean, round_to))
    }
}

fn round_places(value: f64, places: u32) -> f64 {
    // Beyond ~15 digits f64 cannot represent the scaled value exactly anyway.
    let places = places.min(15) as i32;
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
