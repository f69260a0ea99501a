//! Moving-average smoothing of per-frame measurements

use std::collections::VecDeque;

/// Window size the counting servers settled on
pub const DEFAULT_SMOOTHING_WINDOW: usize = 3;

/// Bounded FIFO of recent samples
#[derive(Clone, Debug)]
pub struct SmoothingWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SmoothingWindow {
    /// Create a window; a capacity of 0 is treated as 1 (no smoothing)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        SmoothingWindow {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest at capacity, and return the mean
    pub fn push_and_smooth(&mut self, sample: f32) -> f32 {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);

        average(&self.samples)
    }

    /// Mean of the current contents
    pub fn mean(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        Some(average(&self.samples))
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples oldest first
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }
}

/// Accumulates in f64 so the mean of finite samples stays finite
fn average(samples: &VecDeque<f32>) -> f32 {
    let sum: f64 = samples.iter().map(|&s| f64::from(s)).sum();
    (sum / samples.len() as f64) as f32
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_WINDOW)
    }
}
