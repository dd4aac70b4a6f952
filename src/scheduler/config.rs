//! Scheduler configuration.

use std::time::Duration;

/// Tuning knobs for the cooperative work loop.
///
/// ```ignore
/// let config = SchedulerConfig::default()
///     .with_slice_budget(Duration::from_millis(8))
///     .with_max_units_per_slice(32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Yield once the deadline has less than this left.
    pub yield_threshold: Duration,
    /// Length of a slice when the scheduler times slices itself.
    pub slice_budget: Duration,
    /// Pause between slices of a [`super::FixedSliceHost`].
    pub poll_interval: Duration,
    /// Hard cap on units per slice, regardless of time left.
    pub max_units_per_slice: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            slice_budget: Duration::from_millis(16),
            poll_interval: Duration::from_millis(4),
            max_units_per_slice: None,
        }
    }
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_yield_threshold(mut self, threshold: Duration) -> Self {
        self.yield_threshold = threshold;
        self
    }

    pub fn with_slice_budget(mut self, budget: Duration) -> Self {
        self.slice_budget = budget;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_units_per_slice(mut self, max: usize) -> Self {
        self.max_units_per_slice = Some(max);
        self
    }
}
