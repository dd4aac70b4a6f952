//! Idle-time contract between the scheduler and its host.
//!
//! A host hands out idle windows; each window comes with a [`Deadline`] the
//! scheduler polls between units of work. Hosts without a native idle
//! primitive use [`FixedSliceHost`], which times fixed slices itself.

use std::thread;
use std::time::{Duration, Instant};

use super::SchedulerConfig;

/// Remaining time of one idle window.
pub trait Deadline {
    fn time_remaining(&self) -> Duration;

    fn did_timeout(&self) -> bool {
        self.time_remaining().is_zero()
    }
}

/// A constant amount of time left. Never runs out on its own.
impl Deadline for Duration {
    fn time_remaining(&self) -> Duration {
        *self
    }
}

/// Deadline `budget` after the moment it was created.
#[derive(Debug, Clone, Copy)]
pub struct FixedSlice {
    start: Instant,
    budget: Duration,
}

impl FixedSlice {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl Deadline for FixedSlice {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }
}

/// Source of idle windows.
pub trait IdleHost {
    type Deadline: Deadline;

    /// Block until the next idle window. `None` means the host is shutting
    /// down and no further windows will come.
    fn next_idle_window(&mut self) -> Option<Self::Deadline>;
}

/// Closures returning deadlines are hosts.
impl<D, F> IdleHost for F
where
    D: Deadline,
    F: FnMut() -> Option<D>,
{
    type Deadline = D;

    fn next_idle_window(&mut self) -> Option<D> {
        self()
    }
}

/// Fallback host: fixed-length slices separated by a short sleep.
#[derive(Debug, Clone)]
pub struct FixedSliceHost {
    budget: Duration,
    poll_interval: Duration,
    window_limit: Option<usize>,
    windows: usize,
}

impl FixedSliceHost {
    pub fn new(budget: Duration, poll_interval: Duration) -> Self {
        Self {
            budget,
            poll_interval,
            window_limit: None,
            windows: 0,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.slice_budget, config.poll_interval)
    }

    /// Stop handing out windows after `limit` of them.
    pub fn with_window_limit(mut self, limit: usize) -> Self {
        self.window_limit = Some(limit);
        self
    }

    /// Windows handed out so far.
    pub fn windows(&self) -> usize {
        self.windows
    }
}

impl IdleHost for FixedSliceHost {
    type Deadline = FixedSlice;

    fn next_idle_window(&mut self) -> Option<FixedSlice> {
        if self.window_limit.is_some_and(|limit| self.windows >= limit) {
            return None;
        }
        if self.windows > 0 && !self.poll_interval.is_zero() {
            thread::sleep(self.poll_interval);
        }
        self.windows += 1;
        Some(FixedSlice::new(self.budget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_deadline() {
        assert_eq!(Duration::from_millis(5).time_remaining(), Duration::from_millis(5));
        assert!(Duration::ZERO.did_timeout());
        assert!(!Duration::from_millis(1).did_timeout());
    }

    #[test]
    fn test_fixed_slice_counts_down() {
        let slice = FixedSlice::new(Duration::from_secs(60));
        assert!(slice.time_remaining() <= Duration::from_secs(60));
        assert!(!slice.did_timeout());

        let spent = FixedSlice::new(Duration::ZERO);
        assert!(spent.did_timeout());
    }

    #[test]
    fn test_fixed_slice_host_window_limit() {
        let mut host = FixedSliceHost::new(Duration::from_millis(1), Duration::ZERO).with_window_limit(2);
        assert!(host.next_idle_window().is_some());
        assert!(host.next_idle_window().is_some());
        assert!(host.next_idle_window().is_none());
        assert_eq!(host.windows(), 2);
    }

    #[test]
    fn test_closure_host() {
        let mut remaining = 1;
        let mut host = || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            Some(Duration::from_millis(10))
        };
        assert!(host.next_idle_window().is_some());
        assert!(host.next_idle_window().is_none());
    }
}
