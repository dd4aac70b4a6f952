//! Scheduler - cooperative, time-sliced work loop.
//!
//! Inside an idle window the scheduler advances the session one fiber at a
//! time and checks the deadline between units. It never interrupts a unit.
//! Once the traversal is exhausted the generation is committed synchronously
//! in the same slice.
//!
//! # Example
//!
//! ```ignore
//! let mut scheduler = Scheduler::new(SchedulerConfig::default());
//! session.render(app, root);
//!
//! // Drive with the built-in fixed-slice host
//! let mut host = FixedSliceHost::from_config(scheduler.config());
//! scheduler.drive(&mut session, &mut host)?;
//!
//! // Or hand out slices manually
//! while session.work_in_progress().is_some() {
//!     scheduler.run_slice(&mut session, &FixedSlice::new(Duration::from_millis(8)))?;
//! }
//! ```

mod config;
mod idle;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

pub use config::SchedulerConfig;
pub use idle::{Deadline, FixedSlice, FixedSliceHost, IdleHost};

use crate::commit::CommitReport;
use crate::error::RenderError;
use crate::session::Session;
use crate::target::RenderTarget;

// =============================================================================
// Handle
// =============================================================================

/// Cloneable stop switch shared with a [`Scheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    running: Arc<AtomicBool>,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the scheduler to stop before its next unit.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// What one slice did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceOutcome {
    /// Units of work performed.
    pub units: usize,
    /// True when the slice ended with work still pending.
    pub yielded: bool,
    /// Set when the slice finished a generation.
    pub commit: Option<CommitReport>,
}

/// Running totals across slices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub slices: usize,
    pub units: usize,
    pub commits: usize,
    pub failures: usize,
}

// =============================================================================
// Scheduler
// =============================================================================

pub struct Scheduler {
    config: SchedulerConfig,
    running: Arc<AtomicBool>,
    stats: SchedulerStats,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Scheduler {
    /// Create a scheduler. It starts in the running state.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(true)),
            stats: SchedulerStats::default(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            running: self.running.clone(),
        }
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Run units until the deadline nears, then commit if the generation is done.
    ///
    /// At least one unit runs per slice so a starved host still makes
    /// progress. A stopped scheduler does nothing.
    pub fn run_slice<T: RenderTarget, D: Deadline + ?Sized>(
        &mut self,
        session: &mut Session<T>,
        deadline: &D,
    ) -> Result<SliceOutcome, RenderError> {
        let mut outcome = SliceOutcome::default();
        if !self.is_running() {
            return Ok(outcome);
        }
        self.stats.slices += 1;

        while session.has_pending_work() {
            if outcome.units > 0 && self.should_yield(outcome.units, deadline) {
                outcome.yielded = true;
                break;
            }
            if !self.is_running() {
                outcome.yielded = true;
                break;
            }
            match session.step() {
                Some(Ok(_)) => outcome.units += 1,
                Some(Err(err)) => {
                    self.stats.units += outcome.units;
                    self.stats.failures += 1;
                    return Err(err);
                }
                None => break,
            }
        }
        self.stats.units += outcome.units;

        if !outcome.yielded && session.is_ready_to_commit() {
            let report = session.commit().inspect_err(|_| self.stats.failures += 1)?;
            self.stats.commits += 1;
            outcome.commit = Some(report);
        }

        trace!(
            units = outcome.units,
            yielded = outcome.yielded,
            committed = outcome.commit.is_some(),
            "slice finished"
        );
        Ok(outcome)
    }

    /// Run fixed slices until no generation is in flight.
    ///
    /// Returns the report of the last commit, if any happened.
    pub fn run_until_idle<T: RenderTarget>(
        &mut self,
        session: &mut Session<T>,
    ) -> Result<Option<CommitReport>, RenderError> {
        let mut last = None;
        while self.is_running() && session.work_in_progress().is_some() {
            let outcome = self.run_slice(session, &FixedSlice::new(self.config.slice_budget))?;
            if outcome.commit.is_some() {
                last = outcome.commit;
            }
        }
        Ok(last)
    }

    /// Keep taking idle windows from `host` until stopped or the host shuts down.
    ///
    /// Windows with no work are passed over. A failing unit ends the call
    /// with its error; the scheduler stays running and can be driven again.
    pub fn drive<T: RenderTarget, H: IdleHost>(
        &mut self,
        session: &mut Session<T>,
        host: &mut H,
    ) -> Result<(), RenderError> {
        debug!("scheduler driving");
        while self.is_running() {
            let Some(deadline) = host.next_idle_window() else {
                debug!("idle host shut down");
                break;
            };
            if session.work_in_progress().is_none() {
                continue;
            }
            self.run_slice(session, &deadline)?;
        }
        debug!(
            slices = self.stats.slices,
            units = self.stats.units,
            commits = self.stats.commits,
            "scheduler stopped"
        );
        Ok(())
    }

    fn should_yield<D: Deadline + ?Sized>(&self, units: usize, deadline: &D) -> bool {
        if self.config.max_units_per_slice.is_some_and(|max| units >= max) {
            return true;
        }
        deadline.time_remaining() < self.config.yield_threshold
    }
}

// =============================================================================
// Tests
// =============================================================================
