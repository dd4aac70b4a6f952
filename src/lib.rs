//! # spark-fiber
//!
//! Incremental UI rendering engine built around fiber reconciliation.
//!
//! Given a description of the desired element tree, the engine works out the
//! smallest set of mutations that brings a persistent render target in line
//! with it, and applies them in a single synchronous commit. The diffing work
//! is split into per-fiber units that a cooperative scheduler runs inside idle
//! windows, so a large tree never blocks the host for long.
//!
//! ## Architecture
//!
//! ```text
//! create_element ──► Session::render ──► units of work (Scheduler slices)
//!                                              │
//!                                              ▼
//!                         commit: deletions, placements, updates ──► RenderTarget
//! ```
//!
//! Each generation lives in its own fiber arena. A fiber points at the fiber
//! it replaces in the previous arena (its alternate), which is how target
//! handles and hook slots carry over between renders.
//!
//! ## Modules
//!
//! - [`element`] - Element descriptions and function components
//! - [`fiber`] - Fiber arena, hook slots, the reconciler
//! - [`session`] - Render state as an explicit context
//! - [`commit`] - Commit phase and prop reconciliation
//! - [`scheduler`] - Cooperative time-sliced work loop
//! - [`target`] - Render target contract and an in-memory target
//! - [`types`] - Props, listeners, effect tags

pub mod commit;
pub mod element;
pub mod error;
pub mod fiber;
pub mod scheduler;
pub mod session;
pub mod target;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use element::{
    create_element, fragment, text_element, Child, Component, Element, ElementType, Rendered,
};

pub use error::RenderError;

pub use fiber::{EffectSummary, Fiber, FiberId, FiberTree, HookSlot, Hooks};

pub use session::{Abandoned, Session, WorkInProgress, WorkUnits};

pub use commit::{update_target, CommitReport};

pub use scheduler::{
    Deadline, FixedSlice, FixedSliceHost, IdleHost, Scheduler, SchedulerConfig, SchedulerHandle,
    SchedulerStats, SliceOutcome,
};

pub use target::{MemoryTarget, NodeId, RenderTarget, TargetError, TargetStats};
