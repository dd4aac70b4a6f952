//! Error types for reconciliation and commit.

use thiserror::Error;

use crate::target::TargetError;

/// Errors surfaced by a render session or the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A render-target operation failed.
    #[error("render target error: {0}")]
    Target(#[from] TargetError),

    /// A component (or the root) produced an element the target cannot represent.
    #[error("`{owner}` rendered a malformed `{element}` element: {reason}")]
    MalformedElement {
        owner: String,
        element: String,
        reason: &'static str,
    },

    /// `commit` was called with no work-in-progress tree.
    #[error("no work-in-progress tree to commit")]
    NoWorkInProgress,

    /// `commit` was called before the traversal finished.
    #[error("work-in-progress tree still has unvisited fibers")]
    WorkPending,
}
