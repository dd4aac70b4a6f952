//! Commit Phase - flush a finished work-in-progress tree to the target.
//!
//! # Algorithm
//!
//! 1. Remove every fiber queued in `deletions` (they belong to the previous
//!    generation, are tagged Deletion there and are unreachable from the new
//!    root), then discard the detached handles
//! 2. Walk the new tree pre-order from the root's first child, always
//!    descending into both `child` and `sibling`:
//!    - Placement: attach the handle under the nearest host ancestor, before
//!      the next host sibling that is already attached
//!    - Update: reconcile props against the alternate
//! 3. The caller promotes the tree to `current`
//!
//! The whole pass runs synchronously; nothing yields between steps.

mod props;

use tracing::{debug, trace};

pub use props::update_target;

use crate::error::RenderError;
use crate::fiber::{Deletion, EffectSummary, FiberId, FiberTree};
use crate::target::{RenderTarget, TargetError};
use crate::types::EffectTag;

/// What a commit did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Generation number that became current.
    pub generation: u64,
    /// Effect tags of the committed generation.
    pub effects: EffectSummary,
    /// Fibers whose commit changed the target. Updates with identical props
    /// are not counted.
    pub mutated: usize,
}

/// Apply deletions and the new tree. Returns how many fibers mutated the target.
pub(crate) fn commit_root<T: RenderTarget>(
    target: &mut T,
    current: Option<&FiberTree<T::Node>>,
    wip: &FiberTree<T::Node>,
    deletions: &[Deletion],
) -> Result<usize, RenderError> {
    let mut mutated = 0;

    if let Some(current) = current {
        for deletion in deletions {
            debug_assert_eq!(current[deletion.fiber].effect(), Some(EffectTag::Deletion));
            mutated += commit_deletion(target, current, deletion.fiber)?;
        }
    }

    if let Some(first) = wip.root().child() {
        mutated += commit_work(target, current, wip, first)?;
    }

    debug!(deletions = deletions.len(), mutated, "commit applied");
    Ok(mutated)
}

/// Pre-order walk starting at `start`, covering its siblings too.
fn commit_work<T: RenderTarget>(
    target: &mut T,
    current: Option<&FiberTree<T::Node>>,
    wip: &FiberTree<T::Node>,
    start: FiberId,
) -> Result<usize, RenderError> {
    let mut mutated = 0;
    let mut stack = vec![start];

    while let Some(id) = stack.pop() {
        let fiber = &wip[id];
        if let Some(sibling) = fiber.sibling() {
            stack.push(sibling);
        }
        if let Some(child) = fiber.child() {
            stack.push(child);
        }

        let Some(node) = fiber.target() else {
            // Component fibers own no handle; their host children carry the effects.
            continue;
        };

        match fiber.effect() {
            Some(EffectTag::Placement) => {
                let parent = host_parent(wip, id).ok_or(TargetError::UnknownNode)?;
                let before = host_sibling(wip, id);
                trace!(fiber = id.index(), ty = fiber.name(), "placement");
                target.insert_before(&parent, node, before.as_ref())?;
                mutated += 1;
            }
            Some(EffectTag::Update) => {
                let previous = current
                    .zip(fiber.alternate())
                    .map(|(tree, alternate)| &tree[alternate]);
                if let Some(previous) = previous {
                    let changes = update_target(target, node, previous.props(), fiber.props())?;
                    if !changes.is_empty() {
                        trace!(fiber = id.index(), ty = fiber.name(), ?changes, "update");
                        mutated += 1;
                    }
                }
            }
            // Deleted fibers live in the previous tree.
            Some(EffectTag::Deletion) | None => {}
        }
    }

    Ok(mutated)
}

/// Remove a previous-generation fiber's handles from the target.
///
/// A component fiber owns no handle, so its top-level host descendants are
/// removed instead. For fragment components that is every root it rendered.
/// Removed handles are discarded along with their subtrees.
fn commit_deletion<T: RenderTarget>(
    target: &mut T,
    tree: &FiberTree<T::Node>,
    id: FiberId,
) -> Result<usize, RenderError> {
    let Some(parent) = host_parent(tree, id) else {
        return Ok(0);
    };
    let mut nodes = Vec::new();
    collect_host_nodes(tree, id, &mut nodes);
    trace!(fiber = id.index(), ty = tree[id].name(), nodes = nodes.len(), "deletion");
    for node in &nodes {
        target.remove_child(&parent, node)?;
        target.discard(node);
    }
    Ok(usize::from(!nodes.is_empty()))
}

fn collect_host_nodes<N: Clone>(tree: &FiberTree<N>, id: FiberId, out: &mut Vec<N>) {
    if let Some(node) = tree[id].target() {
        out.push(node.clone());
        return;
    }
    for child in tree.children(id) {
        collect_host_nodes(tree, child, out);
    }
}

/// Handle of the nearest ancestor that owns one.
fn host_parent<N: Clone>(tree: &FiberTree<N>, id: FiberId) -> Option<N> {
    let mut parent = tree[id].parent();
    while let Some(p) = parent {
        if let Some(node) = tree[p].target() {
            return Some(node.clone());
        }
        parent = tree[p].parent();
    }
    None
}

/// First following host handle that is already attached.
///
/// Searches later siblings, descending through component fibers and climbing
/// out of them, skipping Placement subtrees (not attached yet). `None` means
/// the node goes at the end of its host parent.
fn host_sibling<N: Clone>(tree: &FiberTree<N>, id: FiberId) -> Option<N> {
    let mut node = id;
    'siblings: loop {
        while tree[node].sibling().is_none() {
            let parent = tree[node].parent()?;
            if tree[parent].target().is_some() {
                return None;
            }
            node = parent;
        }
        node = tree[node].sibling()?;

        loop {
            let fiber = &tree[node];
            if fiber.effect() == Some(EffectTag::Placement) {
                continue 'siblings;
            }
            if let Some(handle) = fiber.target() {
                return Some(handle.clone());
            }
            match fiber.child() {
                Some(child) => node = child,
                None => continue 'siblings,
            }
        }
    }
}
