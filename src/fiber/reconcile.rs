//! Reconciler - performs one unit of work per fiber.
//!
//! Per-fiber state machine:
//!
//! ```text
//! Pending ──► Component: reset hooks, call render fn ──┐
//!        └──► Host: create target node if absent ──────┤
//!                                                      ▼
//!                                 reconcile_children (positional)
//!                                                      ▼
//!                                 Completed → next fiber (child, sibling, uncle…)
//! ```
//!
//! Children are matched against the previous generation strictly by position.
//! Reordering an unkeyed list therefore shows up as a run of Update,
//! Placement and Deletion effects rather than a move.

use tracing::trace;

use super::{Deletion, Fiber, FiberId, FiberTree, HookSlot, Hooks};
use crate::commit::update_target;
use crate::element::{Component, Element, ElementType};
use crate::error::RenderError;
use crate::target::RenderTarget;
use crate::types::{EffectTag, Props};

/// Everything one unit of work may touch.
///
/// The committed tree is borrowed mutably only so removed fibers can be
/// tagged [`EffectTag::Deletion`]; nothing else in it changes.
pub(crate) struct WorkContext<'a, T: RenderTarget> {
    pub target: &'a mut T,
    pub current: Option<&'a mut FiberTree<T::Node>>,
    pub wip: &'a mut FiberTree<T::Node>,
    pub deletions: &'a mut Vec<Deletion>,
}

impl<T: RenderTarget> WorkContext<'_, T> {
    fn delete(&mut self, id: FiberId, reason: &'static str) {
        let Some(tree) = self.current.as_deref_mut() else {
            return;
        };
        trace!(fiber = id.index(), ty = tree[id].name(), reason, "deleting");
        self.deletions.push(tree.mark_deleted(id));
    }
}

/// Process `id` and return the next fiber to visit.
///
/// A unit either completes fully or fails; an error leaves the tree in a
/// state that must be abandoned.
pub(crate) fn perform_unit_of_work<T: RenderTarget>(
    cx: &mut WorkContext<'_, T>,
    id: FiberId,
) -> Result<Option<FiberId>, RenderError> {
    trace!(fiber = id.index(), ty = cx.wip[id].name(), "perform unit of work");

    match cx.wip[id].ty.clone() {
        Some(ElementType::Component(component)) => update_component(cx, id, &component)?,
        _ => update_host(cx, id)?,
    }

    Ok(next_unit(&*cx.wip, id))
}

fn update_component<T: RenderTarget>(
    cx: &mut WorkContext<'_, T>,
    id: FiberId,
    component: &Component,
) -> Result<(), RenderError> {
    let props = cx.wip[id].props.clone();
    let alternate = cx.wip[id].alternate;

    let mut slots = Vec::new();
    let rendered = {
        let previous: &[HookSlot] = match (cx.current.as_deref(), alternate) {
            (Some(tree), Some(alternate)) => tree[alternate].hooks.as_slice(),
            _ => &[],
        };
        let mut hooks = Hooks::new(previous, &mut slots);
        component.render(&props, &mut hooks)
    };
    cx.wip[id].hooks = slots;

    let elements = rendered.into_elements();
    reconcile_children(cx, id, &elements)
}

fn update_host<T: RenderTarget>(
    cx: &mut WorkContext<'_, T>,
    id: FiberId,
) -> Result<(), RenderError> {
    let props = cx.wip[id].props.clone();

    if cx.wip[id].target.is_none() {
        // Components never reach here; the root always owns its container.
        let node = match cx.wip[id].ty.clone() {
            Some(ElementType::Text) => Some(cx.target.create_text("")?),
            Some(ElementType::Host(tag)) => Some(cx.target.create_element(&tag)?),
            _ => None,
        };
        if let Some(node) = node {
            cx.wip[id].target = Some(node.clone());
            update_target(cx.target, &node, &Props::default(), &props)?;
        }
    }

    reconcile_children(cx, id, props.children())
}

/// What the diff needs from one previous-generation fiber.
struct OldFiber<N> {
    id: FiberId,
    ty: Option<ElementType>,
    target: Option<N>,
    sibling: Option<FiberId>,
}

fn old_fiber<N: Clone>(tree: Option<&FiberTree<N>>, id: Option<FiberId>) -> Option<OldFiber<N>> {
    let (tree, id) = (tree?, id?);
    let fiber = &tree[id];
    Some(OldFiber {
        id,
        ty: fiber.ty.clone(),
        target: fiber.target.clone(),
        sibling: fiber.sibling,
    })
}

/// Diff `elements` against the alternate's child chain, position by position.
fn reconcile_children<T: RenderTarget>(
    cx: &mut WorkContext<'_, T>,
    parent: FiberId,
    elements: &[Element],
) -> Result<(), RenderError> {
    for element in elements {
        element.validate(cx.wip[parent].name())?;
    }

    let mut old_id = match (cx.current.as_deref(), cx.wip[parent].alternate) {
        (Some(tree), Some(alternate)) => tree[alternate].child,
        _ => None,
    };
    let mut previous_sibling: Option<FiberId> = None;
    let mut index = 0;

    while index < elements.len() || old_id.is_some() {
        let element = elements.get(index);
        let old = old_fiber(cx.current.as_deref(), old_id);
        old_id = old.as_ref().and_then(|o| o.sibling);

        let new_fiber = match (element, old) {
            (Some(element), Some(old)) if old.ty.as_ref() == Some(element.ty()) => Some(
                Fiber::from_element(element, parent, EffectTag::Update, Some(old.id), old.target),
            ),
            (Some(element), replaced) => {
                if let Some(old) = replaced {
                    cx.delete(old.id, "type changed");
                }
                Some(Fiber::from_element(element, parent, EffectTag::Placement, None, None))
            }
            (None, Some(old)) => {
                cx.delete(old.id, "list shrank");
                None
            }
            (None, None) => None,
        };

        if let Some(fiber) = new_fiber {
            let new_id = cx.wip.push(fiber);
            match previous_sibling {
                None => cx.wip[parent].child = Some(new_id),
                Some(prev) => cx.wip[prev].sibling = Some(new_id),
            }
            previous_sibling = Some(new_id);
        }
        index += 1;
    }

    Ok(())
}

/// Depth-first successor: child, else the nearest sibling up the parent chain.
fn next_unit<N>(tree: &FiberTree<N>, id: FiberId) -> Option<FiberId> {
    if let Some(child) = tree[id].child {
        return Some(child);
    }
    let mut next = Some(id);
    while let Some(fiber) = next {
        if let Some(sibling) = tree[fiber].sibling {
            return Some(sibling);
        }
        next = tree[fiber].parent;
    }
    None
}

// =============================================================================
// Tests
// =============================================================================
