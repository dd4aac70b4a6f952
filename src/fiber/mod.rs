//! Fiber arena - one generation of units of work.
//!
//! Each render builds a fresh [`FiberTree`]: a flat `Vec` of fibers addressed
//! by [`FiberId`], with tree links stored as indices. `alternate` points into
//! the previous generation's arena (the committed tree) at the fiber matched
//! by position, so diffing never needs a raw back-pointer.
//!
//! ```text
//! current (committed)          work in progress
//! ┌────┐                       ┌────┐
//! │root│◄──────alternate───────┤root│
//! └─┬──┘                       └─┬──┘
//!   │child                       │child
//! ┌─▼──┐  sibling ┌────┐       ┌─▼──┐  sibling ┌────┐
//! │div ├─────────►│ p  │◄──┐   │div ├─────────►│ ul │  (Placement)
//! └────┘          └────┘   │   └────┘          └────┘
//!                          └── deletions
//! ```

mod hooks;
mod reconcile;

use std::ops::{Index, IndexMut};
use std::rc::Rc;

pub use hooks::{HookSlot, Hooks};
pub(crate) use reconcile::{perform_unit_of_work, WorkContext};

use crate::element::{Element, ElementType};
use crate::types::{EffectTag, Props};

/// Index of a fiber inside one generation's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiberId(usize);

impl FiberId {
    /// The root fiber is always the first entry.
    pub const ROOT: FiberId = FiberId(0);

    pub const fn index(self) -> usize {
        self.0
    }
}

/// One element's rendering state for one generation.
#[derive(Debug)]
pub struct Fiber<N> {
    pub(crate) ty: Option<ElementType>,
    pub(crate) props: Rc<Props>,
    pub(crate) target: Option<N>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect: Option<EffectTag>,
    pub(crate) hooks: Vec<HookSlot>,
}

impl<N> Fiber<N> {
    pub(crate) fn from_element(
        element: &Element,
        parent: FiberId,
        effect: EffectTag,
        alternate: Option<FiberId>,
        target: Option<N>,
    ) -> Self {
        Self {
            ty: Some(element.ty().clone()),
            props: element.shared_props(),
            target,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate,
            effect: Some(effect),
            hooks: Vec::new(),
        }
    }

    /// Element type; `None` for the root.
    pub fn ty(&self) -> Option<&ElementType> {
        self.ty.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn target(&self) -> Option<&N> {
        self.target.as_ref()
    }

    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    /// Matching fiber in the previous generation's arena.
    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    /// Effect assigned during reconciliation; `None` only for the root.
    pub fn effect(&self) -> Option<EffectTag> {
        self.effect
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_root(&self) -> bool {
        self.ty.is_none()
    }

    pub fn is_component(&self) -> bool {
        self.ty.as_ref().is_some_and(ElementType::is_component)
    }

    /// Display name for logs and errors.
    pub fn name(&self) -> &str {
        self.ty.as_ref().map_or("root", ElementType::name)
    }
}

/// A previous-generation fiber removed by the generation under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Deletion {
    pub fiber: FiberId,
    /// Tag the fiber carried before it was marked; put back if the new
    /// generation never commits.
    pub previous: Option<EffectTag>,
}

/// Effect counts for one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectSummary {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
}

/// Arena holding every fiber of one generation.
#[derive(Debug)]
pub struct FiberTree<N> {
    fibers: Vec<Fiber<N>>,
}

impl<N> FiberTree<N> {
    /// Seed a tree whose root owns `container` and has `children` as props.
    pub(crate) fn with_root(container: N, children: Vec<Element>, alternate: Option<FiberId>) -> Self {
        let mut props = Props::default();
        props.children = children;
        let root = Fiber {
            ty: None,
            props: Rc::new(props),
            target: Some(container),
            parent: None,
            child: None,
            sibling: None,
            alternate,
            effect: None,
            hooks: Vec::new(),
        };
        Self { fibers: vec![root] }
    }

    pub(crate) fn push(&mut self, fiber: Fiber<N>) -> FiberId {
        let id = FiberId(self.fibers.len());
        self.fibers.push(fiber);
        id
    }

    pub fn root(&self) -> &Fiber<N> {
        &self.fibers[0]
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        self.fibers.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// All fibers in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (FiberId, &Fiber<N>)> {
        self.fibers.iter().enumerate().map(|(i, f)| (FiberId(i), f))
    }

    /// Child chain of `id`, first child first.
    pub fn children(&self, id: FiberId) -> impl Iterator<Item = FiberId> + '_ {
        std::iter::successors(self.get(id).and_then(|f| f.child), move |c| self.fibers[c.0].sibling)
    }

    /// Count effect tags.
    ///
    /// Deletion tags only show up on a committed tree while the next
    /// generation is removing some of its fibers.
    pub fn effect_summary(&self) -> EffectSummary {
        let mut summary = EffectSummary::default();
        for fiber in &self.fibers {
            match fiber.effect {
                Some(EffectTag::Placement) => summary.placements += 1,
                Some(EffectTag::Update) => summary.updates += 1,
                Some(EffectTag::Deletion) => summary.deletions += 1,
                None => {}
            }
        }
        summary
    }

    /// Tag `id` for deletion, returning the tag it had.
    pub(crate) fn mark_deleted(&mut self, id: FiberId) -> Deletion {
        Deletion {
            fiber: id,
            previous: self.fibers[id.0].effect.replace(EffectTag::Deletion),
        }
    }

    /// Undo [`Self::mark_deleted`].
    pub(crate) fn unmark_deleted(&mut self, deletion: Deletion) {
        if let Some(fiber) = self.fibers.get_mut(deletion.fiber.0) {
            fiber.effect = deletion.previous;
        }
    }

    /// Drop links into the previous arena once it has been released.
    pub(crate) fn clear_alternates(&mut self) {
        for fiber in &mut self.fibers {
            fiber.alternate = None;
        }
    }
}

impl<N> Index<FiberId> for FiberTree<N> {
    type Output = Fiber<N>;

    fn index(&self, id: FiberId) -> &Fiber<N> {
        &self.fibers[id.0]
    }
}

impl<N> IndexMut<FiberId> for FiberTree<N> {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber<N> {
        &mut self.fibers[id.0]
    }
}

// =============================================================================
// Tests
// =============================================================================
