//! Render Session - the render state as an explicit context.
//!
//! A [`Session`] owns one render target and everything the engine tracks
//! between calls: the committed tree, the tree under construction, the
//! traversal cursor and the pending deletions. Several sessions can live side
//! by side; nothing is global.
//!
//! # Lifecycle
//!
//! ```text
//! render(element) ──► wip seeded, cursor = root
//!        │
//!        ▼
//! step() / work_units() ── one fiber per call ──► cursor exhausted
//!        │
//!        ▼
//! commit() ──► deletions, placements, updates applied ──► wip becomes current
//! ```
//!
//! Starting a new render while one is in flight abandons the old one
//! explicitly and reports it through [`Abandoned`].

use spark_signals::{signal, Signal};
use tracing::{debug, error, warn};

use crate::commit::{commit_root, CommitReport};
use crate::element::Element;
use crate::error::RenderError;
use crate::fiber::{
    perform_unit_of_work, Deletion, EffectSummary, FiberId, FiberTree, WorkContext,
};
use crate::target::RenderTarget;
use crate::types::EffectTag;

// =============================================================================
// Work in progress
// =============================================================================

/// The generation under construction.
#[derive(Debug)]
pub struct WorkInProgress<N> {
    tree: FiberTree<N>,
    cursor: Option<FiberId>,
    deletions: Vec<Deletion>,
    units: usize,
    generation: u64,
}

impl<N> WorkInProgress<N> {
    pub fn tree(&self) -> &FiberTree<N> {
        &self.tree
    }

    /// Next fiber to visit; `None` once the traversal is done.
    pub fn cursor(&self) -> Option<FiberId> {
        self.cursor
    }

    /// Previous-generation fibers that will be removed at commit.
    ///
    /// Each of them carries [`EffectTag::Deletion`] in the committed tree.
    pub fn deletions(&self) -> impl ExactSizeIterator<Item = FiberId> + '_ {
        self.deletions.iter().map(|d| d.fiber)
    }

    pub fn units_performed(&self) -> usize {
        self.units
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_complete(&self) -> bool {
        self.cursor.is_none()
    }
}

fn summarize<N>(current: Option<&FiberTree<N>>, wip: &WorkInProgress<N>) -> EffectSummary {
    let deletions = current.map_or(0, |tree| tree.effect_summary().deletions);
    debug_assert_eq!(deletions, wip.deletions.len());
    EffectSummary {
        deletions,
        ..wip.tree.effect_summary()
    }
}

/// Report for a generation that was dropped before commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abandoned {
    pub generation: u64,
    /// Units already performed when the generation was dropped.
    pub units: usize,
    /// Detached target handles released through [`RenderTarget::discard`].
    pub discarded: usize,
}

// =============================================================================
// Session
// =============================================================================

/// One independent render context bound to a render target.
pub struct Session<T: RenderTarget> {
    target: T,
    current: Option<FiberTree<T::Node>>,
    wip: Option<WorkInProgress<T::Node>>,
    generation: u64,
    committed: Signal<u64>,
}

impl<T: RenderTarget> Session<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            current: None,
            wip: None,
            generation: 0,
            committed: signal(0),
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Give the target back, dropping all fiber state.
    pub fn into_target(self) -> T {
        self.target
    }

    /// Last committed tree.
    pub fn current_root(&self) -> Option<&FiberTree<T::Node>> {
        self.current.as_ref()
    }

    pub fn work_in_progress(&self) -> Option<&WorkInProgress<T::Node>> {
        self.wip.as_ref()
    }

    /// Number of the most recently started generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of the most recently committed generation (0 before the first).
    pub fn committed_generation(&self) -> u64 {
        self.committed.get()
    }

    /// Reactive view of [`Self::committed_generation`].
    ///
    /// Effects reading this signal re-run after every commit.
    pub fn committed_signal(&self) -> Signal<u64> {
        self.committed.clone()
    }

    /// True while fibers remain to be visited.
    pub fn has_pending_work(&self) -> bool {
        self.wip.as_ref().is_some_and(|w| !w.is_complete())
    }

    /// True when a generation is fully built and waiting for commit.
    pub fn is_ready_to_commit(&self) -> bool {
        self.wip.as_ref().is_some_and(WorkInProgress::is_complete)
    }

    /// Effects of the in-flight generation, if any.
    ///
    /// Placements and updates are read from the tree under construction,
    /// deletions from the tags on the committed tree.
    pub fn pending_effects(&self) -> Option<EffectSummary> {
        let wip = self.wip.as_ref()?;
        Some(summarize(self.current.as_ref(), wip))
    }

    /// Schedule `element` to be rendered into `container`.
    ///
    /// Nothing touches the target until the generation is committed. An
    /// in-flight generation is abandoned first and reported.
    pub fn render(&mut self, element: Element, container: T::Node) -> Option<Abandoned> {
        let abandoned = self.abandon();
        if let Some(report) = &abandoned {
            warn!(
                generation = report.generation,
                units = report.units,
                "render replaced an unfinished generation"
            );
        }

        self.generation += 1;
        let alternate = self.current.as_ref().map(|_| FiberId::ROOT);
        let tree = FiberTree::with_root(container, vec![element], alternate);
        self.wip = Some(WorkInProgress {
            tree,
            cursor: Some(FiberId::ROOT),
            deletions: Vec::new(),
            units: 0,
            generation: self.generation,
        });
        debug!(generation = self.generation, "render scheduled");
        abandoned
    }

    /// Drop the in-flight generation, releasing handles it created.
    ///
    /// The committed tree and the target are left untouched.
    pub fn abandon(&mut self) -> Option<Abandoned> {
        let wip = self.wip.take()?;
        let abandoned = self.release(wip);
        debug!(
            generation = abandoned.generation,
            units = abandoned.units,
            discarded = abandoned.discarded,
            "generation abandoned"
        );
        Some(abandoned)
    }

    /// Discard the handles `wip` created and clear its Deletion tags from
    /// the committed tree.
    fn release(&mut self, wip: WorkInProgress<T::Node>) -> Abandoned {
        let mut discarded = 0;
        for (_, fiber) in wip.tree.iter() {
            if fiber.effect() != Some(EffectTag::Placement) {
                continue;
            }
            if let Some(node) = fiber.target() {
                self.target.discard(node);
                discarded += 1;
            }
        }
        if let Some(current) = self.current.as_mut() {
            for deletion in wip.deletions.into_iter().rev() {
                current.unmark_deleted(deletion);
            }
        }
        Abandoned {
            generation: wip.generation,
            units: wip.units,
            discarded,
        }
    }

    /// Perform exactly one unit of work.
    ///
    /// Returns `None` when there is nothing to do. On error the generation is
    /// abandoned before the error is returned.
    pub fn step(&mut self) -> Option<Result<FiberId, RenderError>> {
        let wip = self.wip.as_mut()?;
        let id = wip.cursor?;

        let mut cx = WorkContext {
            target: &mut self.target,
            current: self.current.as_mut(),
            wip: &mut wip.tree,
            deletions: &mut wip.deletions,
        };

        match perform_unit_of_work(&mut cx, id) {
            Ok(next) => {
                wip.cursor = next;
                wip.units += 1;
                Some(Ok(id))
            }
            Err(err) => {
                error!(fiber = id.index(), %err, "unit of work failed");
                self.abandon();
                Some(Err(err))
            }
        }
    }

    /// Iterate over the remaining units of work, one fiber per item.
    pub fn work_units(&mut self) -> WorkUnits<'_, T> {
        WorkUnits { session: self }
    }

    /// Commit a fully built generation to the target.
    ///
    /// Fails with [`RenderError::NoWorkInProgress`] when nothing was
    /// rendered and [`RenderError::WorkPending`] when the traversal is not
    /// finished; neither touches the target. A target error part way through
    /// drops the generation the same way [`Self::abandon`] does, so handles
    /// that were never attached are released.
    pub fn commit(&mut self) -> Result<CommitReport, RenderError> {
        let wip = match self.wip.take() {
            None => return Err(RenderError::NoWorkInProgress),
            Some(wip) if !wip.is_complete() => {
                self.wip = Some(wip);
                return Err(RenderError::WorkPending);
            }
            Some(wip) => wip,
        };

        let effects = summarize(self.current.as_ref(), &wip);
        let result = commit_root(
            &mut self.target,
            self.current.as_ref(),
            &wip.tree,
            &wip.deletions,
        );
        let mutated = match result {
            Ok(mutated) => mutated,
            Err(err) => {
                let released = self.release(wip);
                error!(
                    generation = released.generation,
                    discarded = released.discarded,
                    %err,
                    "commit failed"
                );
                return Err(err);
            }
        };

        let mut tree = wip.tree;
        tree.clear_alternates();
        self.current = Some(tree);
        self.committed.set(wip.generation);

        debug!(
            generation = wip.generation,
            placements = effects.placements,
            updates = effects.updates,
            deletions = effects.deletions,
            mutated,
            "generation committed"
        );

        Ok(CommitReport {
            generation: wip.generation,
            effects,
            mutated,
        })
    }

    /// Run every remaining unit and commit, without yielding.
    ///
    /// Returns `Ok(None)` when nothing was rendered.
    pub fn flush(&mut self) -> Result<Option<CommitReport>, RenderError> {
        for unit in self.work_units() {
            unit?;
        }
        if self.is_ready_to_commit() {
            return self.commit().map(Some);
        }
        Ok(None)
    }
}

/// Resumable iterator over units of work.
///
/// Each `next()` visits one fiber. Dropping the iterator leaves the cursor
/// where it stopped; a later iterator picks up from there.
pub struct WorkUnits<'s, T: RenderTarget> {
    session: &'s mut Session<T>,
}

impl<T: RenderTarget> Iterator for WorkUnits<'_, T> {
    type Item = Result<FiberId, RenderError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.session.step()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::children;
    use crate::element::{create_element, Component, Rendered};
    use crate::target::{MemoryTarget, NodeId, TargetError};
    use crate::types::{Listener, PropValue, Props};

    /// Memory target whose inserts start failing after a fixed number.
    struct FailingTarget {
        inner: MemoryTarget,
        inserts_left: usize,
    }

    impl RenderTarget for FailingTarget {
        type Node = NodeId;

        fn create_element(&mut self, tag: &str) -> Result<NodeId, TargetError> {
            self.inner.create_element(tag)
        }

        fn create_text(&mut self, value: &str) -> Result<NodeId, TargetError> {
            self.inner.create_text(value)
        }

        fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), TargetError> {
            self.inner.append_child(parent, child)
        }

        fn insert_before(
            &mut self,
            parent: &NodeId,
            child: &NodeId,
            reference: Option<&NodeId>,
        ) -> Result<(), TargetError> {
            if self.inserts_left == 0 {
                return Err(TargetError::Backend("insert refused".into()));
            }
            self.inserts_left -= 1;
            self.inner.insert_before(parent, child, reference)
        }

        fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), TargetError> {
            self.inner.remove_child(parent, child)
        }

        fn get_attribute(&self, node: &NodeId, name: &str) -> Option<PropValue> {
            self.inner.get_attribute(node, name)
        }

        fn set_attribute(
            &mut self,
            node: &NodeId,
            name: &str,
            value: &PropValue,
        ) -> Result<(), TargetError> {
            self.inner.set_attribute(node, name, value)
        }

        fn remove_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), TargetError> {
            self.inner.remove_attribute(node, name)
        }

        fn add_listener(
            &mut self,
            node: &NodeId,
            event: &str,
            listener: &Listener,
        ) -> Result<(), TargetError> {
            self.inner.add_listener(node, event, listener)
        }

        fn remove_listener(
            &mut self,
            node: &NodeId,
            event: &str,
            listener: &Listener,
        ) -> Result<(), TargetError> {
            self.inner.remove_listener(node, event, listener)
        }

        fn discard(&mut self, node: &NodeId) {
            self.inner.discard(node);
        }
    }

    fn session() -> (Session<MemoryTarget>, NodeId) {
        let mut target = MemoryTarget::new();
        let root = target.create_root("root");
        (Session::new(target), root)
    }

    fn div(id: &str, kids: Vec<crate::element::Child>) -> Element {
        create_element("div", Props::new().attr("id", id), kids)
    }

    #[test]
    fn test_render_does_not_touch_target() {
        let (mut session, root) = session();
        session.render(div("a", children!["hi"]), root);

        assert!(session.has_pending_work());
        assert_eq!(session.target().inner_markup(root), "");
        assert!(session.current_root().is_none());
    }

    #[test]
    fn test_flush_commits() {
        let (mut session, root) = session();
        session.render(div("a", children!["hi"]), root);

        let report = session.flush().unwrap().unwrap();
        assert_eq!(report.generation, 1);
        assert_eq!(report.effects.placements, 2);
        assert_eq!(session.target().inner_markup(root), "<div id=\"a\">hi</div>");
        assert_eq!(session.committed_generation(), 1);
        assert!(session.work_in_progress().is_none());
    }

    #[test]
    fn test_commit_guards() {
        let (mut session, root) = session();
        assert_eq!(session.commit(), Err(RenderError::NoWorkInProgress));

        session.render(div("a", children![]), root);
        assert_eq!(session.commit(), Err(RenderError::WorkPending));
        // Guard keeps the generation in place.
        assert!(session.work_in_progress().is_some());
        assert!(session.flush().unwrap().is_some());
    }

    #[test]
    fn test_work_units_is_resumable() {
        let (mut session, root) = session();
        session.render(div("a", children!["x", "y"]), root);

        // root, div, #text, #text
        let first: Vec<_> = session.work_units().take(2).collect();
        assert_eq!(first.len(), 2);
        assert!(session.has_pending_work());

        let rest = session.work_units().count();
        assert_eq!(rest, 2);
        assert!(session.is_ready_to_commit());
    }

    #[test]
    fn test_render_replacing_in_flight_generation_is_reported() {
        let (mut session, root) = session();
        session.render(div("a", children!["x"]), root);
        session.step();
        session.step();

        let abandoned = session.render(div("b", children![]), root).unwrap();
        assert_eq!(abandoned.generation, 1);
        assert_eq!(abandoned.units, 2);
        // The div's handle was created by the second unit and released.
        assert_eq!(abandoned.discarded, 1);
        assert_eq!(session.target().stats().discarded, 1);

        session.flush().unwrap();
        assert_eq!(session.target().inner_markup(root), "<div id=\"b\"></div>");
    }

    #[test]
    fn test_failed_unit_abandons_generation() {
        fn broken(_props: &Props) -> Rendered {
            create_element("bad tag", Props::new(), children![]).into()
        }

        let (mut session, root) = session();
        session.render(div("ok", children![]), root);
        session.flush().unwrap();

        session.render(create_element(Component::new(broken), Props::new(), children![]), root);
        let err = session.flush().unwrap_err();
        assert!(matches!(err, RenderError::MalformedElement { .. }));
        assert!(session.work_in_progress().is_none());
        // Last committed output is intact.
        assert_eq!(session.target().inner_markup(root), "<div id=\"ok\"></div>");
        assert_eq!(session.committed_generation(), 1);
    }

    #[test]
    fn test_type_change_in_middle_keeps_order() {
        let (mut session, root) = session();
        let make = |middle: &str| {
            create_element(
                "ul",
                Props::new(),
                children![
                    create_element("li", Props::new(), children!["1"]),
                    create_element(middle, Props::new(), children!["2"]),
                    create_element("li", Props::new(), children!["3"]),
                ],
            )
        };

        session.render(make("p"), root);
        session.flush().unwrap();
        session.render(make("span"), root);
        let report = session.flush().unwrap().unwrap();

        assert_eq!(report.effects.deletions, 1);
        assert_eq!(
            session.target().inner_markup(root),
            "<ul><li>1</li><span>2</span><li>3</li></ul>"
        );
    }

    #[test]
    fn test_deleting_fragment_component_removes_all_roots() {
        fn pair(_props: &Props) -> Rendered {
            vec![
                create_element("a", Props::new(), children![]),
                create_element("b", Props::new(), children![]),
            ]
            .into()
        }

        let (mut session, root) = session();
        session.render(
            create_element(
                "div",
                Props::new(),
                children![create_element(Component::new(pair), Props::new(), children![])],
            ),
            root,
        );
        session.flush().unwrap();
        assert_eq!(session.target().inner_markup(root), "<div><a></a><b></b></div>");

        session.render(create_element("div", Props::new(), children![]), root);
        session.flush().unwrap();
        assert_eq!(session.target().inner_markup(root), "<div></div>");
    }

    #[test]
    fn test_placement_inside_component_goes_before_stable_sibling() {
        fn maybe(props: &Props) -> Rendered {
            match props.get("show") {
                Some(crate::types::PropValue::Bool(true)) => {
                    create_element("em", Props::new(), children![]).into()
                }
                _ => Rendered::Empty,
            }
        }

        let (mut session, root) = session();
        let tree = |show: bool| {
            create_element(
                "p",
                Props::new(),
                children![
                    create_element(Component::new(maybe), Props::new().attr("show", show), children![]),
                    create_element("b", Props::new(), children![]),
                ],
            )
        };

        session.render(tree(false), root);
        session.flush().unwrap();
        session.render(tree(true), root);
        session.flush().unwrap();

        assert_eq!(session.target().inner_markup(root), "<p><em></em><b></b></p>");
    }

    #[test]
    fn test_committed_signal_tracks_generation() {
        let (mut session, root) = session();
        let committed = session.committed_signal();
        assert_eq!(committed.get(), 0);

        session.render(div("a", children![]), root);
        session.flush().unwrap();
        session.render(div("b", children![]), root);
        session.flush().unwrap();

        assert_eq!(committed.get(), 2);
    }

    #[test]
    fn test_failed_commit_discards_unattached_handles() {
        let mut inner = MemoryTarget::new();
        let root = inner.create_root("root");
        let mut session = Session::new(FailingTarget {
            inner,
            inserts_left: 1,
        });

        session.render(
            div(
                "a",
                children![
                    create_element("a", Props::new(), children![]),
                    create_element("b", Props::new(), children![]),
                ],
            ),
            root,
        );
        let err = session.flush().unwrap_err();

        assert!(matches!(err, RenderError::Target(TargetError::Backend(_))));
        assert!(session.work_in_progress().is_none());
        assert_eq!(session.committed_generation(), 0);
        // The div made it in before the failure; both children never did.
        let target = &session.target().inner;
        assert_eq!(target.stats().discarded, 2);
        assert_eq!(target.len(), 2);
        assert_eq!(target.inner_markup(root), "<div id=\"a\"></div>");
    }

    #[test]
    fn test_abandon_clears_deletion_tags() {
        let (mut session, root) = session();
        let list = |len: usize| {
            let items: Vec<Element> = (0..len)
                .map(|_| create_element("li", Props::new(), children![]))
                .collect();
            create_element("ul", Props::new(), children![items])
        };
        session.render(list(3), root);
        session.flush().unwrap();

        session.render(list(1), root);
        for unit in session.work_units() {
            unit.unwrap();
        }
        assert_eq!(session.pending_effects().map(|e| e.deletions), Some(2));
        assert_eq!(session.work_in_progress().unwrap().deletions().len(), 2);
        assert_eq!(session.current_root().unwrap().effect_summary().deletions, 2);

        session.abandon().unwrap();
        let current = session.current_root().unwrap();
        assert_eq!(current.effect_summary().deletions, 0);
        assert_eq!(current.effect_summary().placements, 4);

        // The next generation diffs against a clean tree.
        session.render(list(3), root);
        let report = session.flush().unwrap().unwrap();
        assert_eq!(report.effects.deletions, 0);
        assert_eq!(report.effects.updates, 4);
        assert_eq!(session.target().children(session.target().children(root)[0]).len(), 3);
    }
}
