//! Prop and listener reconciliation for a single target node.

use tracing::warn;

use crate::target::{RenderTarget, TargetError};
use crate::types::{event_kind, is_listener_key, Listener, PropChanges, PropValue, Props};

/// Apply the minimal set of mutations turning `prev` into `next` on `node`.
///
/// Four ordered passes:
/// 1. remove listeners that are gone or changed
/// 2. clear attributes that are gone
/// 3. set attributes that are new or changed
/// 4. add listeners that are new or changed
///
/// The child list is not part of the attribute map and is never touched.
pub fn update_target<T: RenderTarget>(
    target: &mut T,
    node: &T::Node,
    prev: &Props,
    next: &Props,
) -> Result<PropChanges, TargetError> {
    let mut changes = PropChanges::empty();

    for (key, value) in prev.iter().filter(|(k, _)| is_listener_key(k)) {
        if next.get(key) == Some(value) {
            continue;
        }
        if let Some(listener) = listener_of(key, value) {
            target.remove_listener(node, &event_kind(key), listener)?;
            changes |= PropChanges::LISTENERS_REMOVED;
        }
    }

    for (key, _) in prev.iter().filter(|(k, _)| !is_listener_key(k)) {
        if !next.contains(key) {
            target.remove_attribute(node, key)?;
            changes |= PropChanges::ATTRS_CLEARED;
        }
    }

    for (key, value) in next.iter().filter(|(k, _)| !is_listener_key(k)) {
        if prev.get(key) != Some(value) {
            target.set_attribute(node, key, value)?;
            changes |= PropChanges::ATTRS_SET;
        }
    }

    for (key, value) in next.iter().filter(|(k, _)| is_listener_key(k)) {
        if prev.get(key) == Some(value) {
            continue;
        }
        if let Some(listener) = listener_of(key, value) {
            target.add_listener(node, &event_kind(key), listener)?;
            changes |= PropChanges::LISTENERS_ADDED;
        }
    }

    Ok(changes)
}

fn listener_of<'v>(key: &str, value: &'v PropValue) -> Option<&'v Listener> {
    let listener = value.as_listener();
    if listener.is_none() {
        warn!(key, "listener prop does not hold a callback; ignored");
    }
    listener
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::MemoryTarget;
    use crate::types::{Event, Listener};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_initial_apply_sets_everything() {
        let mut target = MemoryTarget::new();
        let node = target.create_element("button").unwrap();
        let next = Props::new()
            .attr("id", "go")
            .attr("disabled", false)
            .listener("onClick", |_| {});

        let changes = update_target(&mut target, &node, &Props::new(), &next).unwrap();
        assert_eq!(changes, PropChanges::ATTRS_SET | PropChanges::LISTENERS_ADDED);
        assert_eq!(target.attribute(node, "id"), Some(&PropValue::from("go")));
        assert_eq!(target.listener_count(node), 1);
        // Listeners are not attributes.
        assert_eq!(target.attribute(node, "onClick"), None);
    }

    #[test]
    fn test_identical_props_touch_nothing() {
        let mut target = MemoryTarget::new();
        let node = target.create_element("div").unwrap();
        let listener = Listener::new(|_| {});
        let props = Props::new().attr("id", "a").attr("onClick", listener);

        update_target(&mut target, &node, &Props::new(), &props).unwrap();
        target.reset_stats();

        let same = props.clone();
        let changes = update_target(&mut target, &node, &props, &same).unwrap();
        assert!(changes.is_empty());
        assert_eq!(target.stats().mutations(), 0);
    }

    #[test]
    fn test_changed_and_removed_attributes() {
        let mut target = MemoryTarget::new();
        let node = target.create_element("div").unwrap();
        let prev = Props::new().attr("id", "a").attr("title", "t");
        update_target(&mut target, &node, &Props::new(), &prev).unwrap();

        let next = Props::new().attr("id", "b");
        let changes = update_target(&mut target, &node, &prev, &next).unwrap();

        assert_eq!(changes, PropChanges::ATTRS_CLEARED | PropChanges::ATTRS_SET);
        assert_eq!(target.attribute(node, "id"), Some(&PropValue::from("b")));
        assert_eq!(target.attribute(node, "title"), None);
    }

    #[test]
    fn test_changed_listener_is_swapped() {
        let mut target = MemoryTarget::new();
        let node = target.create_element("button").unwrap();
        let old_hits = Rc::new(Cell::new(0));
        let new_hits = Rc::new(Cell::new(0));

        let old_clone = old_hits.clone();
        let prev = Props::new().listener("onClick", move |_| old_clone.set(old_clone.get() + 1));
        update_target(&mut target, &node, &Props::new(), &prev).unwrap();

        let new_clone = new_hits.clone();
        let next = Props::new().listener("onClick", move |_| new_clone.set(new_clone.get() + 1));
        let changes = update_target(&mut target, &node, &prev, &next).unwrap();

        assert_eq!(changes, PropChanges::LISTENERS_REMOVED | PropChanges::LISTENERS_ADDED);
        target.dispatch(node, &Event::new("click"));
        assert_eq!(old_hits.get(), 0);
        assert_eq!(new_hits.get(), 1);
    }

    #[test]
    fn test_non_callback_listener_prop_is_ignored() {
        let mut target = MemoryTarget::new();
        let node = target.create_element("div").unwrap();
        let next = Props::new().attr("onClick", "not a function");

        let changes = update_target(&mut target, &node, &Props::new(), &next).unwrap();
        assert!(changes.is_empty());
        assert_eq!(target.listener_count(node), 0);
    }
}
