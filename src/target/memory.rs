//! In-memory render target.
//!
//! A small browser-like node tree: element and text nodes in a slab, each
//! with attributes, listeners and an ordered child list. Every mutation is
//! counted in [`TargetStats`] so tests can assert how much work a commit did.
//! Discarded slots go on a free list and are handed out again by later
//! creates, so a long-running session keeps the slab bounded.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tracing::trace;

use super::{RenderTarget, TargetError};
use crate::types::{Event, Listener, PropValue, TEXT_VALUE_KEY};

/// Handle to a node in a [`MemoryTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Mutation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetStats {
    pub created: usize,
    pub appended: usize,
    pub inserted: usize,
    pub removed: usize,
    pub attributes_set: usize,
    pub attributes_removed: usize,
    pub listeners_added: usize,
    pub listeners_removed: usize,
    pub discarded: usize,
}

impl TargetStats {
    /// Total number of structural and prop mutations.
    pub fn mutations(&self) -> usize {
        self.appended
            + self.inserted
            + self.removed
            + self.attributes_set
            + self.attributes_removed
            + self.listeners_added
            + self.listeners_removed
    }
}

#[derive(Debug)]
enum NodeKind {
    Element(String),
    Text(String),
}

#[derive(Debug)]
struct MemNode {
    kind: NodeKind,
    attributes: BTreeMap<String, PropValue>,
    listeners: Vec<(String, Listener)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl MemNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }
}

/// Browser-like render target held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    nodes: Vec<Option<MemNode>>,
    /// Pool of freed slots for reuse.
    free: Vec<usize>,
    stats: TargetStats,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container node to render into.
    pub fn create_root(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(tag.to_string()))
    }

    pub fn stats(&self) -> TargetStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = TargetStats::default();
    }

    /// Number of slots ever allocated, live or free.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.get(node.0).is_some_and(Option::is_some)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map_or(&[], |n| n.children.as_slice())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).ok()?.parent
    }

    /// Tag of an element node.
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).ok()?.kind {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Character data of a text node.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).ok()?.kind {
            NodeKind::Text(value) => Some(value),
            NodeKind::Element(_) => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&PropValue> {
        self.node(node).ok()?.attributes.get(name)
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.node(node).map_or(0, |n| n.listeners.len())
    }

    /// Deliver an event to the node's listeners for `event.kind`.
    ///
    /// Returns how many listeners ran.
    pub fn dispatch(&self, node: NodeId, event: &Event) -> usize {
        let Ok(n) = self.node(node) else {
            return 0;
        };
        let matching: Vec<Listener> = n
            .listeners
            .iter()
            .filter(|(kind, _)| *kind == event.kind)
            .map(|(_, l)| l.clone())
            .collect();
        for listener in &matching {
            listener.call(event);
        }
        matching.len()
    }

    /// Serialize the subtree under `node`, excluding `node` itself.
    ///
    /// Attributes are emitted in key order and listeners are omitted, so two
    /// trees with the same structure always produce the same string.
    pub fn inner_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_markup(child, &mut out);
        }
        out
    }

    /// Serialize the subtree rooted at `node`.
    pub fn to_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        let Ok(n) = self.node(node) else {
            return;
        };
        match &n.kind {
            NodeKind::Text(value) => out.push_str(value),
            NodeKind::Element(tag) => {
                let _ = write!(out, "<{tag}");
                for (name, value) in &n.attributes {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                out.push('>');
                for &child in &n.children {
                    self.write_markup(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let node = Some(MemNode::new(kind));
        let id = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = node;
                NodeId(index)
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        };
        self.stats.created += 1;
        id
    }

    fn node(&self, id: NodeId) -> Result<&MemNode, TargetError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(TargetError::UnknownNode)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemNode, TargetError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(TargetError::UnknownNode)
    }

    fn attach(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), TargetError> {
        if self.node(child)?.parent.is_some() {
            return Err(TargetError::AlreadyAttached);
        }
        let siblings = &mut self.node_mut(parent)?.children;
        let position = match reference {
            Some(r) => siblings
                .iter()
                .position(|&c| c == r)
                .ok_or(TargetError::NotAChild)?,
            None => siblings.len(),
        };
        siblings.insert(position, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }
}

impl RenderTarget for MemoryTarget {
    type Node = NodeId;

    fn create_element(&mut self, tag: &str) -> Result<NodeId, TargetError> {
        let id = self.alloc(NodeKind::Element(tag.to_string()));
        trace!(node = id.0, tag, "create element");
        Ok(id)
    }

    fn create_text(&mut self, value: &str) -> Result<NodeId, TargetError> {
        let id = self.alloc(NodeKind::Text(value.to_string()));
        trace!(node = id.0, "create text");
        Ok(id)
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), TargetError> {
        self.attach(*parent, *child, None)?;
        self.stats.appended += 1;
        trace!(parent = parent.0, child = child.0, "append child");
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        reference: Option<&NodeId>,
    ) -> Result<(), TargetError> {
        match reference {
            None => self.append_child(parent, child),
            Some(r) => {
                self.attach(*parent, *child, Some(*r))?;
                self.stats.inserted += 1;
                trace!(parent = parent.0, child = child.0, before = r.0, "insert child");
                Ok(())
            }
        }
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), TargetError> {
        let siblings = &mut self.node_mut(*parent)?.children;
        let position = siblings
            .iter()
            .position(|c| c == child)
            .ok_or(TargetError::NotAChild)?;
        siblings.remove(position);
        self.node_mut(*child)?.parent = None;
        self.stats.removed += 1;
        trace!(parent = parent.0, child = child.0, "remove child");
        Ok(())
    }

    fn get_attribute(&self, node: &NodeId, name: &str) -> Option<PropValue> {
        let n = self.node(*node).ok()?;
        match &n.kind {
            NodeKind::Text(value) if name == TEXT_VALUE_KEY => Some(PropValue::Text(value.clone())),
            _ => n.attributes.get(name).cloned(),
        }
    }

    fn set_attribute(
        &mut self,
        node: &NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), TargetError> {
        let n = self.node_mut(*node)?;
        match &mut n.kind {
            NodeKind::Text(text) if name == TEXT_VALUE_KEY => *text = value.to_string(),
            _ => {
                n.attributes.insert(name.to_string(), value.clone());
            }
        }
        self.stats.attributes_set += 1;
        trace!(node = node.0, name, "set attribute");
        Ok(())
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), TargetError> {
        let n = self.node_mut(*node)?;
        match &mut n.kind {
            NodeKind::Text(text) if name == TEXT_VALUE_KEY => text.clear(),
            _ => {
                n.attributes.remove(name);
            }
        }
        self.stats.attributes_removed += 1;
        trace!(node = node.0, name, "remove attribute");
        Ok(())
    }

    fn add_listener(
        &mut self,
        node: &NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), TargetError> {
        self.node_mut(*node)?
            .listeners
            .push((event.to_string(), listener.clone()));
        self.stats.listeners_added += 1;
        trace!(node = node.0, event, "add listener");
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: &NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), TargetError> {
        let listeners = &mut self.node_mut(*node)?.listeners;
        if let Some(position) = listeners
            .iter()
            .position(|(kind, l)| kind == event && l == listener)
        {
            listeners.remove(position);
            self.stats.listeners_removed += 1;
            trace!(node = node.0, event, "remove listener");
        }
        Ok(())
    }

    fn discard(&mut self, node: &NodeId) {
        let attached = self.node(*node).map(|n| n.parent.is_some());
        if attached != Ok(false) {
            return;
        }
        let mut stack = vec![node.0];
        while let Some(index) = stack.pop() {
            let Some(freed) = self.nodes.get_mut(index).and_then(Option::take) else {
                continue;
            };
            stack.extend(freed.children.iter().map(|c| c.0));
            self.free.push(index);
            self.stats.discarded += 1;
            trace!(node = index, "discard node");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
