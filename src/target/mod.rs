//! Render target contract.
//!
//! The engine never builds target nodes itself; it goes through this
//! capability set. [`MemoryTarget`] is a browser-like in-process tree used by
//! tests, demos and headless hosts.

mod memory;

use std::fmt::Debug;

use thiserror::Error;

pub use memory::{MemoryTarget, NodeId, TargetStats};

use crate::types::{Listener, PropValue};

/// Errors reported by a render target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("node does not exist on this target")]
    UnknownNode,
    #[error("node is not a child of the given parent")]
    NotAChild,
    #[error("node already has a parent")]
    AlreadyAttached,
    #[error("{0}")]
    Backend(String),
}

/// Capabilities the commit phase needs from a render target.
///
/// Handles are cheap, cloneable references. For text nodes the `value`
/// attribute is the node's character data.
pub trait RenderTarget {
    type Node: Clone + PartialEq + Debug;

    fn create_element(&mut self, tag: &str) -> Result<Self::Node, TargetError>;

    fn create_text(&mut self, value: &str) -> Result<Self::Node, TargetError>;

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), TargetError>;

    /// Insert `child` before `reference`, or append when `reference` is `None`.
    fn insert_before(
        &mut self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> Result<(), TargetError>;

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), TargetError>;

    fn get_attribute(&self, node: &Self::Node, name: &str) -> Option<PropValue>;

    fn set_attribute(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: &PropValue,
    ) -> Result<(), TargetError>;

    /// Clear an attribute that is no longer present in the props.
    fn remove_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), TargetError>;

    fn add_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        listener: &Listener,
    ) -> Result<(), TargetError>;

    fn remove_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        listener: &Listener,
    ) -> Result<(), TargetError>;

    /// Release a detached node, and everything under it, that the engine no
    /// longer references.
    ///
    /// Called after a node is removed at commit and for the handles of a
    /// generation that is dropped before commit. Nodes that are still
    /// attached must be left alone.
    fn discard(&mut self, _node: &Self::Node) {}
}
