//! Core types for spark-fiber.
//!
//! These are the values that flow from the element factory through the
//! reconciler into the commit phase: props, listeners, effect tags and the
//! change mask reported by prop reconciliation.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::element::Element;

// =============================================================================
// Naming conventions
// =============================================================================

/// Prefix that marks a prop key as an event listener (`onClick`, `onInput`).
pub const LISTENER_PREFIX: &str = "on";

/// Prop key holding the character data of a text element.
pub const TEXT_VALUE_KEY: &str = "value";

/// Check whether a prop key names a listener.
///
/// The prefix must be followed by an uppercase letter, so `onClick` is a
/// listener while `one` or `on` are plain attributes.
pub fn is_listener_key(key: &str) -> bool {
    key.strip_prefix(LISTENER_PREFIX)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// Event kind for a listener key: the suffix after the prefix, lowercased.
///
/// `onClick` → `click`, `onKeyDown` → `keydown`.
pub fn event_kind(key: &str) -> String {
    key.strip_prefix(LISTENER_PREFIX)
        .unwrap_or(key)
        .to_ascii_lowercase()
}

// =============================================================================
// Events and listeners
// =============================================================================

/// Event delivered to a listener by the render target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Event {
    pub kind: String,
    pub detail: Option<String>,
}

impl Event {
    /// Create an event with no detail payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            detail: None,
        }
    }

    /// Attach a detail payload.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Shared event callback.
///
/// Two listeners are equal only if they are the same allocation, which is what
/// decides whether a re-render swaps the callback on the target.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

// =============================================================================
// Prop values
// =============================================================================

/// A single prop value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Listener(Listener),
}

impl PropValue {
    /// Borrow the listener, if this value is one.
    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            PropValue::Listener(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Text(s) => f.write_str(s),
            PropValue::Int(i) => write!(f, "{i}"),
            PropValue::Float(v) => write!(f, "{v}"),
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Listener(l) => write!(f, "{l:?}"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(i64::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<Listener> for PropValue {
    fn from(value: Listener) -> Self {
        PropValue::Listener(value)
    }
}

// =============================================================================
// Props
// =============================================================================

/// Element props: attributes and listeners keyed by name, plus the child list.
///
/// Children live outside the attribute map, so prop reconciliation never
/// sees them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    values: BTreeMap<String, PropValue>,
    pub(crate) children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute (or listener, if the key uses the listener prefix).
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Set a listener. `key` should carry the listener prefix, e.g. `onClick`.
    pub fn listener(mut self, key: impl Into<String>, f: impl Fn(&Event) + 'static) -> Self {
        self.values
            .insert(key.into(), PropValue::Listener(Listener::new(f)));
        self
    }

    /// Insert a value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate attributes and listeners in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }
}

// =============================================================================
// Effect tags
// =============================================================================

/// Mutation a fiber requires at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTag {
    /// Attach a new handle under the nearest host ancestor.
    Placement,
    /// Keep the handle, reconcile props against the alternate.
    Update,
    /// Remove the handle from the target.
    Deletion,
}

// =============================================================================
// Prop change mask (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Passes of prop reconciliation that touched the target.
    ///
    /// An empty mask means the Update left the node alone.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PropChanges: u8 {
        const NONE = 0;
        const LISTENERS_REMOVED = 1 << 0;
        const ATTRS_CLEARED = 1 << 1;
        const ATTRS_SET = 1 << 2;
        const LISTENERS_ADDED = 1 << 3;
    }
}

// =============================================================================
// Tests
// =============================================================================
