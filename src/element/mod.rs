//! Element Factory - immutable descriptions of desired output.
//!
//! Elements are rebuilt on every render call and carry no identity across
//! generations. The reconciler matches them against the previous fiber tree by
//! position only.
//!
//! # Example
//!
//! ```ignore
//! use spark_fiber::{children, create_element, Props};
//!
//! let tree = create_element(
//!     "div",
//!     Props::new().attr("id", "a"),
//!     children![create_element("span", Props::new(), children!["hi"])],
//! );
//! ```

mod component;

use std::fmt;
use std::rc::Rc;

pub use component::{Component, RenderFn};

use crate::error::RenderError;
use crate::types::{Props, TEXT_VALUE_KEY};

// =============================================================================
// Element Type
// =============================================================================

/// What an element renders as.
#[derive(Clone, PartialEq)]
pub enum ElementType {
    /// A render-target node with the given tag (`div`, `span`).
    Host(Rc<str>),
    /// A text node; its character data lives in `props.value`.
    Text,
    /// A component function evaluated during reconciliation.
    Component(Component),
}

impl ElementType {
    pub fn is_component(&self) -> bool {
        matches!(self, ElementType::Component(_))
    }

    /// Display name for logs and errors.
    pub fn name(&self) -> &str {
        match self {
            ElementType::Host(tag) => &**tag,
            ElementType::Text => "#text",
            ElementType::Component(c) => c.name(),
        }
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Host(tag) => write!(f, "Host({tag})"),
            ElementType::Text => f.write_str("Text"),
            ElementType::Component(c) => write!(f, "{c:?}"),
        }
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        ElementType::Host(Rc::from(tag))
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        ElementType::Host(Rc::from(tag))
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        ElementType::Component(component)
    }
}

// =============================================================================
// Element
// =============================================================================

/// Immutable `{ type, props }` description. Cloning shares the props.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    ty: ElementType,
    props: Rc<Props>,
}

impl Element {
    /// Build an element from already-normalized props.
    pub fn new(ty: impl Into<ElementType>, props: Props) -> Self {
        Self {
            ty: ty.into(),
            props: Rc::new(props),
        }
    }

    pub fn ty(&self) -> &ElementType {
        &self.ty
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn shared_props(&self) -> Rc<Props> {
        Rc::clone(&self.props)
    }

    pub fn children(&self) -> &[Element] {
        &self.props.children
    }

    /// Character data, for text elements.
    pub fn text(&self) -> Option<String> {
        match self.ty {
            ElementType::Text => self.props.get(TEXT_VALUE_KEY).map(ToString::to_string),
            _ => None,
        }
    }

    /// Reject shapes the render target cannot represent.
    ///
    /// `owner` names the component (or host) that produced the element.
    pub fn validate(&self, owner: &str) -> Result<(), RenderError> {
        let reason = match &self.ty {
            ElementType::Host(tag) if tag.is_empty() => Some("host tag is empty"),
            ElementType::Host(tag) if tag.chars().any(char::is_whitespace) => {
                Some("host tag contains whitespace")
            }
            ElementType::Text if !self.props.children.is_empty() => {
                Some("text element has children")
            }
            _ => None,
        };
        match reason {
            Some(reason) => Err(RenderError::MalformedElement {
                owner: owner.to_string(),
                element: self.ty.name().to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Children
// =============================================================================

/// Loosely-typed child argument accepted by [`create_element`].
///
/// Anything that is not an element is coerced: booleans and `None` render
/// nothing, scalars become text, vectors are flattened.
#[derive(Debug, Clone)]
pub enum Child {
    Element(Element),
    Text(String),
    Nothing,
    Many(Vec<Child>),
}

impl From<Element> for Child {
    fn from(value: Element) -> Self {
        Child::Element(value)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Text(value.to_string())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Text(value)
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Child::Text(value.to_string())
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Child::Text(value.to_string())
    }
}

impl From<usize> for Child {
    fn from(value: usize) -> Self {
        Child::Text(value.to_string())
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Child::Text(value.to_string())
    }
}

impl From<bool> for Child {
    fn from(_: bool) -> Self {
        Child::Nothing
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Child::Nothing, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(value: Vec<T>) -> Self {
        Child::Many(value.into_iter().map(Into::into).collect())
    }
}

/// Build a `Vec<Child>` from heterogeneous values.
///
/// ```ignore
/// let kids = children![header(), "plain text", 42, show_footer.then(footer)];
/// ```
#[macro_export]
macro_rules! children {
    () => { ::std::vec::Vec::<$crate::element::Child>::new() };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$($crate::element::Child::from($child)),+]
    };
}

fn flatten_into(child: Child, out: &mut Vec<Element>) {
    match child {
        Child::Element(element) => out.push(element),
        Child::Text(value) => out.push(text_element(value)),
        Child::Nothing => {}
        Child::Many(children) => {
            for child in children {
                flatten_into(child, out);
            }
        }
    }
}

// =============================================================================
// Factory functions
// =============================================================================

/// Create an element, normalizing its children.
///
/// Nested child lists are flattened in order, booleans and `None` are
/// dropped, and non-element children are wrapped in text elements. Never
/// fails: malformed children are coerced, not rejected.
pub fn create_element(
    ty: impl Into<ElementType>,
    mut props: Props,
    children: impl IntoIterator<Item = Child>,
) -> Element {
    let mut flat = Vec::new();
    for child in children {
        flatten_into(child, &mut flat);
    }
    props.children = flat;
    Element::new(ty, props)
}

/// Create a text element.
pub fn text_element(value: impl Into<String>) -> Element {
    Element::new(
        ElementType::Text,
        Props::new().attr(TEXT_VALUE_KEY, value.into()),
    )
}

/// Identity render function returning `props.children` as sibling roots.
pub fn fragment(props: &Props) -> Rendered {
    Rendered::Fragment(props.children.clone())
}

// =============================================================================
// Component output
// =============================================================================

/// What a component function returns.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Rendered {
    /// A single root element.
    Element(Element),
    /// Several sibling roots with no wrapper node.
    Fragment(Vec<Element>),
    /// Render nothing.
    #[default]
    Empty,
}

impl Rendered {
    /// Normalize into the ordered list of roots to reconcile.
    pub fn into_elements(self) -> Vec<Element> {
        match self {
            Rendered::Element(element) => vec![element],
            Rendered::Fragment(elements) => elements,
            Rendered::Empty => Vec::new(),
        }
    }
}

impl From<Element> for Rendered {
    fn from(value: Element) -> Self {
        Rendered::Element(value)
    }
}

impl From<Vec<Element>> for Rendered {
    fn from(value: Vec<Element>) -> Self {
        Rendered::Fragment(value)
    }
}

impl From<Option<Element>> for Rendered {
    fn from(value: Option<Element>) -> Self {
        value.map_or(Rendered::Empty, Rendered::Element)
    }
}

// =============================================================================
// Tests
// =============================================================================
