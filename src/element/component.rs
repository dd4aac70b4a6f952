//! Component functions.
//!
//! A component is a render function from props to elements.
//!
//! Identity decides whether the reconciler updates or remounts:
//! - Function items and non-capturing closures are zero-sized and have a type
//!   of their own, so they are compared by type. Constructing the same
//!   component again in the next generation yields an equal component.
//! - Anything else (function pointers, boxed closures, closures that capture)
//!   may share its type with unrelated functions, so it is compared by the
//!   shared render function. Build such a component once and clone it to
//!   keep it stable across generations.

use std::any::{type_name, TypeId};
use std::fmt;
use std::mem::size_of;
use std::ptr;
use std::rc::Rc;

use super::{fragment, Rendered};
use crate::fiber::Hooks;
use crate::types::Props;

/// Render function signature shared by all components.
pub type RenderFn = dyn Fn(&Props, &mut Hooks<'_>) -> Rendered;

/// A named, reference-counted component function.
#[derive(Clone)]
pub struct Component {
    /// `None` when the type alone does not identify the function.
    id: Option<TypeId>,
    name: &'static str,
    render: Rc<RenderFn>,
}

impl Component {
    /// Build a component from a plain props → elements function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Props) -> Rendered + 'static,
    {
        let render: Rc<RenderFn> = Rc::new(move |props: &Props, _hooks: &mut Hooks<'_>| f(props));
        Self {
            id: type_identity::<F>(),
            name: short_name(type_name::<F>()),
            render,
        }
    }

    /// Build a component that reads or allocates hook slots.
    pub fn with_hooks<F>(f: F) -> Self
    where
        F: Fn(&Props, &mut Hooks<'_>) -> Rendered + 'static,
    {
        Self {
            id: type_identity::<F>(),
            name: short_name(type_name::<F>()),
            render: Rc::new(f),
        }
    }

    /// The fragment component: renders its children as sibling roots.
    pub fn fragment() -> Self {
        Self::new(fragment).named("Fragment")
    }

    /// Override the display name used in logs and errors.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(&self, props: &Props, hooks: &mut Hooks<'_>) -> Rendered {
        (self.render)(props, hooks)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => ptr::addr_eq(Rc::as_ptr(&self.render), Rc::as_ptr(&other.render)),
            _ => false,
        }
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

fn type_identity<F: 'static>() -> Option<TypeId> {
    (size_of::<F>() == 0).then(TypeId::of::<F>)
}

/// Last path segment of a type name (`my_app::views::header` → `header`).
///
/// Closures, function pointers and trait objects have no useful segment and
/// are called `component`; use [`Component::named`] to label them.
fn short_name(full: &'static str) -> &'static str {
    if full.contains("fn(") || full.contains("dyn ") {
        return "component";
    }
    match full.rsplit("::").next() {
        Some(last) if !last.is_empty() && !last.starts_with('{') => last,
        _ => "component",
    }
}
