//! Property tests over arbitrary element trees.

use proptest::prelude::*;

use spark_fiber::{
    children, create_element, text_element, Component, Element, MemoryTarget, NodeId, PropValue,
    Props, RenderTarget, Scheduler, SchedulerConfig, Session,
};

/// Shape of a generated tree, kept separate from `Element` so the same shape
/// can also be built straight into a target.
#[derive(Debug, Clone)]
enum Shape {
    Host {
        tag: &'static str,
        attrs: Vec<(String, i64)>,
        children: Vec<Shape>,
    },
    Text(String),
    Fragment(Vec<Shape>),
}

fn arb_tag() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["div", "span", "p", "li"])
}

fn arb_attrs() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::btree_map("[a-z]{1,3}", 0i64..4, 0..3).prop_map(|m| m.into_iter().collect())
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        "[a-z]{1,4}".prop_map(Shape::Text),
        (arb_tag(), arb_attrs()).prop_map(|(tag, attrs)| Shape::Host {
            tag,
            attrs,
            children: Vec::new(),
        }),
    ];
    leaf.prop_recursive(4, 40, 4, |inner| {
        prop_oneof![
            3 => (arb_tag(), arb_attrs(), prop::collection::vec(inner.clone(), 0..4)).prop_map(
                |(tag, attrs, children)| Shape::Host { tag, attrs, children }
            ),
            1 => prop::collection::vec(inner, 0..4).prop_map(Shape::Fragment),
        ]
    })
}

fn to_element(shape: &Shape) -> Element {
    match shape {
        Shape::Host { tag, attrs, children } => {
            let mut props = Props::new();
            for (key, value) in attrs {
                props.insert(key.clone(), *value);
            }
            let kids: Vec<Element> = children.iter().map(to_element).collect();
            create_element(*tag, props, children![kids])
        }
        Shape::Text(value) => text_element(value.clone()),
        Shape::Fragment(children) => {
            let kids: Vec<Element> = children.iter().map(to_element).collect();
            create_element(Component::fragment(), Props::new(), children![kids])
        }
    }
}

/// Build `shape` directly through the target API, bypassing the engine.
fn construct(target: &mut MemoryTarget, parent: NodeId, shape: &Shape) {
    match shape {
        Shape::Host { tag, attrs, children } => {
            let node = target.create_element(tag).unwrap();
            for (key, value) in attrs {
                target.set_attribute(&node, key, &PropValue::Int(*value)).unwrap();
            }
            target.append_child(&parent, &node).unwrap();
            for child in children {
                construct(target, node, child);
            }
        }
        Shape::Text(value) => {
            let node = target.create_text(value).unwrap();
            target.append_child(&parent, &node).unwrap();
        }
        Shape::Fragment(children) => {
            for child in children {
                construct(target, parent, child);
            }
        }
    }
}

fn reference_markup(shape: &Shape) -> String {
    let mut target = MemoryTarget::new();
    let root = target.create_root("root");
    construct(&mut target, root, shape);
    target.inner_markup(root)
}

fn session() -> (Session<MemoryTarget>, NodeId) {
    let mut target = MemoryTarget::new();
    let root = target.create_root("root");
    (Session::new(target), root)
}

proptest! {
    /// Rendering to quiescence matches building the tree by hand.
    #[test]
    fn render_matches_reference_construction(shape in arb_shape()) {
        let (mut session, root) = session();
        let mut scheduler = Scheduler::new(SchedulerConfig::default().with_max_units_per_slice(3));

        session.render(to_element(&shape), root);
        scheduler.run_until_idle(&mut session).unwrap();

        prop_assert_eq!(session.target().inner_markup(root), reference_markup(&shape));
    }

    /// A second identical render only updates, and changes nothing.
    #[test]
    fn identical_rerender_is_idempotent(shape in arb_shape()) {
        let (mut session, root) = session();
        session.render(to_element(&shape), root);
        session.flush().unwrap();
        session.target_mut().reset_stats();

        session.render(to_element(&shape), root);
        let report = session.flush().unwrap().unwrap();

        prop_assert_eq!(report.effects.placements, 0);
        prop_assert_eq!(report.effects.deletions, 0);
        prop_assert_eq!(report.mutated, 0);
        prop_assert_eq!(session.target().stats().mutations(), 0);
    }

    /// Moving from any tree to any other ends in the second tree's structure.
    #[test]
    fn transition_matches_reference_construction(before in arb_shape(), after in arb_shape()) {
        let (mut session, root) = session();
        session.render(to_element(&before), root);
        session.flush().unwrap();

        session.render(to_element(&after), root);
        session.flush().unwrap();

        prop_assert_eq!(session.target().inner_markup(root), reference_markup(&after));
    }
}
