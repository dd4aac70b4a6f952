//! Basic Example - render, update and remove against the in-memory target
//!
//! This example walks through three generations:
//! - First render places every node
//! - Changing an attribute updates the existing node in place
//! - Dropping a child deletes its node
//!
//! Run with: RUST_LOG=spark_fiber=debug cargo run --example basic

use spark_fiber::{children, create_element, Element, MemoryTarget, Props, Session};
use tracing_subscriber::EnvFilter;

fn app(id: &str, with_span: bool) -> Element {
    let span = with_span.then(|| create_element("span", Props::new(), children!["hi"]));
    create_element("div", Props::new().attr("id", id), children![span])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== spark-fiber Basic Example ===\n");

    let mut target = MemoryTarget::new();
    let root = target.create_root("body");
    let mut session = Session::new(target);

    let steps = [("a", true), ("b", true), ("b", false)];
    for (id, with_span) in steps {
        session.render(app(id, with_span), root);
        session.target_mut().reset_stats();

        if let Some(report) = session.flush()? {
            println!("Generation {}:", report.generation);
            println!(
                "  effects:  {} placed, {} updated, {} deleted",
                report.effects.placements, report.effects.updates, report.effects.deletions
            );
            println!("  mutated:  {} fibers", report.mutated);
            println!("  target:   {:?}", session.target().stats());
            println!("  markup:   {}\n", session.target().to_markup(root));
        }
    }

    Ok(())
}
