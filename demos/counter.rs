//! Counter Example - hook slots holding signals, driven by the scheduler
//!
//! This example demonstrates:
//! - A component keeping a `Signal` in a hook slot across generations
//! - Dispatching a click to a listener on the target
//! - Driving work in time slices with `FixedSliceHost`
//! - Observing commits through the session's committed-generation signal
//!
//! Run with: RUST_LOG=spark_fiber=trace cargo run --example counter

use std::time::Duration;

use spark_fiber::{
    children, create_element, Component, Element, Event, FixedSliceHost, MemoryTarget, Props,
    Rendered, Scheduler, SchedulerConfig, Session,
};
use spark_signals::{effect, signal};
use tracing_subscriber::EnvFilter;

fn counter() -> Component {
    Component::with_hooks(|props, hooks| {
        let count = hooks.use_slot(|| signal(0i64));
        let step = match props.get("step") {
            Some(spark_fiber::PropValue::Int(step)) => *step,
            _ => 1,
        };

        let clicks = (*count).clone();
        let value = count.get();
        Rendered::from(vec![
            create_element("span", Props::new().attr("class", "value"), children![value]),
            create_element(
                "button",
                Props::new().listener("onClick", move |_| { clicks.set(clicks.get() + step); }),
                children![format!("+{step}")],
            ),
        ])
    })
    .named("Counter")
}

fn app() -> Element {
    create_element(
        "main",
        Props::new(),
        children![
            create_element(counter(), Props::new().attr("step", 1), children![]),
            create_element(counter(), Props::new().attr("step", 5), children![]),
        ],
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== spark-fiber Counter Example ===\n");

    let mut target = MemoryTarget::new();
    let root = target.create_root("body");
    let mut session = Session::new(target);

    let committed = session.committed_signal();
    let _watch = effect(move || {
        println!("[effect] committed generation {}", committed.get());
    });

    let config = SchedulerConfig::default()
        .with_slice_budget(Duration::from_millis(2))
        .with_max_units_per_slice(4);
    let mut scheduler = Scheduler::new(config);

    session.render(app(), root);
    scheduler.run_until_idle(&mut session)?;
    println!("{}\n", session.target().to_markup(root));

    for round in 1..=3 {
        // Click every button, then re-render to pick up the new signal values.
        let main = session.target().children(root)[0];
        let buttons: Vec<_> = session
            .target()
            .children(main)
            .iter()
            .copied()
            .filter(|&n| session.target().tag(n) == Some("button"))
            .collect();
        for button in buttons {
            session.target().dispatch(button, &Event::new("click"));
        }

        session.render(app(), root);
        let mut host = FixedSliceHost::from_config(scheduler.config()).with_window_limit(16);
        scheduler.drive(&mut session, &mut host)?;

        println!("round {round}: {}", session.target().to_markup(root));
    }

    let stats = scheduler.stats();
    println!(
        "\nscheduler: {} slices, {} units, {} commits",
        stats.slices, stats.units, stats.commits
    );

    Ok(())
}
