//! Minimal walkthrough: build a small machine, start it, send events.
//!
//! Run with: cargo run --example basic_machine

use std::sync::Arc;
use strata::builder::{MachineBuilder, StateBuilder, TransitionBuilder};
use strata::core::Event;
use strata::interpreter::Interpreter;
use strata::patch;
use strata::registry::HandlerRegistry;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let definition = MachineBuilder::new("trafficLight")
        .initial("red")
        .context_field("cycles", serde_json::json!(0))
        .state(
            StateBuilder::new("red").on(
                "TIMER",
                TransitionBuilder::to("green").assign("countCycle"),
            ),
        )
        .state(StateBuilder::new("green").on("TIMER", TransitionBuilder::to("yellow")))
        .state(StateBuilder::new("yellow").on("TIMER", TransitionBuilder::to("red")))
        .build()?;

    let mut registry = HandlerRegistry::new();
    registry.register_action("countCycle", |ctx, _| {
        let cycles = ctx
            .get("cycles")
            .and_then(|v| v.as_i64())
            .unwrap_or_default();
        Ok(patch! { "cycles": cycles + 1 })
    });

    let mut interpreter = Interpreter::new(Arc::new(definition), Arc::new(registry))?;
    interpreter.start()?;

    for _ in 0..7 {
        let snapshot = interpreter.send(Event::new("TIMER"))?;
        println!(
            "light: {}  cycles: {}",
            snapshot.leaf().map(|id| id.as_str()).unwrap_or("?"),
            snapshot.context.get("cycles").unwrap()
        );
    }

    Ok(())
}
