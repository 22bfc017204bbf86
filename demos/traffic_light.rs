//! Traffic Light
//!
//! A state machine declared with the `machine!` macro, driven by tokens and
//! observed through its `stateChanged` and `terminated` signals.
//!
//! Key concepts:
//! - Every guard token becomes a slot on the machine instance
//! - Tokens latch until the next state entry
//! - `a&b` needs both tokens, `a|b` either one
//!
//! Run with: RUST_LOG=wirestate=debug cargo run --example traffic_light

use serde_json::Value;
use tracing_subscriber::EnvFilter;
use wirestate::component::{slot, ComponentError, Runtime};
use wirestate::machine::{MachineType, STATE_CHANGED, TERMINATED};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    println!("=== Traffic Light Example ===\n");

    let mut rt = Runtime::new();
    let machines = MachineType::register(&mut rt)?;

    let desc = wirestate::machine! {
        initial: "red",
        final: "off",
        transitions: {
            "red" => { "timer&clear" => "green", "shutdown" => "off" },
            "green" => { "timer" => "yellow", "shutdown" => "off" },
            "yellow" => { "timer" => "red", "shutdown" => "off" },
        }
    }?;
    let light = machines.spawn_from(&mut rt, &desc)?;
    println!("Slots on the light: {:?}", rt.slot_list(light.id())?);

    let panel_ty = rt.define_type("Panel", &["show", "halt"], &[])?;
    rt.add_type_slot(panel_ty, "show", Some(slot(show)))?;
    rt.add_type_slot(
        panel_ty,
        "halt",
        Some(slot(|_rt, _id, _args| {
            println!("  panel: light switched off");
            Ok(())
        })),
    )?;
    let panel = rt.spawn(panel_ty)?;

    rt.connect(light.id(), STATE_CHANGED, panel, "show")?;
    rt.connect(light.id(), TERMINATED, panel, "halt")?;

    light.start(&mut rt)?;

    println!("\nTimer fires before the crossing is clear:");
    rt.invoke(light.id(), "timer", &[])?;

    println!("Crossing clears:");
    rt.invoke(light.id(), "clear", &[])?;

    println!("Timer again, then shutdown:");
    rt.invoke(light.id(), "setToken", &[Value::from("timer")])?;
    rt.invoke(light.id(), "shutdown", &[])?;

    let machine = light.machine(&rt)?;
    println!("\nPath taken: {:?}", machine.history().get_path());
    println!("Terminated: {}", machine.is_terminated());

    println!("\n=== Example Complete ===");
    Ok(())
}

fn show(_rt: &mut Runtime, _id: wirestate::ComponentId, args: &[Value]) -> Result<(), ComponentError> {
    let state = args
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| ComponentError::InvalidArguments("expected a state name".into()))?;
    println!("  panel: light is now {state}");
    Ok(())
}
