//! Pipeline Wiring
//!
//! Components that know nothing about each other, wired together from
//! plain `Connection` records. A state machine gates the pipeline: it only
//! opens once both upstream stages have reported ready.
//!
//! Key concepts:
//! - Signals fan out to every subscriber, in connection order
//! - One machine's `stateChanged` can feed another component's slot
//! - Disconnecting removes exactly the matching subscription
//!
//! Run with: RUST_LOG=wirestate=trace cargo run --example pipeline_wiring

use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use wirestate::component::{slot, Connection, Invocation, Runtime};
use wirestate::machine::{MachineDescription, MachineType, STATE_CHANGED};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    println!("=== Pipeline Wiring Example ===\n");

    let mut rt = Runtime::new();
    let machines = MachineType::register(&mut rt)?;

    // Stages announce readiness; the sink counts what reaches it.
    let stage_ty = rt.define_type("Stage", &["poke"], &["ready"])?;
    rt.add_type_slot(
        stage_ty,
        "poke",
        Some(slot(|rt, id, _args| {
            let name = rt.data::<String>(id)?.clone();
            rt.emit(id, "ready", &[json!(name)])
        })),
    )?;
    let sink_ty = rt.define_type("Sink", &["accept"], &[])?;
    rt.add_type_slot(
        sink_ty,
        "accept",
        Some(slot(|rt, id, args| {
            println!("  sink received {args:?}");
            *rt.data_mut::<u32>(id)? += 1;
            Ok(())
        })),
    )?;

    let decoder = rt.spawn_with(stage_ty, "decoder".to_string())?;
    let encoder = rt.spawn_with(stage_ty, "encoder".to_string())?;
    let sink = rt.spawn_with(sink_ty, 0u32)?;

    let gate = machines.spawn_from(
        &mut rt,
        &MachineDescription::from_value(json!({
            "initial": "closed",
            "final": "open",
            "transitions": { "closed": { "decoder&encoder": "open" } }
        }))?,
    )?;

    let wiring = [
        Connection::new(decoder, "ready", gate.id(), "setToken"),
        Connection::new(encoder, "ready", gate.id(), "setToken"),
        Connection::new(gate.id(), STATE_CHANGED, sink, "accept"),
        Connection::new(decoder, "ready", sink, "accept"),
    ];
    for wire in &wiring {
        wire.connect(&mut rt)?;
    }

    gate.start(&mut rt)?;

    println!("Decoder ready:");
    Invocation::new(decoder, "poke", vec![]).invoke(&mut rt)?;

    println!("Decoder no longer reports to the sink directly.");
    let removed = wiring[3].disconnect(&mut rt)?;
    println!("  removed {removed} subscription(s)");

    println!("Encoder ready:");
    Invocation::new(encoder, "poke", vec![Value::Null]).invoke(&mut rt)?;

    println!(
        "\nGate is {:?}, sink saw {} message(s)",
        gate.machine(&rt)?.current_state(),
        rt.data::<u32>(sink)?
    );

    println!("\n=== Example Complete ===");
    Ok(())
}
