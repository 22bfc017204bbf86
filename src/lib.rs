//! Wirestate: components wired by signals, driven by token state machines
//!
//! Wirestate has two layers. The capability model lets components expose
//! named slots and signals and be wired together at runtime. On top of it,
//! a state machine component advances when boolean combinations of tokens
//! become true and announces every state it enters.
//!
//! The machine logic is a pure core ([`machine::StateMachine`]); signal
//! emission lives in a thin component shell ([`machine::MachineHandle`]).
//!
//! # Core Concepts
//!
//! - **Runtime**: arena owning every component type and instance
//! - **Slots / Signals**: named entry points and named event sources
//! - **Guards**: token expressions such as `a&b|c`, evaluated left to right
//! - **Latches**: delivered tokens stay true until the next state entry
//!
//! # Example
//!
//! ```rust
//! use wirestate::component::{slot, Runtime};
//! use wirestate::machine::{MachineType, STATE_CHANGED};
//! use serde_json::Value;
//!
//! let mut rt = Runtime::new();
//! let machines = MachineType::register(&mut rt).unwrap();
//!
//! let desc = wirestate::machine! {
//!     initial: "closed",
//!     final: "open",
//!     transitions: { "closed" => { "key&handle" => "open" } }
//! }
//! .unwrap();
//! let door = machines.spawn_from(&mut rt, &desc).unwrap();
//!
//! let log_ty = rt.define_type("Log", &["write"], &[]).unwrap();
//! rt.add_type_slot(log_ty, "write", Some(slot(|rt, id, args| {
//!     let state = args[0].as_str().unwrap_or_default().to_string();
//!     rt.data_mut::<Vec<String>>(id)?.push(state);
//!     Ok(())
//! }))).unwrap();
//! let log = rt.spawn_with(log_ty, Vec::<String>::new()).unwrap();
//!
//! rt.connect(door.id(), STATE_CHANGED, log, "write").unwrap();
//! door.start(&mut rt).unwrap();
//! rt.invoke(door.id(), "key", &[]).unwrap();
//! rt.invoke(door.id(), "setToken", &[Value::from("handle")]).unwrap();
//!
//! assert_eq!(rt.data::<Vec<String>>(log).unwrap(), &vec!["closed", "open"]);
//! ```

pub mod builder;
pub mod component;
pub mod core;
pub mod machine;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder};
pub use component::{ComponentError, ComponentId, Runtime};
pub use crate::core::{parse_guard, GuardExpr, GuardParseError};
pub use machine::{MachineDescription, MachineError, MachineHandle, MachineType, StateMachine};
