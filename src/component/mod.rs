//! Signal/slot capability model.
//!
//! Components expose named **slots** (callable entry points) and
//! **signals** (named event sources). Wiring a signal of one component to a
//! slot of another lets the two cooperate without holding references to
//! each other.
//!
//! - [`Runtime`]: arena of types and instances; connect, disconnect, emit, invoke
//! - [`Connection`] / [`Invocation`]: wiring records replayed against a runtime
//! - [`ComponentError`]: failures surfaced to the caller

mod connection;
mod descriptor;
mod error;
mod runtime;

pub use connection::{Connection, Invocation};
pub use descriptor::{slot, Binding, SignalTable, SlotFn};
pub use error::ComponentError;
pub use runtime::{ComponentId, Runtime, TypeKey};
