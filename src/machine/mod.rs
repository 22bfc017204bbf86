//! Token-driven state machines.
//!
//! - [`StateMachine`]: pure transition logic over latched tokens
//! - [`MachineType`] / [`MachineHandle`]: the machine as a component with
//!   one slot per guard token and `stateChanged` / `terminated` signals
//! - [`MachineDescription`]: declarative configuration, usually from JSON

mod component;
mod description;
mod engine;
mod error;

pub use self::component::{MachineHandle, MachineType, SET_TOKEN, STATE_CHANGED, TERMINATED};
pub use self::description::{MachineDescription, TransitionTable};
pub use self::engine::{StateEntry, StateMachine};
pub use self::error::MachineError;
