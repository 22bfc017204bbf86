//! The state machine as a component.
//!
//! The shell owns no logic of its own: it stores a [`StateMachine`] as
//! instance data, turns every guard token into an instance slot, and
//! announces state entries on the `stateChanged` and `terminated` signals.

use super::description::{MachineDescription, TransitionTable};
use super::engine::{StateEntry, StateMachine};
use super::error::MachineError;
use crate::component::{slot, ComponentError, ComponentId, Runtime, TypeKey};
use crate::core::GuardParseError;
use serde_json::Value;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::{debug, trace, warn};

/// Slot delivering the token named by its first argument.
pub const SET_TOKEN: &str = "setToken";
/// Emitted with the new state name on every state entry.
pub const STATE_CHANGED: &str = "stateChanged";
/// Emitted after `stateChanged` when the final state is entered.
pub const TERMINATED: &str = "terminated";

const TYPE_NAME: &str = "StateMachine";

/// The registered `StateMachine` component type.
///
/// # Example
///
/// ```rust
/// use wirestate::component::Runtime;
/// use wirestate::machine::{MachineDescription, MachineType};
///
/// let mut rt = Runtime::new();
/// let machines = MachineType::register(&mut rt).unwrap();
///
/// let desc = MachineDescription::from_json(
///     r#"{"initial": "start", "transitions": {"start": {"next": "end"}}}"#,
/// ).unwrap();
/// let sm = machines.spawn_from(&mut rt, &desc).unwrap();
///
/// assert_eq!(rt.slot_list(sm.id()).unwrap(), vec!["setToken", "next"]);
/// assert_eq!(rt.type_slot_list(machines.key()).unwrap(), vec!["setToken"]);
///
/// sm.start(&mut rt).unwrap();
/// rt.invoke(sm.id(), "next", &[]).unwrap();
/// assert_eq!(sm.machine(&rt).unwrap().current_state(), Some("end"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineType {
    ty: TypeKey,
}

impl MachineType {
    /// Declare the `StateMachine` type: the `setToken` slot, the two
    /// signals, and the configuration methods reachable through
    /// [`Runtime::invoke`].
    pub fn register(rt: &mut Runtime) -> Result<Self, ComponentError> {
        let ty = rt.define_type(TYPE_NAME, &[SET_TOKEN], &[STATE_CHANGED, TERMINATED])?;

        rt.add_type_slot(ty, SET_TOKEN, Some(slot(set_token)))?;
        rt.define_method(ty, "start", slot(invoke_start))?;
        rt.define_method(ty, "setInitialState", slot(invoke_set_initial_state))?;
        rt.define_method(ty, "setFinalState", slot(invoke_set_final_state))?;
        rt.define_method(ty, "setTransitions", slot(invoke_set_transitions))?;
        rt.define_method(ty, "addTransition", slot(invoke_add_transition))?;

        debug!(?ty, "machine_type_registered");
        Ok(Self { ty })
    }

    pub fn key(&self) -> TypeKey {
        self.ty
    }

    /// Spawn an empty machine.
    pub fn spawn(&self, rt: &mut Runtime) -> Result<MachineHandle, ComponentError> {
        let id = rt.spawn_with(self.ty, StateMachine::new())?;
        Ok(MachineHandle::new(id))
    }

    /// Spawn a machine configured from `desc`. It is not started.
    pub fn spawn_from(
        &self,
        rt: &mut Runtime,
        desc: &MachineDescription,
    ) -> Result<MachineHandle, ComponentError> {
        let id = rt.spawn_with(self.ty, StateMachine::from_description(desc))?;
        let handle = MachineHandle::new(id);
        handle.materialize_token_slots(rt)?;
        Ok(handle)
    }
}

/// Typed access to one state machine component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MachineHandle {
    id: ComponentId,
}

impl MachineHandle {
    pub fn new(id: ComponentId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Read-only view of the machine state.
    pub fn machine<'a>(&self, rt: &'a Runtime) -> Result<&'a StateMachine, ComponentError> {
        rt.data::<StateMachine>(self.id)
    }

    pub fn set_initial_state(&self, rt: &mut Runtime, name: &str) -> Result<(), ComponentError> {
        rt.data_mut::<StateMachine>(self.id)?.set_initial_state(name);
        Ok(())
    }

    pub fn set_final_state(&self, rt: &mut Runtime, name: &str) -> Result<(), ComponentError> {
        rt.data_mut::<StateMachine>(self.id)?.set_final_state(name);
        Ok(())
    }

    /// Register a transition and expose any new guard tokens as slots.
    pub fn add_transition(
        &self,
        rt: &mut Runtime,
        from: &str,
        guard: &str,
        to: &str,
    ) -> Result<(), MachineError> {
        rt.data_mut::<StateMachine>(self.id)?.add_transition(from, guard, to)?;
        self.materialize_token_slots(rt)?;
        Ok(())
    }

    /// Register a whole transition table. Guard errors are accumulated in
    /// the returned validation; well-formed transitions are kept.
    pub fn set_transitions(
        &self,
        rt: &mut Runtime,
        table: &TransitionTable,
    ) -> Result<Validation<(), NonEmptyVec<GuardParseError>>, ComponentError> {
        let outcome = rt.data_mut::<StateMachine>(self.id)?.set_transitions(table);
        self.materialize_token_slots(rt)?;
        Ok(outcome)
    }

    /// Enter the initial state and announce it.
    pub fn start(&self, rt: &mut Runtime) -> Result<(), MachineError> {
        let entry = rt.data_mut::<StateMachine>(self.id)?.start()?;
        self.announce(rt, &entry)?;
        Ok(())
    }

    /// Deliver a token. Returns the entered state if a transition fired.
    pub fn deliver_token(
        &self,
        rt: &mut Runtime,
        token: &str,
    ) -> Result<Option<String>, ComponentError> {
        let Some(entry) = rt.data_mut::<StateMachine>(self.id)?.deliver_token(token) else {
            return Ok(None);
        };
        self.announce(rt, &entry)?;
        Ok(Some(entry.state))
    }

    fn announce(&self, rt: &mut Runtime, entry: &StateEntry) -> Result<(), ComponentError> {
        rt.emit(self.id, STATE_CHANGED, &[Value::String(entry.state.clone())])?;
        if entry.terminal {
            debug!(id = ?self.id, state = %entry.state, "machine_terminated");
            rt.emit(self.id, TERMINATED, &[])?;
        }
        Ok(())
    }

    /// Give every guard token without a slot of the same name an instance
    /// slot that delivers it. Existing slots are never rebound.
    fn materialize_token_slots(&self, rt: &mut Runtime) -> Result<(), ComponentError> {
        let existing = rt.slot_list(self.id)?;
        let missing: Vec<String> = self
            .machine(rt)?
            .tokens()
            .filter(|token| !existing.iter().any(|s| s == token))
            .map(str::to_string)
            .collect();

        for token in missing {
            let delivered = token.clone();
            rt.add_instance_slot(
                self.id,
                &token,
                slot(move |rt, id, _args| {
                    MachineHandle::new(id).deliver_token(rt, &delivered).map(|_| ())
                }),
            )?;
            trace!(id = ?self.id, token = %token, "token_slot_added");
        }
        Ok(())
    }
}

fn set_token(rt: &mut Runtime, id: ComponentId, args: &[Value]) -> Result<(), ComponentError> {
    match args.first().and_then(Value::as_str) {
        Some(token) => MachineHandle::new(id).deliver_token(rt, token).map(|_| ()),
        None => {
            trace!(?id, "set_token_without_token");
            Ok(())
        }
    }
}

fn string_arg<'a>(args: &'a [Value], index: usize, what: &str) -> Result<&'a str, ComponentError> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| ComponentError::InvalidArguments(format!("expected {what} at {index}")))
}

fn invoke_start(rt: &mut Runtime, id: ComponentId, _args: &[Value]) -> Result<(), ComponentError> {
    MachineHandle::new(id)
        .start(rt)
        .map_err(MachineError::into_slot_error)
}

fn invoke_set_initial_state(
    rt: &mut Runtime,
    id: ComponentId,
    args: &[Value],
) -> Result<(), ComponentError> {
    let name = string_arg(args, 0, "state name")?;
    MachineHandle::new(id).set_initial_state(rt, name)
}

fn invoke_set_final_state(
    rt: &mut Runtime,
    id: ComponentId,
    args: &[Value],
) -> Result<(), ComponentError> {
    let name = string_arg(args, 0, "state name")?;
    MachineHandle::new(id).set_final_state(rt, name)
}

fn invoke_set_transitions(
    rt: &mut Runtime,
    id: ComponentId,
    args: &[Value],
) -> Result<(), ComponentError> {
    let value = args
        .first()
        .cloned()
        .ok_or_else(|| ComponentError::InvalidArguments("expected transition table".into()))?;
    let table: TransitionTable = serde_json::from_value(value)
        .map_err(|e| ComponentError::InvalidArguments(e.to_string()))?;

    if let Validation::Failure(errors) = MachineHandle::new(id).set_transitions(rt, &table)? {
        warn!(?id, rejected = errors.len(), "transitions_partially_rejected");
    }
    Ok(())
}

fn invoke_add_transition(
    rt: &mut Runtime,
    id: ComponentId,
    args: &[Value],
) -> Result<(), ComponentError> {
    let from = string_arg(args, 0, "source state")?;
    let guard = string_arg(args, 1, "guard")?;
    let to = string_arg(args, 2, "target state")?;

    match MachineHandle::new(id).add_transition(rt, from, guard, to) {
        Ok(()) | Err(MachineError::Guard(_)) => Ok(()),
        Err(other) => Err(other.into_slot_error()),
    }
}
