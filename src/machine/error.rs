//! State machine errors.

use crate::component::ComponentError;
use crate::core::GuardParseError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("Initial state not specified. Call set_initial_state before start")]
    MissingInitialState,

    #[error(transparent)]
    Guard(#[from] GuardParseError),

    #[error(transparent)]
    Component(#[from] ComponentError),
}

impl MachineError {
    /// Collapse into the error type slot callables return.
    pub(crate) fn into_slot_error(self) -> ComponentError {
        match self {
            Self::Component(err) => err,
            other => ComponentError::HandlerFailed(other.to_string()),
        }
    }
}
