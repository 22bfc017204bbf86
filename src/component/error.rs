//! Errors raised by the capability model.

use thiserror::Error;

/// Errors surfaced by connect, disconnect, emit and invoke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    #[error("Source is not a component")]
    NotAComponent,

    #[error("Signal is not defined: \"{0}\"")]
    UndefinedSignal(String),

    #[error("Slot is not defined: \"{0}\"")]
    UndefinedSlot(String),

    #[error("Component type is not registered")]
    UnknownType,

    #[error("Component instance does not exist")]
    UnknownComponent,

    #[error("Type \"{0}\" has no slot/signal capability")]
    MissingCapability(String),

    #[error("Component data has an unexpected type")]
    DataMismatch,

    #[error("Invalid slot arguments: {0}")]
    InvalidArguments(String),

    /// Raised by slot handlers to abort the current emission.
    #[error("Slot handler failed: {0}")]
    HandlerFailed(String),
}
