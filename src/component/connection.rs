//! Value records describing wiring between components.
//!
//! These are what a wiring layer builds from an application description:
//! a [`Connection`] can be made and unmade repeatedly, an [`Invocation`]
//! replays a slot call.

use super::error::ComponentError;
use super::runtime::{ComponentId, Runtime};
use serde_json::Value;
use tracing::warn;

/// A signal of one component wired to a slot of another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub source: ComponentId,
    pub signal: String,
    pub destination: ComponentId,
    pub slot: String,
}

impl Connection {
    pub fn new(
        source: ComponentId,
        signal: impl Into<String>,
        destination: ComponentId,
        slot: impl Into<String>,
    ) -> Self {
        Self {
            source,
            signal: signal.into(),
            destination,
            slot: slot.into(),
        }
    }

    pub fn connect(&self, rt: &mut Runtime) -> Result<(), ComponentError> {
        rt.connect(self.source, &self.signal, self.destination, &self.slot)
            .inspect_err(|e| {
                warn!(
                    signal = %self.signal,
                    slot = %self.slot,
                    error = %e,
                    "connection_failed"
                )
            })
    }

    /// Returns how many subscriptions were removed.
    pub fn disconnect(&self, rt: &mut Runtime) -> Result<usize, ComponentError> {
        rt.disconnect(self.source, &self.signal, self.destination, &self.slot)
    }
}

/// A recorded slot call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub destination: ComponentId,
    pub slot: String,
    pub args: Vec<Value>,
}

impl Invocation {
    pub fn new(destination: ComponentId, slot: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            destination,
            slot: slot.into(),
            args,
        }
    }

    pub fn invoke(&self, rt: &mut Runtime) -> Result<(), ComponentError> {
        rt.invoke(self.destination, &self.slot, &self.args)
    }
}
