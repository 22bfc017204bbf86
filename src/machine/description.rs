//! Declarative description of a state machine.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `state -> guard text -> next state`.
///
/// Both levels keep declaration order, which decides which guard wins when
/// several become true on the same token.
pub type TransitionTable = IndexMap<String, IndexMap<String, String>>;

/// The JSON-facing shape of a state machine:
///
/// ```json
/// { "initial": "start",
///   "final": "end",
///   "transitions": { "start": { "a&b": "end" } } }
/// ```
///
/// # Example
///
/// ```rust
/// use wirestate::machine::MachineDescription;
///
/// let desc = MachineDescription::from_json(
///     r#"{"initial": "start", "transitions": {"start": {"b": "x", "a": "y"}}}"#,
/// ).unwrap();
///
/// let guards: Vec<&String> = desc.transitions["start"].keys().collect();
/// assert_eq!(guards, ["b", "a"]);
/// assert!(desc.final_state.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,

    #[serde(default, rename = "final", skip_serializing_if = "Option::is_none")]
    pub final_state: Option<String>,

    #[serde(default)]
    pub transitions: TransitionTable,
}

impl MachineDescription {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
