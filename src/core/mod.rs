//! Pure pieces of the runtime.
//!
//! - Guard expressions and their parser
//! - Token latches and compiled transition networks
//! - Bounded history of fired transitions
//!
//! Nothing in this module touches components or emits signals.

mod error;
mod guard;
mod history;
mod network;

pub use error::GuardParseError;
pub use guard::{parse_guard, scan_tokens, GuardExpr, Link};
pub use history::{StateHistory, StateTransition, DEFAULT_HISTORY_LIMIT};
pub use network::{LatchTable, TransitionNetwork};
