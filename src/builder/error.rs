//! Build errors for machine descriptions.

use crate::core::GuardParseError;
use thiserror::Error;

/// Errors that can occur when building a machine description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("No transitions defined. Add at least one transition")]
    NoTransitions,

    #[error("Transition out of \"{from}\" has a malformed guard: {source}")]
    MalformedGuard {
        from: String,
        #[source]
        source: GuardParseError,
    },
}
