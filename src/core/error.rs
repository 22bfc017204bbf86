//! Guard parsing errors.

use thiserror::Error;

/// A guard expression that could not be parsed.
///
/// Carries the offending text and the byte offset at which the grammar
/// stopped matching, so callers can point at the problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed guard expression \"{guard}\" at offset {offset}")]
pub struct GuardParseError {
    /// The full guard text as it was declared
    pub guard: String,
    /// Byte offset where parsing failed
    pub offset: usize,
}

impl GuardParseError {
    pub fn new(guard: impl Into<String>, offset: usize) -> Self {
        Self {
            guard: guard.into(),
            offset,
        }
    }
}
