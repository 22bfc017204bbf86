//! Record of fired transitions.
//!
//! History is a bounded window: once `limit` transitions are held, each new
//! one evicts the oldest. Recording is in place and constant time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Transitions kept by [`StateHistory::new`].
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// One fired transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state being left
    pub from: String,
    /// The state being entered
    pub to: String,
    /// Text of the guard that fired
    pub guard: String,
    /// When the guard fired
    pub timestamp: DateTime<Utc>,
}

/// The most recent fired transitions, oldest first.
///
/// # Example
///
/// ```rust
/// use wirestate::core::{StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let mut history = StateHistory::with_limit(2);
/// for (from, to) in [("idle", "busy"), ("busy", "idle"), ("idle", "busy")] {
///     history.record(StateTransition {
///         from: from.into(),
///         to: to.into(),
///         guard: "go".into(),
///         timestamp: Utc::now(),
///     });
/// }
///
/// assert_eq!(history.get_path(), vec!["busy", "idle", "busy"]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: VecDeque<StateTransition>,
    limit: usize,
}

impl StateHistory {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// History holding at most `limit` transitions. Zero records nothing.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: VecDeque::new(),
            limit,
        }
    }

    /// Append a transition, evicting the oldest when full.
    pub fn record(&mut self, transition: StateTransition) {
        if self.limit == 0 {
            return;
        }
        if self.transitions.len() == self.limit {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Change the bound, dropping the oldest entries that no longer fit.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        while self.transitions.len() > limit {
            self.transitions.pop_front();
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// States traversed within the window: the oldest source state, then
    /// every target.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(first.from.as_str());
        }
        for transition in &self.transitions {
            path.push(transition.to.as_str());
        }
        path
    }

    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition> {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&StateTransition> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fired(from: &str, to: &str, guard: &str) -> StateTransition {
        StateTransition {
            from: from.to_string(),
            to: to.to_string(),
            guard: guard.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = StateHistory::new();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert_eq!(history.limit(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn get_path_returns_state_sequence() {
        let mut history = StateHistory::new();
        history.record(fired("start", "middle", "a"));
        history.record(fired("middle", "end", "b|c"));

        assert_eq!(history.get_path(), vec!["start", "middle", "end"]);
        assert_eq!(history.last().map(|t| t.guard.as_str()), Some("b|c"));
    }

    #[test]
    fn full_history_evicts_oldest() {
        let mut history = StateHistory::with_limit(3);
        for i in 0..10 {
            history.record(fired(&format!("s{i}"), &format!("s{}", i + 1), "tick"));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.get_path(), vec!["s7", "s8", "s9", "s10"]);
    }

    #[test]
    fn zero_limit_records_nothing() {
        let mut history = StateHistory::with_limit(0);
        history.record(fired("a", "b", "go"));
        assert!(history.is_empty());
    }

    #[test]
    fn shrinking_limit_keeps_newest() {
        let mut history = StateHistory::new();
        history.record(fired("a", "b", "x"));
        history.record(fired("b", "c", "y"));
        history.set_limit(1);

        assert_eq!(history.get_path(), vec!["b", "c"]);
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = StateHistory::with_limit(4);
        history.record(fired("start", "end", "a&b"));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(history, deserialized);
    }
}
