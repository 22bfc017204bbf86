//! Pure token-driven state machine.
//!
//! No signals are emitted here. Operations that enter a state return a
//! [`StateEntry`] and the component shell decides what to announce.

use super::description::{MachineDescription, TransitionTable};
use super::error::MachineError;
use crate::core::{
    parse_guard, scan_tokens, GuardExpr, GuardParseError, LatchTable, StateHistory,
    StateTransition, TransitionNetwork,
};
use chrono::Utc;
use indexmap::{IndexMap, IndexSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::{debug, trace, warn};

/// Outcome of entering a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub state: String,
    /// The entered state is the final state.
    pub terminal: bool,
}

#[derive(Debug, Clone)]
struct GuardedTransition {
    expr: GuardExpr,
    target: String,
}

/// Finite state machine whose transitions fire when boolean combinations
/// of tokens become true.
///
/// Tokens latch: once delivered they stay true until the next state entry.
/// Every entry resets all latches and rebuilds one network per outgoing
/// guard; the first guard (in declaration order) that evaluates true on a
/// delivery fires.
///
/// # Example
///
/// ```rust
/// use wirestate::machine::StateMachine;
///
/// let mut machine = StateMachine::new();
/// machine.set_initial_state("start");
/// machine.set_final_state("end");
/// machine.add_transition("start", "a&b", "end").unwrap();
/// machine.start().unwrap();
///
/// assert!(machine.deliver_token("a").is_none());
/// let entry = machine.deliver_token("b").unwrap();
/// assert_eq!(entry.state, "end");
/// assert!(entry.terminal);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    initial: Option<String>,
    final_state: Option<String>,
    current: Option<String>,
    transitions: IndexMap<String, IndexMap<String, GuardedTransition>>,
    tokens: IndexSet<String>,
    latches: LatchTable,
    active: IndexMap<String, TransitionNetwork>,
    rejected: Vec<GuardParseError>,
    history: StateHistory,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a machine from a description. Malformed guards are skipped
    /// and remain visible through [`rejected_guards`](Self::rejected_guards).
    pub fn from_description(desc: &MachineDescription) -> Self {
        let mut machine = Self::new();
        if let Some(initial) = &desc.initial {
            machine.set_initial_state(initial);
        }
        if let Some(final_state) = &desc.final_state {
            machine.set_final_state(final_state);
        }
        if let Validation::Failure(errors) = machine.set_transitions(&desc.transitions) {
            debug!(rejected = errors.len(), "description_guards_rejected");
        }
        machine
    }

    /// Set the initial state. The current state follows it until `start`.
    pub fn set_initial_state(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.current = Some(name.clone());
        self.initial = Some(name);
    }

    pub fn set_final_state(&mut self, name: impl Into<String>) {
        self.final_state = Some(name.into());
    }

    /// Register `from --guard--> to`.
    ///
    /// A guard that does not parse is logged, recorded and returned as an
    /// error; the machine is left unchanged. Registering the same guard
    /// text twice for a state replaces the target and keeps its position.
    pub fn add_transition(&mut self, from: &str, guard: &str, to: &str) -> Result<(), GuardParseError> {
        let expr = match parse_guard(guard) {
            Ok(expr) => expr,
            Err(err) => {
                warn!(from, guard, to, offset = err.offset, "transition_guard_rejected");
                self.rejected.push(err.clone());
                return Err(err);
            }
        };

        for token in expr.tokens().into_iter().chain(scan_tokens(guard)) {
            self.tokens.insert(token);
        }
        self.transitions.entry(from.to_string()).or_default().insert(
            guard.to_string(),
            GuardedTransition {
                expr,
                target: to.to_string(),
            },
        );

        debug!(from, guard, to, "transition_added");
        Ok(())
    }

    /// Register every transition of `table`, accumulating all guard errors.
    ///
    /// Well-formed transitions are kept even when others fail.
    pub fn set_transitions(
        &mut self,
        table: &TransitionTable,
    ) -> Validation<(), NonEmptyVec<GuardParseError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<GuardParseError>>> = Vec::new();

        for (from, guards) in table {
            for (guard, to) in guards {
                let check = match self.add_transition(from, guard, to) {
                    Ok(()) => Validation::success(()),
                    Err(err) => Validation::fail(err),
                };
                checks.push(check);
            }
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// Enter the initial state.
    pub fn start(&mut self) -> Result<StateEntry, MachineError> {
        let initial = self.initial.clone().ok_or(MachineError::MissingInitialState)?;
        Ok(self.enter(&initial))
    }

    /// Latch `token` and fire the first active guard that became true.
    ///
    /// Returns the entered state, or `None` if nothing fired. Unknown
    /// tokens are ignored.
    pub fn deliver_token(&mut self, token: &str) -> Option<StateEntry> {
        if !self.latches.set(token) {
            trace!(token, state = ?self.current, "token_ignored");
            return None;
        }

        let fired = self
            .active
            .iter()
            .find(|(_, network)| network.eval(&self.latches))
            .map(|(guard, _)| guard.clone())?;

        let from = self.current.clone().unwrap_or_default();
        let target = self
            .transitions
            .get(&from)
            .and_then(|guards| guards.get(&fired))
            .map(|transition| transition.target.clone())?;

        self.active.clear();
        self.history.record(StateTransition {
            from,
            to: target.clone(),
            guard: fired,
            timestamp: Utc::now(),
        });

        Some(self.enter(&target))
    }

    fn enter(&mut self, state: &str) -> StateEntry {
        self.latches.clear();
        self.active.clear();

        if let Some(guards) = self.transitions.get(state) {
            for (guard, transition) in guards {
                let network = TransitionNetwork::build(&transition.expr, &mut self.latches);
                // Backstop for tokens the AST missed; normally a no-op.
                for token in scan_tokens(guard) {
                    self.latches.register(&token);
                }
                self.active.insert(guard.clone(), network);
            }
        }

        self.current = Some(state.to_string());
        let terminal = self.final_state.as_deref() == Some(state);

        debug!(state, guards = self.active.len(), terminal, "state_entered");
        StateEntry {
            state: state.to_string(),
            terminal,
        }
    }

    pub fn current_state(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn initial_state(&self) -> Option<&str> {
        self.initial.as_deref()
    }

    pub fn final_state(&self) -> Option<&str> {
        self.final_state.as_deref()
    }

    /// The machine sits in its final state.
    pub fn is_terminated(&self) -> bool {
        self.final_state.is_some() && self.current == self.final_state
    }

    /// Every token named by any registered guard, first use first.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// `(guard, target)` pairs leaving `state`, in declaration order.
    pub fn guards_for(&self, state: &str) -> Vec<(&str, &str)> {
        self.transitions
            .get(state)
            .map(|guards| {
                guards
                    .iter()
                    .map(|(guard, t)| (guard.as_str(), t.target.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn latches(&self) -> &LatchTable {
        &self.latches
    }

    /// Guards currently armed, in declaration order.
    pub fn active_guards(&self) -> Vec<&str> {
        self.active.keys().map(String::as_str).collect()
    }

    pub fn rejected_guards(&self) -> &[GuardParseError] {
        &self.rejected
    }

    /// Recent fired transitions, bounded by
    /// [`set_history_limit`](Self::set_history_limit).
    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Bound the transition history. Zero turns recording off.
    pub fn set_history_limit(&mut self, limit: usize) {
        self.history.set_limit(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DEFAULT_HISTORY_LIMIT;

    fn started(initial: &str, table: &[(&str, &str, &str)]) -> StateMachine {
        let mut machine = StateMachine::new();
        machine.set_initial_state(initial);
        for (from, guard, to) in table {
            machine.add_transition(from, guard, to).unwrap();
        }
        machine.start().unwrap();
        machine
    }

    #[test]
    fn start_requires_initial_state() {
        let mut machine = StateMachine::new();
        assert_eq!(machine.start(), Err(MachineError::MissingInitialState));
    }

    #[test]
    fn set_initial_state_moves_current() {
        let mut machine = StateMachine::new();
        machine.set_initial_state("idle");
        assert_eq!(machine.current_state(), Some("idle"));
        assert!(machine.active_guards().is_empty());
    }

    #[test]
    fn single_token_fires() {
        let mut machine = started("start", &[("start", "next", "end")]);

        let entry = machine.deliver_token("next").unwrap();

        assert_eq!(entry.state, "end");
        assert!(!entry.terminal);
        assert_eq!(machine.current_state(), Some("end"));
    }

    #[test]
    fn and_guard_waits_for_both_tokens() {
        let mut machine = started("start", &[("start", "a&b", "end")]);

        assert!(machine.deliver_token("a").is_none());
        assert_eq!(machine.current_state(), Some("start"));
        assert_eq!(machine.deliver_token("b").unwrap().state, "end");
    }

    #[test]
    fn or_guard_fires_on_either_token() {
        let mut machine = started("start", &[("start", "a|b", "end")]);
        assert_eq!(machine.deliver_token("b").unwrap().state, "end");
    }

    #[test]
    fn latches_reset_on_self_loop() {
        let mut machine = started("s", &[("s", "a&b", "s"), ("s", "c", "t")]);

        machine.deliver_token("a");
        assert_eq!(machine.deliver_token("b").unwrap().state, "s");

        assert!(machine.deliver_token("a").is_none());
        assert!(machine.latches().get("a"));
        assert!(!machine.latches().get("b"));
    }

    #[test]
    fn first_declared_guard_wins() {
        let mut machine = started("start", &[("start", "b", "x"), ("start", "a|b", "y")]);
        assert_eq!(machine.deliver_token("b").unwrap().state, "x");
    }

    #[test]
    fn repeated_token_does_not_refire_in_new_state() {
        let mut machine = started("s", &[("s", "go", "t"), ("t", "go&stop", "u")]);

        machine.deliver_token("go");
        assert_eq!(machine.current_state(), Some("t"));
        assert!(!machine.latches().get("go"));
    }

    #[test]
    fn unknown_token_is_ignored() {
        let mut machine = started("start", &[("start", "next", "end")]);

        assert!(machine.deliver_token("bogus").is_none());
        assert!(!machine.latches().is_known("bogus"));
        assert_eq!(machine.current_state(), Some("start"));
    }

    #[test]
    fn tokens_before_start_do_nothing() {
        let mut machine = StateMachine::new();
        machine.set_initial_state("start");
        machine.add_transition("start", "next", "end").unwrap();

        assert!(machine.deliver_token("next").is_none());
    }

    #[test]
    fn final_state_is_terminal() {
        let mut machine = StateMachine::new();
        machine.set_initial_state("start");
        machine.set_final_state("end");
        machine.add_transition("start", "next", "end").unwrap();
        machine.start().unwrap();

        assert!(machine.deliver_token("next").unwrap().terminal);
        assert!(machine.is_terminated());
    }

    #[test]
    fn initial_equal_to_final_is_terminal_on_start() {
        let mut machine = StateMachine::new();
        machine.set_initial_state("done");
        machine.set_final_state("done");

        assert!(machine.start().unwrap().terminal);
    }

    #[test]
    fn malformed_guard_is_rejected_and_recorded() {
        let mut machine = StateMachine::new();
        machine.set_initial_state("start");

        let err = machine.add_transition("start", "a&", "end").unwrap_err();

        assert_eq!(err.guard, "a&");
        assert_eq!(machine.rejected_guards(), &[err]);
        assert!(machine.guards_for("start").is_empty());
        assert_eq!(machine.tokens().count(), 0);
    }

    #[test]
    fn set_transitions_accumulates_every_failure() {
        let table: TransitionTable = [(
            "start".to_string(),
            [
                ("a&".to_string(), "x".to_string()),
                ("ok".to_string(), "y".to_string()),
                ("|b".to_string(), "z".to_string()),
            ]
            .into_iter()
            .collect(),
        )]
        .into_iter()
        .collect();

        let mut machine = StateMachine::new();
        match machine.set_transitions(&table) {
            Validation::Failure(errors) => assert_eq!(errors.len(), 2),
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
        assert_eq!(machine.guards_for("start"), vec![("ok", "y")]);
    }

    #[test]
    fn tokens_keep_first_use_order() {
        let mut machine = StateMachine::new();
        machine.add_transition("s", "b|a", "t").unwrap();
        machine.add_transition("t", "a&c", "s").unwrap();

        assert_eq!(machine.tokens().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn history_records_fired_guards() {
        let mut machine = started("s", &[("s", "go", "t"), ("t", "back", "s")]);

        machine.deliver_token("go");
        machine.deliver_token("back");

        assert_eq!(machine.history().get_path(), vec!["s", "t", "s"]);
        assert_eq!(machine.history().transitions().next().unwrap().guard, "go");
    }

    #[test]
    fn self_loop_history_stays_bounded() {
        let mut machine = started("s", &[("s", "tick", "s")]);
        machine.set_history_limit(8);

        for _ in 0..10_000 {
            assert!(machine.deliver_token("tick").is_some());
        }

        assert_eq!(machine.history().len(), 8);
        assert_eq!(machine.history().get_path().len(), 9);
        assert_eq!(machine.current_state(), Some("s"));
    }

    #[test]
    fn default_history_limit_applies() {
        let mut machine = started("s", &[("s", "tick", "s")]);

        for _ in 0..(DEFAULT_HISTORY_LIMIT + 50) {
            machine.deliver_token("tick");
        }

        assert_eq!(machine.history().len(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn from_description_keeps_good_transitions() {
        let desc = MachineDescription::from_json(
            r#"{"initial": "s", "final": "t",
                "transitions": {"s": {"a&": "x", "go": "t"}}}"#,
        )
        .unwrap();

        let mut machine = StateMachine::from_description(&desc);

        assert_eq!(machine.rejected_guards().len(), 1);
        machine.start().unwrap();
        assert!(machine.deliver_token("go").unwrap().terminal);
    }
}
