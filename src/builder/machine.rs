//! Fluent builder for machine descriptions.

use crate::builder::error::BuildError;
use crate::core::parse_guard;
use crate::machine::{MachineDescription, TransitionTable};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Builder for [`MachineDescription`] with a fluent API.
///
/// # Example
///
/// ```rust
/// use wirestate::builder::MachineBuilder;
///
/// let desc = MachineBuilder::new()
///     .initial("red")
///     .final_state("off")
///     .transition("red", "timer", "green")
///     .transition("green", "timer", "red")
///     .transition("red", "stop|fault", "off")
///     .build()
///     .unwrap();
///
/// assert_eq!(desc.transitions["red"]["timer"], "green");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MachineBuilder {
    initial: Option<String>,
    final_state: Option<String>,
    transitions: TransitionTable,
}

impl MachineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = Some(state.into());
        self
    }

    pub fn final_state(mut self, state: impl Into<String>) -> Self {
        self.final_state = Some(state.into());
        self
    }

    /// Add `from --guard--> to`. A repeated `(from, guard)` pair replaces
    /// the earlier target.
    pub fn transition(
        mut self,
        from: impl Into<String>,
        guard: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.transitions
            .entry(from.into())
            .or_default()
            .insert(guard.into(), to.into());
        self
    }

    /// Add every `(guard, to)` pair leaving `from`, in order.
    pub fn state<I, G, T>(mut self, from: impl Into<String>, guards: I) -> Self
    where
        I: IntoIterator<Item = (G, T)>,
        G: Into<String>,
        T: Into<String>,
    {
        let entry = self.transitions.entry(from.into()).or_default();
        for (guard, to) in guards {
            entry.insert(guard.into(), to.into());
        }
        self
    }

    /// Merge a whole table. Existing states keep their position.
    pub fn transitions(mut self, table: TransitionTable) -> Self {
        for (from, guards) in table {
            self.transitions.entry(from).or_default().extend(guards);
        }
        self
    }

    /// Check everything `build` checks, reporting every problem at once.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<BuildError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<BuildError>>> = Vec::new();

        if self.initial.is_none() {
            checks.push(Validation::fail(BuildError::MissingInitialState));
        }
        if self.transition_count() == 0 {
            checks.push(Validation::fail(BuildError::NoTransitions));
        }
        for (from, guards) in &self.transitions {
            for guard in guards.keys() {
                let check = match parse_guard(guard) {
                    Ok(_) => Validation::success(()),
                    Err(source) => Validation::fail(BuildError::MalformedGuard {
                        from: from.clone(),
                        source,
                    }),
                };
                checks.push(check);
            }
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// Build the description.
    /// Returns the first problem found; see [`validate`](Self::validate)
    /// for all of them.
    pub fn build(self) -> Result<MachineDescription, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        if self.transitions.values().all(|guards| guards.is_empty()) {
            return Err(BuildError::NoTransitions);
        }

        for (from, guards) in &self.transitions {
            for guard in guards.keys() {
                parse_guard(guard).map_err(|source| BuildError::MalformedGuard {
                    from: from.clone(),
                    source,
                })?;
            }
        }

        Ok(MachineDescription {
            initial: Some(initial),
            final_state: self.final_state,
            transitions: self.transitions,
        })
    }

    fn transition_count(&self) -> usize {
        self.transitions.values().map(|guards| guards.len()).sum()
    }
}
