//! Token latches and the evaluation trees compiled from guard expressions.
//!
//! A [`LatchTable`] records which tokens have been delivered since the
//! owning state was entered. A [`TransitionNetwork`] is the compiled form of
//! one guard, evaluated against that table after every delivery.

use super::guard::{GuardExpr, Link};
use indexmap::IndexMap;

/// Per-state record of delivered tokens.
///
/// Every token mentioned by a guard of the active state has an entry,
/// `false` until the token is first delivered. Latches are sticky: once set
/// they stay set until the table is cleared on the next state entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatchTable {
    latches: IndexMap<String, bool>,
}

impl LatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `token` known, unset. Existing latches keep their value.
    pub fn register(&mut self, token: &str) {
        if !self.latches.contains_key(token) {
            self.latches.insert(token.to_string(), false);
        }
    }

    /// Latch `token`. Returns `false` (and changes nothing) when the token
    /// is not known to this table.
    pub fn set(&mut self, token: &str) -> bool {
        match self.latches.get_mut(token) {
            Some(latch) => {
                *latch = true;
                true
            }
            None => false,
        }
    }

    /// Current value of a latch; unknown tokens read as unset.
    pub fn get(&self, token: &str) -> bool {
        self.latches.get(token).copied().unwrap_or(false)
    }

    pub fn is_known(&self, token: &str) -> bool {
        self.latches.contains_key(token)
    }

    /// Known tokens in registration order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.latches.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.latches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latches.is_empty()
    }

    /// Forget every token.
    pub fn clear(&mut self) {
        self.latches.clear();
    }
}

/// Evaluation tree for one guard expression.
///
/// # Example
///
/// ```rust
/// use wirestate::core::{parse_guard, LatchTable, TransitionNetwork};
///
/// let mut latches = LatchTable::new();
/// let network = TransitionNetwork::build(&parse_guard("a&b").unwrap(), &mut latches);
///
/// latches.set("a");
/// assert!(!network.eval(&latches));
/// latches.set("b");
/// assert!(network.eval(&latches));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionNetwork {
    Leaf(String),
    And(Box<TransitionNetwork>, Box<TransitionNetwork>),
    Or(Box<TransitionNetwork>, Box<TransitionNetwork>),
}

impl TransitionNetwork {
    /// Compile `expr`, registering each of its tokens in `latches`.
    ///
    /// Chains compile to a left-nested tree, so `a&b|c` becomes
    /// `Or(And(a, b), c)`.
    pub fn build(expr: &GuardExpr, latches: &mut LatchTable) -> Self {
        match expr {
            GuardExpr::Token(name) => {
                latches.register(name);
                Self::Leaf(name.clone())
            }
            GuardExpr::Chain { first, links } => {
                let mut network = Self::build(first, latches);
                for link in links {
                    network = match link {
                        Link::And(next) => {
                            Self::And(Box::new(network), Box::new(Self::build(next, latches)))
                        }
                        Link::Or(next) => {
                            Self::Or(Box::new(network), Box::new(Self::build(next, latches)))
                        }
                    };
                }
                network
            }
        }
    }

    /// Evaluate against the current latches. Pure.
    pub fn eval(&self, latches: &LatchTable) -> bool {
        match self {
            Self::Leaf(token) => latches.get(token),
            Self::And(left, right) => left.eval(latches) && right.eval(latches),
            Self::Or(left, right) => left.eval(latches) || right.eval(latches),
        }
    }
}
