//! Type descriptors and instance records stored in the runtime arenas.

use super::error::ComponentError;
use super::runtime::{ComponentId, Runtime, TypeKey};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A callable slot entry point.
///
/// The `ComponentId` is the target the callable is bound to; the runtime is
/// handed in so the slot can reach its own data, emit, or invoke others.
pub type SlotFn = Rc<dyn Fn(&mut Runtime, ComponentId, &[Value]) -> Result<(), ComponentError>>;

/// Wrap a closure as a [`SlotFn`].
///
/// # Example
///
/// ```rust
/// use wirestate::component::{slot, SlotFn};
///
/// let noop: SlotFn = slot(|_rt, _id, _args| Ok(()));
/// ```
pub fn slot<F>(f: F) -> SlotFn
where
    F: Fn(&mut Runtime, ComponentId, &[Value]) -> Result<(), ComponentError> + 'static,
{
    Rc::new(f)
}

/// One subscriber of a signal: the destination and the callable resolved
/// from its slot name when the connection was made.
#[derive(Clone)]
pub struct Binding {
    pub target: ComponentId,
    pub(crate) slot: SlotFn,
}

impl Binding {
    /// Whether this binding targets `target` through exactly `callable`.
    pub(crate) fn matches(&self, target: ComponentId, callable: &SlotFn) -> bool {
        self.target == target && Rc::ptr_eq(&self.slot, callable)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Signal name to ordered subscriber list.
pub type SignalTable = IndexMap<String, Vec<Binding>>;

/// Default slot names and signal names shared by every unforked instance.
#[derive(Debug, Clone, Default)]
pub(crate) struct Capability {
    pub(crate) slots: Vec<String>,
    pub(crate) signals: IndexSet<String>,
}

impl Capability {
    pub(crate) fn add_slot(&mut self, name: &str) {
        if !self.slots.iter().any(|s| s == name) {
            self.slots.push(name.to_string());
        }
    }

    pub(crate) fn add_signal(&mut self, name: &str) {
        self.signals.insert(name.to_string());
    }

    /// Fresh signal table: every declared signal with no subscribers.
    pub(crate) fn empty_signal_table(&self) -> SignalTable {
        self.signals
            .iter()
            .map(|name| (name.clone(), Vec::new()))
            .collect()
    }
}

pub(crate) struct TypeDescriptor {
    pub(crate) name: String,
    pub(crate) capability: Option<Capability>,
    pub(crate) methods: HashMap<String, SlotFn>,
}

impl TypeDescriptor {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            capability: None,
            methods: HashMap::new(),
        }
    }

    pub(crate) fn capability_mut(&mut self) -> Result<&mut Capability, ComponentError> {
        match self.capability.as_mut() {
            Some(capability) => Ok(capability),
            None => Err(ComponentError::MissingCapability(self.name.clone())),
        }
    }
}

/// A live component. `slots` and `signals` stay `None` until the instance
/// forks them away from its type.
pub(crate) struct Instance {
    pub(crate) ty: TypeKey,
    pub(crate) slots: Option<Vec<String>>,
    pub(crate) signals: Option<SignalTable>,
    pub(crate) methods: HashMap<String, SlotFn>,
    pub(crate) data: Option<Box<dyn Any>>,
}

impl Instance {
    pub(crate) fn is_forked(&self) -> bool {
        self.slots.is_some() || self.signals.is_some()
    }
}
