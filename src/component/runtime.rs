//! The component arena and its signal/slot operations.
//!
//! Type descriptors and instances live in two arenas owned by [`Runtime`].
//! An instance reads its type's default slots and signals until the first
//! write, at which point it forks its own copy. Nothing written through an
//! instance ever reaches the shared descriptor.

use super::descriptor::{Binding, Capability, Instance, SignalTable, SlotFn, TypeDescriptor};
use super::error::ComponentError;
use serde_json::Value;
use slotmap::{new_key_type, SlotMap};
use std::any::Any;
use std::collections::HashMap;
use tracing::{debug, error, trace};

new_key_type! {
    /// Handle to a registered component type.
    pub struct TypeKey;
    /// Handle to a live component instance.
    pub struct ComponentId;
}

/// Owner of every component type and instance.
///
/// All dispatch is synchronous: [`emit`](Runtime::emit) and
/// [`invoke`](Runtime::invoke) run their callables to completion on the
/// caller's stack. Callables receive `&mut Runtime`, so a slot may itself
/// emit or invoke while an emission is in progress.
///
/// # Example
///
/// ```rust
/// use wirestate::component::{slot, Runtime};
/// use serde_json::json;
///
/// let mut rt = Runtime::new();
/// let sender = rt.define_type("Sender", &[], &["sent"]).unwrap();
/// let counter = rt.define_type("Counter", &["bump"], &[]).unwrap();
/// rt.add_type_slot(counter, "bump", Some(slot(|rt, id, _args| {
///     *rt.data_mut::<u32>(id)? += 1;
///     Ok(())
/// }))).unwrap();
///
/// let a = rt.spawn(sender).unwrap();
/// let b = rt.spawn_with(counter, 0u32).unwrap();
/// rt.connect(a, "sent", b, "bump").unwrap();
///
/// rt.emit(a, "sent", &[json!("hello")]).unwrap();
/// assert_eq!(*rt.data::<u32>(b).unwrap(), 1);
/// ```
pub struct Runtime {
    types: SlotMap<TypeKey, TypeDescriptor>,
    instances: SlotMap<ComponentId, Instance>,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            types: SlotMap::with_key(),
            instances: SlotMap::with_key(),
        }
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// Register a bare type. It has no slots or signals until
    /// [`declare_capability`](Runtime::declare_capability) is called.
    pub fn register_type(&mut self, name: &str) -> TypeKey {
        self.types.insert(TypeDescriptor::new(name))
    }

    /// Install the default slot names and signal names of a type.
    ///
    /// Replaces any previous declaration; declaring the same names again
    /// yields the same descriptor. Type-level callables are kept.
    pub fn declare_capability(
        &mut self,
        ty: TypeKey,
        slots: &[&str],
        signals: &[&str],
    ) -> Result<(), ComponentError> {
        let Some(descriptor) = self.types.get_mut(ty) else {
            error!(?ty, "declare_capability_unknown_type");
            return Err(ComponentError::UnknownType);
        };

        let mut capability = Capability::default();
        for name in slots {
            capability.add_slot(name);
        }
        for name in signals {
            capability.add_signal(name);
        }
        descriptor.capability = Some(capability);

        debug!(
            type_name = %descriptor.name,
            slots = slots.len(),
            signals = signals.len(),
            "capability_declared"
        );
        Ok(())
    }

    /// Register a type and declare its capability in one step.
    pub fn define_type(
        &mut self,
        name: &str,
        slots: &[&str],
        signals: &[&str],
    ) -> Result<TypeKey, ComponentError> {
        let ty = self.register_type(name);
        self.declare_capability(ty, slots, signals)?;
        Ok(ty)
    }

    /// True iff the type has both a slot set and a signal table.
    pub fn has_capability(&self, ty: TypeKey) -> bool {
        self.capability(ty).is_some()
    }

    pub fn type_name(&self, ty: TypeKey) -> Option<&str> {
        self.types.get(ty).map(|d| d.name.as_str())
    }

    /// Add a slot name to the shared descriptor, optionally binding its
    /// callable. Visible to every instance that has not forked its slots.
    pub fn add_type_slot(
        &mut self,
        ty: TypeKey,
        name: &str,
        callable: Option<SlotFn>,
    ) -> Result<(), ComponentError> {
        let descriptor = self.types.get_mut(ty).ok_or(ComponentError::UnknownType)?;
        descriptor.capability_mut()?.add_slot(name);
        if let Some(callable) = callable {
            descriptor.methods.insert(name.to_string(), callable);
        }
        Ok(())
    }

    /// Tag several names as type-level slots without binding callables.
    pub fn add_type_slots(&mut self, ty: TypeKey, names: &[&str]) -> Result<(), ComponentError> {
        for name in names {
            self.add_type_slot(ty, name, None)?;
        }
        Ok(())
    }

    /// Add a signal to the shared descriptor.
    pub fn add_type_signal(&mut self, ty: TypeKey, name: &str) -> Result<(), ComponentError> {
        let descriptor = self.types.get_mut(ty).ok_or(ComponentError::UnknownType)?;
        descriptor.capability_mut()?.add_signal(name);
        Ok(())
    }

    pub fn add_type_signals(&mut self, ty: TypeKey, names: &[&str]) -> Result<(), ComponentError> {
        for name in names {
            self.add_type_signal(ty, name)?;
        }
        Ok(())
    }

    /// Bind a type-level callable without listing it as a slot.
    ///
    /// Methods can be invoked and connected to by name but do not show up
    /// in [`slot_list`](Runtime::slot_list).
    pub fn define_method(
        &mut self,
        ty: TypeKey,
        name: &str,
        callable: SlotFn,
    ) -> Result<(), ComponentError> {
        let descriptor = self.types.get_mut(ty).ok_or(ComponentError::UnknownType)?;
        descriptor.methods.insert(name.to_string(), callable);
        Ok(())
    }

    pub fn type_slot_list(&self, ty: TypeKey) -> Result<Vec<String>, ComponentError> {
        Ok(self.declared_capability(ty)?.slots.clone())
    }

    pub fn type_signal_list(&self, ty: TypeKey) -> Result<Vec<String>, ComponentError> {
        Ok(self.declared_capability(ty)?.signals.iter().cloned().collect())
    }

    // ------------------------------------------------------------------
    // Instances
    // ------------------------------------------------------------------

    /// Create an instance of `ty` with no payload.
    pub fn spawn(&mut self, ty: TypeKey) -> Result<ComponentId, ComponentError> {
        self.insert_instance(ty, None)
    }

    /// Create an instance of `ty` carrying `data`.
    pub fn spawn_with<T: Any>(&mut self, ty: TypeKey, data: T) -> Result<ComponentId, ComponentError> {
        self.insert_instance(ty, Some(Box::new(data)))
    }

    fn insert_instance(
        &mut self,
        ty: TypeKey,
        data: Option<Box<dyn Any>>,
    ) -> Result<ComponentId, ComponentError> {
        if !self.types.contains_key(ty) {
            return Err(ComponentError::UnknownType);
        }
        let id = self.instances.insert(Instance {
            ty,
            slots: None,
            signals: None,
            methods: HashMap::new(),
            data,
        });
        trace!(?id, ?ty, "component_spawned");
        Ok(id)
    }

    /// Drop an instance. Bindings other components hold to it are left
    /// in place.
    pub fn despawn(&mut self, id: ComponentId) -> bool {
        self.instances.remove(id).is_some()
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.instances.contains_key(id)
    }

    pub fn type_of(&self, id: ComponentId) -> Option<TypeKey> {
        self.instances.get(id).map(|i| i.ty)
    }

    pub fn data<T: Any>(&self, id: ComponentId) -> Result<&T, ComponentError> {
        self.instance(id)?
            .data
            .as_deref()
            .and_then(|d| d.downcast_ref::<T>())
            .ok_or(ComponentError::DataMismatch)
    }

    pub fn data_mut<T: Any>(&mut self, id: ComponentId) -> Result<&mut T, ComponentError> {
        self.instances
            .get_mut(id)
            .ok_or(ComponentError::UnknownComponent)?
            .data
            .as_deref_mut()
            .and_then(|d| d.downcast_mut::<T>())
            .ok_or(ComponentError::DataMismatch)
    }

    /// Slot names of an instance: its own list once forked, otherwise the
    /// type's.
    pub fn slot_list(&self, id: ComponentId) -> Result<Vec<String>, ComponentError> {
        let instance = self.instance(id)?;
        match &instance.slots {
            Some(slots) => Ok(slots.clone()),
            None => Ok(self
                .capability(instance.ty)
                .ok_or(ComponentError::NotAComponent)?
                .slots
                .clone()),
        }
    }

    pub fn signal_list(&self, id: ComponentId) -> Result<Vec<String>, ComponentError> {
        let instance = self.instance(id)?;
        match &instance.signals {
            Some(table) => Ok(table.keys().cloned().collect()),
            None => Ok(self
                .capability(instance.ty)
                .ok_or(ComponentError::NotAComponent)?
                .signals
                .iter()
                .cloned()
                .collect()),
        }
    }

    /// Whether the instance has both slots and signals, own or inherited.
    pub fn is_component(&self, id: ComponentId) -> bool {
        self.slot_list(id).is_ok() && self.signal_list(id).is_ok()
    }

    /// Whether the instance has detached its slots or signals from its type.
    pub fn is_forked(&self, id: ComponentId) -> bool {
        self.instances.get(id).is_some_and(Instance::is_forked)
    }

    /// Add or rebind a slot owned by this instance only.
    ///
    /// The first call forks the instance's slot list from its type; later
    /// type-level slots are no longer seen by this instance.
    pub fn add_instance_slot(
        &mut self,
        id: ComponentId,
        name: &str,
        callable: SlotFn,
    ) -> Result<(), ComponentError> {
        let Runtime { types, instances } = self;
        let instance = instances.get_mut(id).ok_or(ComponentError::UnknownComponent)?;

        if instance.slots.is_none() {
            let defaults = types
                .get(instance.ty)
                .and_then(|d| d.capability.as_ref())
                .ok_or(ComponentError::NotAComponent)?
                .slots
                .clone();
            instance.slots = Some(defaults);
        }

        let slots = instance.slots.get_or_insert_with(Vec::new);
        if !slots.iter().any(|s| s == name) {
            slots.push(name.to_string());
        }
        instance.methods.insert(name.to_string(), callable);
        Ok(())
    }

    /// Add a signal owned by this instance only, with no subscribers.
    ///
    /// Re-adding an existing signal resets its subscriber list.
    pub fn add_instance_signal(&mut self, id: ComponentId, name: &str) -> Result<(), ComponentError> {
        let Runtime { types, instances } = self;
        let instance = instances.get_mut(id).ok_or(ComponentError::UnknownComponent)?;
        own_signals(types, instance)?.insert(name.to_string(), Vec::new());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Wiring and dispatch
    // ------------------------------------------------------------------

    /// Subscribe `destination`'s `slot_name` to `source`'s `signal`.
    ///
    /// The callable is resolved now and stored; rebinding the slot later
    /// does not affect this connection. Connecting the same pair twice
    /// yields two independent subscriptions.
    pub fn connect(
        &mut self,
        source: ComponentId,
        signal: &str,
        destination: ComponentId,
        slot_name: &str,
    ) -> Result<(), ComponentError> {
        if !self.has_signal(source, signal)? {
            return Err(ComponentError::UndefinedSignal(signal.to_string()));
        }
        if !self.instances.contains_key(destination) {
            return Err(ComponentError::UnknownComponent);
        }
        let callable = self
            .resolve(destination, slot_name)
            .ok_or_else(|| ComponentError::UndefinedSlot(slot_name.to_string()))?;

        let Runtime { types, instances } = self;
        let instance = instances
            .get_mut(source)
            .ok_or(ComponentError::UnknownComponent)?;
        own_signals(types, instance)?
            .entry(signal.to_string())
            .or_default()
            .push(Binding {
                target: destination,
                slot: callable,
            });

        debug!(?source, signal, ?destination, slot = slot_name, "signal_connected");
        Ok(())
    }

    /// Remove every subscription of `destination` whose stored callable is
    /// the one `slot_name` resolves to right now. Returns how many were
    /// removed.
    ///
    /// If the slot was rebound since connecting, nothing matches.
    pub fn disconnect(
        &mut self,
        source: ComponentId,
        signal: &str,
        destination: ComponentId,
        slot_name: &str,
    ) -> Result<usize, ComponentError> {
        if !self.has_signal(source, signal)? {
            return Err(ComponentError::UndefinedSignal(signal.to_string()));
        }
        let Some(current) = self.resolve(destination, slot_name) else {
            return Ok(0);
        };

        let instance = self
            .instances
            .get_mut(source)
            .ok_or(ComponentError::UnknownComponent)?;
        let Some(bindings) = instance.signals.as_mut().and_then(|t| t.get_mut(signal)) else {
            return Ok(0);
        };

        let before = bindings.len();
        bindings.retain(|b| !b.matches(destination, &current));
        let removed = before - bindings.len();

        debug!(?source, signal, ?destination, slot = slot_name, removed, "signal_disconnected");
        Ok(removed)
    }

    /// Call every subscriber of `signal`, in connection order, with `args`.
    ///
    /// Subscribers are snapshotted before dispatch. The first failing
    /// callable stops the emission and its error is returned; later
    /// subscribers are not called. Emitting an undeclared signal does
    /// nothing.
    pub fn emit(
        &mut self,
        source: ComponentId,
        signal: &str,
        args: &[Value],
    ) -> Result<(), ComponentError> {
        let instance = self.instance(source)?;
        let bindings: Vec<Binding> = match &instance.signals {
            Some(table) => table.get(signal).cloned().unwrap_or_default(),
            None if self.capability(instance.ty).is_some() => Vec::new(),
            None => return Err(ComponentError::NotAComponent),
        };

        trace!(?source, signal, subscribers = bindings.len(), "signal_emit");
        for binding in bindings {
            (binding.slot)(self, binding.target, args)?;
        }
        Ok(())
    }

    /// Call a slot directly, bypassing signals.
    pub fn invoke(
        &mut self,
        destination: ComponentId,
        slot_name: &str,
        args: &[Value],
    ) -> Result<(), ComponentError> {
        if !self.instances.contains_key(destination) {
            return Err(ComponentError::UnknownComponent);
        }
        let callable = self
            .resolve(destination, slot_name)
            .ok_or_else(|| ComponentError::UndefinedSlot(slot_name.to_string()))?;
        callable(self, destination, args)
    }

    /// Number of subscriptions currently attached to `source`'s `signal`.
    pub fn subscriber_count(&self, source: ComponentId, signal: &str) -> Result<usize, ComponentError> {
        if !self.has_signal(source, signal)? {
            return Err(ComponentError::UndefinedSignal(signal.to_string()));
        }
        Ok(self
            .instance(source)?
            .signals
            .as_ref()
            .and_then(|t| t.get(signal))
            .map_or(0, Vec::len))
    }

    // ------------------------------------------------------------------
    // Lookup helpers
    // ------------------------------------------------------------------

    fn instance(&self, id: ComponentId) -> Result<&Instance, ComponentError> {
        self.instances.get(id).ok_or(ComponentError::UnknownComponent)
    }

    fn capability(&self, ty: TypeKey) -> Option<&Capability> {
        self.types.get(ty).and_then(|d| d.capability.as_ref())
    }

    fn declared_capability(&self, ty: TypeKey) -> Result<&Capability, ComponentError> {
        let descriptor = self.types.get(ty).ok_or(ComponentError::UnknownType)?;
        descriptor
            .capability
            .as_ref()
            .ok_or_else(|| ComponentError::MissingCapability(descriptor.name.clone()))
    }

    fn has_signal(&self, id: ComponentId, signal: &str) -> Result<bool, ComponentError> {
        let instance = self.instance(id)?;
        match &instance.signals {
            Some(table) => Ok(table.contains_key(signal)),
            None => self
                .capability(instance.ty)
                .map(|c| c.signals.contains(signal))
                .ok_or(ComponentError::NotAComponent),
        }
    }

    /// Callable bound under `name`: the instance's own, else its type's.
    fn resolve(&self, id: ComponentId, name: &str) -> Option<SlotFn> {
        let instance = self.instances.get(id)?;
        instance
            .methods
            .get(name)
            .or_else(|| self.types.get(instance.ty)?.methods.get(name))
            .cloned()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// The instance's own signal table, forking it from the type on first use.
/// A fork starts every declared signal with an empty subscriber list.
fn own_signals<'a>(
    types: &SlotMap<TypeKey, TypeDescriptor>,
    instance: &'a mut Instance,
) -> Result<&'a mut SignalTable, ComponentError> {
    if instance.signals.is_none() {
        let table = types
            .get(instance.ty)
            .and_then(|d| d.capability.as_ref())
            .ok_or(ComponentError::NotAComponent)?
            .empty_signal_table();
        instance.signals = Some(table);
    }
    Ok(instance.signals.get_or_insert_with(SignalTable::new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::slot;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Calls = Vec<Vec<Value>>;

    /// Type with a `trigger` slot that records its arguments.
    fn recorder_type(rt: &mut Runtime) -> TypeKey {
        let ty = rt.define_type("Recorder", &["trigger"], &[]).unwrap();
        rt.add_type_slot(
            ty,
            "trigger",
            Some(slot(|rt, id, args| {
                rt.data_mut::<Calls>(id)?.push(args.to_vec());
                Ok(())
            })),
        )
        .unwrap();
        ty
    }

    fn emitter_type(rt: &mut Runtime) -> TypeKey {
        rt.define_type("Emitter", &[], &["fired", "other"]).unwrap()
    }

    fn calls(rt: &Runtime, id: ComponentId) -> usize {
        rt.data::<Calls>(id).unwrap().len()
    }

    #[test]
    fn declare_capability_installs_defaults() {
        let mut rt = Runtime::new();
        let ty = rt.register_type("Widget");
        assert!(!rt.has_capability(ty));

        rt.declare_capability(ty, &["a", "b"], &["changed"]).unwrap();

        assert!(rt.has_capability(ty));
        assert_eq!(rt.type_slot_list(ty).unwrap(), vec!["a", "b"]);
        assert_eq!(rt.type_signal_list(ty).unwrap(), vec!["changed"]);
    }

    #[test]
    fn declare_capability_is_idempotent() {
        let mut rt = Runtime::new();
        let ty = rt.define_type("Widget", &["a", "a"], &["s"]).unwrap();
        rt.declare_capability(ty, &["a"], &["s", "s"]).unwrap();

        assert_eq!(rt.type_slot_list(ty).unwrap(), vec!["a"]);
        assert_eq!(rt.type_signal_list(ty).unwrap(), vec!["s"]);
    }

    #[test]
    fn declare_capability_rejects_unknown_type() {
        let mut rt = Runtime::new();
        let result = rt.declare_capability(TypeKey::default(), &["a"], &[]);

        assert_eq!(result, Err(ComponentError::UnknownType));
    }

    #[test]
    fn instance_slot_does_not_leak_to_type_or_siblings() {
        let mut rt = Runtime::new();
        let ty = recorder_type(&mut rt);
        let a = rt.spawn_with(ty, Calls::new()).unwrap();
        let b = rt.spawn_with(ty, Calls::new()).unwrap();

        rt.add_instance_slot(a, "local", slot(|_, _, _| Ok(()))).unwrap();

        assert_eq!(rt.slot_list(a).unwrap(), vec!["trigger", "local"]);
        assert_eq!(rt.slot_list(b).unwrap(), vec!["trigger"]);
        assert_eq!(rt.type_slot_list(ty).unwrap(), vec!["trigger"]);
        assert!(rt.is_forked(a));
        assert!(!rt.is_forked(b));
    }

    #[test]
    fn instance_slot_rebinds_without_duplicating_name() {
        let mut rt = Runtime::new();
        let ty = recorder_type(&mut rt);
        let a = rt.spawn_with(ty, 0u32).unwrap();

        rt.add_instance_slot(a, "go", slot(|rt, id, _| {
            *rt.data_mut::<u32>(id)? += 1;
            Ok(())
        }))
        .unwrap();
        rt.add_instance_slot(a, "go", slot(|rt, id, _| {
            *rt.data_mut::<u32>(id)? += 10;
            Ok(())
        }))
        .unwrap();
        rt.invoke(a, "go", &[]).unwrap();

        assert_eq!(rt.slot_list(a).unwrap(), vec!["trigger", "go"]);
        assert_eq!(*rt.data::<u32>(a).unwrap(), 10);
    }

    #[test]
    fn instance_signal_does_not_leak_to_type() {
        let mut rt = Runtime::new();
        let ty = emitter_type(&mut rt);
        let a = rt.spawn(ty).unwrap();
        let b = rt.spawn(ty).unwrap();

        rt.add_instance_signal(a, "mine").unwrap();

        assert_eq!(rt.signal_list(a).unwrap(), vec!["fired", "other", "mine"]);
        assert_eq!(rt.signal_list(b).unwrap(), vec!["fired", "other"]);
        assert_eq!(rt.type_signal_list(ty).unwrap(), vec!["fired", "other"]);
    }

    #[test]
    fn forked_instances_stop_seeing_type_additions() {
        let mut rt = Runtime::new();
        let ty = emitter_type(&mut rt);
        let forked = rt.spawn(ty).unwrap();
        let shared = rt.spawn(ty).unwrap();
        rt.add_instance_signal(forked, "mine").unwrap();

        rt.add_type_signal(ty, "late").unwrap();
        rt.add_type_slots(ty, &["late_slot"]).unwrap();

        assert!(rt.signal_list(shared).unwrap().contains(&"late".to_string()));
        assert!(!rt.signal_list(forked).unwrap().contains(&"late".to_string()));
        assert_eq!(rt.slot_list(forked).unwrap(), vec!["late_slot"]);
    }

    #[test]
    fn type_level_additions_require_capability() {
        let mut rt = Runtime::new();
        let bare = rt.register_type("Bare");

        assert_eq!(
            rt.add_type_signal(bare, "s"),
            Err(ComponentError::MissingCapability("Bare".into()))
        );
    }

    #[test]
    fn emit_reaches_connected_slot_once_with_arguments() {
        let mut rt = Runtime::new();
        let emitter = emitter_type(&mut rt);
        let recorder = recorder_type(&mut rt);
        let a = rt.spawn(emitter).unwrap();
        let sibling = rt.spawn(emitter).unwrap();
        let b = rt.spawn_with(recorder, Calls::new()).unwrap();
        let c = rt.spawn_with(recorder, Calls::new()).unwrap();

        rt.connect(a, "fired", b, "trigger").unwrap();
        rt.connect(sibling, "fired", c, "trigger").unwrap();
        rt.emit(a, "fired", &[json!(1), json!("two")]).unwrap();

        assert_eq!(rt.data::<Calls>(b).unwrap(), &vec![vec![json!(1), json!("two")]]);
        assert_eq!(calls(&rt, c), 0);
    }

    #[test]
    fn connect_forks_source_signals_only() {
        let mut rt = Runtime::new();
        let emitter = emitter_type(&mut rt);
        let recorder = recorder_type(&mut rt);
        let a = rt.spawn(emitter).unwrap();
        let untouched = rt.spawn(emitter).unwrap();
        let b = rt.spawn_with(recorder, Calls::new()).unwrap();

        rt.connect(a, "fired", b, "trigger").unwrap();

        assert!(rt.is_forked(a));
        assert!(!rt.is_forked(untouched));
        assert!(!rt.is_forked(b));
        assert_eq!(rt.subscriber_count(a, "fired").unwrap(), 1);
        assert_eq!(rt.subscriber_count(untouched, "fired").unwrap(), 0);
    }

    #[test]
    fn duplicate_connections_fire_twice() {
        let mut rt = Runtime::new();
        let emitter = emitter_type(&mut rt);
        let recorder = recorder_type(&mut rt);
        let a = rt.spawn(emitter).unwrap();
        let b = rt.spawn_with(recorder, Calls::new()).unwrap();

        rt.connect(a, "fired", b, "trigger").unwrap();
        rt.connect(a, "fired", b, "trigger").unwrap();
        rt.emit(a, "fired", &[]).unwrap();

        assert_eq!(calls(&rt, b), 2);
    }

    #[test]
    fn connect_validates_source_signal_and_slot() {
        let mut rt = Runtime::new();
        let emitter = emitter_type(&mut rt);
        let recorder = recorder_type(&mut rt);
        let bare = rt.register_type("Bare");
        let a = rt.spawn(emitter).unwrap();
        let b = rt.spawn_with(recorder, Calls::new()).unwrap();
        let plain = rt.spawn(bare).unwrap();

        assert_eq!(
            rt.connect(plain, "fired", b, "trigger"),
            Err(ComponentError::NotAComponent)
        );
        assert_eq!(
            rt.connect(a, "missing", b, "trigger"),
            Err(ComponentError::UndefinedSignal("missing".into()))
        );
        assert_eq!(
            rt.connect(a, "fired", b, "nope"),
            Err(ComponentError::UndefinedSlot("nope".into()))
        );
        assert_eq!(
            ComponentError::UndefinedSlot("nope".into()).to_string(),
            "Slot is not defined: \"nope\""
        );
    }

    #[test]
    fn disconnect_removes_matching_bindings() {
        let mut rt = Runtime::new();
        let emitter = emitter_type(&mut rt);
        let recorder = recorder_type(&mut rt);
        let a = rt.spawn(emitter).unwrap();
        let b = rt.spawn_with(recorder, Calls::new()).unwrap();
        let c = rt.spawn_with(recorder, Calls::new()).unwrap();

        rt.connect(a, "fired", b, "trigger").unwrap();
        rt.connect(a, "fired", b, "trigger").unwrap();
        rt.connect(a, "fired", c, "trigger").unwrap();

        assert_eq!(rt.disconnect(a, "fired", b, "trigger").unwrap(), 2);
        rt.emit(a, "fired", &[]).unwrap();

        assert_eq!(calls(&rt, b), 0);
        assert_eq!(calls(&rt, c), 1);
    }

    #[test]
    fn disconnect_misses_rebound_slot() {
        let mut rt = Runtime::new();
        let emitter = emitter_type(&mut rt);
        let recorder = recorder_type(&mut rt);
        let a = rt.spawn(emitter).unwrap();
        let b = rt.spawn_with(recorder, Calls::new()).unwrap();

        rt.connect(a, "fired", b, "trigger").unwrap();
        rt.add_instance_slot(b, "trigger", slot(|_, _, _| Ok(()))).unwrap();

        assert_eq!(rt.disconnect(a, "fired", b, "trigger").unwrap(), 0);
        rt.emit(a, "fired", &[]).unwrap();
        assert_eq!(calls(&rt, b), 1);
    }

    #[test]
    fn failing_subscriber_stops_the_emission() {
        let mut rt = Runtime::new();
        let emitter = emitter_type(&mut rt);
        let recorder = recorder_type(&mut rt);
        let failing = rt.define_type("Failing", &["boom"], &[]).unwrap();
        rt.add_type_slot(
            failing,
            "boom",
            Some(slot(|_, _, _| Err(ComponentError::HandlerFailed("boom".into())))),
        )
        .unwrap();

        let a = rt.spawn(emitter).unwrap();
        let before = rt.spawn_with(recorder, Calls::new()).unwrap();
        let bomb = rt.spawn(failing).unwrap();
        let after = rt.spawn_with(recorder, Calls::new()).unwrap();
        rt.connect(a, "fired", before, "trigger").unwrap();
        rt.connect(a, "fired", bomb, "boom").unwrap();
        rt.connect(a, "fired", after, "trigger").unwrap();

        let result = rt.emit(a, "fired", &[]);

        assert_eq!(result, Err(ComponentError::HandlerFailed("boom".into())));
        assert_eq!(calls(&rt, before), 1);
        assert_eq!(calls(&rt, after), 0);
    }

    #[test]
    fn emit_on_undeclared_signal_is_a_noop() {
        let mut rt = Runtime::new();
        let emitter = emitter_type(&mut rt);
        let a = rt.spawn(emitter).unwrap();

        assert!(rt.emit(a, "nothing", &[]).is_ok());
    }

    #[test]
    fn emit_requires_a_component() {
        let mut rt = Runtime::new();
        let bare = rt.register_type("Bare");
        let plain = rt.spawn(bare).unwrap();

        assert_eq!(rt.emit(plain, "x", &[]), Err(ComponentError::NotAComponent));
        assert!(!rt.is_component(plain));
    }

    #[test]
    fn slots_may_emit_while_being_emitted_to() {
        let mut rt = Runtime::new();
        let relay = rt.define_type("Relay", &["forward"], &["out"]).unwrap();
        rt.add_type_slot(
            relay,
            "forward",
            Some(slot(|rt, id, args| rt.emit(id, "out", args))),
        )
        .unwrap();
        let emitter = emitter_type(&mut rt);
        let recorder = recorder_type(&mut rt);

        let source = rt.spawn(emitter).unwrap();
        let middle = rt.spawn(relay).unwrap();
        let sink = rt.spawn_with(recorder, Calls::new()).unwrap();
        rt.connect(source, "fired", middle, "forward").unwrap();
        rt.connect(middle, "out", sink, "trigger").unwrap();

        rt.emit(source, "fired", &[json!("x")]).unwrap();

        assert_eq!(rt.data::<Calls>(sink).unwrap(), &vec![vec![json!("x")]]);
    }

    #[test]
    fn invoke_calls_slot_directly() {
        let mut rt = Runtime::new();
        let recorder = recorder_type(&mut rt);
        let b = rt.spawn_with(recorder, Calls::new()).unwrap();

        rt.invoke(b, "trigger", &[json!(true)]).unwrap();

        assert_eq!(calls(&rt, b), 1);
        assert_eq!(
            rt.invoke(b, "absent", &[]),
            Err(ComponentError::UndefinedSlot("absent".into()))
        );
    }

    #[test]
    fn methods_are_callable_but_not_listed() {
        let mut rt = Runtime::new();
        let ty = rt.define_type("Worker", &["work"], &["done"]).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        rt.define_method(
            ty,
            "reset",
            slot(move |_, _, args| {
                sink.borrow_mut().extend(args.iter().cloned());
                Ok(())
            }),
        )
        .unwrap();
        let w = rt.spawn(ty).unwrap();

        rt.invoke(w, "reset", &[json!(3)]).unwrap();

        assert_eq!(*seen.borrow(), vec![json!(3)]);
        assert_eq!(rt.slot_list(w).unwrap(), vec!["work"]);
    }

    #[test]
    fn data_access_checks_payload_type() {
        let mut rt = Runtime::new();
        let ty = rt.define_type("Holder", &[], &[]).unwrap();
        let h = rt.spawn_with(ty, 5u8).unwrap();
        let empty = rt.spawn(ty).unwrap();

        assert_eq!(*rt.data::<u8>(h).unwrap(), 5);
        assert_eq!(rt.data::<String>(h), Err(ComponentError::DataMismatch));
        assert_eq!(rt.data::<u8>(empty), Err(ComponentError::DataMismatch));

        assert!(rt.despawn(h));
        assert_eq!(rt.data::<u8>(h), Err(ComponentError::UnknownComponent));
    }
}
