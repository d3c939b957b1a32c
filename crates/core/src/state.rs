//! Dynamic bindable properties and the per-request state store.
//!
//! There is no runtime reflection here: a component *declares* its
//! bindable slots by returning them, in order, from
//! [`Component::properties`](crate::node::Component::properties). The
//! engine resolves each slot at a deterministic [`ElementId`] before the
//! component's body is evaluated, and all reads/writes go through the
//! context; a slot never holds a back-reference.

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::warn;

use crate::context::BlocksContext;
use crate::element_id::ElementId;
use crate::environment::EnvironmentKey;
use crate::error::RenderError;

/// Anything storable in a local-state slot.
pub trait ComponentValue: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> ComponentValue for T {}

/// ElementId-keyed storage for component-local state. Lives on the
/// context; persists across the traversals of one logical turn and, when
/// explicitly carried over, into the response render.
#[derive(Clone, Default)]
pub struct StateStore {
    entries: HashMap<ElementId, Arc<dyn Any + Send + Sync>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: ComponentValue>(&self, id: &ElementId) -> Option<T> {
        self.entries.get(id).and_then(|entry| entry.downcast_ref::<T>()).cloned()
    }

    pub fn set<T: ComponentValue>(&mut self, id: ElementId, value: T) {
        self.entries.insert(id, Arc::new(value));
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").field("entries", &self.entries.len()).finish()
    }
}

/// One bindable slot of a component, resolved once per traversal at its
/// declaration-order ElementId.
pub trait DynamicProperty {
    fn update(&mut self, id: ElementId, ctx: &mut BlocksContext) -> Result<(), RenderError>;
}

/// A component-local state slot. Seeds its initial value into the store on
/// first resolution so later writes (form values, handlers) merge rather
/// than reset.
#[derive(Clone, Debug)]
pub struct State<T: ComponentValue> {
    initial: T,
    value: T,
    slot: Option<ElementId>,
}

impl<T: ComponentValue> State<T> {
    pub fn new(initial: T) -> Self {
        Self { initial: initial.clone(), value: initial, slot: None }
    }

    /// The slot's value as of this traversal's resolution.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Writes through to the store and the local copy. Must only be called
    /// after resolution (i.e. from a handler or body).
    pub fn set(&mut self, ctx: &mut BlocksContext, value: T) {
        match &self.slot {
            Some(slot) => ctx.set_state(slot.clone(), value.clone()),
            None => warn!("State::set before the slot was resolved; value not persisted"),
        }
        self.value = value;
    }

    /// A context-addressed handle on this slot, safe to move into action
    /// handler closures.
    pub fn binding(&self) -> Binding<T> {
        if self.slot.is_none() {
            warn!("binding taken from an unresolved State slot");
        }
        Binding { slot: self.slot.clone(), _value: PhantomData }
    }
}

impl<T: ComponentValue + Default> Default for State<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ComponentValue> DynamicProperty for State<T> {
    fn update(&mut self, id: ElementId, ctx: &mut BlocksContext) -> Result<(), RenderError> {
        match ctx.state_value::<T>(&id) {
            Some(value) => self.value = value,
            None => {
                self.value = self.initial.clone();
                ctx.set_state(id.clone(), self.initial.clone());
            }
        }
        self.slot = Some(id);
        Ok(())
    }
}

/// Read/write access to a state slot by its ElementId. All traffic goes
/// through the context; the binding itself is just an address.
pub struct Binding<T> {
    slot: Option<ElementId>,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self { slot: self.slot.clone(), _value: PhantomData }
    }
}

impl<T> std::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding").field("slot", &self.slot).finish()
    }
}

impl<T: ComponentValue> Binding<T> {
    /// An address-less binding; reads resolve to `None` and writes warn.
    /// Useful for controls rendered without application state.
    pub fn detached() -> Self {
        Self { slot: None, _value: PhantomData }
    }

    pub fn is_detached(&self) -> bool {
        self.slot.is_none()
    }

    pub fn resolve(&self, ctx: &BlocksContext) -> Option<T> {
        self.slot.as_ref().and_then(|slot| ctx.state_value::<T>(slot))
    }

    pub fn write(&self, ctx: &mut BlocksContext, value: T) {
        match &self.slot {
            Some(slot) => ctx.set_state(slot.clone(), value),
            None => warn!("write through a detached binding dropped"),
        }
    }
}

/// Reads a typed environment value at resolution time.
pub struct EnvironmentRead<K: EnvironmentKey> {
    value: K::Value,
}

impl<K: EnvironmentKey> Clone for EnvironmentRead<K> {
    fn clone(&self) -> Self {
        Self { value: self.value.clone() }
    }
}

impl<K: EnvironmentKey> std::fmt::Debug for EnvironmentRead<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentRead").field("key", &std::any::type_name::<K>()).finish()
    }
}

impl<K: EnvironmentKey> EnvironmentRead<K> {
    pub fn new() -> Self {
        Self { value: K::default_value() }
    }

    pub fn value(&self) -> &K::Value {
        &self.value
    }
}

impl<K: EnvironmentKey> Default for EnvironmentRead<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EnvironmentKey> DynamicProperty for EnvironmentRead<K> {
    fn update(&mut self, _id: ElementId, ctx: &mut BlocksContext) -> Result<(), RenderError> {
        self.value = ctx.environment().get::<K>();
        Ok(())
    }
}

/// A string slot persisted in the surrounding view's private metadata.
/// Round-trips automatically: resolution prefers the inbound metadata
/// value and re-registers it for the outgoing view.
#[derive(Clone, Debug)]
pub struct MetaData {
    key: String,
    value: String,
}

impl MetaData {
    pub fn new(key: impl Into<String>, initial: impl Into<String>) -> Self {
        Self { key: key.into(), value: initial.into() }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set(&mut self, ctx: &mut BlocksContext, value: impl Into<String>) {
        self.value = value.into();
        ctx.set_metadata(&self.key, &self.value);
    }
}

impl DynamicProperty for MetaData {
    fn update(&mut self, _id: ElementId, ctx: &mut BlocksContext) -> Result<(), RenderError> {
        if let Some(inbound) = ctx.incoming_metadata(&self.key) {
            self.value = inbound;
        }
        ctx.set_metadata(&self.key, &self.value);
        Ok(())
    }
}
