//! Entities

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

use bitflags::bitflags;

use super::component::{Component, ComponentRegistry, MethodBinding};
use super::keyvalues::TypeKey;
use super::network::{NetworkHook, NetworkObject};
use super::runtime::{InvocationQueue, UpdateContext};

slotmap::new_key_type! {
    /// Handle to a live entity in a [`Scene`](super::Scene)
    pub struct EntityId;
}

bitflags! {
    /// Entity lifecycle flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntityFlags: u32 {
        /// The entity will be removed; no further initialization runs
        const PENDING_DESTRUCTION = 1 << 0;
        /// The entity has been activated in a running scene
        const ACTIVATED = 1 << 1;
    }
}

/// An entity: a class name and one instance of each of its component types
pub struct Entity {
    class_name: String,
    target_name: Option<String>,
    flags: EntityFlags,
    components: Vec<Box<dyn Component>>,
    initialized: HashSet<TypeId>,
    disabled: HashSet<TypeId>,
    started: HashSet<TypeId>,
    network: NetworkHook,
}

impl Entity {
    /// Create an entity with no components
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            target_name: None,
            flags: EntityFlags::empty(),
            components: Vec::new(),
            initialized: HashSet::new(),
            disabled: HashSet::new(),
            started: HashSet::new(),
            network: NetworkHook::default(),
        }
    }

    /// Class name the entity was created from
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Name other entities use to refer to this one
    pub fn target_name(&self) -> Option<&str> {
        self.target_name.as_deref()
    }

    /// Set the target name; an empty name clears it
    pub fn set_target_name(&mut self, name: &str) {
        self.target_name = (!name.is_empty()).then(|| name.to_string());
    }

    /// Lifecycle flags
    pub const fn flags(&self) -> EntityFlags {
        self.flags
    }

    /// Whether the entity is marked for destruction
    pub const fn is_pending_destruction(&self) -> bool {
        self.flags.contains(EntityFlags::PENDING_DESTRUCTION)
    }

    /// Mark the entity for destruction
    pub fn mark_for_destruction(&mut self) {
        self.flags.insert(EntityFlags::PENDING_DESTRUCTION);
    }

    /// Whether the entity has been activated
    pub const fn is_activated(&self) -> bool {
        self.flags.contains(EntityFlags::ACTIVATED)
    }

    /// Add a component instance
    ///
    /// An entity owns at most one component of each type; a second instance
    /// of the same type is dropped.
    pub fn add_component(&mut self, mut component: Box<dyn Component>) -> bool {
        let type_id = component.component_type_id();

        if self.components.iter().any(|existing| existing.component_type_id() == type_id) {
            log::warn!("{}: duplicate component ignored", self.class_name);
            return false;
        }

        if self.network.is_networked() {
            component.attach_network(self.network.clone());
        }

        self.components.push(component);
        true
    }

    /// Component of type `C`
    pub fn get<C: Component>(&self) -> Option<&C> {
        self.components.iter().find_map(|component| component.downcast_ref::<C>())
    }

    /// Mutable component of type `C`
    pub fn get_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.components.iter_mut().find_map(|component| component.downcast_mut::<C>())
    }

    /// Whether the entity has a component of type `C`
    pub fn has<C: Component>(&self) -> bool {
        self.get::<C>().is_some()
    }

    /// Whether the entity has a component of the given type
    pub fn has_type(&self, component_type: TypeKey) -> bool {
        self.components
            .iter()
            .any(|component| component.component_type_id() == component_type.id())
    }

    /// Number of components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Whether a component's initializer has run
    pub fn is_initialized(&self, component_type: TypeKey) -> bool {
        self.initialized.contains(&component_type.id())
    }

    /// Record that a component's initializer is about to run
    ///
    /// Returns `false` if it already ran.
    pub(crate) fn mark_initialized(&mut self, component_type: TypeKey) -> bool {
        self.initialized.insert(component_type.id())
    }

    /// A component together with the entity flags, for initialization
    pub(crate) fn component_and_flags_mut(
        &mut self,
        component_type: TypeKey,
    ) -> Option<(&mut dyn Component, &mut EntityFlags)> {
        let flags = &mut self.flags;

        self.components
            .iter_mut()
            .find(|component| component.component_type_id() == component_type.id())
            .map(move |component| (&mut **component, flags))
    }

    /// Attach or detach the replication hook
    ///
    /// Every component is told about the new hook.
    pub fn set_network_object(&mut self, object: Option<Arc<dyn NetworkObject>>) {
        self.network = NetworkHook::from(object);

        for component in &mut self.components {
            component.attach_network(self.network.clone());
        }
    }

    /// Whether the entity is networked
    pub const fn is_networked(&self) -> bool {
        self.network.is_networked()
    }

    /// Activate every component
    ///
    /// Entities pending destruction and already active entities are skipped.
    pub(crate) fn activate(&mut self) {
        if self.is_activated() || self.is_pending_destruction() {
            return;
        }

        for component in &mut self.components {
            component.activate();
        }

        self.flags.insert(EntityFlags::ACTIVATED);
    }

    /// Whether the entity has an enabled component of the given type
    ///
    /// Components start out enabled.
    pub fn is_enabled(&self, component_type: TypeKey) -> bool {
        self.has_type(component_type) && !self.disabled.contains(&component_type.id())
    }

    /// Enable or disable a component, running its hook if the state changed
    ///
    /// Returns `false` if the entity has no such component or it was already
    /// in the requested state.
    pub(crate) fn set_enabled(&mut self, component_type: TypeKey, enabled: bool) -> bool {
        let id = component_type.id();

        let Some(component) = self
            .components
            .iter_mut()
            .find(|component| component.component_type_id() == id)
        else {
            return false;
        };

        if enabled && self.disabled.remove(&id) {
            component.on_enable();
            true
        } else if !enabled && self.disabled.insert(id) {
            component.on_disable();
            true
        } else {
            false
        }
    }

    /// Tell every enabled component that the entity entered a scene
    pub(crate) fn enter_scene(&mut self) {
        let disabled = &self.disabled;

        for component in self
            .components
            .iter_mut()
            .filter(|component| !disabled.contains(&component.component_type_id()))
        {
            component.on_enable();
        }
    }

    /// Tell every enabled component that the entity left its scene
    pub(crate) fn leave_scene(&mut self) {
        let disabled = &self.disabled;

        for component in self
            .components
            .iter_mut()
            .filter(|component| !disabled.contains(&component.component_type_id()))
        {
            component.on_disable();
        }
    }

    /// Start and update every enabled component
    ///
    /// Stops early once the entity is marked for destruction.
    pub(crate) fn update_components(
        &mut self,
        id: EntityId,
        time: f32,
        registry: &ComponentRegistry,
        invocations: &mut InvocationQueue,
    ) {
        let Self {
            class_name,
            flags,
            components,
            disabled,
            started,
            ..
        } = self;

        for component in components.iter_mut() {
            if flags.contains(EntityFlags::PENDING_DESTRUCTION) {
                break;
            }

            let type_id = component.component_type_id();

            if disabled.contains(&type_id) {
                continue;
            }

            let Some(metadata) = registry.get_by_id(type_id) else {
                continue;
            };

            let mut context = UpdateContext::new(id, class_name.as_str(), metadata, time, flags, invocations);

            if started.insert(type_id) {
                component.start(&mut context);
            }

            component.update(&mut context);

            if context.disable_requested() {
                disabled.insert(type_id);
                component.on_disable();
                invocations.cancel(id, metadata.component_type());
            }
        }
    }

    /// Run a method of one of the entity's components
    ///
    /// Returns `false` if the entity has no such component.
    pub(crate) fn call_method(
        &mut self,
        id: EntityId,
        registry: &ComponentRegistry,
        component_type: TypeKey,
        method: &MethodBinding,
        time: f32,
        invocations: &mut InvocationQueue,
    ) -> bool {
        let Some(metadata) = registry.get(component_type) else {
            return false;
        };

        let Self {
            class_name,
            flags,
            components,
            disabled,
            ..
        } = self;

        let Some(component) = components
            .iter_mut()
            .find(|component| component.component_type_id() == component_type.id())
        else {
            return false;
        };

        let mut context = UpdateContext::new(id, class_name.as_str(), metadata, time, flags, invocations);
        method.call(&mut **component, &mut context);

        if context.disable_requested() && disabled.insert(component_type.id()) {
            component.on_disable();
            invocations.cancel(id, component_type);
        }

        true
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("class_name", &self.class_name)
            .field("target_name", &self.target_name)
            .field("flags", &self.flags)
            .field("components", &self.components.len())
            .finish()
    }
}
