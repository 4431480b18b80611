//! Entity creation
//!
//! [`EntityCreator`] builds a detached [`Entity`]: it instantiates the
//! components the factory asks for, lets the factory initialize them and
//! returns the entity only if every step succeeded. Nothing is registered
//! anywhere until the caller inserts the result into a scene.

use std::collections::HashSet;

use super::component::{Component, InitContext};
use super::entity::Entity;
use super::keyvalues::{parse_int, KeyValues, TypeKey};
use super::metadata::EntitySystemMetaData;
use super::EntityError;
use crate::assets::ModelManager;

/// Keyvalue holding the entity's spawn flags
pub const SPAWNFLAGS_KEY: &str = "spawnflags";

/// Keyvalue holding the entity's target name
pub const TARGETNAME_KEY: &str = "targetname";

/// Initializes components from keyvalues
pub struct EntityCreator<'a> {
    metadata: &'a EntitySystemMetaData,
    models: &'a mut ModelManager,
}

impl<'a> EntityCreator<'a> {
    /// Create a creator using the given metadata and models
    pub fn new(metadata: &'a EntitySystemMetaData, models: &'a mut ModelManager) -> Self {
        Self { metadata, models }
    }

    /// Entity system metadata
    pub const fn metadata(&self) -> &'a EntitySystemMetaData {
        self.metadata
    }

    /// Initialize the entity's component of type `C`
    pub fn initialize_component<C: Component>(&mut self, entity: &mut Entity, key_values: &KeyValues) -> bool {
        self.initialize_component_by_type(entity, TypeKey::of::<C>(), key_values)
    }

    /// Initialize one of the entity's components
    ///
    /// Assigns every keyvalue the component declares, applies spawn flags,
    /// checks required keyvalues and finally runs the component's own
    /// initializer. Each component is initialized at most once per entity,
    /// and not at all once the entity is pending destruction. Every
    /// `spawnflags` pair contributes its bits.
    pub fn initialize_component_by_type(
        &mut self,
        entity: &mut Entity,
        component_type: TypeKey,
        key_values: &KeyValues,
    ) -> bool {
        let metadata = self.metadata;

        if entity.is_pending_destruction() {
            log::debug!(
                "{}: skipping component {}, entity is pending destruction",
                entity.class_name(),
                component_type.name()
            );
            return false;
        }

        let Some(component_metadata) = metadata.components().get(component_type) else {
            log::error!(
                "{}: component {} is not registered",
                entity.class_name(),
                component_type.name()
            );
            return false;
        };

        if !entity.has_type(component_type) {
            log::error!("{}: entity has no component {}", entity.class_name(), component_type.name());
            return false;
        }

        if !entity.mark_initialized(component_type) {
            log::error!(
                "{}: component {} is already initialized",
                entity.class_name(),
                component_type.name()
            );
            return false;
        }

        let class_name = entity.class_name().to_string();

        let Some((component, flags)) = entity.component_and_flags_mut(component_type) else {
            return false;
        };

        let mut assigned = HashSet::new();

        for (key, value) in key_values.iter() {
            let Some(field) = component_metadata.field(key) else {
                continue;
            };

            let converted = match metadata.converters().convert(field.value_type(), key, value) {
                Ok(converted) => converted,
                Err(error) => {
                    log::error!("{}: {}", class_name, error);
                    return false;
                }
            };

            if !field.assign(component, converted) {
                log::error!(
                    "{}: couldn't assign keyvalue \"{}\" to component {}",
                    class_name,
                    key,
                    component_type.name()
                );
                return false;
            }

            assigned.insert(field.key());
        }

        if !component_metadata.spawn_flags().is_empty() {
            let spawn_flags = key_values
                .iter()
                .filter(|(key, _)| *key == SPAWNFLAGS_KEY)
                .fold(0, |flags, (_, value)| {
                    flags | u32::try_from(parse_int(value).max(0)).unwrap_or(u32::MAX)
                });

            for binding in component_metadata.spawn_flags() {
                if spawn_flags & binding.mask() != 0 {
                    binding.set(component);
                }
            }
        }

        if let Some(missing) = component_metadata.required_keys().find(|key| !assigned.contains(key)) {
            log::warn!(
                "{}: missing required keyvalue \"{}\" for component {}",
                class_name,
                missing,
                component_type.name()
            );
            return false;
        }

        let mut context = InitContext::new(key_values, &class_name, self.models, flags, &assigned);
        component.initialize(&mut context)
    }

    /// Create a detached entity of the given class
    ///
    /// The entity is returned only if the factory initialized every component
    /// and the entity did not request its own destruction.
    pub fn create_entity(&mut self, class_name: &str, key_values: &KeyValues) -> Result<Entity, EntityError> {
        let metadata = self.metadata;

        let entry = metadata
            .factory(class_name)
            .ok_or_else(|| EntityError::UnknownClass(class_name.to_string()))?;

        let mut entity = Entity::new(class_name);

        for component_type in entry.component_types().iter() {
            let Some(component_metadata) = metadata.components().get(component_type) else {
                log::error!("{}: component {} is not registered", class_name, component_type.name());
                return Err(EntityError::InitializationFailed(class_name.to_string()));
            };
            entity.add_component(component_metadata.create());
        }

        if let Some(target_name) = key_values.get(TARGETNAME_KEY) {
            entity.set_target_name(target_name);
        }

        if !entry.factory().initialize(self, &mut entity, key_values) {
            return Err(EntityError::InitializationFailed(class_name.to_string()));
        }

        if entity.is_pending_destruction() {
            return Err(EntityError::DestroyedDuringInitialization(class_name.to_string()));
        }

        Ok(entity)
    }
}
