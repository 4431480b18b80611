//! Entity system metadata
//!
//! Converters, component descriptions and factories are registered on an
//! [`EntitySystemMetaDataBuilder`] at startup and combined into an immutable
//! [`EntitySystemMetaData`] that scenes share.

use std::any::Any;

use super::component::{Component, ComponentRegistry, ComponentRegistryBuilder};
use super::components;
use super::factory::{EntityDictionary, EntityDictionaryBuilder, EntityFactory, FactoryEntry};
use super::keyvalues::{KeyValueConverter, KeyValueConverters, KeyValueConvertersBuilder, KeyValueEnum};
use super::MetaDataError;

/// Immutable registries used to create entities
pub struct EntitySystemMetaData {
    converters: KeyValueConverters,
    components: ComponentRegistry,
    factories: EntityDictionary,
}

impl EntitySystemMetaData {
    /// Keyvalue converters
    pub const fn converters(&self) -> &KeyValueConverters {
        &self.converters
    }

    /// Component registry
    pub const fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Factories by class name
    pub const fn factories(&self) -> &EntityDictionary {
        &self.factories
    }

    /// Factory for a class
    pub fn factory(&self, class_name: &str) -> Option<&FactoryEntry> {
        self.factories.get(class_name)
    }
}

/// Builder for [`EntitySystemMetaData`]
pub struct EntitySystemMetaDataBuilder {
    converters: KeyValueConvertersBuilder,
    components: ComponentRegistryBuilder,
    factories: EntityDictionaryBuilder,
}

impl EntitySystemMetaDataBuilder {
    /// Create a builder with the built-in converters and nothing else
    pub fn new() -> Self {
        Self {
            converters: KeyValueConvertersBuilder::new(),
            components: ComponentRegistryBuilder::new(),
            factories: EntityDictionaryBuilder::new(),
        }
    }

    /// Register the built-in enums, components and entity classes
    pub fn with_builtins(self) -> Result<Self, MetaDataError> {
        components::register_builtins(self)
    }

    /// Register a converter for `T`, replacing any earlier one
    pub fn with_converter<T: Any>(mut self, converter: impl KeyValueConverter + 'static) -> Self {
        self.converters.add::<T>(converter);
        self
    }

    /// Register an enum keyvalue type
    pub fn with_enum<E: KeyValueEnum>(mut self) -> Result<Self, MetaDataError> {
        self.converters.add_enum::<E>()?;
        Ok(self)
    }

    /// Register a component type
    pub fn with_component<C: Component + Default>(mut self) -> Self {
        self.components.add::<C>();
        self
    }

    /// Register a factory for an entity class
    pub fn with_factory(mut self, class_name: &str, factory: impl EntityFactory + 'static) -> Self {
        self.factories.add(class_name, Box::new(factory));
        self
    }

    /// Validate and build the metadata
    ///
    /// Fails if a component field has no converter, a component declares a
    /// keyvalue twice, or a factory requires an unregistered component.
    pub fn build(self) -> Result<EntitySystemMetaData, MetaDataError> {
        let converters = self.converters.build();
        let components = self.components.build(&converters)?;
        let factories = self.factories.build()?;

        for (class_name, entry) in factories.iter() {
            if let Some(missing) = entry
                .component_types()
                .iter()
                .find(|component_type| !components.contains(*component_type))
            {
                return Err(MetaDataError::UnregisteredComponent {
                    class_name: class_name.to_string(),
                    component: missing.name(),
                });
            }
        }

        log::info!(
            "Entity system ready: {} converters, {} components, {} entity classes",
            converters.len(),
            components.len(),
            factories.len()
        );

        Ok(EntitySystemMetaData {
            converters,
            components,
            factories,
        })
    }
}

impl Default for EntitySystemMetaDataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Collider, Renderable, Transform};
    use crate::ecs::factory::ComponentListFactory;
    use crate::ecs::keyvalues::{KeyValueError, TypeKey};
    use crate::key_value_enum;

    key_value_enum! {
        enum Nothing {}
    }

    #[test]
    fn test_builtins() {
        let metadata = EntitySystemMetaDataBuilder::new().with_builtins().unwrap().build().unwrap();

        for class_name in ["info_target", "env_sprite", "func_wall", "worldspawn"] {
            assert!(metadata.factories().contains(class_name), "{class_name}");
        }
        assert!(metadata.components().contains(TypeKey::of::<Transform>()));
        assert!(metadata.components().contains(TypeKey::of::<Renderable>()));
        assert!(metadata.components().contains(TypeKey::of::<Collider>()));
    }

    #[test]
    fn test_factory_with_unregistered_component() {
        let result = EntitySystemMetaDataBuilder::new()
            .with_component::<Transform>()
            .with_factory("thing", ComponentListFactory::new().with::<Transform>().with::<Collider>())
            .build();

        assert!(matches!(
            result,
            Err(MetaDataError::UnregisteredComponent { class_name, .. }) if class_name == "thing"
        ));
    }

    #[test]
    fn test_component_enum_without_converter() {
        // Collider's solid type is an enum that was never registered
        let result = EntitySystemMetaDataBuilder::new().with_component::<Collider>().build();

        assert!(matches!(result, Err(MetaDataError::NoConverter { key, .. }) if key == "solid"));
    }

    #[test]
    fn test_empty_enum() {
        let result = EntitySystemMetaDataBuilder::new().with_enum::<Nothing>();

        assert!(matches!(
            result,
            Err(MetaDataError::KeyValue(KeyValueError::EmptyEnum(_)))
        ));
    }
}
