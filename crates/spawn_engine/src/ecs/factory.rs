//! Entity factories
//!
//! A factory names the component types an entity class is made of and
//! initializes them in the order they depend on each other. Factories are
//! registered per class name in an [`EntityDictionary`].

use std::collections::HashMap;

use super::component::Component;
use super::creator::EntityCreator;
use super::entity::Entity;
use super::keyvalues::{KeyValues, TypeKey};
use super::MetaDataError;

/// Unordered set of component types, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentTypeSet {
    types: Vec<TypeKey>,
}

impl ComponentTypeSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add component type `C`
    pub fn add<C: Component>(&mut self) -> &mut Self {
        self.add_type(TypeKey::of::<C>())
    }

    /// Add a component type
    pub fn add_type(&mut self, component_type: TypeKey) -> &mut Self {
        if !self.types.contains(&component_type) {
            self.types.push(component_type);
        }
        self
    }

    /// Whether the set contains the type
    pub fn contains(&self, component_type: TypeKey) -> bool {
        self.types.contains(&component_type)
    }

    /// Iterate over the types
    pub fn iter(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.types.iter().copied()
    }

    /// Number of types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Creates entities of one or more classes
pub trait EntityFactory: Send + Sync {
    /// Add the component types the entity needs
    ///
    /// Called once, at registration.
    fn component_types(&self, types: &mut ComponentTypeSet);

    /// Initialize the entity's components
    ///
    /// Return `false` as soon as a component fails; the entity is then discarded.
    fn initialize(&self, creator: &mut EntityCreator<'_>, entity: &mut Entity, key_values: &KeyValues) -> bool;
}

/// Factory initializing a fixed list of components in order
///
/// Put components others depend on first (usually [`Transform`](super::components::Transform)).
#[derive(Debug, Clone, Default)]
pub struct ComponentListFactory {
    components: Vec<TypeKey>,
}

impl ComponentListFactory {
    /// Create a factory with no components
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: append component `C`
    pub fn with<C: Component>(mut self) -> Self {
        let component_type = TypeKey::of::<C>();
        if !self.components.contains(&component_type) {
            self.components.push(component_type);
        }
        self
    }
}

impl EntityFactory for ComponentListFactory {
    fn component_types(&self, types: &mut ComponentTypeSet) {
        for component_type in &self.components {
            types.add_type(*component_type);
        }
    }

    fn initialize(&self, creator: &mut EntityCreator<'_>, entity: &mut Entity, key_values: &KeyValues) -> bool {
        for component_type in &self.components {
            if !creator.initialize_component_by_type(entity, *component_type, key_values) {
                return false;
            }

            if entity.is_pending_destruction() {
                break;
            }
        }

        true
    }
}

/// A registered factory and its cached component types
pub struct FactoryEntry {
    factory: Box<dyn EntityFactory>,
    component_types: ComponentTypeSet,
}

impl FactoryEntry {
    /// The factory
    pub fn factory(&self) -> &dyn EntityFactory {
        self.factory.as_ref()
    }

    /// Component types the factory requires
    pub const fn component_types(&self) -> &ComponentTypeSet {
        &self.component_types
    }
}

/// Factories by entity class name
pub struct EntityDictionary {
    factories: HashMap<String, FactoryEntry>,
}

impl EntityDictionary {
    /// Factory for a class
    pub fn get(&self, class_name: &str) -> Option<&FactoryEntry> {
        self.factories.get(class_name)
    }

    /// Whether a class has a factory
    pub fn contains(&self, class_name: &str) -> bool {
        self.factories.contains_key(class_name)
    }

    /// Registered class names
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Iterate over class names and factories
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FactoryEntry)> {
        self.factories.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no classes are registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Builder for [`EntityDictionary`]
#[derive(Default)]
pub struct EntityDictionaryBuilder {
    factories: HashMap<String, FactoryEntry>,
    invalid_names: Vec<String>,
}

impl EntityDictionaryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a class name
    ///
    /// The first factory registered for a name is kept.
    pub fn add(&mut self, class_name: &str, factory: Box<dyn EntityFactory>) -> &mut Self {
        if class_name.trim().is_empty() {
            self.invalid_names.push(class_name.to_string());
            return self;
        }

        if self.factories.contains_key(class_name) {
            log::warn!("Entity class \"{}\" already has a factory; ignoring the new one", class_name);
            return self;
        }

        let mut component_types = ComponentTypeSet::new();
        factory.component_types(&mut component_types);

        self.factories.insert(
            class_name.to_string(),
            FactoryEntry {
                factory,
                component_types,
            },
        );
        self
    }

    /// Build the dictionary
    pub fn build(self) -> Result<EntityDictionary, MetaDataError> {
        if let Some(name) = self.invalid_names.into_iter().next() {
            return Err(MetaDataError::InvalidClassName(name));
        }

        Ok(EntityDictionary {
            factories: self.factories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct First;
    impl Component for First {}

    #[derive(Default)]
    struct Second;
    impl Component for Second {}

    #[test]
    fn test_type_set_deduplicates() {
        let mut types = ComponentTypeSet::new();
        types.add::<First>().add::<Second>().add::<First>();

        assert_eq!(types.len(), 2);
        assert!(types.contains(TypeKey::of::<Second>()));
    }

    #[test]
    fn test_component_types_are_cached_at_registration() {
        let mut builder = EntityDictionaryBuilder::new();
        builder.add("thing", Box::new(ComponentListFactory::new().with::<First>().with::<Second>()));
        let dictionary = builder.build().unwrap();

        let entry = dictionary.get("thing").unwrap();
        assert_eq!(
            entry.component_types().iter().collect::<Vec<_>>(),
            vec![TypeKey::of::<First>(), TypeKey::of::<Second>()]
        );
        assert!(dictionary.get("other").is_none());
    }

    #[test]
    fn test_first_factory_wins() {
        let mut builder = EntityDictionaryBuilder::new();
        builder
            .add("thing", Box::new(ComponentListFactory::new().with::<First>()))
            .add("thing", Box::new(ComponentListFactory::new().with::<Second>()));
        let dictionary = builder.build().unwrap();

        assert_eq!(dictionary.len(), 1);
        assert!(dictionary.get("thing").unwrap().component_types().contains(TypeKey::of::<First>()));
    }

    #[test]
    fn test_empty_class_name_is_rejected() {
        let mut builder = EntityDictionaryBuilder::new();
        builder.add(" ", Box::new(ComponentListFactory::new()));

        assert!(matches!(builder.build(), Err(MetaDataError::InvalidClassName(_))));
    }
}
