//! Components and their keyvalue descriptions
//!
//! A component declares which keyvalues it reads in [`Component::describe`].
//! Each declaration binds a key to a typed setter; the type selects the
//! converter used for the value. Descriptions are collected once into a
//! [`ComponentRegistry`] and validated against the converter registry, so a
//! field whose type cannot be converted is reported at startup rather than
//! when the first entity using it spawns.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;

use super::entity::EntityFlags;
use super::keyvalues::{KeyValue, KeyValueConverters, KeyValues, TypeKey};
use super::network::NetworkHook;
use super::runtime::UpdateContext;
use super::MetaDataError;
use crate::assets::{Model, ModelManager};

/// Access to a value as [`Any`]
pub trait AsAny {
    /// Borrow as `Any`
    fn as_any(&self) -> &dyn Any;

    /// Mutably borrow as `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of entity state, initialized from the entity's keyvalues
pub trait Component: AsAny + Send + Sync + 'static {
    /// Declare the keyvalues this component reads
    fn describe(_fields: &mut KeyValueFields<Self>)
    where
        Self: Sized,
    {
    }

    /// Finish initialization once all keyvalues have been assigned
    ///
    /// Returning `false` refuses construction of the whole entity; the
    /// component is expected to log why.
    fn initialize(&mut self, _context: &mut InitContext<'_>) -> bool {
        true
    }

    /// The entity went live in a running scene
    fn activate(&mut self) {}

    /// The component became enabled
    ///
    /// Also called for every enabled component when its entity enters a scene.
    fn on_enable(&mut self) {}

    /// The component became disabled
    ///
    /// Also called for every enabled component when its entity is destroyed.
    fn on_disable(&mut self) {}

    /// Called once, before the first [`update`](Self::update)
    fn start(&mut self, _context: &mut UpdateContext<'_>) {}

    /// Called on every scene update while the component is enabled
    fn update(&mut self, _context: &mut UpdateContext<'_>) {}

    /// The entity's replication hook changed
    fn attach_network(&mut self, _hook: NetworkHook) {}
}

impl dyn Component {
    /// Whether the component is a `C`
    pub fn is<C: Component>(&self) -> bool {
        self.as_any().is::<C>()
    }

    /// Downcast to a concrete component
    pub fn downcast_ref<C: Component>(&self) -> Option<&C> {
        self.as_any().downcast_ref::<C>()
    }

    /// Mutably downcast to a concrete component
    pub fn downcast_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.as_any_mut().downcast_mut::<C>()
    }

    /// Type of the concrete component
    pub fn component_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }
}

type Assign = Arc<dyn Fn(&mut dyn Component, KeyValue) -> bool + Send + Sync>;
type SetFlag = Arc<dyn Fn(&mut dyn Component) + Send + Sync>;
type Call = Arc<dyn Fn(&mut dyn Component, &mut UpdateContext<'_>) + Send + Sync>;

/// A keyvalue a component reads
#[derive(Clone)]
pub struct FieldBinding {
    key: &'static str,
    value_type: TypeKey,
    required: bool,
    assign: Assign,
}

impl FieldBinding {
    /// Keyvalue name
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Type the value is converted to
    pub const fn value_type(&self) -> TypeKey {
        self.value_type
    }

    /// Whether entities must provide this keyvalue
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Assign a converted value to the component
    ///
    /// Returns `false` if the component or value has the wrong type.
    pub fn assign(&self, component: &mut dyn Component, value: KeyValue) -> bool {
        (self.assign)(component, value)
    }
}

/// A boolean field set from a bit of the `spawnflags` keyvalue
#[derive(Clone)]
pub struct SpawnFlagBinding {
    mask: u32,
    set: SetFlag,
}

impl SpawnFlagBinding {
    /// Bits that enable the flag
    pub const fn mask(&self) -> u32 {
        self.mask
    }

    /// Set the flag on the component
    pub fn set(&self, component: &mut dyn Component) {
        (self.set)(component);
    }
}

/// A component method that can be invoked by name
#[derive(Clone)]
pub struct MethodBinding {
    name: &'static str,
    call: Call,
}

impl MethodBinding {
    /// Method name
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Run the method on a component
    ///
    /// Does nothing if the component has the wrong type.
    pub fn call(&self, component: &mut dyn Component, context: &mut UpdateContext<'_>) {
        (self.call)(component, context);
    }
}

/// Collects the keyvalue and method declarations of component `C`
pub struct KeyValueFields<C> {
    fields: Vec<FieldBinding>,
    spawn_flags: Vec<SpawnFlagBinding>,
    methods: Vec<MethodBinding>,
    _component: PhantomData<fn(&mut C)>,
}

impl<C: Component> KeyValueFields<C> {
    fn new() -> Self {
        Self {
            fields: Vec::new(),
            spawn_flags: Vec::new(),
            methods: Vec::new(),
            _component: PhantomData,
        }
    }

    fn bind<T: Any>(&mut self, key: &'static str, required: bool, setter: fn(&mut C, T)) -> &mut Self {
        let assign = move |component: &mut dyn Component, value: KeyValue| {
            let Some(component) = component.downcast_mut::<C>() else {
                return false;
            };

            match value.downcast::<T>() {
                Ok(value) => {
                    setter(component, *value);
                    true
                }
                Err(_) => false,
            }
        };

        self.fields.push(FieldBinding {
            key,
            value_type: TypeKey::of::<T>(),
            required,
            assign: Arc::new(assign),
        });
        self
    }

    /// Declare an optional keyvalue
    pub fn field<T: Any>(&mut self, key: &'static str, setter: fn(&mut C, T)) -> &mut Self {
        self.bind(key, false, setter)
    }

    /// Declare a keyvalue every entity must provide
    pub fn required<T: Any>(&mut self, key: &'static str, setter: fn(&mut C, T)) -> &mut Self {
        self.bind(key, true, setter)
    }

    /// Declare a flag set when any bit of `mask` is set in `spawnflags`
    pub fn spawn_flag(&mut self, mask: u32, setter: fn(&mut C, bool)) -> &mut Self {
        let set = move |component: &mut dyn Component| {
            if let Some(component) = component.downcast_mut::<C>() {
                setter(component, true);
            }
        };

        self.spawn_flags.push(SpawnFlagBinding {
            mask,
            set: Arc::new(set),
        });
        self
    }

    /// Declare a method that can be invoked by name, now or after a delay
    pub fn method(&mut self, name: &'static str, method: fn(&mut C, &mut UpdateContext<'_>)) -> &mut Self {
        let call = move |component: &mut dyn Component, context: &mut UpdateContext<'_>| {
            if let Some(component) = component.downcast_mut::<C>() {
                method(component, context);
            }
        };

        self.methods.push(MethodBinding {
            name,
            call: Arc::new(call),
        });
        self
    }
}

fn create<C: Component + Default>() -> Box<dyn Component> {
    Box::new(C::default())
}

/// Everything known about a registered component type
#[derive(Clone)]
pub struct ComponentMetaData {
    component_type: TypeKey,
    create: fn() -> Box<dyn Component>,
    fields: HashMap<&'static str, FieldBinding>,
    spawn_flags: Vec<SpawnFlagBinding>,
    methods: HashMap<&'static str, MethodBinding>,
}

impl ComponentMetaData {
    fn describe<C: Component + Default>() -> (Self, Vec<&'static str>) {
        let mut declarations = KeyValueFields::<C>::new();
        C::describe(&mut declarations);

        let mut fields = HashMap::new();
        let mut duplicates = Vec::new();

        for field in declarations.fields {
            let key = field.key;
            if fields.insert(key, field).is_some() {
                duplicates.push(key);
            }
        }

        let mut methods = HashMap::new();

        for method in declarations.methods {
            if methods.insert(method.name, method).is_some() {
                log::warn!(
                    "Component {} declares a method more than once; the last declaration wins",
                    TypeKey::of::<C>().name()
                );
            }
        }

        let metadata = Self {
            component_type: TypeKey::of::<C>(),
            create: create::<C>,
            fields,
            spawn_flags: declarations.spawn_flags,
            methods,
        };

        (metadata, duplicates)
    }

    /// Component type
    pub const fn component_type(&self) -> TypeKey {
        self.component_type
    }

    /// Create a default instance
    pub fn create(&self) -> Box<dyn Component> {
        (self.create)()
    }

    /// Field bound to a keyvalue
    pub fn field(&self, key: &str) -> Option<&FieldBinding> {
        self.fields.get(key)
    }

    /// All declared fields
    pub fn fields(&self) -> impl Iterator<Item = &FieldBinding> {
        self.fields.values()
    }

    /// Keyvalues entities must provide
    pub fn required_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.values().filter(|field| field.required).map(|field| field.key)
    }

    /// Spawn flag bindings
    pub fn spawn_flags(&self) -> &[SpawnFlagBinding] {
        &self.spawn_flags
    }

    /// Invokable method by name
    pub fn method(&self, name: &str) -> Option<&MethodBinding> {
        self.methods.get(name)
    }

    /// Names of all invokable methods
    pub fn method_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.methods.keys().copied()
    }
}

/// Metadata of every registered component
pub struct ComponentRegistry {
    components: HashMap<TypeId, ComponentMetaData>,
}

impl ComponentRegistry {
    /// Metadata for a component type
    pub fn get(&self, component_type: TypeKey) -> Option<&ComponentMetaData> {
        self.components.get(&component_type.id())
    }

    pub(crate) fn get_by_id(&self, type_id: TypeId) -> Option<&ComponentMetaData> {
        self.components.get(&type_id)
    }

    /// Whether the component type is registered
    pub fn contains(&self, component_type: TypeKey) -> bool {
        self.components.contains_key(&component_type.id())
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no components are registered
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Builder for [`ComponentRegistry`]
#[derive(Default)]
pub struct ComponentRegistryBuilder {
    components: Vec<(ComponentMetaData, Vec<&'static str>)>,
}

impl ComponentRegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type
    pub fn add<C: Component + Default>(&mut self) -> &mut Self {
        let component_type = TypeKey::of::<C>();

        if let Some(index) = self
            .components
            .iter()
            .position(|(metadata, _)| metadata.component_type == component_type)
        {
            log::warn!("Component {} registered more than once", component_type.name());
            self.components.remove(index);
        }

        self.components.push(ComponentMetaData::describe::<C>());
        self
    }

    /// Build the registry, checking every field against the converters
    pub fn build(self, converters: &KeyValueConverters) -> Result<ComponentRegistry, MetaDataError> {
        let mut components = HashMap::new();

        for (metadata, duplicates) in self.components {
            let component = metadata.component_type.name();

            if let Some(key) = duplicates.first() {
                return Err(MetaDataError::DuplicateKeyValue {
                    component,
                    key: (*key).to_string(),
                });
            }

            for field in metadata.fields.values() {
                if !converters.contains(field.value_type) {
                    return Err(MetaDataError::NoConverter {
                        component,
                        key: field.key.to_string(),
                        type_name: field.value_type.name(),
                    });
                }
            }

            log::debug!(
                "Registered component {} with {} keyvalues",
                component,
                metadata.fields.len()
            );
            components.insert(metadata.component_type.id(), metadata);
        }

        Ok(ComponentRegistry { components })
    }
}

/// What a component can reach while initializing
pub struct InitContext<'a> {
    key_values: &'a KeyValues,
    class_name: &'a str,
    models: &'a mut ModelManager,
    flags: &'a mut EntityFlags,
    assigned: &'a HashSet<&'static str>,
}

impl<'a> InitContext<'a> {
    pub(crate) fn new(
        key_values: &'a KeyValues,
        class_name: &'a str,
        models: &'a mut ModelManager,
        flags: &'a mut EntityFlags,
        assigned: &'a HashSet<&'static str>,
    ) -> Self {
        Self {
            key_values,
            class_name,
            models,
            flags,
            assigned,
        }
    }

    /// All keyvalues of the entity
    pub const fn key_values(&self) -> &KeyValues {
        self.key_values
    }

    /// Class name of the entity
    pub const fn class_name(&self) -> &str {
        self.class_name
    }

    /// Whether the keyvalue was present and assigned to this component
    pub fn was_assigned(&self, key: &str) -> bool {
        self.assigned.contains(key)
    }

    /// Model manager of the scene
    pub fn models(&mut self) -> &mut ModelManager {
        self.models
    }

    /// Resolve a model by name
    pub fn load_model(&mut self, name: &str) -> Option<Arc<Model>> {
        self.models.load(name)
    }

    /// Mark the entity for destruction
    ///
    /// Initialization of the remaining components is skipped and the entity
    /// never goes live.
    pub fn request_destruction(&mut self) {
        self.flags.insert(EntityFlags::PENDING_DESTRUCTION);
    }

    /// Whether destruction has been requested
    pub const fn is_pending_destruction(&self) -> bool {
        self.flags.contains(EntityFlags::PENDING_DESTRUCTION)
    }
}
