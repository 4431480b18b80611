//! Converter registry
//!
//! A converter is bound to one or more destination types by exact type; there is
//! no fallback to a "compatible" converter. The registry is assembled once with
//! [`KeyValueConvertersBuilder`] and is immutable afterwards.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use super::converters::{BooleanConverter, FloatConverter, IntegerConverter, StringConverter, Vec3Converter};
use super::enums::{EnumConverter, KeyValueEnum};
use super::{KeyValueError, TypeKey};
use crate::foundation::math::Vec3;

/// A converted, type-erased key-value
pub type KeyValue = Box<dyn Any + Send>;

/// Converts strings to values of the destination types it is registered for
///
/// Malformed values must be normalized to a deterministic default rather than
/// reported; the only error a converter returns is a configuration error (for
/// example being asked for a type it does not handle).
pub trait KeyValueConverter: Send + Sync {
    /// Convert `value`, read from `key`, into a value of type `destination`
    fn from_string(&self, destination: TypeKey, key: &str, value: &str) -> Result<KeyValue, KeyValueError>;
}

/// Registered converters, keyed by destination type
pub struct KeyValueConverters {
    converters: HashMap<TypeId, (TypeKey, Arc<dyn KeyValueConverter>)>,
    enums: Arc<EnumConverter>,
}

impl KeyValueConverters {
    /// Whether a converter is registered for the type
    pub fn contains(&self, destination: TypeKey) -> bool {
        self.converters.contains_key(&destination.id())
    }

    /// Number of registered destination types
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Whether no converters are registered
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Destination types with a converter
    pub fn types(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.converters.values().map(|(key, _)| *key)
    }

    /// Convert a value to the destination type
    pub fn convert(&self, destination: TypeKey, key: &str, value: &str) -> Result<KeyValue, KeyValueError> {
        let (_, converter) = self
            .converters
            .get(&destination.id())
            .ok_or(KeyValueError::NoConverter(destination.name()))?;

        converter.from_string(destination, key, value)
    }

    /// Convert a value to `T`
    pub fn from_string<T: Any>(&self, key: &str, value: &str) -> Result<T, KeyValueError> {
        let destination = TypeKey::of::<T>();

        self.convert(destination, key, value)?
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| KeyValueError::TypeMismatch {
                type_name: destination.name(),
                key: key.to_string(),
            })
    }

    /// Enum converter shared by all registered enums
    pub fn enums(&self) -> &EnumConverter {
        &self.enums
    }

    /// Default value of a registered enum
    pub fn default_enum_value<E: KeyValueEnum>(&self) -> Result<E, KeyValueError> {
        self.enums.default_value::<E>()
    }
}

enum Registration {
    Converter(Arc<dyn KeyValueConverter>),
    Enum,
}

/// Builder for [`KeyValueConverters`]
pub struct KeyValueConvertersBuilder {
    registrations: HashMap<TypeId, (TypeKey, Registration)>,
    enums: EnumConverter,
}

impl KeyValueConvertersBuilder {
    /// Create a builder with no converters
    pub fn empty() -> Self {
        Self {
            registrations: HashMap::new(),
            enums: EnumConverter::new(),
        }
    }

    /// Create a builder with the built-in converters
    ///
    /// Registers `bool`, `i32`, `u32`, `f32`, `String` and [`Vec3`].
    pub fn new() -> Self {
        let mut builder = Self::empty();
        builder
            .add::<bool>(BooleanConverter)
            .add_for_types(&[TypeKey::of::<i32>(), TypeKey::of::<u32>()], IntegerConverter)
            .add::<f32>(FloatConverter)
            .add::<String>(StringConverter)
            .add::<Vec3>(Vec3Converter);
        builder
    }

    fn register(&mut self, target: TypeKey, registration: Registration) {
        if self.registrations.insert(target.id(), (target, registration)).is_some() {
            log::warn!("Type {} already has a keyvalue converter; replacing it", target.name());
        }
    }

    /// Bind a shared converter instance to a type
    ///
    /// A later registration for the same type replaces this one.
    pub fn add_converter(&mut self, target: TypeKey, converter: Arc<dyn KeyValueConverter>) -> &mut Self {
        self.register(target, Registration::Converter(converter));
        self
    }

    /// Bind a converter to `T`
    pub fn add<T: Any>(&mut self, converter: impl KeyValueConverter + 'static) -> &mut Self {
        self.add_converter(TypeKey::of::<T>(), Arc::new(converter))
    }

    /// Bind one converter instance to several types
    pub fn add_for_types(&mut self, targets: &[TypeKey], converter: impl KeyValueConverter + 'static) -> &mut Self {
        let converter: Arc<dyn KeyValueConverter> = Arc::new(converter);

        for target in targets {
            self.add_converter(*target, Arc::clone(&converter));
        }

        self
    }

    /// Register an enum with the shared enum converter
    ///
    /// Fails if the enum has no members.
    pub fn add_enum<E: KeyValueEnum>(&mut self) -> Result<&mut Self, KeyValueError> {
        self.enums.register::<E>()?;
        self.register(TypeKey::of::<E>(), Registration::Enum);
        Ok(self)
    }

    /// Build the immutable registry
    pub fn build(self) -> KeyValueConverters {
        let enums = Arc::new(self.enums);

        let converters = self
            .registrations
            .into_iter()
            .map(|(id, (key, registration))| {
                let converter = match registration {
                    Registration::Converter(converter) => converter,
                    Registration::Enum => Arc::clone(&enums) as Arc<dyn KeyValueConverter>,
                };
                (id, (key, converter))
            })
            .collect();

        KeyValueConverters { converters, enums }
    }
}

impl Default for KeyValueConvertersBuilder {
    fn default() -> Self {
        Self::new()
    }
}
