//! Enum key-values
//!
//! Rust enums carry no runtime member list, so enums used as key-values
//! implement [`KeyValueEnum`] (usually through [`key_value_enum!`](crate::key_value_enum)),
//! which lists their members in declaration order.
//!
//! Map data stores enums as integers. A value that does not name a declared
//! member becomes the enum's default: 0 if 0 is a member, otherwise the first
//! declared member. Defaults are computed on first use and cached for the life
//! of the converter.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{parse_int, KeyValue, KeyValueConverter, KeyValueError, TypeKey};

/// An enum usable as a key-value destination
pub trait KeyValueEnum: Copy + Send + Sync + 'static {
    /// Member names and values, in declaration order
    const MEMBERS: &'static [(&'static str, i64)];

    /// The member with the given value
    fn from_value(value: i64) -> Option<Self>;
}

/// Declare an enum together with its [`KeyValueEnum`] implementation
///
/// ```rust
/// spawn_engine::key_value_enum! {
///     /// Collision type
///     #[derive(Default)]
///     pub enum Solid {
///         #[default]
///         Not = 0,
///         Trigger = 1,
///     }
/// }
/// ```
#[macro_export]
macro_rules! key_value_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant = $value,
            )*
        }

        impl $crate::ecs::keyvalues::KeyValueEnum for $name {
            const MEMBERS: &'static [(&'static str, i64)] = &[$((stringify!($variant), $value as i64)),*];

            #[allow(unreachable_code, unused_variables)]
            fn from_value(value: i64) -> Option<Self> {
                $(
                    if value == $value as i64 {
                        return Some(Self::$variant);
                    }
                )*
                None
            }
        }
    };
}

struct EnumDescriptor {
    key: TypeKey,
    members: &'static [(&'static str, i64)],
    make: fn(i64) -> Option<KeyValue>,
}

fn make_member<E: KeyValueEnum>(value: i64) -> Option<KeyValue> {
    E::from_value(value).map(|member| Box::new(member) as KeyValue)
}

/// Converter shared by every registered enum
pub struct EnumConverter {
    descriptors: HashMap<TypeId, EnumDescriptor>,
    // Process-lifetime cache: populated once per type, never invalidated
    defaults: Mutex<HashMap<TypeId, i64>>,
}

impl EnumConverter {
    /// Create a converter with no enums
    pub fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
            defaults: Mutex::new(HashMap::new()),
        }
    }

    /// Register an enum
    ///
    /// An enum without members cannot be used as a key-value.
    pub fn register<E: KeyValueEnum>(&mut self) -> Result<(), KeyValueError> {
        let key = TypeKey::of::<E>();

        if E::MEMBERS.is_empty() {
            return Err(KeyValueError::EmptyEnum(key.name()));
        }

        self.descriptors.insert(
            key.id(),
            EnumDescriptor {
                key,
                members: E::MEMBERS,
                make: make_member::<E>,
            },
        );

        Ok(())
    }

    /// Whether the enum is registered
    pub fn contains(&self, key: TypeKey) -> bool {
        self.descriptors.contains_key(&key.id())
    }

    fn descriptor(&self, key: TypeKey) -> Result<&EnumDescriptor, KeyValueError> {
        self.descriptors
            .get(&key.id())
            .ok_or(KeyValueError::NoConverter(key.name()))
    }

    /// Default value of an enum, computed on first use
    pub fn default_value_of(&self, key: TypeKey) -> Result<i64, KeyValueError> {
        let descriptor = self.descriptor(key)?;

        // Held across the computation so concurrent first uses agree
        let mut defaults = self.defaults.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(value) = defaults.get(&key.id()) {
            return Ok(*value);
        }

        let value = if descriptor.members.iter().any(|(_, value)| *value == 0) {
            0
        } else {
            descriptor
                .members
                .first()
                .map(|(_, value)| *value)
                .ok_or(KeyValueError::EmptyEnum(descriptor.key.name()))?
        };

        defaults.insert(key.id(), value);
        Ok(value)
    }

    /// Default value of an enum
    pub fn default_value<E: KeyValueEnum>(&self) -> Result<E, KeyValueError> {
        let key = TypeKey::of::<E>();
        let value = self.default_value_of(key)?;

        E::from_value(value).ok_or(KeyValueError::TypeMismatch {
            type_name: key.name(),
            key: String::new(),
        })
    }

    /// Number of enums whose default has been computed
    pub fn cached_defaults(&self) -> usize {
        self.defaults.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn resolve(descriptor: &EnumDescriptor, value: &str) -> Option<i64> {
        let trimmed = value.trim();

        let is_numeric = trimmed
            .trim_start_matches(['-', '+'])
            .starts_with(|c: char| c.is_ascii_digit());

        if is_numeric {
            let number = parse_int(trimmed);
            return descriptor
                .members
                .iter()
                .any(|(_, value)| *value == number)
                .then_some(number);
        }

        descriptor
            .members
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
            .map(|(_, value)| *value)
    }
}

impl Default for EnumConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueConverter for EnumConverter {
    fn from_string(&self, destination: TypeKey, key: &str, value: &str) -> Result<KeyValue, KeyValueError> {
        let descriptor = self.descriptor(destination)?;

        let number = match Self::resolve(descriptor, value) {
            Some(number) => number,
            None => self.default_value_of(destination)?,
        };

        (descriptor.make)(number).ok_or_else(|| KeyValueError::TypeMismatch {
            type_name: destination.name(),
            key: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_value_enum;
    use std::sync::Arc;

    key_value_enum! {
        enum Mode {
            A = 0,
            B = 1,
        }
    }

    key_value_enum! {
        enum Mode2 {
            X = 1,
            Y = 2,
        }
    }

    key_value_enum! {
        enum ZeroLast {
            High = 5,
            Zero = 0,
        }
    }

    key_value_enum! {
        enum Empty {}
    }

    fn converter() -> EnumConverter {
        let mut converter = EnumConverter::new();
        converter.register::<Mode>().unwrap();
        converter.register::<Mode2>().unwrap();
        converter.register::<ZeroLast>().unwrap();
        converter
    }

    fn convert<E: KeyValueEnum>(converter: &EnumConverter, value: &str) -> E {
        *converter
            .from_string(TypeKey::of::<E>(), "key", value)
            .unwrap()
            .downcast::<E>()
            .unwrap()
    }

    #[test]
    fn test_default_is_zero_when_defined() {
        assert_eq!(converter().default_value::<Mode>(), Ok(Mode::A));
        assert_eq!(converter().default_value::<ZeroLast>(), Ok(ZeroLast::Zero));
    }

    #[test]
    fn test_default_is_first_member_without_zero() {
        assert_eq!(converter().default_value::<Mode2>(), Ok(Mode2::X));
    }

    #[test]
    fn test_default_is_memoized() {
        let converter = converter();
        assert_eq!(converter.cached_defaults(), 0);

        assert_eq!(converter.default_value::<Mode2>(), Ok(Mode2::X));
        assert_eq!(converter.cached_defaults(), 1);

        assert_eq!(converter.default_value::<Mode2>(), Ok(Mode2::X));
        assert_eq!(converter.cached_defaults(), 1);
    }

    #[test]
    fn test_empty_enum_is_rejected() {
        let mut converter = EnumConverter::new();
        assert!(matches!(converter.register::<Empty>(), Err(KeyValueError::EmptyEnum(_))));
        assert!(!converter.contains(TypeKey::of::<Empty>()));
        assert!(matches!(
            converter.default_value::<Empty>(),
            Err(KeyValueError::NoConverter(_))
        ));
    }

    #[test]
    fn test_parse_by_value_and_name() {
        let converter = converter();

        assert_eq!(convert::<Mode>(&converter, "1"), Mode::B);
        assert_eq!(convert::<Mode>(&converter, " 0 "), Mode::A);
        assert_eq!(convert::<Mode>(&converter, "b"), Mode::B);
        assert_eq!(convert::<Mode2>(&converter, "Y"), Mode2::Y);
    }

    #[test]
    fn test_unresolved_values_use_default() {
        let converter = converter();

        assert_eq!(convert::<Mode>(&converter, "3"), Mode::A);
        assert_eq!(convert::<Mode2>(&converter, "0"), Mode2::X);
        assert_eq!(convert::<Mode2>(&converter, "banana"), Mode2::X);
        assert_eq!(convert::<Mode2>(&converter, ""), Mode2::X);
    }

    #[test]
    fn test_concurrent_first_use_agrees() {
        let converter = Arc::new(converter());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let converter = Arc::clone(&converter);
                std::thread::spawn(move || converter.default_value::<Mode2>().unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Mode2::X);
        }
        assert_eq!(converter.cached_defaults(), 1);
    }
}
