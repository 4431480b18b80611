//! Key-values: the untyped string pairs that configure entities
//!
//! Map data describes each entity as an ordered list of `(key, value)` strings.
//! This module holds that list, the lenient numeric parsers used to read it and
//! the converter registry that turns values into typed component fields.

mod converter;
mod converters;
mod enums;
pub mod parser;

pub use converter::{KeyValue, KeyValueConverter, KeyValueConverters, KeyValueConvertersBuilder};
pub use converters::{BooleanConverter, FloatConverter, IntegerConverter, StringConverter, Vec3Converter};
pub use enums::{EnumConverter, KeyValueEnum};

use std::any::{Any, TypeId};
use std::hash::{Hash, Hasher};

use thiserror::Error;

use crate::foundation::math::Vec3;

/// Destination type of a key-value conversion
///
/// Identity is the [`TypeId`]; the name is kept for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for type `T`
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Type identifier
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Type name
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Key-value configuration errors
///
/// These indicate a content or build defect, never malformed values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyValueError {
    /// No converter is registered for the destination type
    #[error("no keyvalue converter registered for type {0}")]
    NoConverter(&'static str),

    /// Enum has no members and cannot produce a default
    #[error("enum {0} has no values but is used as a keyvalue")]
    EmptyEnum(&'static str),

    /// A converter produced a value of a different type than requested
    #[error("converter for {type_name} produced a value of the wrong type for key \"{key}\"")]
    TypeMismatch {
        /// Requested type
        type_name: &'static str,
        /// Key being converted
        key: String,
    },
}

/// Ordered list of key-value pairs describing one entity
///
/// Keys may repeat; readers that want a single value take the last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValues {
    pairs: Vec<(String, String)>,
}

impl KeyValues {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Builder pattern: append a pair
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Iterate over pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Last value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Whether `key` appears at all
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(candidate, _)| candidate == key)
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect(),
        }
    }
}

/// Parse a leading integer the way `atoi` does
///
/// Leading whitespace and an optional sign are accepted, parsing stops at the
/// first non-digit, and a string without digits yields 0. Out of range values
/// saturate.
pub fn parse_int(value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut result: i64 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(digit - b'0');
        result = result.saturating_mul(10).saturating_add(digit);
    }

    if negative {
        -result
    } else {
        result
    }
}

/// Parse a leading float the way `atof` does
///
/// The longest prefix that forms a decimal number (with optional exponent) is
/// used; a string without one yields 0.
pub fn parse_float(value: &str) -> f32 {
    let trimmed = value.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end += 1;
    }

    let integer_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut mantissa_digits = end - integer_start;

    if bytes.get(end) == Some(&b'.') {
        let fraction_start = end + 1;
        let mut fraction_end = fraction_start;
        while bytes.get(fraction_end).is_some_and(u8::is_ascii_digit) {
            fraction_end += 1;
        }
        mantissa_digits += fraction_end - fraction_start;
        end = fraction_end;
    }

    if mantissa_digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_end = end + 1;
        if matches!(bytes.get(exponent_end), Some(b'-' | b'+')) {
            exponent_end += 1;
        }
        let exponent_digits_start = exponent_end;
        while bytes.get(exponent_end).is_some_and(u8::is_ascii_digit) {
            exponent_end += 1;
        }
        if exponent_end > exponent_digits_start {
            end = exponent_end;
        }
    }

    trimmed[..end].parse().unwrap_or(0.0)
}

/// Parse up to three whitespace separated floats; missing components are 0
pub fn parse_vec3(value: &str) -> Vec3 {
    let mut result = Vec3::zeros();

    for (index, component) in value.split_whitespace().take(3).enumerate() {
        result[index] = parse_float(component);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_keyvalues_last_occurrence_wins() {
        let keyvalues: KeyValues = [("origin", "0 0 0"), ("model", "a.mdl"), ("origin", "1 2 3")]
            .into_iter()
            .collect();

        assert_eq!(keyvalues.len(), 3);
        assert_eq!(keyvalues.get("origin"), Some("1 2 3"));
        assert_eq!(keyvalues.get("angles"), None);
        assert!(keyvalues.contains_key("model"));

        let keys: Vec<_> = keyvalues.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["origin", "model", "origin"]);
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int("  -7"), -7);
        assert_eq!(parse_int("+3"), 3);
        assert_eq!(parse_int("12abc"), 12);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("-"), 0);
        assert_eq!(parse_int("99999999999999999999999"), i64::MAX);
    }

    #[test]
    fn test_parse_float() {
        assert_relative_eq!(parse_float("1.5"), 1.5);
        assert_relative_eq!(parse_float(" -0.25"), -0.25);
        assert_relative_eq!(parse_float(".5"), 0.5);
        assert_relative_eq!(parse_float("3."), 3.0);
        assert_relative_eq!(parse_float("2e2"), 200.0);
        assert_relative_eq!(parse_float("2e"), 2.0);
        assert_relative_eq!(parse_float("7.5units"), 7.5);
        assert_relative_eq!(parse_float("banana"), 0.0);
        assert_relative_eq!(parse_float("-."), 0.0);
    }

    #[test]
    fn test_parse_vec3() {
        let full = parse_vec3("1 -2 3.5");
        assert_relative_eq!(full, Vec3::new(1.0, -2.0, 3.5));

        let partial = parse_vec3("  8 ");
        assert_relative_eq!(partial, Vec3::new(8.0, 0.0, 0.0));

        let extra = parse_vec3("1 2 3 4");
        assert_relative_eq!(extra, Vec3::new(1.0, 2.0, 3.0));

        assert_relative_eq!(parse_vec3(""), Vec3::zeros());
    }

    #[test]
    fn test_type_key_identity() {
        assert_eq!(TypeKey::of::<bool>(), TypeKey::of::<bool>());
        assert_ne!(TypeKey::of::<bool>(), TypeKey::of::<i32>());
        assert_eq!(TypeKey::of::<u32>().name(), "u32");
    }
}
