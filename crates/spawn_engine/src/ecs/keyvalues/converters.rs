//! Built-in converters

use super::{parse_float, parse_int, parse_vec3, KeyValue, KeyValueConverter, KeyValueError, TypeKey};

/// Converts `"true"`/`"false"` (any case); anything else is `false`
pub struct BooleanConverter;

impl KeyValueConverter for BooleanConverter {
    fn from_string(&self, _destination: TypeKey, _key: &str, value: &str) -> Result<KeyValue, KeyValueError> {
        Ok(Box::new(value.trim().eq_ignore_ascii_case("true")))
    }
}

/// Converts integers with `atoi` semantics, clamped to the destination range
///
/// Handles `i32` and `u32`.
pub struct IntegerConverter;

impl KeyValueConverter for IntegerConverter {
    fn from_string(&self, destination: TypeKey, _key: &str, value: &str) -> Result<KeyValue, KeyValueError> {
        let parsed = parse_int(value);

        if destination == TypeKey::of::<i32>() {
            let clamped = parsed.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
            Ok(Box::new(i32::try_from(clamped).unwrap_or_default()))
        } else if destination == TypeKey::of::<u32>() {
            let clamped = parsed.clamp(0, i64::from(u32::MAX));
            Ok(Box::new(u32::try_from(clamped).unwrap_or_default()))
        } else {
            Err(KeyValueError::NoConverter(destination.name()))
        }
    }
}

/// Converts floats with `atof` semantics
pub struct FloatConverter;

impl KeyValueConverter for FloatConverter {
    fn from_string(&self, _destination: TypeKey, _key: &str, value: &str) -> Result<KeyValue, KeyValueError> {
        Ok(Box::new(parse_float(value)))
    }
}

/// Copies the value verbatim
pub struct StringConverter;

impl KeyValueConverter for StringConverter {
    fn from_string(&self, _destination: TypeKey, _key: &str, value: &str) -> Result<KeyValue, KeyValueError> {
        Ok(Box::new(value.to_string()))
    }
}

/// Converts `"x y z"` vectors; missing components are 0
pub struct Vec3Converter;

impl KeyValueConverter for Vec3Converter {
    fn from_string(&self, _destination: TypeKey, _key: &str, value: &str) -> Result<KeyValue, KeyValueError> {
        Ok(Box::new(parse_vec3(value)))
    }
}
