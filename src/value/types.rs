//! ValueType trait for field value conversions
//!
//! `ValueType` maps a Rust field type to its `sea_query::Value` variant and back.
//! Field descriptors use it in both directions: getters turn a field into a
//! `Value` for diffing and parameter binding, setters turn a row `Value` back
//! into the field.
//!
//! ## Usage
//!
//! ```rust
//! use tidemark::ValueType;
//! use sea_query::Value;
//!
//! let value: Value = 42i32.into_value();
//! assert!(matches!(value, Value::Int(Some(42))));
//!
//! let back: i32 = ValueType::from_value(value).unwrap();
//! assert_eq!(back, 42);
//! ```
//!
//! ## Implementation
//!
//! - Integer types: `i8`, `i16`, `i32`, `i64`, `u8`, `u16`, `u32`, `u64`
//! - Floating point: `f32`, `f64`
//! - Boolean: `bool`
//! - String: `String`
//! - Binary: `Vec<u8>`
//! - JSON: `serde_json::Value`
//! - UUID, chrono date/time and `rust_decimal::Decimal`
//! - `Option<T>` for all of the above
//!
//! No coercion happens between unrelated variants: a `Value::BigInt` is never
//! accepted for an `i32` field. Unsigned integers are stored in the next wider
//! signed variant because PostgreSQL has no unsigned columns, and `i8` is
//! stored as `SmallInt` because the narrowest integer column is `int2`.

use sea_query::Value;

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExtractionError {
    /// The value is null but the field is not optional
    NullValue,
    /// The value variant doesn't match the field type
    TypeMismatch {
        expected: String,
        actual: String,
    },
    /// Value conversion failed (e.g., overflow)
    ConversionError(String),
}

impl std::fmt::Display for ValueExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueExtractionError::NullValue => write!(f, "Value is null"),
            ValueExtractionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
            ValueExtractionError::ConversionError(msg) => {
                write!(f, "Conversion error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValueExtractionError {}

/// Trait for mapping Rust field types to their `sea_query::Value` variant.
pub trait ValueType: Sized {
    /// Convert this value into a `sea_query::Value`.
    fn into_value(self) -> Value;

    /// Convert a `sea_query::Value` into this type.
    ///
    /// # Errors
    ///
    /// - `NullValue` when the value is null and `Self` is not an `Option`
    /// - `TypeMismatch` when the variant does not belong to `Self`
    /// - `ConversionError` when the value is out of range for `Self`
    fn from_value(value: Value) -> Result<Self, ValueExtractionError>;

    /// Return the null variant for this type.
    ///
    /// Used by `Option<T>` so `None` keeps its column type.
    fn null_value() -> Value;
}

fn mismatch(expected: &str, actual: &Value) -> ValueExtractionError {
    ValueExtractionError::TypeMismatch {
        expected: expected.to_string(),
        actual: format!("{:?}", actual),
    }
}

macro_rules! impl_value_type {
    ($type:ty, $variant:ident) => {
        impl ValueType for $type {
            fn into_value(self) -> Value {
                Value::$variant(Some(self))
            }

            fn from_value(value: Value) -> Result<Self, ValueExtractionError> {
                match value {
                    Value::$variant(Some(v)) => Ok(v),
                    Value::$variant(None) => Err(ValueExtractionError::NullValue),
                    other => Err(mismatch(stringify!($variant), &other)),
                }
            }

            fn null_value() -> Value {
                Value::$variant(None)
            }
        }
    };
}

impl_value_type!(i16, SmallInt);
impl_value_type!(i32, Int);
impl_value_type!(i64, BigInt);
impl_value_type!(f32, Float);
impl_value_type!(f64, Double);
impl_value_type!(bool, Bool);
impl_value_type!(String, String);
impl_value_type!(Vec<u8>, Bytes);

// Types PostgreSQL has no column for travel as the next wider signed variant.
macro_rules! impl_widened_value_type {
    ($type:ty, $wide:ty, $variant:ident) => {
        impl ValueType for $type {
            fn into_value(self) -> Value {
                Value::$variant(Some(<$wide>::from(self)))
            }

            fn from_value(value: Value) -> Result<Self, ValueExtractionError> {
                match value {
                    Value::$variant(Some(v)) => <$type>::try_from(v).map_err(|_| {
                        ValueExtractionError::ConversionError(format!(
                            "{} is out of range for {}",
                            v,
                            stringify!($type)
                        ))
                    }),
                    Value::$variant(None) => Err(ValueExtractionError::NullValue),
                    other => Err(mismatch(stringify!($variant), &other)),
                }
            }

            fn null_value() -> Value {
                Value::$variant(None)
            }
        }
    };
}

impl_widened_value_type!(i8, i16, SmallInt);
impl_widened_value_type!(u8, i16, SmallInt);
impl_widened_value_type!(u16, i32, Int);
impl_widened_value_type!(u32, i64, BigInt);

impl ValueType for u64 {
    fn into_value(self) -> Value {
        Value::BigUnsigned(Some(self))
    }

    fn from_value(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::BigUnsigned(Some(v)) => Ok(v),
            Value::BigInt(Some(v)) => u64::try_from(v).map_err(|_| {
                ValueExtractionError::ConversionError(format!("{} is out of range for u64", v))
            }),
            Value::BigUnsigned(None) | Value::BigInt(None) => Err(ValueExtractionError::NullValue),
            other => Err(mismatch("BigUnsigned", &other)),
        }
    }

    fn null_value() -> Value {
        Value::BigUnsigned(None)
    }
}

impl ValueType for serde_json::Value {
    fn into_value(self) -> Value {
        Value::Json(Some(Box::new(self)))
    }

    fn from_value(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Json(Some(v)) => Ok(*v),
            Value::Json(None) => Err(ValueExtractionError::NullValue),
            other => Err(mismatch("Json", &other)),
        }
    }

    fn null_value() -> Value {
        Value::Json(None)
    }
}

// Types whose `Value` shape is owned by sea-query's own conversions.
macro_rules! impl_value_type_via_sea_query {
    ($type:ty, $name:expr) => {
        impl ValueType for $type {
            fn into_value(self) -> Value {
                Value::from(self)
            }

            fn from_value(value: Value) -> Result<Self, ValueExtractionError> {
                if value == Self::null_value() {
                    return Err(ValueExtractionError::NullValue);
                }
                let actual = format!("{:?}", value);
                <$type as sea_query::ValueType>::try_from(value).map_err(|_| {
                    ValueExtractionError::TypeMismatch {
                        expected: $name.to_string(),
                        actual,
                    }
                })
            }

            fn null_value() -> Value {
                <$type as sea_query::Nullable>::null()
            }
        }
    };
}

impl_value_type_via_sea_query!(uuid::Uuid, "Uuid");
impl_value_type_via_sea_query!(chrono::NaiveDate, "ChronoDate");
impl_value_type_via_sea_query!(chrono::NaiveDateTime, "ChronoDateTime");
impl_value_type_via_sea_query!(chrono::DateTime<chrono::Utc>, "ChronoDateTimeUtc");
impl_value_type_via_sea_query!(rust_decimal::Decimal, "Decimal");

impl<T: ValueType> ValueType for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => T::into_value(v),
            None => T::null_value(),
        }
    }

    fn from_value(value: Value) -> Result<Self, ValueExtractionError> {
        match T::from_value(value) {
            Ok(v) => Ok(Some(v)),
            Err(ValueExtractionError::NullValue) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn null_value() -> Value {
        T::null_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i32_value_type() {
        let value = 42i32.into_value();
        assert!(matches!(value, Value::Int(Some(42))));

        let extracted: i32 = ValueType::from_value(value).unwrap();
        assert_eq!(extracted, 42);
    }

    #[test]
    fn test_string_value_type() {
        let value = "hello".to_string().into_value();
        assert!(matches!(value, Value::String(Some(ref s)) if s == "hello"));

        let extracted: String = ValueType::from_value(value).unwrap();
        assert_eq!(extracted, "hello");
    }

    #[test]
    fn test_option_value_type() {
        let value = Some(42i32).into_value();
        assert!(matches!(value, Value::Int(Some(42))));

        let extracted = <Option<i32> as ValueType>::from_value(value).unwrap();
        assert_eq!(extracted, Some(42));

        let extracted = <Option<i32> as ValueType>::from_value(Value::Int(None)).unwrap();
        assert_eq!(extracted, None);
    }

    #[test]
    fn test_option_none_keeps_column_type() {
        assert_eq!(None::<String>.into_value(), Value::String(None));
        assert_eq!(None::<i64>.into_value(), Value::BigInt(None));
    }

    #[test]
    fn test_null_into_required_field_fails() {
        let err = <i32 as ValueType>::from_value(Value::Int(None)).unwrap_err();
        assert_eq!(err, ValueExtractionError::NullValue);
    }

    #[test]
    fn test_no_coercion_between_variants() {
        let err = <i32 as ValueType>::from_value(Value::BigInt(Some(7))).unwrap_err();
        assert!(matches!(err, ValueExtractionError::TypeMismatch { .. }));

        // Option<T> does not swallow a mismatch as None
        let err = <Option<i32> as ValueType>::from_value(Value::String(Some("7".into()))).unwrap_err();
        assert!(matches!(err, ValueExtractionError::TypeMismatch { .. }));
    }

    #[test]
    fn test_i8_travels_as_small_int() {
        // int2 columns decode as SmallInt, so i8 must read them back
        assert_eq!((-5i8).into_value(), Value::SmallInt(Some(-5)));
        assert_eq!(<i8 as ValueType>::from_value(Value::SmallInt(Some(-5))).unwrap(), -5);
        assert_eq!(<Option<i8> as ValueType>::from_value(Value::SmallInt(None)).unwrap(), None);

        let err = <i8 as ValueType>::from_value(Value::SmallInt(Some(300))).unwrap_err();
        assert!(matches!(err, ValueExtractionError::ConversionError(_)));
    }

    #[test]
    fn test_unsigned_range_checked() {
        assert_eq!(200u8.into_value(), Value::SmallInt(Some(200)));
        assert_eq!(<u8 as ValueType>::from_value(Value::SmallInt(Some(200))).unwrap(), 200);

        let err = <u8 as ValueType>::from_value(Value::SmallInt(Some(-1))).unwrap_err();
        assert!(matches!(err, ValueExtractionError::ConversionError(_)));
    }

    #[test]
    fn test_uuid_value_type() {
        let id = uuid::Uuid::new_v4();
        let extracted: uuid::Uuid = ValueType::from_value(id.into_value()).unwrap();
        assert_eq!(extracted, id);

        let none = <Option<uuid::Uuid> as ValueType>::from_value(<uuid::Uuid as ValueType>::null_value()).unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn test_json_value_type() {
        let json = serde_json::json!({"tags": ["a", "b"]});
        let extracted: serde_json::Value = ValueType::from_value(json.clone().into_value()).unwrap();
        assert_eq!(extracted, json);
    }
}
