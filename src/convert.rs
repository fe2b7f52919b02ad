//! `ToBson` / `FromBson` implementations for std and wrapper types.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::value::{Document, Regex, Value};
use crate::wrappers::{ObjectId, Uuid, UtcTimestamp};
use crate::{FromBson, Result, StructDecodeError, ToBson};

fn mismatch(expected: &'static str, actual: &Value) -> crate::BsonError {
    StructDecodeError::TypeMismatch {
        expected,
        actual: actual.type_name(),
    }
    .into()
}

/// Implements both traits for types with a `From` conversion into `Value`
/// and a single matching variant. `copy` types are converted from `*self`.
macro_rules! impl_simple {
    (@from $ty:ty, $variant:ident, $name:expr) => {
        impl FromBson for $ty {
            fn from_bson(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(mismatch($name, &other)),
                }
            }
        }
    };
    (copy $ty:ty, $variant:ident, $name:expr) => {
        impl ToBson for $ty {
            fn to_bson(&self) -> Value {
                Value::from(*self)
            }
        }

        impl_simple!(@from $ty, $variant, $name);
    };
    ($ty:ty, $variant:ident, $name:expr) => {
        impl ToBson for $ty {
            fn to_bson(&self) -> Value {
                Value::from(self.clone())
            }
        }

        impl_simple!(@from $ty, $variant, $name);
    };
}

impl_simple!(copy bool, Boolean, "boolean");
impl_simple!(String, String, "string");
impl_simple!(Document, Document, "document");
impl_simple!(copy Uuid, Uuid, "uuid");
impl_simple!(copy ObjectId, ObjectId, "objectid");
impl_simple!(Regex, Regex, "regex");

// --- Integers ---
/// Integers accept either integer variant as long as the value fits.
macro_rules! impl_integer {
    ($($ty:ty),*) => {
        $(
            impl ToBson for $ty {
                fn to_bson(&self) -> Value {
                    Value::integer(*self as i64)
                }
            }

            impl FromBson for $ty {
                fn from_bson(value: Value) -> Result<Self> {
                    let n = value.as_i64().ok_or_else(|| mismatch("integer", &value))?;
                    <$ty>::try_from(n).map_err(|_| {
                        StructDecodeError::OutOfRange {
                            value: n.to_string(),
                            target: stringify!($ty),
                        }
                        .into()
                    })
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, u8, u16, u32);

// --- f64 ---
impl ToBson for f64 {
    fn to_bson(&self) -> Value {
        Value::Double(*self)
    }
}

/// Accepts any numeric variant; large `Int64` values lose precision.
impl FromBson for f64 {
    fn from_bson(value: Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| mismatch("number", &value))
    }
}

// --- str ---
impl ToBson for str {
    fn to_bson(&self) -> Value {
        Value::String(self.to_owned())
    }
}

// --- Bytes ---
/// `Bytes` maps to generic binary data.
impl ToBson for Bytes {
    fn to_bson(&self) -> Value {
        Value::Binary(self.to_vec())
    }
}

impl FromBson for Bytes {
    fn from_bson(value: Value) -> Result<Self> {
        match value {
            Value::Binary(b) => Ok(Bytes::from(b)),
            other => Err(mismatch("binary", &other)),
        }
    }
}

// --- Datetimes ---
impl ToBson for UtcTimestamp {
    fn to_bson(&self) -> Value {
        Value::UtcDateTime(*self)
    }
}

impl FromBson for UtcTimestamp {
    fn from_bson(value: Value) -> Result<Self> {
        match value {
            Value::UtcDateTime(utc) => Ok(utc),
            Value::DateTime(dt) => Ok(UtcTimestamp::from_datetime(&dt)),
            other => Err(mismatch("utc datetime", &other)),
        }
    }
}

impl ToBson for DateTime<Utc> {
    fn to_bson(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl FromBson for DateTime<Utc> {
    fn from_bson(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            Value::UtcDateTime(utc) => utc.to_datetime().ok_or_else(|| {
                crate::ElementError::InvalidDateTime {
                    millis: utc.to_millis(),
                }
                .into()
            }),
            other => Err(mismatch("datetime", &other)),
        }
    }
}

// --- Value ---
impl ToBson for Value {
    fn to_bson(&self) -> Value {
        self.clone()
    }
}

impl FromBson for Value {
    fn from_bson(value: Value) -> Result<Self> {
        Ok(value)
    }
}

// --- Option ---
/// `None` is written as null; null or a missing key reads back as `None`.
impl<T: ToBson> ToBson for Option<T> {
    fn to_bson(&self) -> Value {
        match self {
            Some(v) => v.to_bson(),
            None => Value::Null,
        }
    }
}

impl<T: FromBson> FromBson for Option<T> {
    fn from_bson(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_bson(other).map(Some),
        }
    }

    fn from_missing() -> Option<Self> {
        Some(None)
    }
}

// --- Sequences ---
impl<T: ToBson> ToBson for [T] {
    fn to_bson(&self) -> Value {
        Value::Array(self.iter().map(ToBson::to_bson).collect())
    }
}

impl<T: ToBson> ToBson for Vec<T> {
    fn to_bson(&self) -> Value {
        self.as_slice().to_bson()
    }
}

impl<T: FromBson> FromBson for Vec<T> {
    fn from_bson(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_bson).collect(),
            other => Err(mismatch("array", &other)),
        }
    }
}

impl<T: ToBson + ?Sized> ToBson for &T {
    fn to_bson(&self) -> Value {
        (**self).to_bson()
    }
}

impl<T: ToBson + ?Sized> ToBson for Box<T> {
    fn to_bson(&self) -> Value {
        (**self).to_bson()
    }
}

impl<T: FromBson> FromBson for Box<T> {
    fn from_bson(value: Value) -> Result<Self> {
        T::from_bson(value).map(Box::new)
    }
}
