#[cfg(feature = "serde_json")]
use serde_json::Value as JsonValue;

#[allow(unused_imports)]
use crate::value::{Document, Value};
#[allow(unused_imports)]
use crate::wrappers::Uuid;

// --- uuid::Uuid ---
#[cfg(feature = "uuid")]
impl From<uuid::Uuid> for Uuid {
    fn from(uuid: uuid::Uuid) -> Self {
        Uuid::new(uuid.into_bytes())
    }
}

#[cfg(feature = "uuid")]
impl From<Uuid> for uuid::Uuid {
    fn from(uuid: Uuid) -> Self {
        uuid::Uuid::from_bytes(uuid.into_bytes())
    }
}

#[cfg(feature = "uuid")]
impl From<uuid::Uuid> for Value {
    fn from(uuid: uuid::Uuid) -> Self {
        Value::Uuid(uuid.into())
    }
}

#[cfg(feature = "uuid")]
impl crate::ToBson for uuid::Uuid {
    fn to_bson(&self) -> Value {
        Value::Uuid((*self).into())
    }
}

#[cfg(feature = "uuid")]
impl crate::FromBson for uuid::Uuid {
    fn from_bson(value: Value) -> crate::Result<Self> {
        <Uuid as crate::FromBson>::from_bson(value).map(Into::into)
    }
}

// --- serde_json::Value ---
/// Builds a value the way a JSON number is read by a host with a single
/// numeric type: integers take the smallest integer form that fits, other
/// numbers become doubles. Object key order follows the JSON map.
#[cfg(feature = "serde_json")]
impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::integer(i)
                } else {
                    Value::number(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => Value::Document(map.into_iter().collect::<Document>()),
        }
    }
}
