//! In-memory document model.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::core::{INT32_MAX, INT32_MIN};
use crate::wrappers::{ObjectId, Uuid, UtcTimestamp};

/// A single BSON value.
///
/// Exactly one variant is active at a time. `Unsupported` stands in for
/// values the wire format has no representation for; the encoder drops such
/// elements entirely (tag, key and payload) instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    /// Generic binary data (subtype `0x00`).
    Binary(Vec<u8>),
    Document(Document),
    /// Encoded as a document keyed by the decimal indices `"0"`, `"1"`, ...
    Array(Vec<Value>),
    /// A UTC datetime decoded into a calendar value.
    DateTime(DateTime<Utc>),
    /// A UTC datetime kept as its raw 8-byte payload.
    UtcDateTime(UtcTimestamp),
    Uuid(Uuid),
    ObjectId(ObjectId),
    Regex(Regex),
    Unsupported,
}

impl Value {
    /// Builds a value from a host number.
    ///
    /// Integral numbers in `[-2147483647, 2147483647]` become `Int32`, other
    /// integral numbers within the `i64` domain become `Int64`, and everything
    /// else stays a `Double`.
    pub fn number(n: f64) -> Value {
        if n.fract() == 0.0 {
            if n >= INT32_MIN as f64 && n <= INT32_MAX as f64 {
                return Value::Int32(n as i32);
            }
            if n >= i64::MIN as f64 && n < i64::MAX as f64 {
                return Value::Int64(n as i64);
            }
        }
        Value::Double(n)
    }

    /// Builds an integer value, choosing the 4-byte form whenever it fits in
    /// `[-2147483647, 2147483647]`.
    pub fn integer(n: i64) -> Value {
        if (INT32_MIN..=INT32_MAX).contains(&n) {
            Value::Int32(n as i32)
        } else {
            Value::Int64(n)
        }
    }

    /// Short name of the active variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Document(_) => "document",
            Value::Array(_) => "array",
            Value::DateTime(_) => "datetime",
            Value::UtcDateTime(_) => "utc datetime",
            Value::Uuid(_) => "uuid",
            Value::ObjectId(_) => "objectid",
            Value::Regex(_) => "regex",
            Value::Unsupported => "unsupported",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is either integer variant.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(n) => Some(*n as i64),
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as `f64` if it is numeric. Large `Int64` values lose
    /// precision.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(n) => Some(*n),
            Value::Int32(n) => Some(*n as f64),
            Value::Int64(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }
}

/// An insertion-ordered mapping from key to value.
///
/// Order is significant: elements are written in the order they were
/// inserted. Keys must not contain a NUL byte. Two documents are equal only
/// if they hold the same entries in the same order.
#[derive(Debug, Clone, Default)]
pub struct Document {
    entries: IndexMap<String, Value>,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.entries.iter().eq(other.entries.iter())
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts `value` under `key`. Replacing an existing key keeps its
    /// original position.
    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Removes `key`, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

/// A regular expression with the three flags the wire format carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Regex {
    pub pattern: String,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
}

impl Regex {
    /// Creates a regex from a pattern and flag letters (`g`, `i`, `m`).
    /// Unknown letters are ignored.
    pub fn new(pattern: impl Into<String>, flags: &str) -> Self {
        let mut regex = Regex {
            pattern: pattern.into(),
            ..Default::default()
        };
        for c in flags.chars() {
            match c {
                'g' => regex.global = true,
                'i' => regex.ignore_case = true,
                'm' => regex.multiline = true,
                _ => {}
            }
        }
        regex
    }

    /// Flag bytes as written on the wire, in fixed order: `s` for global,
    /// then `i`, then `m`.
    pub fn wire_flags(&self) -> impl Iterator<Item = u8> {
        [
            (self.global, b's'),
            (self.ignore_case, b'i'),
            (self.multiline, b'm'),
        ]
        .into_iter()
        .filter_map(|(on, flag)| on.then_some(flag))
    }

    /// Inverse of [`Regex::wire_flags`]. Unknown flag bytes are ignored.
    pub fn from_wire(pattern: String, flags: &[u8]) -> Self {
        let mut regex = Regex {
            pattern,
            ..Default::default()
        };
        for flag in flags {
            match flag {
                b's' => regex.global = true,
                b'i' => regex.ignore_case = true,
                b'm' => regex.multiline = true,
                _ => {}
            }
        }
        regex
    }
}

/// Builds a [`Document`] from `key => value` pairs, keeping their order.
///
/// ```rust
/// use tinybson::{doc, Value};
///
/// let d = doc! { "id" => 10, "str" => "Test", "n" => Value::Null };
/// assert_eq!(d.len(), 3);
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::Document::new()
    };
    ( $( $key:expr => $value:expr ),+ $(,)? ) => {{
        let mut doc = $crate::Document::new();
        $( doc.insert($key, $value); )+
        doc
    }};
}

// --- From conversions ---

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::integer(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::integer(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Binary(b.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Binary(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(datetime: DateTime<Utc>) -> Self {
        Value::DateTime(datetime)
    }
}

impl From<UtcTimestamp> for Value {
    fn from(utc: UtcTimestamp) -> Self {
        Value::UtcDateTime(utc)
    }
}

impl From<Uuid> for Value {
    fn from(uuid: Uuid) -> Self {
        Value::Uuid(uuid)
    }
}

impl From<ObjectId> for Value {
    fn from(oid: ObjectId) -> Self {
        Value::ObjectId(oid)
    }
}

impl From<Regex> for Value {
    fn from(regex: Regex) -> Self {
        Value::Regex(regex)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
