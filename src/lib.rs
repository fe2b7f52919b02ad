//! # tinybson
//!
//! A small, fast BSON codec for Rust.
//!
//! - Two-pass encoder: the exact output size is computed first, then every
//!   byte is written into a single buffer of that size
//! - Validating decoder: malformed envelopes, truncated payloads and unknown
//!   element types are rejected with a structured error, never a panic
//! - Wrapper types for UUID, ObjectId and raw UTC datetime payloads
//! - Typed conversions through [`ToBson`] / [`FromBson`] and the matching
//!   derive macros
//!
//! ```rust
//! use tinybson::{doc, deserialize, serialize, Value};
//!
//! let value = Value::Document(doc! { "int" => -10 });
//! let bytes = serialize(&value).unwrap();
//! assert_eq!(&bytes[..], b"\x0e\x00\x00\x00\x10int\x00\xf6\xff\xff\xff\x00");
//! assert_eq!(deserialize(&bytes, false).unwrap(), value);
//! ```
//!
//! ## Attribute Macros
//!
//! `#[derive(ToBson, FromBson)]` works on structs with named fields:
//!
//! - `#[bson(rename = "name")]`: Use the given string as the document key.
//! - `#[bson(skip)]`: The field is never written; on decode it is set to `Default::default()`.
//! - `#[bson(default)]`: If the key is missing during decoding, use `Default::default()`.
//!
//! `Option<T>` fields decode a missing key or `null` as `None`.
//!
//! ## Feature Flags
//!
//! - `uuid`: Conversions between [`Uuid`] and `uuid::Uuid`.
//! - `serde_json`: Builds a [`Value`] from a `serde_json::Value`.

mod convert;
pub mod core;
pub mod de;
mod features;
pub mod text;
pub mod value;
pub mod wide;
pub mod wrappers;

pub use crate::core::{document_size, element_size, serialize};
pub use crate::de::{deserialize, deserialize_with, DecodeOptions};
pub use crate::value::{Document, Regex, Value};
pub use crate::wrappers::{ObjectId, Uuid, UtcTimestamp};
pub use tinybson_derive::{FromBson, ToBson};

use bytes::Bytes;

/// Errors that can occur during encoding or decoding.
#[derive(Debug, thiserror::Error)]
pub enum BsonError {
    /// The document envelope is malformed.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// An element payload violates its type's layout.
    #[error(transparent)]
    Element(#[from] ElementError),
    /// The input contains an element type this codec does not know.
    #[error(transparent)]
    Parsing(#[from] ParsingError),
    /// The value cannot be written.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// A decoded document does not match the target struct.
    #[error(transparent)]
    StructDecode(#[from] StructDecodeError),
}

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, BsonError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("Document too short: {len} bytes, need at least 5")]
    TooShort { len: usize },
    #[error("Document size mismatch: declared {declared}, available {available}")]
    SizeMismatch { declared: i32, available: usize },
    #[error("Document is missing its terminating zero byte")]
    MissingTerminator,
    #[error("Illegal key name: missing terminator")]
    IllegalKey,
    #[error("Document elements end at {consumed} bytes, declared {declared}")]
    TrailingBytes { declared: usize, consumed: usize },
    #[error("Documents nested deeper than {max} levels")]
    NestingTooDeep { max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElementError {
    #[error("Wrong UUID length: {len}, expected 16")]
    WrongUuidLength { len: usize },
    #[error("Wrong {kind} length: {actual}, expected {expected}")]
    WrongLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Element 0x{tag:02X} truncated: need {needed} bytes, {remaining} remaining")]
    Truncated {
        tag: u8,
        needed: usize,
        remaining: usize,
    },
    #[error("Negative length {len} in element 0x{tag:02X}")]
    NegativeLength { tag: u8, len: i32 },
    #[error("String payload is empty or not NUL-terminated")]
    InvalidString,
    #[error("Invalid UTF-8 in key or string")]
    InvalidUtf8,
    #[error("Regex pattern or flags missing terminator")]
    UnterminatedRegex,
    #[error("UTC datetime {millis} ms is outside the supported calendar range")]
    InvalidDateTime { millis: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParsingError {
    #[error("Unknown element type 0x{tag:02X}")]
    UnknownElement { tag: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("{what} contains a NUL byte: {value:?}")]
    InteriorNul { what: &'static str, value: String },
    #[error("Document of {size} bytes exceeds the int32 length prefix")]
    DocumentTooLarge { size: usize },
}

/// Errors from converting a decoded [`Value`] into a typed Rust value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructDecodeError {
    #[error("Required field '{field}' not found for struct {struct_name}")]
    MissingRequiredField {
        field: &'static str,
        struct_name: &'static str,
    },
    #[error("Expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Value {value} out of range for {target}")]
    OutOfRange { value: String, target: &'static str },
}

/// Trait for types that can be turned into a [`Value`].
///
/// Most users should use `#[derive(ToBson)]` instead of a manual implementation.
pub trait ToBson {
    fn to_bson(&self) -> Value;
}

/// Trait for types that can be rebuilt from a decoded [`Value`].
///
/// Most users should use `#[derive(FromBson)]` instead of a manual implementation.
///
/// # Errors
/// Returns `StructDecodeError` if the value has the wrong shape.
pub trait FromBson: Sized {
    fn from_bson(value: Value) -> Result<Self>;

    /// Value to use when a struct field's key is absent. `None` makes the
    /// field required.
    fn from_missing() -> Option<Self> {
        None
    }
}

/// Convenience function to encode a typed value.
///
/// # Example
/// ```rust
/// use tinybson::{from_bson_bytes, to_bson_bytes, FromBson, ToBson};
///
/// #[derive(ToBson, FromBson, PartialEq, Debug)]
/// struct MyStruct {
///     id: i32,
///     name: String,
/// }
///
/// let value = MyStruct { id: 42, name: "hello".to_string() };
/// let bytes = to_bson_bytes(&value).unwrap();
/// let decoded: MyStruct = from_bson_bytes(&bytes).unwrap();
/// assert_eq!(value, decoded);
/// ```
pub fn to_bson_bytes<T: ToBson + ?Sized>(value: &T) -> Result<Bytes> {
    serialize(&value.to_bson())
}

/// Convenience function to decode a typed value. UTC datetimes are decoded
/// as raw [`UtcTimestamp`] payloads so that no precision is lost; both
/// `UtcTimestamp` and `chrono::DateTime<Utc>` accept them.
pub fn from_bson_bytes<T: FromBson>(bytes: &[u8]) -> Result<T> {
    T::from_bson(deserialize(bytes, true)?)
}

/// Removes `key` from `doc` and converts it. Used by `#[derive(FromBson)]`.
#[doc(hidden)]
pub fn read_field<T: FromBson>(
    doc: &mut Document,
    key: &'static str,
    struct_name: &'static str,
) -> Result<T> {
    match doc.remove(key) {
        Some(value) => T::from_bson(value),
        None => T::from_missing().ok_or_else(|| {
            StructDecodeError::MissingRequiredField {
                field: key,
                struct_name,
            }
            .into()
        }),
    }
}

/// Like [`read_field`], but a missing key yields `T::default()`.
#[doc(hidden)]
pub fn read_field_or_default<T: FromBson + Default>(doc: &mut Document, key: &'static str) -> Result<T> {
    match doc.remove(key) {
        Some(value) => T::from_bson(value),
        None => Ok(T::default()),
    }
}

/// Unwraps a document for `#[derive(FromBson)]`.
#[doc(hidden)]
pub fn expect_document(value: Value) -> Result<Document> {
    match value {
        Value::Document(doc) => Ok(doc),
        other => Err(StructDecodeError::TypeMismatch {
            expected: "document",
            actual: other.type_name(),
        }
        .into()),
    }
}
