use bytes::{BufMut, Bytes, BytesMut};

use crate::text;
use crate::value::Value;
use crate::wide;
use crate::{EncodeError, Result};

/// Element type tags used in the BSON wire format.
///
/// Each element starts with one of these bytes. They are part of the wire
/// format and must never change.
pub const TAG_END: u8 = 0x00;
pub const TAG_DOUBLE: u8 = 0x01;
pub const TAG_STRING: u8 = 0x02;
pub const TAG_DOCUMENT: u8 = 0x03;
pub const TAG_ARRAY: u8 = 0x04;
pub const TAG_BINARY: u8 = 0x05;
///< Deprecated, decoded as null
pub const TAG_UNDEFINED: u8 = 0x06;
pub const TAG_OBJECT_ID: u8 = 0x07;
pub const TAG_BOOLEAN: u8 = 0x08;
///< Milliseconds since the Unix epoch
pub const TAG_UTC_DATETIME: u8 = 0x09;
pub const TAG_NULL: u8 = 0x0A;
pub const TAG_REGEX: u8 = 0x0B;
pub const TAG_INT32: u8 = 0x10;
pub const TAG_INT64: u8 = 0x12;

/// Binary subtypes.
pub const SUBTYPE_GENERIC: u8 = 0x00;
pub const SUBTYPE_UUID: u8 = 0x04;

/// Integers inside this (symmetric) range are written as `int32`.
pub const INT32_MAX: i64 = 2_147_483_647;
pub const INT32_MIN: i64 = -2_147_483_647;

pub const LENGTH_PREFIX_SIZE: usize = 4;
/// Length prefix plus terminator.
pub const MIN_DOCUMENT_SIZE: usize = LENGTH_PREFIX_SIZE + 1;

const UUID_LEN: usize = 16;
const OBJECT_ID_LEN: usize = 12;
const WIDE_LEN: usize = 8;

// --- Size calculation ---

/// Exact encoded size of `value` as a document.
///
/// Documents and arrays contribute their elements; any other root kind
/// encodes as an empty document.
pub fn document_size(value: &Value) -> usize {
    let body: usize = match value {
        Value::Document(doc) => doc.iter().map(|(k, v)| element_size(k, v)).sum(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| element_size_with_key_len(decimal_len(i), v))
            .sum(),
        _ => 0,
    };
    LENGTH_PREFIX_SIZE + body + 1
}

/// Encoded size of one element: tag, key cstring and payload.
///
/// Unsupported values contribute nothing, not even their tag or key.
pub fn element_size(name: &str, value: &Value) -> usize {
    element_size_with_key_len(text::byte_length(name), value)
}

fn element_size_with_key_len(key_len: usize, value: &Value) -> usize {
    match payload_size(value) {
        Some(payload) => 1 + key_len + 1 + payload,
        None => 0,
    }
}

/// Encoded size of a value's payload, or `None` for values that are dropped.
pub fn payload_size(value: &Value) -> Option<usize> {
    let size = match value {
        Value::Null => 0,
        Value::String(s) => 4 + text::byte_length(s) + 1,
        Value::Int32(_) => 4,
        Value::Int64(_) | Value::Double(_) => 8,
        Value::Boolean(_) => 1,
        Value::Document(_) | Value::Array(_) => document_size(value),
        Value::Binary(b) => 5 + b.len(),
        Value::DateTime(_) | Value::UtcDateTime(_) => WIDE_LEN,
        Value::Uuid(_) => 5 + UUID_LEN,
        Value::ObjectId(_) => OBJECT_ID_LEN,
        Value::Regex(r) => text::cstring_size(&r.pattern) + r.wire_flags().count() + 1,
        Value::Unsupported => return None,
    };
    Some(size)
}

/// Number of decimal digits in `n`, i.e. the byte length of an array key.
fn decimal_len(mut n: usize) -> usize {
    let mut len = 1;
    while n >= 10 {
        n /= 10;
        len += 1;
    }
    len
}

/// Wire tag for `value`, or `None` if it is dropped on encode.
pub fn element_tag(value: &Value) -> Option<u8> {
    let tag = match value {
        Value::Null => TAG_NULL,
        Value::Boolean(_) => TAG_BOOLEAN,
        Value::Int32(_) => TAG_INT32,
        Value::Int64(_) => TAG_INT64,
        Value::Double(_) => TAG_DOUBLE,
        Value::String(_) => TAG_STRING,
        Value::Binary(_) | Value::Uuid(_) => TAG_BINARY,
        Value::Document(_) => TAG_DOCUMENT,
        Value::Array(_) => TAG_ARRAY,
        Value::DateTime(_) | Value::UtcDateTime(_) => TAG_UTC_DATETIME,
        Value::ObjectId(_) => TAG_OBJECT_ID,
        Value::Regex(_) => TAG_REGEX,
        Value::Unsupported => return None,
    };
    Some(tag)
}

// --- Encoding ---

/// Encodes `value` into a freshly allocated buffer of exactly
/// [`document_size`] bytes.
///
/// # Errors
/// Returns `EncodeError::DocumentTooLarge` if the document does not fit an
/// `int32` length prefix, or `EncodeError::InteriorNul` if a key or regex
/// pattern contains a NUL byte.
pub fn serialize(value: &Value) -> Result<Bytes> {
    let size = document_size(value);
    if size > i32::MAX as usize {
        return Err(EncodeError::DocumentTooLarge { size }.into());
    }
    let mut writer = BytesMut::with_capacity(size);
    encode_document(value, &mut writer)?;
    debug_assert_eq!(writer.len(), size, "size pass and encode pass disagree");
    Ok(writer.freeze())
}

/// Writes `value` as a document at the end of `writer`.
///
/// The length prefix is written as a placeholder and patched once the body
/// is complete.
fn encode_document(value: &Value, writer: &mut BytesMut) -> Result<()> {
    let start = writer.len();
    writer.put_i32_le(0);
    match value {
        Value::Document(doc) => {
            for (key, v) in doc {
                encode_element(key, v, writer)?;
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                encode_element(&i.to_string(), v, writer)?;
            }
        }
        _ => {}
    }
    writer.put_u8(TAG_END);
    // Fits: the total size was checked against i32::MAX before writing.
    let size = (writer.len() - start) as i32;
    writer[start..start + LENGTH_PREFIX_SIZE].copy_from_slice(&size.to_le_bytes());
    Ok(())
}

fn encode_element(name: &str, value: &Value, writer: &mut BytesMut) -> Result<()> {
    let Some(tag) = element_tag(value) else {
        log::trace!("dropping unsupported value under key {:?}", name);
        return Ok(());
    };
    writer.put_u8(tag);
    text::put_cstring(writer, name, "key")?;

    match value {
        Value::Null | Value::Unsupported => {}
        Value::Boolean(b) => writer.put_u8(u8::from(*b)),
        Value::Int32(n) => writer.put_i32_le(*n),
        Value::Int64(n) => writer.put_slice(&wide::to_wide_bytes(*n)),
        Value::Double(n) => writer.put_slice(&wide::float_to_wide_bytes(*n)),
        Value::String(s) => {
            let bytes = text::encode(s);
            writer.put_i32_le((bytes.len() + 1) as i32);
            writer.put_slice(bytes);
            writer.put_u8(0);
        }
        Value::Binary(b) => {
            writer.put_i32_le(b.len() as i32);
            writer.put_u8(SUBTYPE_GENERIC);
            writer.put_slice(b);
        }
        Value::Document(_) | Value::Array(_) => encode_document(value, writer)?,
        Value::DateTime(dt) => writer.put_slice(&wide::to_wide_bytes(dt.timestamp_millis())),
        Value::UtcDateTime(utc) => writer.put_slice(utc.as_bytes()),
        Value::Uuid(uuid) => {
            writer.put_i32_le(UUID_LEN as i32);
            writer.put_u8(SUBTYPE_UUID);
            writer.put_slice(uuid.as_bytes());
        }
        Value::ObjectId(oid) => writer.put_slice(oid.as_bytes()),
        Value::Regex(regex) => {
            text::put_cstring(writer, &regex.pattern, "regex pattern")?;
            for flag in regex.wire_flags() {
                writer.put_u8(flag);
            }
            writer.put_u8(0);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_decimal_len() {
        assert_eq!(decimal_len(0), 1);
        assert_eq!(decimal_len(9), 1);
        assert_eq!(decimal_len(10), 2);
        assert_eq!(decimal_len(12345), 5);
    }

    #[test]
    fn test_element_sizes() {
        assert_eq!(element_size("int", &Value::Int32(1)), 1 + 4 + 4);
        assert_eq!(element_size("int", &Value::Int64(1)), 1 + 4 + 8);
        assert_eq!(element_size("s", &Value::from("äö")), 1 + 2 + 4 + 4 + 1);
        assert_eq!(element_size("n", &Value::Null), 3);
        assert_eq!(element_size("whatever", &Value::Unsupported), 0);
    }

    #[test]
    fn test_empty_and_non_document_roots() {
        assert_eq!(document_size(&Value::Document(doc! {})), 5);
        assert_eq!(document_size(&Value::from("")), 5);
        assert_eq!(&serialize(&Value::Int32(7)).unwrap()[..], &[5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_nested_prefix_is_patched() {
        let value = Value::Document(doc! { "obj" => doc! { "int" => 10, "str" => "" } });
        let bytes = serialize(&value).unwrap();
        assert_eq!(bytes.len(), 0x22);
        // Outer prefix, then tag + "obj\0", then the nested prefix.
        assert_eq!(&bytes[..4], &[0x22, 0, 0, 0]);
        assert_eq!(&bytes[9..13], &[0x18, 0, 0, 0]);
    }

    #[test]
    fn test_integral_double_is_written_as_binary64() {
        let value = Value::Document(doc! { "d" => Value::Double(1.0) });
        let bytes = serialize(&value).unwrap();
        assert_eq!(bytes[4], TAG_DOUBLE);
        assert_eq!(&bytes[7..15], &1.0f64.to_le_bytes());
    }

    #[test]
    fn test_interior_nul_in_key_is_rejected() {
        let value = Value::Document(doc! { "a\0b" => 1 });
        assert!(serialize(&value).is_err());
    }
}
