//! Validating decoder.
//!
//! Decoding is all-or-nothing: the first failure at any depth aborts the
//! whole call and no partially built value escapes.

use bytes::Buf;

use crate::core::*;
use crate::text;
use crate::value::{Document, Regex, Value};
use crate::wide;
use crate::wrappers::{ObjectId, Uuid, UtcTimestamp};
use crate::{DocumentError, ElementError, ParsingError, Result};

/// Nesting limit for documents and arrays. Keeps hostile input from
/// exhausting the stack.
pub const MAX_DEPTH: usize = 256;

/// Options controlling how decoded values are represented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Decode UTC datetimes into [`Value::UtcDateTime`] (lossless raw bytes)
    /// instead of [`Value::DateTime`].
    pub use_utc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Document,
    Array,
}

/// Decodes a complete document from `bytes`.
///
/// # Errors
/// Returns the first `DocumentError`, `ElementError` or `ParsingError`
/// encountered. See [`deserialize_with`]. With `use_utc = false` a well-formed
/// UTC datetime outside the range `chrono` can represent also fails the whole
/// decode with `ElementError::InvalidDateTime`; pass `use_utc = true` to keep
/// such payloads as raw [`UtcTimestamp`] values instead.
pub fn deserialize(bytes: &[u8], use_utc: bool) -> Result<Value> {
    deserialize_with(bytes, DecodeOptions { use_utc })
}

/// Decodes a complete document from `bytes` using `options`.
///
/// The root is always returned as [`Value::Document`]. The last byte of
/// `bytes` must be zero; other bytes after the declared document length are
/// not inspected.
pub fn deserialize_with(bytes: &[u8], options: DecodeOptions) -> Result<Value> {
    let result = decode_document(bytes, Container::Document, options, 0).map(|(value, _)| value);
    if let Err(err) = &result {
        log::debug!("bson decode aborted: {}", err);
    }
    result
}

/// Validates the envelope at the front of `buf` and returns the document
/// bytes (length prefix through terminator). For the root document the
/// final byte of the whole buffer must be zero as well.
fn read_envelope(buf: &[u8], root: bool) -> Result<&[u8]> {
    if buf.len() < MIN_DOCUMENT_SIZE {
        return Err(DocumentError::TooShort { len: buf.len() }.into());
    }
    let mut head = buf;
    let declared = head.get_i32_le();
    if declared < MIN_DOCUMENT_SIZE as i32 || declared as usize > buf.len() {
        return Err(DocumentError::SizeMismatch {
            declared,
            available: buf.len(),
        }
        .into());
    }
    if root && buf.last() != Some(&TAG_END) {
        return Err(DocumentError::MissingTerminator.into());
    }
    let doc = &buf[..declared as usize];
    if doc[doc.len() - 1] != TAG_END {
        return Err(DocumentError::MissingTerminator.into());
    }
    Ok(doc)
}

/// Decodes the document starting at `buf[0]` and returns it together with
/// its declared size.
fn decode_document(
    buf: &[u8],
    container: Container,
    options: DecodeOptions,
    depth: usize,
) -> Result<(Value, usize)> {
    if depth > MAX_DEPTH {
        return Err(DocumentError::NestingTooDeep { max: MAX_DEPTH }.into());
    }
    let doc = read_envelope(buf, depth == 0)?;
    let mut reader = &doc[LENGTH_PREFIX_SIZE..];

    let mut entries = Document::new();
    let mut items = Vec::new();
    loop {
        if !reader.has_remaining() {
            // The last element ran over the terminator.
            return Err(DocumentError::MissingTerminator.into());
        }
        let tag = reader.get_u8();
        if tag == TAG_END {
            break;
        }
        let key = read_key(&mut reader)?;
        let value = decode_element(tag, &mut reader, options, depth)?;
        match container {
            // Array keys only mark position; values keep read order.
            Container::Array => items.push(value),
            Container::Document => {
                entries.insert(text::decode(key)?, value);
            }
        }
    }
    if reader.has_remaining() {
        return Err(DocumentError::TrailingBytes {
            declared: doc.len(),
            consumed: doc.len() - reader.remaining(),
        }
        .into());
    }

    let value = match container {
        Container::Document => Value::Document(entries),
        Container::Array => Value::Array(items),
    };
    Ok((value, doc.len()))
}

/// Reads an element key. A key whose terminator is the document's final
/// byte leaves no room for a payload and is rejected.
fn read_key<'a>(reader: &mut &'a [u8]) -> Result<&'a [u8]> {
    let buf: &'a [u8] = *reader;
    match text::split_cstring(buf) {
        Some((key, consumed)) if consumed < buf.len() => {
            reader.advance(consumed);
            Ok(key)
        }
        _ => Err(DocumentError::IllegalKey.into()),
    }
}

fn decode_element(
    tag: u8,
    reader: &mut &[u8],
    options: DecodeOptions,
    depth: usize,
) -> Result<Value> {
    let value = match tag {
        TAG_DOUBLE => Value::Double(wide::float_from_wide_bytes(take_array(reader, tag)?)),
        TAG_STRING => {
            let len = read_length(reader, tag)?;
            let bytes = take(reader, len, tag)?;
            match bytes.split_last() {
                Some((0, text_bytes)) => Value::String(text::decode(text_bytes)?.to_owned()),
                _ => return Err(ElementError::InvalidString.into()),
            }
        }
        TAG_DOCUMENT | TAG_ARRAY => {
            let container = if tag == TAG_ARRAY {
                Container::Array
            } else {
                Container::Document
            };
            let (value, size) = decode_document(*reader, container, options, depth + 1)?;
            reader.advance(size);
            value
        }
        TAG_BINARY => {
            let len = read_length(reader, tag)?;
            let subtype = read_u8(reader, tag)?;
            if subtype == SUBTYPE_UUID {
                if len != 16 {
                    return Err(ElementError::WrongUuidLength { len }.into());
                }
                Value::Uuid(Uuid::new(take_array(reader, tag)?))
            } else {
                Value::Binary(take(reader, len, tag)?.to_vec())
            }
        }
        TAG_UNDEFINED | TAG_NULL => Value::Null,
        TAG_OBJECT_ID => Value::ObjectId(ObjectId::new(take_array(reader, tag)?)),
        TAG_BOOLEAN => Value::Boolean(read_u8(reader, tag)? == 1),
        TAG_UTC_DATETIME => {
            let utc = UtcTimestamp::new(take_array(reader, tag)?);
            if options.use_utc {
                Value::UtcDateTime(utc)
            } else {
                let datetime = utc.to_datetime().ok_or(ElementError::InvalidDateTime {
                    millis: utc.to_millis(),
                })?;
                Value::DateTime(datetime)
            }
        }
        TAG_REGEX => {
            let pattern = read_regex_part(reader)?;
            let pattern = text::decode(pattern)?.to_owned();
            let flags = read_regex_part(reader)?;
            Value::Regex(Regex::from_wire(pattern, flags))
        }
        TAG_INT32 => Value::Int32(i32::from_le_bytes(take_array(reader, tag)?)),
        TAG_INT64 => Value::Int64(wide::from_wide_bytes(take_array(reader, tag)?)),
        _ => return Err(ParsingError::UnknownElement { tag }.into()),
    };
    Ok(value)
}

fn read_regex_part<'a>(reader: &mut &'a [u8]) -> Result<&'a [u8]> {
    let buf: &'a [u8] = *reader;
    let (part, consumed) = text::split_cstring(buf).ok_or(ElementError::UnterminatedRegex)?;
    reader.advance(consumed);
    Ok(part)
}

/// Reads an `int32` length field, rejecting negative values.
fn read_length(reader: &mut &[u8], tag: u8) -> Result<usize> {
    let len = i32::from_le_bytes(take_array(reader, tag)?);
    usize::try_from(len).map_err(|_| ElementError::NegativeLength { tag, len }.into())
}

fn ensure(reader: &[u8], needed: usize, tag: u8) -> Result<()> {
    if reader.remaining() < needed {
        return Err(ElementError::Truncated {
            tag,
            needed,
            remaining: reader.remaining(),
        }
        .into());
    }
    Ok(())
}

fn read_u8(reader: &mut &[u8], tag: u8) -> Result<u8> {
    ensure(reader, 1, tag)?;
    Ok(reader.get_u8())
}

fn take<'a>(reader: &mut &'a [u8], len: usize, tag: u8) -> Result<&'a [u8]> {
    ensure(reader, len, tag)?;
    let buf: &'a [u8] = *reader;
    let (head, rest) = buf.split_at(len);
    *reader = rest;
    Ok(head)
}

fn take_array<const N: usize>(reader: &mut &[u8], tag: u8) -> Result<[u8; N]> {
    ensure(reader, N, tag)?;
    let mut out = [0u8; N];
    reader.copy_to_slice(&mut out);
    Ok(out)
}
