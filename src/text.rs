//! UTF-8 text helpers.
//!
//! Every length on the wire is a UTF-8 byte length, never a character count.

use bytes::BufMut;

use crate::{EncodeError, ElementError, Result};

/// Returns the UTF-8 bytes of `text`.
#[inline]
pub fn encode(text: &str) -> &[u8] {
    text.as_bytes()
}

/// Validates `bytes` as UTF-8.
pub fn decode(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| ElementError::InvalidUtf8.into())
}

/// Number of UTF-8 bytes in `text`.
#[inline]
pub fn byte_length(text: &str) -> usize {
    text.len()
}

/// Encoded size of `text` as a cstring, terminator included.
#[inline]
pub fn cstring_size(text: &str) -> usize {
    byte_length(text) + 1
}

/// Writes `text` followed by a NUL terminator.
///
/// # Errors
/// Returns `EncodeError::InteriorNul` if `text` already contains a NUL byte,
/// since the reader would stop early and misparse everything after it.
pub fn put_cstring<B: BufMut>(writer: &mut B, text: &str, what: &'static str) -> Result<()> {
    let bytes = encode(text);
    if bytes.contains(&0) {
        return Err(EncodeError::InteriorNul {
            what,
            value: text.to_owned(),
        }
        .into());
    }
    writer.put_slice(bytes);
    writer.put_u8(0);
    Ok(())
}

/// Finds the cstring at the front of `bytes`.
///
/// Returns the string bytes (without terminator) and the number of bytes
/// consumed (with terminator), or `None` if no terminator exists.
pub fn split_cstring(bytes: &[u8]) -> Option<(&[u8], usize)> {
    let end = bytes.iter().position(|&b| b == 0)?;
    Some((&bytes[..end], end + 1))
}
