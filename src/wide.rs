//! 8-byte payloads (`int64`, `UTC datetime` and `double`).
//!
//! Integral payloads are little-endian two's-complement values laid out as
//! the low 32-bit word followed by the high 32-bit word. Doubles are the raw
//! IEEE-754 binary64 bits.

/// Splits `value` into its low and high 32-bit two's-complement words.
#[inline]
pub fn split_words(value: i64) -> (u32, u32) {
    (value as u32, (value >> 32) as u32)
}

/// Joins low and high words back into a signed 64-bit value.
#[inline]
pub fn join_words(low: u32, high: u32) -> i64 {
    (((high as u64) << 32) | low as u64) as i64
}

/// Encodes `value` as 8 little-endian bytes, low word first.
pub fn to_wide_bytes(value: i64) -> [u8; 8] {
    let (low, high) = split_words(value);
    let mut buf = [0u8; 8];
    buf[..4].copy_from_slice(&low.to_le_bytes());
    buf[4..].copy_from_slice(&high.to_le_bytes());
    buf
}

/// Decodes 8 little-endian bytes written by [`to_wide_bytes`].
pub fn from_wide_bytes(bytes: [u8; 8]) -> i64 {
    let low = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let high = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    join_words(low, high)
}

/// Encodes a binary64 value as its raw little-endian IEEE-754 bits.
///
/// This is the non-integral half of the wide layout; integral values use
/// [`to_wide_bytes`].
pub fn float_to_wide_bytes(value: f64) -> [u8; 8] {
    value.to_bits().to_le_bytes()
}

/// Decodes 8 little-endian bytes written by [`float_to_wide_bytes`].
pub fn float_from_wide_bytes(bytes: [u8; 8]) -> f64 {
    f64::from_bits(u64::from_le_bytes(bytes))
}
