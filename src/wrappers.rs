//! Fixed-length byte holders recognised as distinct wire types.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::wide;
use crate::{ElementError, Result};

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Length of the wrapped buffer in bytes.
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Copies `bytes` into a new value.
            ///
            /// # Errors
            /// Returns `ElementError::WrongLength` unless `bytes` is exactly
            #[doc = concat!("`", stringify!($len), "` bytes long.")]
            pub fn from_slice(bytes: &[u8]) -> Result<Self> {
                <[u8; $len]>::try_from(bytes).map(Self).map_err(|_| {
                    ElementError::WrongLength {
                        kind: stringify!($name),
                        expected: $len,
                        actual: bytes.len(),
                    }
                    .into()
                })
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn into_bytes(self) -> [u8; $len] {
                self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = crate::BsonError;

            fn try_from(bytes: &[u8]) -> Result<Self> {
                Self::from_slice(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

fixed_bytes!(
    /// A 16-byte UUID, written as binary subtype `0x04`.
    Uuid,
    16
);

fixed_bytes!(
    /// A 12-byte ObjectId.
    ObjectId,
    12
);

fixed_bytes!(
    /// Raw 8-byte UTC datetime payload: milliseconds since the Unix epoch.
    ///
    /// Keeping the bytes untouched gives a lossless round trip for any
    /// payload, including ones outside the range `chrono` can represent.
    UtcTimestamp,
    8
);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{:02x}", b))
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl UtcTimestamp {
    /// The current time.
    pub fn now() -> Self {
        Self::from_millis(Utc::now().timestamp_millis())
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(wide::to_wide_bytes(millis))
    }

    pub fn from_datetime(datetime: &DateTime<Utc>) -> Self {
        Self::from_millis(datetime.timestamp_millis())
    }

    /// Parses an ISO 8601 date string such as `2016-06-25T14:48:11Z` or
    /// `2016-06-25T14:48:11+0200`.
    pub fn parse(text: &str) -> std::result::Result<Self, chrono::ParseError> {
        let parsed = DateTime::parse_from_rfc3339(text)
            .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z"))?;
        Ok(Self::from_millis(parsed.timestamp_millis()))
    }

    /// Milliseconds since the Unix epoch.
    pub fn to_millis(&self) -> i64 {
        wide::from_wide_bytes(self.0)
    }

    /// Converts to a calendar datetime, or `None` if the payload lies outside
    /// the range `chrono` supports.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.to_millis())
    }
}

impl From<DateTime<Utc>> for UtcTimestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::from_datetime(&datetime)
    }
}
