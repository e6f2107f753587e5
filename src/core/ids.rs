//! # Fixed-Width Identifiers
//!
//! Content-addressing identifiers travel on the wire as raw bytes with no
//! length prefix. Any type implementing [`FixedId`] can be packed this way;
//! [`Id`] is the 32-byte identifier used throughout the crate.

use crate::error::{CodecError, Result};
use std::fmt;
use std::str::FromStr;

/// Width in bytes of [`Id`]
pub const ID_LEN: usize = 32;

/// An identifier with a width known at compile time.
pub trait FixedId: Sized {
    /// Number of bytes on the wire
    const LEN: usize;

    /// Raw view of exactly `LEN` bytes
    fn as_bytes(&self) -> &[u8];

    /// Rebuild from raw bytes.
    ///
    /// # Errors
    /// Returns `CodecError::InvalidId` when `bytes` is not exactly `LEN` long.
    fn from_slice(bytes: &[u8]) -> Result<Self>;
}

/// 32-byte content identifier, formatted as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Id([u8; ID_LEN]);

impl Id {
    /// The all-zero identifier
    pub const EMPTY: Id = Id([0u8; ID_LEN]);

    pub const fn new(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; ID_LEN] {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl FixedId for Id {
    const LEN: usize = ID_LEN;

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; ID_LEN] = bytes.try_into().map_err(|_| {
            CodecError::InvalidId(format!(
                "expected {ID_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }
}

impl From<[u8; ID_LEN]> for Id {
    fn from(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Id {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}

impl FromStr for Id {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = hex::decode(s).map_err(|e| CodecError::InvalidId(e.to_string()))?;
        Self::from_slice(&raw)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_hex_format_and_parse() {
        let mut raw = [0u8; ID_LEN];
        raw[0] = 0xAB;
        raw[31] = 0x01;
        let id = Id::new(raw);

        let text = id.to_string();
        assert_eq!(text.len(), ID_LEN * 2);
        assert!(text.starts_with("ab"));
        assert!(text.ends_with("01"));
        assert_eq!(text.parse::<Id>().unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_wrong_width() {
        assert!(matches!("abcd".parse::<Id>(), Err(CodecError::InvalidId(_))));
        assert!(matches!(Id::from_slice(&[0u8; 31]), Err(CodecError::InvalidId(_))));
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let text = "zz".repeat(ID_LEN);
        assert!(matches!(text.parse::<Id>(), Err(CodecError::InvalidId(_))));
    }

    #[test]
    fn test_empty() {
        assert!(Id::default().is_empty());
        assert!(!Id::new([1u8; ID_LEN]).is_empty());
    }
}
