//! # Linear Codec
//!
//! The transcoder behind one codec version: a sequence-length bound plus a
//! [`TypeRegistry`] for polymorphic values. It keeps no per-call state, so a
//! single instance can serve any number of concurrent encodes and decodes
//! once its types are registered.
//!
//! Traversal is depth-first, pre-order, and stops at the first error. A
//! failing call arms the cursor's sticky error and produces no output.
//!
//! Decoding counts open sequences, boxes and polymorphic values. Past
//! `max_depth` the decode fails with `MaxDepthExceeded` instead of recursing,
//! so a registered self-referential type cannot exhaust the stack.

use crate::config::CodecConfig;
use crate::core::packer::{Packer, Unpacker};
use crate::core::serialization::Encodable;
use crate::error::{CodecError, Result};
use crate::protocol::registry::{Registrable, TypeRegistry};

/// Default maximum number of elements in one sequence (2 Mi, large enough for blocks)
pub const DEFAULT_MAX_SLICE_LEN: usize = 2 * 1024 * 1024;

/// Default maximum number of nested containers open during one decode
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug)]
pub struct LinearCodec {
    max_slice_len: usize,
    max_depth: usize,
    registry: TypeRegistry,
}

impl Default for LinearCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SLICE_LEN)
    }
}

impl LinearCodec {
    pub fn new(max_slice_len: usize) -> Self {
        Self {
            max_slice_len,
            max_depth: DEFAULT_MAX_DEPTH,
            registry: TypeRegistry::new(),
        }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::new(config.max_slice_len).with_max_depth(config.max_depth)
    }

    /// Limit how many sequences, boxes and polymorphic values may nest
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_slice_len(&self) -> usize {
        self.max_slice_len
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Register `T` as a polymorphic variant; returns its tag
    pub fn register_type<T: Encodable + Registrable>(&self) -> Result<u32> {
        self.registry.register::<T>()
    }

    /// Reserve `count` tags, keeping later tags stable across versions
    pub fn skip_registrations(&self, count: u32) -> Result<()> {
        self.registry.skip(count)
    }

    /// Encode `value` at the packer's current offset
    pub fn marshal_into<T: Encodable>(&self, value: &T, packer: &mut Packer) -> Result<()> {
        packer.status()?;
        value.encode(self, packer).map_err(|e| packer.fail(e))
    }

    /// Decode a `T` from the unpacker's current offset
    pub fn unmarshal_from<T: Encodable>(&self, unpacker: &mut Unpacker<'_>) -> Result<T> {
        unpacker.status()?;
        T::decode(self, unpacker).map_err(|e| unpacker.fail(e))
    }

    /// Exact number of bytes `marshal_into` would write for `value`
    pub fn size<T: Encodable>(&self, value: &T) -> Result<usize> {
        value.encoded_size(self)
    }

    /// Run `decode` one nesting level deeper
    pub(crate) fn decode_nested<T>(
        &self,
        unpacker: &mut Unpacker<'_>,
        decode: impl FnOnce(&mut Unpacker<'_>) -> Result<T>,
    ) -> Result<T> {
        unpacker.enter(self.max_depth)?;
        let value = decode(unpacker)?;
        unpacker.leave();
        Ok(value)
    }

    pub(crate) fn check_slice_len(&self, len: usize) -> Result<()> {
        if len > self.max_slice_len {
            return Err(CodecError::MaxSliceLenExceeded {
                len,
                max: self.max_slice_len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_marshal_into_reports_first_error() {
        let codec = LinearCodec::new(1);
        let mut packer = Packer::default();
        let result = codec.marshal_into(&vec![1u8, 2], &mut packer);
        assert!(matches!(
            result,
            Err(CodecError::MaxSliceLenExceeded { len: 2, max: 1 })
        ));
        // the shape error is now sticky on the packer
        assert!(packer.errored());
        assert!(codec.marshal_into(&1u8, &mut packer).is_err());
        assert!(packer.finish().is_err());
    }

    #[test]
    fn test_unmarshal_from_truncated() {
        let codec = LinearCodec::default();
        let mut unpacker = Unpacker::new(&[0x00, 0x05, b'a', b'b']);
        assert_eq!(
            codec.unmarshal_from::<String>(&mut unpacker),
            Err(CodecError::InsufficientLength)
        );
    }

    #[test]
    fn test_size_matches_encoding() {
        let codec = LinearCodec::default();
        let value = (vec![String::from("abc"), String::new()], [1u64, 2], -3i16);
        let mut packer = Packer::default();
        codec.marshal_into(&value, &mut packer).unwrap();
        assert_eq!(codec.size(&value).unwrap(), packer.len());
    }

    #[test]
    fn test_registration_delegates_to_registry() {
        let codec = LinearCodec::default();
        assert_eq!(codec.register_type::<u32>().unwrap(), 0);
        codec.skip_registrations(3).unwrap();
        assert_eq!(codec.register_type::<String>().unwrap(), 4);
        assert_eq!(codec.registry().len().unwrap(), 2);
    }

    #[test]
    fn test_nested_sequences_past_max_depth() {
        let codec = LinearCodec::default().with_max_depth(2);
        let value = vec![vec![1u8, 2], vec![3]];
        let mut packer = Packer::default();
        codec.marshal_into(&value, &mut packer).unwrap();
        let bytes = packer.finish().unwrap();

        let mut unpacker = Unpacker::new(&bytes);
        assert_eq!(codec.unmarshal_from::<Vec<Vec<u8>>>(&mut unpacker).unwrap(), value);
        assert_eq!(unpacker.depth(), 0);

        let mut unpacker = Unpacker::new(&bytes);
        assert_eq!(
            codec.unmarshal_from::<Vec<Vec<Vec<u8>>>>(&mut unpacker),
            Err(CodecError::MaxDepthExceeded { max: 2 })
        );
    }
}
