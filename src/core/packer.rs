//! # Packer
//!
//! Byte-level cursors used by every encoder and decoder in the crate.
//!
//! [`Packer`] appends to a growable buffer, [`Unpacker`] reads forward over a
//! borrowed slice. Both keep a sticky first error: once an operation fails,
//! every later operation on the same cursor returns that error (or a zero
//! value) without moving the offset.
//!
//! Every primitive comes in two forms:
//! - `try_*` returns a `Result` and arms the sticky error on failure
//! - the plain form discards the outcome, so long chains of calls can be
//!   checked once at the end through [`Packer::finish`] / [`Unpacker::finish`]
//!
//! ## Wire Format
//! ```text
//! u8/u16/u32/u64   1/2/4/8 bytes, big-endian
//! bool             1 byte, 1 = true, 0 = false
//! bytes            length:u32 | raw[length]
//! str              length:u16 | raw[length]
//! fixed id         raw[WIDTH]
//! ip               addr:16 (IPv4 as IPv4-mapped IPv6) | port:u16
//! ```

use crate::core::endpoint::Endpoint;
use crate::core::ids::FixedId;
use crate::error::{CodecError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Number of bytes per byte
pub const BYTE_LEN: usize = 1;
/// Number of bytes per short
pub const SHORT_LEN: usize = 2;
/// Number of bytes per int
pub const INT_LEN: usize = 4;
/// Number of bytes per long
pub const LONG_LEN: usize = 8;
/// Number of bytes per bool
pub const BOOL_LEN: usize = 1;
/// Number of bytes used for the codec version prefix
pub const VERSION_SIZE: usize = SHORT_LEN;
/// Number of bytes per IP endpoint (16 address bytes + 2 port bytes)
pub const IP_LEN: usize = 16 + SHORT_LEN;

/// Longest text that fits behind a 2-byte length prefix
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Longest byte string accepted behind a 4-byte length prefix.
/// Lengths above this are negative when read as a signed 32-bit length.
pub const MAX_BYTES_LEN: usize = i32::MAX as usize;

/// Default cap on the bytes a single encode may produce (1 MiB)
pub const DEFAULT_MAX_SIZE: usize = 1024 * 1024;

/// Initial allocation for a fresh packer; grows on demand up to its max size
const INITIAL_CAPACITY: usize = 1024;

/// Packed length of a string (2-byte length prefix + string bytes)
pub fn string_len(s: &str) -> usize {
    SHORT_LEN + s.len()
}

/// Growable write cursor with a sticky first error.
#[derive(Debug)]
pub struct Packer {
    bytes: BytesMut,
    max_size: usize,
    err: Option<CodecError>,
}

impl Default for Packer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl Packer {
    /// Create a packer that refuses to grow beyond `max_size` bytes
    pub fn new(max_size: usize) -> Self {
        Self {
            bytes: BytesMut::with_capacity(max_size.min(INITIAL_CAPACITY)),
            max_size,
            err: None,
        }
    }

    /// Maximum number of bytes this packer will hold
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Bytes written so far (the write offset)
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// View of the bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns true once any operation has failed
    pub fn errored(&self) -> bool {
        self.err.is_some()
    }

    /// The first error recorded on this packer, if any
    pub fn error(&self) -> Option<&CodecError> {
        self.err.as_ref()
    }

    /// `Ok(())` while no error has been recorded, otherwise the first error
    pub fn status(&self) -> Result<()> {
        match &self.err {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Record `err` unless an earlier error is already stored. Returns the
    /// error that is now sticky.
    pub fn fail(&mut self, err: CodecError) -> CodecError {
        self.err.get_or_insert(err).clone()
    }

    /// Consume the packer, yielding the written bytes or the first error
    pub fn finish(self) -> Result<Vec<u8>> {
        self.finish_bytes().map(|bytes| bytes.to_vec())
    }

    /// Like [`Packer::finish`] but hands back the frozen buffer without copying
    pub fn finish_bytes(self) -> Result<Bytes> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self.bytes.freeze()),
        }
    }

    /// Make room for `n` more bytes, doubling capacity when it runs out
    fn reserve(&mut self, n: usize) -> Result<()> {
        self.status()?;
        let needed = match self.bytes.len().checked_add(n) {
            Some(needed) => needed,
            None => return Err(self.fail(CodecError::Overflow)),
        };
        if needed > self.max_size {
            return Err(self.fail(CodecError::MaxSizeExceeded {
                needed,
                limit: self.max_size,
            }));
        }
        if needed > self.bytes.capacity() {
            let target = self
                .bytes
                .capacity()
                .saturating_mul(2)
                .max(needed)
                .min(self.max_size);
            self.bytes.reserve(target - self.bytes.len());
        }
        Ok(())
    }

    /// Append `val` with no length prefix
    pub fn try_write_fixed(&mut self, val: &[u8]) -> Result<()> {
        self.reserve(val.len())?;
        self.bytes.put_slice(val);
        Ok(())
    }

    pub fn try_write_u8(&mut self, val: u8) -> Result<()> {
        self.reserve(BYTE_LEN)?;
        self.bytes.put_u8(val);
        Ok(())
    }

    pub fn try_write_u16(&mut self, val: u16) -> Result<()> {
        self.reserve(SHORT_LEN)?;
        self.bytes.put_u16(val);
        Ok(())
    }

    pub fn try_write_u32(&mut self, val: u32) -> Result<()> {
        self.reserve(INT_LEN)?;
        self.bytes.put_u32(val);
        Ok(())
    }

    pub fn try_write_u64(&mut self, val: u64) -> Result<()> {
        self.reserve(LONG_LEN)?;
        self.bytes.put_u64(val);
        Ok(())
    }

    pub fn try_write_bool(&mut self, val: bool) -> Result<()> {
        self.try_write_u8(u8::from(val))
    }

    /// Append a 4-byte length followed by the raw bytes
    ///
    /// # Errors
    /// `Overflow` if `val` is longer than [`MAX_BYTES_LEN`]
    pub fn try_write_bytes(&mut self, val: &[u8]) -> Result<()> {
        self.status()?;
        if val.len() > MAX_BYTES_LEN {
            return Err(self.fail(CodecError::Overflow));
        }
        self.try_write_u32(val.len() as u32)?;
        self.try_write_fixed(val)
    }

    /// Append a 2-byte length followed by the UTF-8 bytes of `val`
    ///
    /// # Errors
    /// `BadLength` if the encoded text is longer than [`MAX_STRING_LEN`]
    pub fn try_write_str(&mut self, val: &str) -> Result<()> {
        self.status()?;
        if val.len() > MAX_STRING_LEN {
            return Err(self.fail(CodecError::BadLength));
        }
        self.try_write_u16(val.len() as u16)?;
        self.try_write_fixed(val.as_bytes())
    }

    /// Append the raw bytes of a fixed-width identifier
    pub fn try_write_fixed_id<I: FixedId>(&mut self, id: &I) -> Result<()> {
        self.try_write_fixed(id.as_bytes())
    }

    /// Append an endpoint as 16 address bytes plus a 2-byte port
    pub fn try_write_ip(&mut self, endpoint: &Endpoint) -> Result<()> {
        self.try_write_fixed(&endpoint.ip().octets())?;
        self.try_write_u16(endpoint.port())
    }

    pub fn write_fixed(&mut self, val: &[u8]) {
        let _ = self.try_write_fixed(val);
    }

    pub fn write_u8(&mut self, val: u8) {
        let _ = self.try_write_u8(val);
    }

    pub fn write_u16(&mut self, val: u16) {
        let _ = self.try_write_u16(val);
    }

    pub fn write_u32(&mut self, val: u32) {
        let _ = self.try_write_u32(val);
    }

    pub fn write_u64(&mut self, val: u64) {
        let _ = self.try_write_u64(val);
    }

    pub fn write_bool(&mut self, val: bool) {
        let _ = self.try_write_bool(val);
    }

    pub fn write_bytes(&mut self, val: &[u8]) {
        let _ = self.try_write_bytes(val);
    }

    pub fn write_str(&mut self, val: &str) {
        let _ = self.try_write_str(val);
    }

    pub fn write_fixed_id<I: FixedId>(&mut self, id: &I) {
        let _ = self.try_write_fixed_id(id);
    }

    pub fn write_ip(&mut self, endpoint: &Endpoint) {
        let _ = self.try_write_ip(endpoint);
    }
}

/// Forward-only read cursor over a borrowed buffer, with a sticky first error.
#[derive(Debug)]
pub struct Unpacker<'a> {
    bytes: &'a [u8],
    offset: usize,
    depth: usize,
    err: Option<CodecError>,
}

impl<'a> Unpacker<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            depth: 0,
            err: None,
        }
    }

    /// Number of nested containers currently being decoded
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Step into a nested container, failing once more than `max_depth`
    /// containers are open at the same time.
    pub fn enter(&mut self, max_depth: usize) -> Result<()> {
        self.status()?;
        if self.depth >= max_depth {
            return Err(self.fail(CodecError::MaxDepthExceeded { max: max_depth }));
        }
        self.depth += 1;
        Ok(())
    }

    /// Step back out of a container opened with [`Unpacker::enter`]
    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Buffer length minus the current offset
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn errored(&self) -> bool {
        self.err.is_some()
    }

    pub fn error(&self) -> Option<&CodecError> {
        self.err.as_ref()
    }

    pub fn status(&self) -> Result<()> {
        match &self.err {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Record `err` unless an earlier error is already stored
    pub fn fail(&mut self, err: CodecError) -> CodecError {
        self.err.get_or_insert(err).clone()
    }

    /// Consume the unpacker, reporting the first error if one occurred
    pub fn finish(self) -> Result<()> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Borrow the next `n` bytes and advance past them
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.status()?;
        if n > self.remaining() {
            return Err(self.fail(CodecError::InsufficientLength));
        }
        let bytes = self.bytes;
        let slice = &bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    pub fn try_read_u8(&mut self) -> Result<u8> {
        Ok(self.take(BYTE_LEN)?.get_u8())
    }

    pub fn try_read_u16(&mut self) -> Result<u16> {
        Ok(self.take(SHORT_LEN)?.get_u16())
    }

    pub fn try_read_u32(&mut self) -> Result<u32> {
        Ok(self.take(INT_LEN)?.get_u32())
    }

    pub fn try_read_u64(&mut self) -> Result<u64> {
        Ok(self.take(LONG_LEN)?.get_u64())
    }

    /// Reads one byte; any nonzero value is `true`
    pub fn try_read_bool(&mut self) -> Result<bool> {
        Ok(self.try_read_u8()? != 0)
    }

    /// Copy out exactly `n` raw bytes
    pub fn try_read_fixed(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    /// Read a 4-byte length and that many raw bytes
    ///
    /// # Errors
    /// - `InsufficientLength` if the buffer ends early
    /// - `NegativeLength` if the length is above [`MAX_BYTES_LEN`]
    pub fn try_read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.try_read_u32()? as usize;
        if len > MAX_BYTES_LEN {
            return Err(self.fail(CodecError::NegativeLength));
        }
        self.try_read_fixed(len)
    }

    /// Read a 2-byte length and that many bytes of UTF-8 text
    pub fn try_read_str(&mut self) -> Result<String> {
        let len = self.try_read_u16()? as usize;
        let raw = self.take(len)?;
        match std::str::from_utf8(raw) {
            Ok(text) => Ok(text.to_owned()),
            Err(_) => Err(self.fail(CodecError::InvalidUtf8)),
        }
    }

    /// Read `I::LEN` raw bytes and parse them into an identifier
    pub fn try_read_fixed_id<I: FixedId>(&mut self) -> Result<I> {
        let raw = self.take(I::LEN)?;
        I::from_slice(raw).map_err(|e| self.fail(e))
    }

    /// Read an endpoint written by [`Packer::try_write_ip`]
    pub fn try_read_ip(&mut self) -> Result<Endpoint> {
        let raw = self.take(16)?;
        let mut octets = [0u8; 16];
        octets.copy_from_slice(raw);
        let port = self.try_read_u16()?;
        Ok(Endpoint::from_wire(octets, port))
    }

    pub fn read_u8(&mut self) -> u8 {
        self.try_read_u8().unwrap_or_default()
    }

    pub fn read_u16(&mut self) -> u16 {
        self.try_read_u16().unwrap_or_default()
    }

    pub fn read_u32(&mut self) -> u32 {
        self.try_read_u32().unwrap_or_default()
    }

    pub fn read_u64(&mut self) -> u64 {
        self.try_read_u64().unwrap_or_default()
    }

    pub fn read_bool(&mut self) -> bool {
        self.try_read_bool().unwrap_or_default()
    }

    pub fn read_fixed(&mut self, n: usize) -> Vec<u8> {
        self.try_read_fixed(n).unwrap_or_default()
    }

    pub fn read_bytes(&mut self) -> Vec<u8> {
        self.try_read_bytes().unwrap_or_default()
    }

    pub fn read_str(&mut self) -> String {
        self.try_read_str().unwrap_or_default()
    }

    pub fn read_fixed_id<I: FixedId + Default>(&mut self) -> I {
        self.try_read_fixed_id().unwrap_or_default()
    }

    pub fn read_ip(&mut self) -> Endpoint {
        self.try_read_ip().unwrap_or_default()
    }
}
