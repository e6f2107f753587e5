//! # Codec Manager
//!
//! Routes payloads to the [`LinearCodec`] registered for their version.
//!
//! Every payload starts with a 2-byte big-endian version. `marshal` writes it
//! before the value; `unmarshal` reads it first and hands the rest of the
//! buffer to the matching codec.
//!
//! ```text
//! [Version(2)] [Codec payload(N)]
//! ```
//!
//! Registration takes the table's write lock; marshal and unmarshal only take
//! the read lock long enough to clone the codec handle.

use crate::config::CodecConfig;
use crate::core::packer::{Packer, Unpacker, DEFAULT_MAX_SIZE, VERSION_SIZE};
use crate::core::serialization::Encodable;
use crate::error::{constants, CodecError, Result};
use crate::protocol::linear::LinearCodec;
use crate::utils::metrics::CodecMetrics;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use tracing::{debug, trace, warn};

/// Versioned codec table.
pub struct CodecManager {
    max_size: usize,
    allow_trailing_bytes: bool,
    codecs: Arc<RwLock<HashMap<u16, Arc<LinearCodec>>>>,
    metrics: CodecMetrics,
}

impl Default for CodecManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl CodecManager {
    /// Manager whose encoded payloads may not exceed `max_size` bytes.
    ///
    /// `max_size` is a hard cap: a `marshal` whose output would grow past it
    /// fails with `MaxSizeExceeded`. This differs from Go-style packers where
    /// the size only sets the initial capacity and the buffer keeps growing,
    /// so pick a value that covers the largest payload you expect to send.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            allow_trailing_bytes: true,
            codecs: Arc::new(RwLock::new(HashMap::new())),
            metrics: CodecMetrics::new(),
        }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::new(config.max_size).with_trailing_bytes(config.allow_trailing_bytes)
    }

    /// Whether `unmarshal` tolerates bytes left over after the value
    pub fn with_trailing_bytes(mut self, allow: bool) -> Self {
        self.allow_trailing_bytes = allow;
        self
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn metrics(&self) -> &CodecMetrics {
        &self.metrics
    }

    /// Bind `codec` to `version`.
    ///
    /// # Errors
    /// `DuplicateType` if the version already has a codec
    pub fn register_codec(&self, version: u16, codec: impl Into<Arc<LinearCodec>>) -> Result<()> {
        let mut codecs = self.codecs.write().map_err(|_| {
            CodecError::LockPoisoned(constants::ERR_MANAGER_WRITE_LOCK.to_string())
        })?;

        if codecs.contains_key(&version) {
            warn!(version, "Rejected duplicate codec version");
            return Err(CodecError::DuplicateType(version));
        }
        codecs.insert(version, codec.into());

        debug!(version, "Registered codec version");
        Ok(())
    }

    /// Codec bound to `version`
    pub fn codec(&self, version: u16) -> Result<Arc<LinearCodec>> {
        let codecs = self.read()?;

        match codecs.get(&version) {
            Some(codec) => Ok(Arc::clone(codec)),
            None => {
                self.metrics.unknown_version();
                Err(CodecError::UnknownVersion(version))
            }
        }
    }

    pub fn has_version(&self, version: u16) -> Result<bool> {
        Ok(self.read()?.contains_key(&version))
    }

    /// Registered versions in ascending order
    pub fn versions(&self) -> Result<Vec<u16>> {
        let mut versions: Vec<u16> = self.read()?.keys().copied().collect();
        versions.sort_unstable();
        Ok(versions)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<u16, Arc<LinearCodec>>>> {
        self.codecs
            .read()
            .map_err(|_| CodecError::LockPoisoned(constants::ERR_MANAGER_READ_LOCK.to_string()))
    }

    /// Encode `value` with the codec for `version`, prefixed by the version.
    ///
    /// # Errors
    /// - `UnknownVersion` if no codec is bound to `version`
    /// - `CantPackVersion` if the version prefix itself cannot be written
    /// - any error from the codec, unchanged
    pub fn marshal<T: Encodable>(&self, version: u16, value: &T) -> Result<Vec<u8>> {
        let result = self.marshal_inner(version, value);
        match &result {
            Ok(bytes) => {
                self.metrics.marshal_success(bytes.len() as u64);
                trace!(version, len = bytes.len(), "Marshalled payload");
            }
            Err(e) => {
                self.metrics.marshal_failure();
                trace!(version, error = %e, "Marshal failed");
            }
        }
        result
    }

    fn marshal_inner<T: Encodable>(&self, version: u16, value: &T) -> Result<Vec<u8>> {
        let codec = self.codec(version)?;

        let mut packer = Packer::new(self.max_size);
        if packer.try_write_u16(version).is_err() {
            return Err(CodecError::CantPackVersion);
        }

        codec.marshal_into(value, &mut packer)?;
        packer.finish()
    }

    /// Decode `bytes` into `dest`, returning the payload's version.
    ///
    /// `dest` is only overwritten when decoding succeeds. Every error raised
    /// after the version was parsed carries it; see [`CodecError::version`].
    ///
    /// # Errors
    /// - `CantUnpackVersion` if fewer than 2 bytes are supplied
    /// - `UnknownVersion(v)` carrying the parsed version if no codec is bound to it
    /// - `Decode { version, source }` wrapping any codec error, or
    ///   `TrailingBytes` if trailing bytes are disallowed and some remain
    pub fn unmarshal<T: Encodable>(&self, bytes: &[u8], dest: &mut T) -> Result<u16> {
        let (version, value) = self.decode(bytes)?;
        *dest = value;
        Ok(version)
    }

    /// Decode `bytes` into a fresh value, returning it with the payload's version
    pub fn decode<T: Encodable>(&self, bytes: &[u8]) -> Result<(u16, T)> {
        let result = self.decode_inner(bytes);
        match &result {
            Ok((version, _)) => {
                self.metrics.unmarshal_success(bytes.len() as u64);
                trace!(version, len = bytes.len(), "Unmarshalled payload");
            }
            Err(e) => {
                self.metrics.unmarshal_failure();
                trace!(version = ?e.version(), len = bytes.len(), error = %e, "Unmarshal failed");
            }
        }
        result
    }

    fn decode_inner<T: Encodable>(&self, bytes: &[u8]) -> Result<(u16, T)> {
        let version = Self::peek_version(bytes)?;
        let codec = self.codec(version)?;

        let decode_body = || -> Result<T> {
            let mut unpacker = Unpacker::new(&bytes[VERSION_SIZE..]);
            let value = codec.unmarshal_from(&mut unpacker)?;

            let remaining = unpacker.remaining();
            if !self.allow_trailing_bytes && remaining > 0 {
                return Err(CodecError::TrailingBytes(remaining));
            }
            Ok(value)
        };

        decode_body()
            .map(|value| (version, value))
            .map_err(|source| CodecError::Decode {
                version,
                source: Box::new(source),
            })
    }

    /// Read the version prefix without decoding the payload
    pub fn peek_version(bytes: &[u8]) -> Result<u16> {
        if bytes.len() < VERSION_SIZE {
            return Err(CodecError::CantUnpackVersion);
        }
        Unpacker::new(bytes)
            .try_read_u16()
            .map_err(|_| CodecError::CantUnpackVersion)
    }

    /// Encoded length of `value` under `version`, including the 2-byte prefix
    pub fn size<T: Encodable>(&self, version: u16, value: &T) -> Result<usize> {
        let codec = self.codec(version)?;
        Ok(VERSION_SIZE + codec.size(value)?)
    }
}

impl std::fmt::Debug for CodecManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecManager")
            .field("max_size", &self.max_size)
            .field("allow_trailing_bytes", &self.allow_trailing_bytes)
            .field("versions", &self.versions().ok())
            .finish()
    }
}
