//! # Error Types
//!
//! Error handling for the versioned codec.
//!
//! Every failure the codec can produce is a variant of [`CodecError`]. None of
//! them are fatal: each one is handed back to the immediate caller, and a
//! failing encode or decode never yields partial output.
//!
//! ## Error Categories
//! - **Buffer-bounds errors**: insufficient bytes, invalid lengths, overflow, size cap
//! - **Shape errors**: unsupported shapes, oversized sequences, absent references
//! - **Registry errors**: duplicate registration, unknown type or tag
//! - **Version errors**: duplicate version, unknown version, missing version prefix
//!
//! `CodecError` is `Clone` so a sticky cursor error can be surfaced again to
//! every later operation on that cursor.
//!
//! ## Example Usage
//! ```rust
//! use versioned_codec::error::{CodecError, Result};
//! use versioned_codec::core::packer::Unpacker;
//! use tracing::error;
//!
//! fn read_count(bytes: &[u8]) -> Result<u32> {
//!     let mut unpacker = Unpacker::new(bytes);
//!     unpacker.try_read_u32()
//! }
//!
//! match read_count(&[0x00, 0x01]) {
//!     Err(CodecError::InsufficientLength) => {}
//!     Err(e) => error!(error = %e, "unexpected failure"),
//!     Ok(_) => unreachable!(),
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error message constants shared by the lock-guarded tables.
pub mod constants {
    pub const ERR_REGISTRY_WRITE_LOCK: &str = "Failed to acquire write lock on type registry";
    pub const ERR_REGISTRY_READ_LOCK: &str = "Failed to acquire read lock on type registry";
    pub const ERR_MANAGER_WRITE_LOCK: &str = "Failed to acquire write lock on codec table";
    pub const ERR_MANAGER_READ_LOCK: &str = "Failed to acquire read lock on codec table";
}

// CodecError is the single error type for all codec operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodecError {
    #[error("packing: insufficient length")]
    InsufficientLength,

    #[error("packing: negative length")]
    NegativeLength,

    #[error("packing: bad length")]
    BadLength,

    #[error("packing: overflow")]
    Overflow,

    #[error("packing: text is not valid UTF-8")]
    InvalidUtf8,

    #[error("packing: buffer would grow to {needed} bytes (limit {limit})")]
    MaxSizeExceeded { needed: usize, limit: usize },

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("max slice length exceeded: {len} > {max}")]
    MaxSliceLenExceeded { len: usize, max: usize },

    #[error("max nesting depth exceeded: {max}")]
    MaxDepthExceeded { max: usize },

    #[error("can't marshal zero length value")]
    MarshalZeroLength,

    #[error("can't register type: {0} already registered")]
    CantRegisterType(String),

    #[error("type not found: {0}")]
    TypeNotFound(String),

    #[error("duplicate type registration: codec version {0}")]
    DuplicateType(u16),

    #[error("couldn't pack codec version")]
    CantPackVersion,

    #[error("couldn't unpack codec version")]
    CantUnpackVersion,

    #[error("unknown codec version: {0}")]
    UnknownVersion(u16),

    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),

    /// A payload whose version was parsed but whose body failed to decode
    #[error("codec version {version}: {source}")]
    Decode {
        version: u16,
        source: Box<CodecError>,
    },

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CodecError {
    /// Version of the payload the error belongs to, when one was parsed
    pub fn version(&self) -> Option<u16> {
        match self {
            CodecError::UnknownVersion(version) | CodecError::Decode { version, .. } => {
                Some(*version)
            }
            _ => None,
        }
    }

    /// The underlying failure with any version context removed
    pub fn root(&self) -> &CodecError {
        match self {
            CodecError::Decode { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Type alias for Results using CodecError
pub type Result<T> = std::result::Result<T, CodecError>;
