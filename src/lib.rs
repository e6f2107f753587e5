//! # Versioned Codec
//!
//! A self-describing, versioned binary wire format for structured values.
//!
//! ## Layers
//! - [`core::packer`]: bounds-checked big-endian cursors with a sticky first error
//! - [`core::serialization`]: the [`Encodable`] capability, implemented per shape
//! - [`protocol::registry`]: stable integer tags for polymorphic values
//! - [`protocol::manager`]: a 2-byte version prefix selecting the codec
//!
//! ## Example
//! ```rust
//! use versioned_codec::{record, CodecManager, LinearCodec};
//!
//! record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Counter {
//!         pub count: u32,
//!         pub label: String,
//!     }
//! }
//!
//! # fn main() -> versioned_codec::Result<()> {
//! let manager = CodecManager::default();
//! manager.register_codec(1, LinearCodec::default())?;
//!
//! let value = Counter { count: 7, label: "ok".into() };
//! let bytes = manager.marshal(1, &value)?;
//! assert_eq!(bytes, [0x00, 0x01, 0x00, 0x00, 0x00, 0x07, 0x00, 0x02, b'o', b'k']);
//!
//! let mut decoded = Counter::default();
//! assert_eq!(manager.unmarshal(&bytes, &mut decoded)?, 1);
//! assert_eq!(decoded, value);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use crate::config::CodecConfig;
pub use crate::core::endpoint::Endpoint;
pub use crate::core::ids::{FixedId, Id};
pub use crate::core::packer::{Packer, Unpacker};
pub use crate::core::serialization::Encodable;
pub use crate::error::{CodecError, Result};
pub use crate::protocol::linear::LinearCodec;
pub use crate::protocol::manager::CodecManager;
pub use crate::protocol::registry::{Poly, Registrable, TypeRegistry};
