//! # Core Wire Components
//!
//! Byte-level cursors, fixed-width identifiers and the shape-driven
//! [`Encodable`](serialization::Encodable) capability.
//!
//! ## Components
//! - **Packer / Unpacker**: big-endian cursors with a sticky first error
//! - **Ids**: raw fixed-width identifiers
//! - **Endpoint**: IP address and port in their 18-byte wire shape
//! - **Serialization**: `Encodable` impls for every supported shape
//! - **Macros**: `record!` for structs encoded field by field
//!
//! ## Security
//! - Every read is bounds-checked before the cursor moves
//! - Encoders stop at a configurable maximum size (default 1 MiB)
//! - Sequence counts are checked against the codec's bound before allocation
//! - Decoding stops at a configurable nesting depth (default 128)

#[macro_use]
mod macros;

pub mod endpoint;
pub mod ids;
pub mod packer;
pub mod serialization;
