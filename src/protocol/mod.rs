//! # Codec Layer
//!
//! Version dispatch and polymorphic type tagging on top of the core cursors.
//!
//! ## Components
//! - **LinearCodec**: one transcoder instance (sequence bound + type registry)
//! - **TypeRegistry**: tag <-> concrete type table for [`Poly`](registry::Poly) values
//! - **CodecManager**: version-prefixed marshal/unmarshal across codecs
//!
//! ## Wire Format
//! ```text
//! [Version(2)] [Payload(N)]
//! Polymorphic value := [Tag(4)] [Concrete value]
//! ```

pub mod linear;
pub mod manager;
pub mod registry;
