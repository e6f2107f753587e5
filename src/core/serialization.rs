//! # Shape-Driven Serialization
//!
//! [`Encodable`] is the capability every value on the wire implements. The
//! implementation for a type follows from its shape alone:
//!
//! | Shape | Encoding |
//! |---|---|
//! | `bool` | 1 byte, 1/0 |
//! | `u8..u64`, `i8..i64` | big-endian fixed width, signed as bit pattern |
//! | `String` | length:u16, bytes |
//! | `Vec<T>` | count:u32, each element |
//! | `[T; N]` | each element, no prefix |
//! | tuples, [`record!`](crate::record) structs | each field in order |
//! | `Box<T>` | the pointee |
//! | `Option<Box<T>>` | the pointee; `None` fails with `MarshalZeroLength` |
//! | [`Poly`](crate::protocol::registry::Poly) | tag:u32, the concrete value |
//! | [`Endpoint`] | addr:16, port:u16 |
//!
//! Decoding mirrors encoding field for field, and `encoded_size` walks the
//! same shape without writing anything.
//!
//! Floats, platform-width integers and maps have no wire form. They implement
//! the trait only to fail with `UnsupportedType`, so a record embedding one
//! still builds and is rejected when it is encoded.
//!
//! An empty `Vec` and a `Vec` that was never filled encode identically as a
//! zero count; the wire carries no "absent" marker.

use crate::core::endpoint::Endpoint;
use crate::core::ids::{FixedId, Id};
use crate::core::packer::{
    string_len, Packer, Unpacker, BOOL_LEN, BYTE_LEN, INT_LEN, IP_LEN, LONG_LEN, SHORT_LEN,
};
use crate::error::{CodecError, Result};
use crate::protocol::linear::LinearCodec;
use std::collections::{BTreeMap, HashMap};

/// A value with a wire representation.
///
/// `encoded_size` must return exactly the number of bytes `encode` writes.
pub trait Encodable: Sized {
    /// Append the wire form of `self` to `packer`
    fn encode(&self, codec: &LinearCodec, packer: &mut Packer) -> Result<()>;

    /// Read a fresh value from `unpacker`
    fn decode(codec: &LinearCodec, unpacker: &mut Unpacker<'_>) -> Result<Self>;

    /// Number of bytes `encode` would write
    fn encoded_size(&self, codec: &LinearCodec) -> Result<usize>;
}

macro_rules! impl_unsigned {
    ($($ty:ty => $write:ident, $read:ident, $len:expr;)*) => {$(
        impl Encodable for $ty {
            fn encode(&self, _codec: &LinearCodec, packer: &mut Packer) -> Result<()> {
                packer.$write(*self)
            }

            fn decode(_codec: &LinearCodec, unpacker: &mut Unpacker<'_>) -> Result<Self> {
                unpacker.$read()
            }

            fn encoded_size(&self, _codec: &LinearCodec) -> Result<usize> {
                Ok($len)
            }
        }
    )*};
}

// Signed integers reuse the unsigned encoding of the same width.
macro_rules! impl_signed {
    ($($ty:ty as $wire:ty => $write:ident, $read:ident, $len:expr;)*) => {$(
        impl Encodable for $ty {
            fn encode(&self, _codec: &LinearCodec, packer: &mut Packer) -> Result<()> {
                packer.$write(*self as $wire)
            }

            fn decode(_codec: &LinearCodec, unpacker: &mut Unpacker<'_>) -> Result<Self> {
                Ok(unpacker.$read()? as $ty)
            }

            fn encoded_size(&self, _codec: &LinearCodec) -> Result<usize> {
                Ok($len)
            }
        }
    )*};
}

impl_unsigned! {
    u8 => try_write_u8, try_read_u8, BYTE_LEN;
    u16 => try_write_u16, try_read_u16, SHORT_LEN;
    u32 => try_write_u32, try_read_u32, INT_LEN;
    u64 => try_write_u64, try_read_u64, LONG_LEN;
    bool => try_write_bool, try_read_bool, BOOL_LEN;
}

impl_signed! {
    i8 as u8 => try_write_u8, try_read_u8, BYTE_LEN;
    i16 as u16 => try_write_u16, try_read_u16, SHORT_LEN;
    i32 as u32 => try_write_u32, try_read_u32, INT_LEN;
    i64 as u64 => try_write_u64, try_read_u64, LONG_LEN;
}

impl Encodable for String {
    fn encode(&self, _codec: &LinearCodec, packer: &mut Packer) -> Result<()> {
        packer.try_write_str(self)
    }

    fn decode(_codec: &LinearCodec, unpacker: &mut Unpacker<'_>) -> Result<Self> {
        unpacker.try_read_str()
    }

    fn encoded_size(&self, _codec: &LinearCodec) -> Result<usize> {
        Ok(string_len(self))
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn encode(&self, codec: &LinearCodec, packer: &mut Packer) -> Result<()> {
        codec.check_slice_len(self.len())?;
        let count = u32::try_from(self.len()).map_err(|_| CodecError::Overflow)?;
        packer.try_write_u32(count)?;
        for item in self {
            item.encode(codec, packer)?;
        }
        Ok(())
    }

    fn decode(codec: &LinearCodec, unpacker: &mut Unpacker<'_>) -> Result<Self> {
        codec.decode_nested(unpacker, |unpacker| {
            let count = unpacker.try_read_u32()? as usize;
            codec.check_slice_len(count)?;
            // every element takes at least one byte unless it is zero-sized
            let mut items = Vec::with_capacity(count.min(unpacker.remaining()));
            for _ in 0..count {
                items.push(T::decode(codec, unpacker)?);
            }
            Ok(items)
        })
    }

    fn encoded_size(&self, codec: &LinearCodec) -> Result<usize> {
        codec.check_slice_len(self.len())?;
        self.iter()
            .try_fold(INT_LEN, |size, item| -> Result<usize> {
                Ok(size + item.encoded_size(codec)?)
            })
    }
}

impl<T: Encodable, const N: usize> Encodable for [T; N] {
    fn encode(&self, codec: &LinearCodec, packer: &mut Packer) -> Result<()> {
        for item in self {
            item.encode(codec, packer)?;
        }
        Ok(())
    }

    fn decode(codec: &LinearCodec, unpacker: &mut Unpacker<'_>) -> Result<Self> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::decode(codec, unpacker)?);
        }
        items
            .try_into()
            .map_err(|_| CodecError::UnsupportedType(std::any::type_name::<Self>().to_owned()))
    }

    fn encoded_size(&self, codec: &LinearCodec) -> Result<usize> {
        self.iter().try_fold(0, |size, item| -> Result<usize> {
            Ok(size + item.encoded_size(codec)?)
        })
    }
}

impl<T: Encodable> Encodable for Box<T> {
    fn encode(&self, codec: &LinearCodec, packer: &mut Packer) -> Result<()> {
        (**self).encode(codec, packer)
    }

    fn decode(codec: &LinearCodec, unpacker: &mut Unpacker<'_>) -> Result<Self> {
        codec.decode_nested(unpacker, |unpacker| T::decode(codec, unpacker).map(Box::new))
    }

    fn encoded_size(&self, codec: &LinearCodec) -> Result<usize> {
        (**self).encoded_size(codec)
    }
}

/// A nullable reference. There is no wire form for `None`, so encoding or
/// sizing it fails; decoding always produces `Some`.
impl<T: Encodable> Encodable for Option<Box<T>> {
    fn encode(&self, codec: &LinearCodec, packer: &mut Packer) -> Result<()> {
        match self {
            Some(inner) => inner.encode(codec, packer),
            None => Err(CodecError::MarshalZeroLength),
        }
    }

    fn decode(codec: &LinearCodec, unpacker: &mut Unpacker<'_>) -> Result<Self> {
        Box::<T>::decode(codec, unpacker).map(Some)
    }

    fn encoded_size(&self, codec: &LinearCodec) -> Result<usize> {
        match self {
            Some(inner) => inner.encoded_size(codec),
            None => Err(CodecError::MarshalZeroLength),
        }
    }
}

impl Encodable for () {
    fn encode(&self, _codec: &LinearCodec, _packer: &mut Packer) -> Result<()> {
        Ok(())
    }

    fn decode(_codec: &LinearCodec, _unpacker: &mut Unpacker<'_>) -> Result<Self> {
        Ok(())
    }

    fn encoded_size(&self, _codec: &LinearCodec) -> Result<usize> {
        Ok(0)
    }
}

macro_rules! impl_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Encodable),+> Encodable for ($($name,)+) {
            fn encode(&self, codec: &LinearCodec, packer: &mut Packer) -> Result<()> {
                $(self.$idx.encode(codec, packer)?;)+
                Ok(())
            }

            fn decode(codec: &LinearCodec, unpacker: &mut Unpacker<'_>) -> Result<Self> {
                Ok(($($name::decode(codec, unpacker)?,)+))
            }

            fn encoded_size(&self, codec: &LinearCodec) -> Result<usize> {
                Ok(0 $(+ self.$idx.encoded_size(codec)?)+)
            }
        }
    };
}

impl_tuple!(A: 0);
impl_tuple!(A: 0, B: 1);
impl_tuple!(A: 0, B: 1, C: 2);
impl_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

impl Encodable for Id {
    fn encode(&self, _codec: &LinearCodec, packer: &mut Packer) -> Result<()> {
        packer.try_write_fixed_id(self)
    }

    fn decode(_codec: &LinearCodec, unpacker: &mut Unpacker<'_>) -> Result<Self> {
        unpacker.try_read_fixed_id()
    }

    fn encoded_size(&self, _codec: &LinearCodec) -> Result<usize> {
        Ok(<Id as FixedId>::LEN)
    }
}

impl Encodable for Endpoint {
    fn encode(&self, _codec: &LinearCodec, packer: &mut Packer) -> Result<()> {
        packer.try_write_ip(self)
    }

    fn decode(_codec: &LinearCodec, unpacker: &mut Unpacker<'_>) -> Result<Self> {
        unpacker.try_read_ip()
    }

    fn encoded_size(&self, _codec: &LinearCodec) -> Result<usize> {
        Ok(IP_LEN)
    }
}

fn unsupported<T>() -> CodecError {
    CodecError::UnsupportedType(std::any::type_name::<T>().to_owned())
}

macro_rules! impl_unsupported {
    ($([$($generics:tt)*] $ty:ty;)*) => {$(
        impl<$($generics)*> Encodable for $ty {
            fn encode(&self, _codec: &LinearCodec, _packer: &mut Packer) -> Result<()> {
                Err(unsupported::<Self>())
            }

            fn decode(_codec: &LinearCodec, _unpacker: &mut Unpacker<'_>) -> Result<Self> {
                Err(unsupported::<Self>())
            }

            fn encoded_size(&self, _codec: &LinearCodec) -> Result<usize> {
                Err(unsupported::<Self>())
            }
        }
    )*};
}

impl_unsupported! {
    [] f32;
    [] f64;
    [] usize;
    [] isize;
    [K, V, S] HashMap<K, V, S>;
    [K, V] BTreeMap<K, V>;
}
