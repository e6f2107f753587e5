//! # Type Registry
//!
//! Polymorphic values travel as a 4-byte tag followed by the concrete value.
//! The registry maps each concrete type to its tag and each tag back to a
//! decoder for that type.
//!
//! Tags are handed out densely in registration order starting at 0.
//! [`TypeRegistry::skip`] reserves tags without binding them, so numbering can
//! stay stable when a type is retired. Tags are never reused.
//!
//! Registration takes the write lock; every encode and decode lookup takes the
//! read lock and releases it before recursing into the concrete value.

use crate::core::packer::{Packer, Unpacker, INT_LEN};
use crate::core::serialization::Encodable;
use crate::error::{constants, CodecError, Result};
use crate::protocol::linear::LinearCodec;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use tracing::{debug, warn};

/// Object-safe view of a concrete type that can sit behind a [`Poly`].
///
/// Implemented automatically for every `Encodable + Clone + PartialEq +
/// Debug + Send + Sync + 'static` type.
pub trait Registrable: Any + Send + Sync + fmt::Debug {
    fn encode_dyn(&self, codec: &LinearCodec, packer: &mut Packer) -> Result<()>;
    fn size_dyn(&self, codec: &LinearCodec) -> Result<usize>;
    fn concrete_type(&self) -> TypeId;
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn clone_box(&self) -> Box<dyn Registrable>;
    fn eq_dyn(&self, other: &dyn Registrable) -> bool;
}

impl<T> Registrable for T
where
    T: Encodable + Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn encode_dyn(&self, codec: &LinearCodec, packer: &mut Packer) -> Result<()> {
        self.encode(codec, packer)
    }

    fn size_dyn(&self, codec: &LinearCodec) -> Result<usize> {
        self.encoded_size(codec)
    }

    fn concrete_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn Registrable> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn Registrable) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// A value of any registered type.
///
/// On the wire: `tag:u32 | concrete-value`.
pub struct Poly(Box<dyn Registrable>);

impl Poly {
    pub fn new<T: Registrable>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Borrow the concrete value if it is a `T`
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    /// Name of the concrete type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    pub fn as_dyn(&self) -> &dyn Registrable {
        &*self.0
    }
}

impl Clone for Poly {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl PartialEq for Poly {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dyn(&*other.0)
    }
}

impl fmt::Debug for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Poly").field(&self.0).finish()
    }
}

impl Encodable for Poly {
    fn encode(&self, codec: &LinearCodec, packer: &mut Packer) -> Result<()> {
        let tag = codec
            .registry()
            .tag_for(self.0.concrete_type(), self.0.type_name())?;
        packer.try_write_u32(tag)?;
        self.0.encode_dyn(codec, packer)
    }

    fn decode(codec: &LinearCodec, unpacker: &mut Unpacker<'_>) -> Result<Self> {
        codec.decode_nested(unpacker, |unpacker| {
            let tag = unpacker.try_read_u32()?;
            let decode = codec.registry().decoder(tag)?;
            decode(codec, unpacker)
        })
    }

    fn encoded_size(&self, codec: &LinearCodec) -> Result<usize> {
        Ok(INT_LEN + self.0.size_dyn(codec)?)
    }
}

/// A nullable polymorphic reference; `None` has no wire form.
impl Encodable for Option<Poly> {
    fn encode(&self, codec: &LinearCodec, packer: &mut Packer) -> Result<()> {
        match self {
            Some(value) => value.encode(codec, packer),
            None => Err(CodecError::MarshalZeroLength),
        }
    }

    fn decode(codec: &LinearCodec, unpacker: &mut Unpacker<'_>) -> Result<Self> {
        Poly::decode(codec, unpacker).map(Some)
    }

    fn encoded_size(&self, codec: &LinearCodec) -> Result<usize> {
        match self {
            Some(value) => value.encoded_size(codec),
            None => Err(CodecError::MarshalZeroLength),
        }
    }
}

type DecodeFn = fn(&LinearCodec, &mut Unpacker<'_>) -> Result<Poly>;

fn decode_as<T: Encodable + Registrable>(
    codec: &LinearCodec,
    unpacker: &mut Unpacker<'_>,
) -> Result<Poly> {
    T::decode(codec, unpacker).map(Poly::new)
}

struct Entry {
    type_name: &'static str,
    decode: DecodeFn,
}

#[derive(Default)]
struct Tables {
    next_tag: u32,
    tags: HashMap<TypeId, u32>,
    entries: HashMap<u32, Entry>,
}

/// Bidirectional map between concrete types and their wire tags.
#[derive(Default)]
pub struct TypeRegistry {
    tables: RwLock<Tables>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `T` to the next free tag and return it.
    ///
    /// # Errors
    /// - `CantRegisterType` if `T` is already registered
    /// - `Overflow` if the tag space is exhausted
    pub fn register<T: Encodable + Registrable>(&self) -> Result<u32> {
        let type_name = std::any::type_name::<T>();
        let mut tables = self.tables.write().map_err(|_| {
            CodecError::LockPoisoned(constants::ERR_REGISTRY_WRITE_LOCK.to_string())
        })?;

        let type_id = TypeId::of::<T>();
        if tables.tags.contains_key(&type_id) {
            warn!(type_name, "Rejected duplicate type registration");
            return Err(CodecError::CantRegisterType(type_name.to_string()));
        }

        let tag = tables.next_tag;
        tables.next_tag = tag.checked_add(1).ok_or(CodecError::Overflow)?;
        tables.tags.insert(type_id, tag);
        tables.entries.insert(
            tag,
            Entry {
                type_name,
                decode: decode_as::<T>,
            },
        );

        debug!(tag, type_name, "Registered type");
        Ok(tag)
    }

    /// Reserve the next `count` tags without binding them
    pub fn skip(&self, count: u32) -> Result<()> {
        let mut tables = self.tables.write().map_err(|_| {
            CodecError::LockPoisoned(constants::ERR_REGISTRY_WRITE_LOCK.to_string())
        })?;
        tables.next_tag = tables
            .next_tag
            .checked_add(count)
            .ok_or(CodecError::Overflow)?;

        debug!(count, next_tag = tables.next_tag, "Skipped type tags");
        Ok(())
    }

    /// Tag bound to `T`
    pub fn tag_of<T: 'static>(&self) -> Result<u32> {
        self.tag_for(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Name of the type bound to `tag`
    pub fn type_name_of(&self, tag: u32) -> Result<&'static str> {
        let tables = self.read()?;
        tables
            .entries
            .get(&tag)
            .map(|entry| entry.type_name)
            .ok_or_else(|| CodecError::TypeNotFound(format!("tag {tag}")))
    }

    /// Tag the next registration will receive
    pub fn next_tag(&self) -> Result<u32> {
        Ok(self.read()?.next_tag)
    }

    /// Number of bound types (reserved tags are not counted)
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.tags.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub(crate) fn tag_for(&self, type_id: TypeId, type_name: &str) -> Result<u32> {
        let tables = self.read()?;
        tables
            .tags
            .get(&type_id)
            .copied()
            .ok_or_else(|| CodecError::TypeNotFound(type_name.to_string()))
    }

    pub(crate) fn decoder(&self, tag: u32) -> Result<DecodeFn> {
        let tables = self.read()?;
        tables
            .entries
            .get(&tag)
            .map(|entry| entry.decode)
            .ok_or_else(|| CodecError::TypeNotFound(format!("tag {tag}")))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| CodecError::LockPoisoned(constants::ERR_REGISTRY_READ_LOCK.to_string()))
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<(u32, &'static str)> = self
            .read()
            .map(|tables| {
                tables
                    .entries
                    .iter()
                    .map(|(tag, entry)| (*tag, entry.type_name))
                    .collect()
            })
            .unwrap_or_default();
        names.sort_unstable_by_key(|(tag, _)| *tag);
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct A;
    #[derive(Debug, Clone, PartialEq)]
    struct B;
    #[derive(Debug, Clone, PartialEq)]
    struct C;
    #[derive(Debug, Clone, PartialEq)]
    struct D;

    macro_rules! unit_encodable {
        ($($ty:ident),*) => {$(
            impl Encodable for $ty {
                fn encode(&self, _: &LinearCodec, _: &mut Packer) -> Result<()> {
                    Ok(())
                }
                fn decode(_: &LinearCodec, _: &mut Unpacker<'_>) -> Result<Self> {
                    Ok($ty)
                }
                fn encoded_size(&self, _: &LinearCodec) -> Result<usize> {
                    Ok(0)
                }
            }
        )*};
    }

    unit_encodable!(A, B, C, D);

    #[test]
    fn test_tags_follow_registration_order() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.register::<A>().unwrap(), 0);
        assert_eq!(registry.register::<B>().unwrap(), 1);
        assert_eq!(registry.register::<C>().unwrap(), 2);
        assert_eq!(registry.len(), Ok(3));

        assert!(matches!(
            registry.register::<A>(),
            Err(CodecError::CantRegisterType(_))
        ));
        // a failed registration does not consume a tag
        assert_eq!(registry.next_tag().unwrap(), 3);
    }

    #[test]
    fn test_skip_reserves_tags() {
        let registry = TypeRegistry::new();
        registry.register::<A>().unwrap();
        registry.register::<B>().unwrap();
        registry.skip(2).unwrap();
        assert_eq!(registry.register::<D>().unwrap(), 4);

        assert!(matches!(
            registry.type_name_of(2),
            Err(CodecError::TypeNotFound(_))
        ));
        assert!(registry.type_name_of(4).unwrap().ends_with("::D"));
    }

    #[test]
    fn test_lookup_both_directions() {
        let registry = TypeRegistry::new();
        registry.register::<B>().unwrap();
        assert_eq!(registry.tag_of::<B>().unwrap(), 0);
        assert!(matches!(
            registry.tag_of::<C>(),
            Err(CodecError::TypeNotFound(_))
        ));
        assert!(registry.decoder(0).is_ok());
        assert!(matches!(
            registry.decoder(9),
            Err(CodecError::TypeNotFound(_))
        ));
    }

    #[test]
    fn test_skip_overflow() {
        let registry = TypeRegistry::new();
        registry.skip(u32::MAX).unwrap();
        assert_eq!(registry.skip(1), Err(CodecError::Overflow));
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let registry = std::sync::Arc::new(TypeRegistry::new());
        registry.register::<A>().unwrap();

        let poisoner = std::sync::Arc::clone(&registry);
        let result = std::thread::spawn(move || {
            let _guard = poisoner.tables.write().unwrap();
            panic!("poison the registry lock");
        })
        .join();
        assert!(result.is_err());

        assert!(matches!(registry.len(), Err(CodecError::LockPoisoned(_))));
        assert!(matches!(registry.is_empty(), Err(CodecError::LockPoisoned(_))));
        assert!(matches!(registry.tag_of::<A>(), Err(CodecError::LockPoisoned(_))));
        assert!(matches!(
            registry.register::<B>(),
            Err(CodecError::LockPoisoned(_))
        ));
    }

    #[test]
    fn test_poly_equality_and_downcast() {
        let a = Poly::new(7u32);
        assert_eq!(a, Poly::new(7u32));
        assert_ne!(a, Poly::new(8u32));
        assert_ne!(a, Poly::new(7u64));
        assert!(a.is::<u32>());
        assert_eq!(a.downcast_ref::<u32>(), Some(&7));
        assert_eq!(a.clone(), a);
    }
}
