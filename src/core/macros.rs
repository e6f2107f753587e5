//! Declarative record definitions.

/// Define a struct whose wire form is its fields in declaration order.
///
/// The struct is emitted unchanged, together with an
/// [`Encodable`](crate::core::serialization::Encodable) impl that encodes,
/// decodes and sizes each field in the order written. Reordering fields
/// changes the wire format.
///
/// ```rust
/// use versioned_codec::record;
///
/// record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Transfer {
///         pub count: u32,
///         pub label: String,
///     }
/// }
///
/// let transfer = Transfer { count: 7, label: "ok".into() };
/// assert_eq!(transfer.count, 7);
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::core::serialization::Encodable for $name {
            fn encode(
                &self,
                _codec: &$crate::protocol::linear::LinearCodec,
                _packer: &mut $crate::core::packer::Packer,
            ) -> $crate::error::Result<()> {
                $(
                    $crate::core::serialization::Encodable::encode(&self.$field, _codec, _packer)?;
                )*
                Ok(())
            }

            fn decode(
                _codec: &$crate::protocol::linear::LinearCodec,
                _unpacker: &mut $crate::core::packer::Unpacker<'_>,
            ) -> $crate::error::Result<Self> {
                Ok(Self {
                    $(
                        $field: <$ty as $crate::core::serialization::Encodable>::decode(
                            _codec, _unpacker,
                        )?,
                    )*
                })
            }

            fn encoded_size(
                &self,
                _codec: &$crate::protocol::linear::LinearCodec,
            ) -> $crate::error::Result<usize> {
                Ok(0 $(
                    + $crate::core::serialization::Encodable::encoded_size(&self.$field, _codec)?
                )*)
            }
        }
    };
}
