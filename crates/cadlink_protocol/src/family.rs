//! Macros declaring the record sum type and its polymorphic families.

/// Declares an enum whose variants are registered record types and wires
/// its serde impls through the envelope codec.
///
/// Each variant is named after the record type it holds. Decoding accepts
/// only tags whose record is a member of the family.
macro_rules! polymorphic_family {
    (
        $(#[$meta:meta])*
        $vis:vis enum $family:ident { $($variant:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $family {
            $(
                #[doc = concat!("A [`", stringify!($variant), "`].")]
                $variant($variant),
            )+
        }

        impl $family {
            /// Wire tag of the concrete record.
            pub fn tag(&self) -> &'static str {
                match self {
                    $($family::$variant(_) => <$variant as ::cadlink_codec::Tagged>::TAG,)+
                }
            }
        }

        $(
            impl From<$variant> for $family {
                fn from(value: $variant) -> Self {
                    $family::$variant(value)
                }
            }
        )+

        impl TryFrom<$crate::registry::Record> for $family {
            type Error = $crate::registry::Record;

            fn try_from(record: $crate::registry::Record) -> Result<Self, Self::Error> {
                match record {
                    $($crate::registry::Record::$variant(value) => Ok($family::$variant(value)),)+
                    other => Err(other),
                }
            }
        }

        impl ::serde::Serialize for $family {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let registry = $crate::registry::registry().map_err(::serde::ser::Error::custom)?;
                match self {
                    $(
                        $family::$variant(value) => {
                            ::cadlink_codec::serialize_polymorphic(registry, value, serializer)
                        }
                    )+
                }
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $family {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let registry = $crate::registry::registry().map_err(::serde::de::Error::custom)?;
                ::cadlink_codec::deserialize_polymorphic(
                    registry,
                    deserializer,
                    stringify!($family),
                    $family::try_from,
                )
            }
        }
    };
}

/// Declares the sum of every registered record type and the routine that
/// registers them.
macro_rules! record_types {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident { $($variant:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $name {
            $(
                #[doc = concat!("A [`", stringify!($variant), "`].")]
                $variant($variant),
            )+
        }

        impl $name {
            /// Wire tag of the concrete record.
            pub fn tag(&self) -> &'static str {
                match self {
                    $($name::$variant(_) => <$variant as ::cadlink_codec::Tagged>::TAG,)+
                }
            }
        }

        $(
            impl From<$variant> for $name {
                fn from(value: $variant) -> Self {
                    $name::$variant(value)
                }
            }
        )+

        /// Registers every record type with `registry`.
        ///
        /// # Errors
        ///
        /// Fails on the first duplicate tag.
        pub fn register_all(
            registry: &mut ::cadlink_codec::TypeRegistry<$name>,
        ) -> ::cadlink_codec::CodecResult<()> {
            $(registry.register::<$variant>()?;)+
            Ok(())
        }
    };
}

pub(crate) use polymorphic_family;
pub(crate) use record_types;
