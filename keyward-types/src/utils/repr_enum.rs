use std::fmt::Display;

/// Error converting an integer code into an enum variant. The integer is not within the range of
/// values in the registry the enum mirrors.
#[derive(Debug, PartialEq, Eq)]
pub struct CodeOutOfRange<I>(pub I);

impl<I: Display> Display for CodeOutOfRange<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Value {} is out of range", self.0)
    }
}

/// Generate a registry enum with integer codes and wire names, plus conversion methods.
///
/// Each variant carries the registry code it is represented by and the name it is known by in
/// JSON Web Key terms.
macro_rules! repr_enum {
    ( $(#[$attr:meta])* $enum_name:ident: $repr:ident {$($(#[$fattr:meta])* $name:ident: $val:literal => $wire:literal,)* } ) => {
        #[allow(non_camel_case_types)]
        $(#[$attr])*
        #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
        #[non_exhaustive]
        pub enum $enum_name {
            $($(#[$fattr])* $name,)*
        }

        impl $enum_name {
            /// Every variant in registry order.
            pub const ALL: &'static [Self] = &[$(Self::$name,)*];

            /// The registry code for this variant.
            pub const fn code(self) -> $repr {
                match self {
                    $(Self::$name => $val,)*
                }
            }

            /// The name used for this variant in JSON Web Key terms.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => $wire,)*
                }
            }

            /// Look a variant up by its wire name.
            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.name() == name)
            }
        }

        impl TryFrom<$repr> for $enum_name {
            type Error = $crate::utils::repr_enum::CodeOutOfRange<$repr>;

            fn try_from(value: $repr) -> Result<Self, Self::Error> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.code() == value)
                    .ok_or($crate::utils::repr_enum::CodeOutOfRange(value))
            }
        }

        impl From<$enum_name> for $repr {
            fn from(src: $enum_name) -> Self {
                src.code()
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::utils::repr_enum::UnknownName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_name(s).ok_or_else(|| $crate::utils::repr_enum::UnknownName(s.to_owned()))
            }
        }

        impl serde::Serialize for $enum_name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> serde::Deserialize<'de> for $enum_name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let name = String::deserialize(deserializer)?;
                Self::from_name(&name).ok_or_else(|| {
                    <D::Error as serde::de::Error>::unknown_variant(&name, &[$($wire,)*])
                })
            }
        }
    }
}

/// A wire name did not match any variant of a registry enum.
#[derive(Debug, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl Display for UnknownName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown name {:?}", self.0)
    }
}

impl std::error::Error for UnknownName {}
