use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An Authenticator Attestation GUID is a 128-bit identifier.
///
/// It indicates the type (e.g. make and model) of an Authenticator and is the key under which
/// metadata statements are published. Authenticators doing self or no attestation usually report
/// the empty AAGUID made only of `0`s.
///
/// Externally the AAGUID is always written in the canonical dashed form
/// `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` with lowercase hex digits.
///
/// [spec]: https://w3c.github.io/webauthn/#sctn-authenticator-model
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Aaguid(pub [u8; Self::LEN]);

impl Aaguid {
    /// Length of an AAGUID in bytes.
    pub const LEN: usize = 16;

    /// Generate empty AAGUID
    pub const fn new_empty() -> Self {
        Self([0; 16])
    }

    /// Whether this is the all zero AAGUID.
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 16]
    }
}

impl Default for Aaguid {
    fn default() -> Self {
        Self::new_empty()
    }
}

impl From<[u8; 16]> for Aaguid {
    fn from(inner: [u8; 16]) -> Self {
        Aaguid(inner)
    }
}

impl fmt::Display for Aaguid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Uuid::from_bytes(self.0).hyphenated(), f)
    }
}

/// The string is not a UUID.
#[derive(Debug, thiserror::Error)]
#[error("invalid AAGUID: {0}")]
pub struct InvalidAaguid(String);

impl FromStr for Aaguid {
    type Err = InvalidAaguid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(|uuid| Aaguid(uuid.into_bytes()))
            .map_err(|e| InvalidAaguid(e.to_string()))
    }
}

impl Serialize for Aaguid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Aaguid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct AaguidVisitor;
        impl serde::de::Visitor<'_> for AaguidVisitor {
            type Value = Aaguid;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    f,
                    "A byte string of {} bytes long or a UUID string",
                    Aaguid::LEN
                )
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.try_into().map(Aaguid).map_err(|_| {
                    E::custom(format!("Byte string of len {}, is not of len 16", v.len()))
                })
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse().map_err(E::custom)
            }
        }
        deserializer.deserialize_any(AaguidVisitor)
    }
}
