//! Utilities to be used in serde derives for more robust (de)serializations.

use serde::{Deserialize, Deserializer};

/// Many fields in the webauthn spec have the following wording.
///
/// > The values SHOULD be members of `T` but client platforms MUST ignore unknown values.
///
/// This method is a simple way of ignoring unknown values without failing deserialization.
pub(crate) fn ignore_unknown<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(T::deserialize(de).unwrap_or_default())
}

/// (De)serialize a [`CoseAlgorithm`](crate::CoseAlgorithm) by its registry code, which is how
/// the WebAuthn JSON surface writes `alg`.
pub(crate) mod algorithm_code {
    use crate::CoseAlgorithm;

    pub fn serialize<S>(value: &CoseAlgorithm, ser: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ser.serialize_i64(value.code())
    }

    pub fn deserialize<'de, D>(de: D) -> Result<CoseAlgorithm, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value: i64 = serde::Deserialize::deserialize(de)?;

        CoseAlgorithm::try_from(value).map_err(|_| {
            <D::Error as serde::de::Error>::invalid_value(
                serde::de::Unexpected::Signed(value),
                &"a COSE algorithm identifier",
            )
        })
    }
}
