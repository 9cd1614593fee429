//! Decoding of the binary authenticator data structure.
//!
//! <https://w3c.github.io/webauthn/#sctn-authenticator-data>

use std::num::TryFromIntError;

use ciborium::value::Value;

use crate::{crypto::sha256, DecodeError};

mod aaguid;
mod cursor;
mod flags;

pub use self::{
    aaguid::{Aaguid, InvalidAaguid},
    cursor::Cursor,
    flags::Flags,
};


/// Fixed prefix of every authenticator data: rpIdHash (32) + flags (1) + signCount (4).
pub const MIN_LEN: usize = 37;

/// Smallest buffer accepted when the [`Flags::AT`] flag announces attested credential data.
pub const MIN_LEN_WITH_ATTESTED_DATA: usize = 148;

/// The authenticator data structure encodes contextual bindings made by the authenticator.
///
/// Every byte of it is under the control of the client, so decoding is strict: the buffer must be
/// consumed exactly by the sections the flags announce.
///
/// <https://w3c.github.io/webauthn/#sctn-authenticator-data>
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatorData {
    /// SHA-256 hash of the RP ID the credential is scoped to.
    rp_id_hash: [u8; 32],

    /// The flags representing the information of this credential. See [Flags] for more information.
    pub flags: Flags,

    /// Signature counter, 32-bit unsigned big-endian integer.
    pub counter: u32,

    /// Present when [`Flags::AT`] is set. Its length depends on the length of the credential ID
    /// and credential public key being attested.
    pub attested_credential_data: Option<AttestedCredentialData>,

    /// Extension-defined authenticator data. Present when [`Flags::ED`] is set and always a CBOR
    /// map; kept as a generic [`Value`] since `Value` cannot key a `HashMap`.
    pub extensions: Option<Value>,
}

impl AuthenticatorData {
    /// Create a new AuthenticatorData object for an RP ID and a counter.
    ///
    /// The flags will be set to their default values.
    pub fn new(rp_id: &str, counter: u32) -> Self {
        Self {
            rp_id_hash: sha256(rp_id.as_bytes()),
            flags: Flags::default(),
            counter,
            attested_credential_data: None,
            extensions: None,
        }
    }

    /// Add an [`AttestedCredentialData`] to the authenticator data.
    ///
    /// This sets the [`Flags::AT`] value as well.
    pub fn set_attested_credential_data(mut self, acd: AttestedCredentialData) -> Self {
        self.attested_credential_data = Some(acd);
        self.set_flags(Flags::AT)
    }

    /// Set additional [`Flags`] to the authenticator data.
    pub fn set_flags(mut self, flags: Flags) -> Self {
        self.flags |= flags;
        self
    }

    /// Get read access to the RP ID hash
    pub fn rp_id_hash(&self) -> &[u8; 32] {
        &self.rp_id_hash
    }

    /// Whether the hash embedded by the authenticator is the SHA-256 of `rp_id`.
    pub fn matches_rp_id(&self, rp_id: &str) -> bool {
        self.rp_id_hash == sha256(rp_id.as_bytes())
    }

    /// The User Present flag.
    pub fn user_present(&self) -> bool {
        self.flags.contains(Flags::UP)
    }

    /// The User Verified flag.
    pub fn user_verified(&self) -> bool {
        self.flags.contains(Flags::UV)
    }

    /// Decode an authenticator data from a byte slice.
    ///
    /// The decoded fields are rpIdHash, flags, signCount, then the attested credential data when
    /// [`Flags::AT`] is set, then the extensions map when [`Flags::ED`] is set. Reserved flag bits
    /// are kept as they are. Any byte left over afterwards is an error.
    pub fn from_slice(v: &[u8]) -> Result<Self, DecodeError> {
        if v.len() < MIN_LEN {
            return Err(DecodeError::TooShort {
                needed: MIN_LEN,
                available: v.len(),
            });
        }

        let mut cursor = Cursor::new(v);
        let rp_id_hash = cursor.read_array::<32>()?;
        let flags = Flags::from(cursor.read_u8()?);
        let counter = cursor.read_u32_be()?;

        if flags.contains(Flags::AT) && v.len() < MIN_LEN_WITH_ATTESTED_DATA {
            return Err(DecodeError::TooShort {
                needed: MIN_LEN_WITH_ATTESTED_DATA,
                available: v.len(),
            });
        }

        let attested_credential_data = flags
            .contains(Flags::AT)
            .then(|| AttestedCredentialData::from_cursor(&mut cursor))
            .transpose()?;

        let extensions = flags
            .contains(Flags::ED)
            .then(|| {
                let (value, _) = cursor.read_cbor()?;
                if value.is_map() {
                    Ok(value)
                } else {
                    Err(DecodeError::InvalidCbor(
                        "extensions must be a CBOR map".into(),
                    ))
                }
            })
            .transpose()?;

        cursor.finish()?;

        Ok(AuthenticatorData {
            rp_id_hash,
            flags,
            counter,
            attested_credential_data,
            extensions,
        })
    }

    /// Encode an authenticator data to its byte representation.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut flags = self.flags;
        flags.set(Flags::AT, self.attested_credential_data.is_some());
        flags.set(Flags::ED, self.extensions.is_some());

        let mut out = Vec::with_capacity(MIN_LEN);
        out.extend_from_slice(&self.rp_id_hash);
        out.push(flags.into());
        out.extend_from_slice(&self.counter.to_be_bytes());
        if let Some(acd) = &self.attested_credential_data {
            acd.write_to(&mut out);
        }
        if let Some(extensions) = &self.extensions {
            // SAFETY: writing a `Value` into a `Vec` cannot fail.
            ciborium::ser::into_writer(extensions, &mut out).unwrap();
        }
        out
    }
}

/// Attested credential data is a variable-length byte array added to the authenticator data when
/// generating an attestation object for a credential
///
/// <https://w3c.github.io/webauthn/#attested-credential-data>
#[derive(Debug, Clone, PartialEq)]
pub struct AttestedCredentialData {
    /// The AAGUID of the authenticator.
    pub aaguid: Aaguid,

    /// Not public as it should not be modifiable to be longer than a u16.
    credential_id: Vec<u8>,

    /// The credential public key as a decoded COSE_Key map.
    key: Value,

    /// The exact bytes the COSE_Key occupied.
    raw_key: Vec<u8>,
}

impl AttestedCredentialData {
    /// Create a new [AttestedCredentialData] from a COSE key map.
    ///
    /// # Error
    /// Returns an error if the length of `credential_id` cannot be represented by a u16.
    pub fn new(
        aaguid: Aaguid,
        credential_id: Vec<u8>,
        key: Value,
    ) -> Result<Self, TryFromIntError> {
        u16::try_from(credential_id.len())?;

        let mut raw_key = Vec::new();
        // SAFETY: writing a `Value` into a `Vec` cannot fail.
        ciborium::ser::into_writer(&key, &mut raw_key).unwrap();

        Ok(Self {
            aaguid,
            credential_id,
            key,
            raw_key,
        })
    }

    /// Get read access to the credential ID,
    pub fn credential_id(&self) -> &[u8] {
        &self.credential_id
    }

    /// The COSE key map as decoded.
    pub fn key(&self) -> &Value {
        &self.key
    }

    /// The exact encoded bytes of the COSE key.
    pub fn raw_key(&self) -> &[u8] {
        &self.raw_key
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.aaguid.0);
        // SAFETY: the length has been asserted to fit a u16 in the constructor or while decoding.
        out.extend_from_slice(&u16::try_from(self.credential_id.len()).unwrap().to_be_bytes());
        out.extend_from_slice(&self.credential_id);
        out.extend_from_slice(&self.raw_key);
    }

    fn from_cursor(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        let aaguid = Aaguid(cursor.read_array()?);
        let cred_len = usize::from(cursor.read_u16_be()?);
        let credential_id = cursor.read_slice(cred_len)?.to_vec();

        let (key, raw_key) = cursor.read_cbor()?;
        if !key.is_map() {
            return Err(DecodeError::InvalidCbor(
                "credential public key must be a CBOR map".into(),
            ));
        }

        Ok(Self {
            aaguid,
            credential_id,
            key,
            raw_key: raw_key.to_vec(),
        })
    }
}
