//! The attestation object returned from a registration ceremony.
//!
//! <https://w3c.github.io/webauthn/#sctn-attestation>

use ciborium::value::Value;

use crate::{
    auth_data::{Aaguid, AuthenticatorData, Cursor},
    encoding, DecodeError,
};

#[cfg(test)]
mod tests;

/// The CBOR map `{fmt, attStmt, authData}` sent by the client as `response.attestationObject`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationObject {
    /// The attestation statement format identifier, such as `packed` or `none`.
    pub fmt: String,

    /// The format specific attestation statement.
    pub att_stmt: AttestationStatement,

    /// The decoded authenticator data.
    pub auth_data: AuthenticatorData,

    /// The authenticator data exactly as received. Attestation signatures are computed over these
    /// bytes.
    pub raw_auth_data: Vec<u8>,
}

impl AttestationObject {
    /// Decode an attestation object. The whole buffer must be a single CBOR map.
    pub fn from_slice(v: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = Cursor::new(v);
        let (value, _) = cursor.read_cbor()?;
        cursor.finish()?;

        let map = value
            .as_map()
            .ok_or_else(|| DecodeError::InvalidCbor("attestation object must be a map".into()))?;

        let fmt = match text_entry(map, "fmt") {
            Some(Value::Text(fmt)) => fmt.clone(),
            Some(_) => return Err(DecodeError::InvalidCbor("`fmt` must be text".into())),
            None => return Err(DecodeError::MissingField("fmt")),
        };
        let att_stmt = match text_entry(map, "attStmt") {
            Some(stmt) => AttestationStatement::from_value(stmt.clone())?,
            None => return Err(DecodeError::MissingField("attStmt")),
        };
        let raw_auth_data = match text_entry(map, "authData") {
            Some(Value::Bytes(bytes)) => bytes.clone(),
            Some(_) => return Err(DecodeError::InvalidCbor("`authData` must be bytes".into())),
            None => return Err(DecodeError::MissingField("authData")),
        };
        let auth_data = AuthenticatorData::from_slice(&raw_auth_data)?;

        Ok(Self {
            fmt,
            att_stmt,
            auth_data,
            raw_auth_data,
        })
    }

    /// The AAGUID from the attested credential data, if the authenticator included any.
    pub fn aaguid(&self) -> Option<Aaguid> {
        self.auth_data
            .attested_credential_data
            .as_ref()
            .map(|acd| acd.aaguid)
    }
}

/// The `attStmt` member of an attestation object, with the fields common to the supported formats
/// pulled out.
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationStatement {
    /// The COSE algorithm identifier the statement signature was made with.
    pub alg: Option<i64>,

    /// The attestation signature.
    pub sig: Option<Vec<u8>>,

    /// DER encoded certificates, the attestation certificate first.
    pub x5c: Vec<Vec<u8>>,

    /// The statement map as received.
    pub raw: Value,
}

impl AttestationStatement {
    /// The empty statement used by the `none` format.
    pub fn empty() -> Self {
        Self {
            alg: None,
            sig: None,
            x5c: Vec::new(),
            raw: Value::Map(Vec::new()),
        }
    }

    /// Extract the known members from a statement map.
    pub fn from_value(raw: Value) -> Result<Self, DecodeError> {
        let map = raw
            .as_map()
            .ok_or_else(|| DecodeError::InvalidCbor("`attStmt` must be a map".into()))?;

        let alg = match text_entry(map, "alg") {
            Some(Value::Integer(int)) => Some(
                i64::try_from(i128::from(*int))
                    .map_err(|_| DecodeError::InvalidCbor("`alg` out of range".into()))?,
            ),
            Some(_) => return Err(DecodeError::InvalidCbor("`alg` must be an integer".into())),
            None => None,
        };
        let sig = match text_entry(map, "sig") {
            Some(Value::Bytes(sig)) => Some(sig.clone()),
            Some(_) => return Err(DecodeError::InvalidCbor("`sig` must be bytes".into())),
            None => None,
        };
        let x5c = match text_entry(map, "x5c") {
            Some(Value::Array(certs)) => certs
                .iter()
                .map(|cert| match cert {
                    Value::Bytes(der) => Ok(der.clone()),
                    _ => Err(DecodeError::InvalidCbor(
                        "`x5c` entries must be bytes".into(),
                    )),
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(DecodeError::InvalidCbor("`x5c` must be an array".into())),
            None => Vec::new(),
        };

        Ok(Self { alg, sig, x5c, raw })
    }

    /// Whether the statement map has no members at all.
    pub fn is_empty(&self) -> bool {
        self.raw.as_map().map_or(true, Vec::is_empty)
    }

    /// The statement re-encoded as CBOR.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // SAFETY: writing a `Value` into a `Vec` cannot fail.
        ciborium::ser::into_writer(&self.raw, &mut out).unwrap();
        out
    }

    /// Base64url of the CBOR statement, the form it is stored in at rest.
    pub fn to_base64url(&self) -> String {
        encoding::base64url(&self.to_vec())
    }

    /// Read back a statement stored with [`Self::to_base64url`].
    pub fn from_base64url(input: &str) -> Result<Self, DecodeError> {
        let bytes = encoding::try_from_base64url(input)
            .ok_or_else(|| DecodeError::InvalidCbor("not base64url".into()))?;
        let mut cursor = Cursor::new(&bytes);
        let (value, _) = cursor.read_cbor()?;
        cursor.finish()?;
        Self::from_value(value)
    }
}

fn text_entry<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_text() == Some(key))
        .map(|(_, v)| v)
}
