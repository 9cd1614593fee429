//! The credential record kept at rest for every registered authenticator.

use serde::{Deserialize, Serialize};

use crate::{
    webauthn::{PublicKeyCredentialDescriptor, PublicKeyCredentialType},
    encoding, KeyConversionError, NormalizedKey,
};

/// A registered credential as the relying party stores it.
///
/// The JSON form is `{counter, credID, publicKey, type, userName, aaguid, fmt, attStmt}` and is
/// wire stable: it must read back exactly as it was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authenticator {
    /// The signature counter of the last accepted ceremony.
    pub counter: u32,

    /// The base64url credential id. Unique across all records.
    #[serde(rename = "credID")]
    pub cred_id: String,

    /// The credential public key, the compact JSON of a [`NormalizedKey`].
    #[serde(rename = "publicKey")]
    pub public_key: String,

    /// Always `public-key`.
    #[serde(rename = "type")]
    pub ty: PublicKeyCredentialType,

    /// The user the credential is bound to.
    #[serde(rename = "userName")]
    pub user_name: String,

    /// The canonical AAGUID string of the authenticator model.
    pub aaguid: String,

    /// The attestation statement format the credential was registered with.
    pub fmt: String,

    /// Base64url of the CBOR attestation statement. Stored once and never re-verified.
    #[serde(rename = "attStmt")]
    pub att_stmt: String,
}

impl Authenticator {
    /// Parse [`Self::public_key`] back into a key.
    pub fn normalized_key(&self) -> Result<NormalizedKey, KeyConversionError> {
        NormalizedKey::from_json(&self.public_key)
    }

    /// The raw credential id.
    pub fn credential_id(&self) -> Option<Vec<u8>> {
        encoding::try_from_base64url(&self.cred_id)
    }

    /// A descriptor for this credential, as put in `allowCredentials` and `excludeCredentials`.
    pub fn descriptor(&self) -> Option<PublicKeyCredentialDescriptor> {
        self.credential_id()
            .map(PublicKeyCredentialDescriptor::public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{"counter":5,"credID":"AQID","publicKey":"{\"kty\":\"EC\",\"alg\":\"ES256\",\"crv\":\"P-256\",\"x\":\"AA\",\"y\":\"AQ\",\"asn1\":false}","type":"public-key","userName":"alice","aaguid":"00112233-4455-6677-8899-aabbccddeeff","fmt":"none","attStmt":"oA"}"#;

    #[test]
    fn record_json_round_trips_exactly() {
        let record: Authenticator = serde_json::from_str(RECORD).expect("valid record");
        assert_eq!(record.counter, 5);
        assert_eq!(record.cred_id, "AQID");
        assert_eq!(record.user_name, "alice");
        assert_eq!(record.ty, PublicKeyCredentialType::PublicKey);
        assert_eq!(serde_json::to_string(&record).expect("serializes"), RECORD);
    }

    #[test]
    fn stored_key_and_id_read_back() {
        let record: Authenticator = serde_json::from_str(RECORD).expect("valid record");
        let key = record.normalized_key().expect("stored key parses");
        assert_eq!(key.param_bytes("y"), Some(vec![1]));
        assert_eq!(key.asn1, Some(false));
        assert_eq!(record.credential_id(), Some(vec![1, 2, 3]));
        assert_eq!(
            record.descriptor().map(|d| d.id.to_vec()),
            Some(vec![1, 2, 3])
        );
    }
}
