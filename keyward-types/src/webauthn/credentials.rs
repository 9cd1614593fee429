//! The credential payload posted back by the client to finish a ceremony.

use serde::{Deserialize, Serialize};

use crate::{
    utils::serde::ignore_unknown, webauthn::PublicKeyCredentialType, Bytes,
};

/// What is wrong with a posted credential payload. Checked before any decoding takes place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsError {
    /// The challenge is absent or empty.
    #[error("missing challenge")]
    MissingChallenge,

    /// There is no `webauthn` object.
    #[error("missing webauthn credential")]
    MissingCredential,

    /// A required member of the credential is absent.
    #[error("missing credential member `{0}`")]
    MissingField(&'static str),

    /// `id` and `rawId` differ.
    #[error("credential id does not match raw id")]
    IdMismatch,

    /// `response.userHandle` is present but not a string.
    #[error("user handle must be a string")]
    InvalidUserHandle,

    /// The credential passed the structural checks but its members are not well formed.
    #[error("malformed credential: {0}")]
    Malformed(String),
}

/// A ceremony completion request: the challenge it answers, the optional user name and the
/// `PublicKeyCredential` produced by the browser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebAuthnCredentials {
    /// The challenge as issued, base64url.
    #[serde(default)]
    pub challenge: Option<String>,

    /// The user name, absent in usernameless authentication.
    #[serde(default)]
    pub username: Option<String>,

    /// The `PublicKeyCredential` JSON as produced by the browser.
    #[serde(default)]
    pub webauthn: Option<serde_json::Value>,
}

impl WebAuthnCredentials {
    /// Check the structural contract of the payload.
    ///
    /// The challenge must be present and non-empty. The credential must carry `id`, `rawId` and
    /// `response`, with `id == rawId`, a `response.clientDataJSON`, and a `response.userHandle`
    /// that is a string whenever it is present.
    pub fn check_valid(&self) -> Result<(), CredentialsError> {
        match self.challenge.as_deref() {
            None | Some("") => return Err(CredentialsError::MissingChallenge),
            Some(_) => {}
        }

        let credential = self
            .webauthn
            .as_ref()
            .and_then(serde_json::Value::as_object)
            .ok_or(CredentialsError::MissingCredential)?;

        let id = credential
            .get("id")
            .filter(|v| !v.is_null())
            .ok_or(CredentialsError::MissingField("id"))?;
        let raw_id = credential
            .get("rawId")
            .filter(|v| !v.is_null())
            .ok_or(CredentialsError::MissingField("rawId"))?;
        let response = credential
            .get("response")
            .and_then(serde_json::Value::as_object)
            .ok_or(CredentialsError::MissingField("response"))?;

        if id != raw_id {
            return Err(CredentialsError::IdMismatch);
        }

        if response.get("clientDataJSON").map_or(true, |v| v.is_null()) {
            return Err(CredentialsError::MissingField("response.clientDataJSON"));
        }

        match response.get("userHandle") {
            None | Some(serde_json::Value::String(_)) => Ok(()),
            Some(_) => Err(CredentialsError::InvalidUserHandle),
        }
    }

    /// Check the payload and parse the typed credential out of it.
    pub fn credential(&self) -> Result<PublicKeyCredential, CredentialsError> {
        self.check_valid()?;
        let value = self
            .webauthn
            .clone()
            .ok_or(CredentialsError::MissingCredential)?;
        serde_json::from_value(value).map_err(|e| CredentialsError::Malformed(e.to_string()))
    }
}

/// The `PublicKeyCredential` JSON shape, shared by registration and authentication.
///
/// <https://w3c.github.io/webauthn/#iface-pkcredential>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredential {
    /// The base64url credential id.
    pub id: String,

    /// The raw credential id.
    pub raw_id: Bytes,

    /// The credential type, `public-key`.
    #[serde(rename = "type", default, deserialize_with = "ignore_unknown")]
    pub ty: PublicKeyCredentialType,

    /// The authenticator's response.
    pub response: AuthenticatorResponse,
}

/// The members of an `AuthenticatorAttestationResponse` or `AuthenticatorAssertionResponse`.
///
/// <https://w3c.github.io/webauthn/#authenticatorresponse>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorResponse {
    /// The JSON client data exactly as the client serialized it.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Bytes,

    /// The CBOR attestation object, registration only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation_object: Option<Bytes>,

    /// The authenticator data, authentication only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_data: Option<Bytes>,

    /// The assertion signature, authentication only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Bytes>,

    /// The user handle of a discoverable credential, authentication only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<Bytes>,
}
