//! Options sent to the client to start an authentication ceremony.

use serde::{Deserialize, Serialize};

use crate::{
    webauthn::{PublicKeyCredentialDescriptor, UserVerificationRequirement},
    Bytes,
};

/// The value passed to `navigator.credentials.get()`.
///
/// <https://w3c.github.io/webauthn/#sctn-credentialrequestoptions-extension>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequestOptions {
    /// The key defining that this is a request for a webauthn credential.
    pub public_key: PublicKeyCredentialRequestOptions,
}

/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialrequestoptions>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialRequestOptions {
    /// The random challenge the authenticator signs along with other data.
    pub challenge: Bytes,

    /// Time in milliseconds the Relying Party is willing to wait for the call to complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,

    /// The RP ID the credentials are scoped to.
    pub rp_id: String,

    /// Credentials acceptable to the Relying Party, most preferred first. Empty for usernameless
    /// flows where the authenticator picks a discoverable credential.
    #[serde(default)]
    pub allow_credentials: Vec<PublicKeyCredentialDescriptor>,

    /// The Relying Party's requirement regarding user verification.
    #[serde(default)]
    pub user_verification: UserVerificationRequirement,
}
