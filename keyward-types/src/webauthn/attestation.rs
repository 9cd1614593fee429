//! Options sent to the client to start a registration ceremony.

use serde::{Deserialize, Serialize};

use crate::{
    utils::serde::algorithm_code,
    webauthn::{PublicKeyCredentialDescriptor, PublicKeyCredentialType, UserVerificationRequirement},
    Bytes, CoseAlgorithm,
};

/// The value passed to `navigator.credentials.create()`.
///
/// <https://w3c.github.io/webauthn/#sctn-credentialcreationoptions-extension>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialCreationOptions {
    /// The key defining that this is a request for a webauthn credential.
    pub public_key: PublicKeyCredentialCreationOptions,
}

/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialcreationoptions>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialCreationOptions {
    /// The Relying Party responsible for the request.
    pub rp: PublicKeyCredentialRpEntity,

    /// The user account for which the Relying Party is requesting attestation.
    pub user: PublicKeyCredentialUserEntity,

    /// The random challenge the authenticator signs along with other data.
    pub challenge: Bytes,

    /// Key types and signature algorithms the Relying Party supports, most preferred first.
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,

    /// Time in milliseconds the Relying Party is willing to wait for the call to complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,

    /// Credentials already registered for this user, which must not be created again on the same
    /// authenticator.
    #[serde(default)]
    pub exclude_credentials: Vec<PublicKeyCredentialDescriptor>,

    /// Requirements on the authenticator taking part in the ceremony.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,

    /// The Relying Party's preference regarding attestation conveyance.
    #[serde(default)]
    pub attestation: AttestationConveyancePreference,
}

/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialrpentity>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCredentialRpEntity {
    /// The RP ID, a registrable domain suffix of the origin.
    pub id: String,

    /// A human-palatable identifier for the Relying Party.
    pub name: String,
}

/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialuserentity>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialUserEntity {
    /// The user handle, an opaque byte sequence of at most 64 bytes.
    pub id: Bytes,

    /// A human-palatable identifier for the user account.
    pub name: String,

    /// A human-palatable name for the user account, intended only for display.
    pub display_name: String,
}

/// A credential type and algorithm pair.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialparameters>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCredentialParameters {
    /// The type of credential to be created.
    #[serde(rename = "type")]
    pub ty: PublicKeyCredentialType,

    /// The signature algorithm, written as its COSE identifier.
    #[serde(with = "algorithm_code")]
    pub alg: CoseAlgorithm,
}

impl From<CoseAlgorithm> for PublicKeyCredentialParameters {
    fn from(alg: CoseAlgorithm) -> Self {
        Self {
            ty: PublicKeyCredentialType::PublicKey,
            alg,
        }
    }
}

/// <https://w3c.github.io/webauthn/#dictdef-authenticatorselectioncriteria>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelectionCriteria {
    /// Whether a client-side discoverable credential is wanted.
    #[serde(default)]
    pub require_resident_key: bool,

    /// The Relying Party's requirement regarding user verification.
    #[serde(default)]
    pub user_verification: UserVerificationRequirement,
}

/// The Relying Party's preference for how attestation is conveyed during credential generation.
///
/// <https://w3c.github.io/webauthn/#enumdef-attestationconveyancepreference>
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttestationConveyancePreference {
    /// No interest in authenticator attestation.
    #[default]
    None,

    /// Verifiable attestation is preferred but the client may substitute or anonymize it.
    Indirect,

    /// The attestation statement as generated by the authenticator is wanted.
    Direct,

    /// An enterprise attestation, which may uniquely identify the authenticator, is wanted.
    Enterprise,
}
