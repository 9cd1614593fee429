//! Common types used in both Attestation (registration) and Assertion (authentication).

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{utils::serde::ignore_unknown, Bytes};

/// This enumeration defines the valid credential types.
///
/// <https://w3c.github.io/webauthn/#enumdef-publickeycredentialtype>
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PublicKeyCredentialType {
    /// Currently the only type defined is a `PublicKey` meaning the public conterpart of an
    /// asymmetric key pair.
    #[default]
    PublicKey,
    /// Any other value, kept so that deserialization does not fail on future types
    #[serde(other)]
    Unknown,
}

impl PublicKeyCredentialType {
    /// The wire form, `"public-key"` for the only known type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PublicKey => "public-key",
            Self::Unknown => "unknown",
        }
    }
}

/// Identifies a specific public key credential. Sent in `excludeCredentials` when registering and
/// in `allowCredentials` when authenticating.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialdescriptor>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCredentialDescriptor {
    /// The type of the public key credential the caller is referring to.
    #[serde(rename = "type", deserialize_with = "ignore_unknown")]
    pub ty: PublicKeyCredentialType,

    /// The credential ID of the public key credential the caller is referring to.
    pub id: Bytes,
}

impl PublicKeyCredentialDescriptor {
    /// Describe a public key credential by its id.
    pub fn public_key(id: impl Into<Bytes>) -> Self {
        Self {
            ty: PublicKeyCredentialType::PublicKey,
            id: id.into(),
        }
    }
}

/// A Relying Party may require [user verification] for some of its operations but not for others,
/// and may use this type to express its needs.
///
/// <https://w3c.github.io/webauthn/#enumdef-userverificationrequirement>
///
/// [user verification]: https://w3c.github.io/webauthn/#user-verification
#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserVerificationRequirement {
    /// The ceremony fails if the response does not have the UV flag set.
    Required,

    /// User verification is preferred but its absence does not fail the ceremony.
    #[default]
    Preferred,

    /// The Relying Party does not want user verification employed during the operation.
    Discouraged,
}

/// Used to limit the values of [`CollectedClientData::ty`] and serializes to static strings.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ClientDataType {
    /// Serializes to the string `"webauthn.create"`
    #[serde(rename = "webauthn.create")]
    Create,

    /// Serializes to the string `"webauthn.get"`
    #[serde(rename = "webauthn.get")]
    Get,
}

impl fmt::Display for ClientDataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "webauthn.create",
            Self::Get => "webauthn.get",
        })
    }
}

/// The client data represents the contextual bindings of both the Relying Party and the client.
/// The authenticator signs over its SHA-256 hash, so it is parsed from the exact bytes received.
///
/// <https://w3c.github.io/webauthn/#dictionary-client-data>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedClientData {
    /// Either [`ClientDataType::Create`] or [`ClientDataType::Get`].
    #[serde(rename = "type")]
    pub ty: ClientDataType,

    /// The base64url encoding of the challenge provided by the Relying Party.
    pub challenge: String,

    /// The fully qualified origin of the requester.
    pub origin: String,

    /// This OPTIONAL member contains the inverse of the sameOriginWithAncestors argument value that
    /// was passed into the internal method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<bool>,

    /// Keys unknown to this library, kept in order.
    #[serde(flatten)]
    pub unknown_keys: IndexMap<String, serde_json::Value>,
}

impl CollectedClientData {
    /// Parse `clientDataJSON` bytes.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
