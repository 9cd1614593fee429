//! A software authenticator paired with a minimal client, for driving a [`RelyingParty`] through
//! whole ceremonies without a browser or hardware.
//!
//! [`RelyingParty`]: crate::RelyingParty

use ciborium::value::{Integer, Value};
use keyward_types::{
    auth_data::AttestedCredentialData,
    crypto::sha256,
    encoding, random_vec,
    webauthn::{
        ClientDataType, CredentialCreationOptions, CredentialRequestOptions, WebAuthnCredentials,
    },
    Aaguid, AuthenticatorData, CoseAlgorithm, Flags,
};
use p256::ecdsa::{signature::Signer, Signature, SigningKey};
use serde_json::json;

use crate::formats;

/// The attestation a [`SoftwareAuthenticator`] produces when registering.
#[derive(Clone)]
pub enum Attestation {
    /// `none`, with an empty statement.
    None,
    /// `packed` signed with the credential key itself.
    SelfSigned,
    /// `packed` signed with `key`, certified by the DER certificates of `x5c`.
    Packed {
        /// The attestation private key.
        key: SigningKey,
        /// The certificate chain, leaf first.
        x5c: Vec<Vec<u8>>,
    },
    /// `fido-u2f` signed with `key`, certified by the DER `certificate`.
    FidoU2f {
        /// The attestation private key.
        key: SigningKey,
        /// The attestation certificate.
        certificate: Vec<u8>,
    },
}

/// A P-256 credential that registers and asserts like a platform authenticator.
pub struct SoftwareAuthenticator {
    key: SigningKey,
    credential_id: Vec<u8>,
    aaguid: Aaguid,
    counter: u32,
    flags: Flags,
    origin: String,
    user_name: Option<String>,
}

impl SoftwareAuthenticator {
    /// A fresh credential used from `origin`, reporting user presence and verification.
    pub fn new(origin: impl Into<String>) -> Self {
        let key = loop {
            if let Ok(key) = SigningKey::from_slice(&random_vec(32)) {
                break key;
            }
        };
        Self {
            key,
            credential_id: random_vec(16),
            aaguid: Aaguid::new_empty(),
            counter: 0,
            flags: Flags::UP | Flags::UV,
            origin: origin.into(),
            user_name: None,
        }
    }

    /// Report `aaguid` as the authenticator model.
    pub fn with_aaguid(mut self, aaguid: Aaguid) -> Self {
        self.aaguid = aaguid;
        self
    }

    /// Set the flags put in every authenticator data.
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Claim to run on `origin`.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Overwrite the signature counter, e.g. to replay an older value.
    pub fn set_counter(&mut self, counter: u32) {
        self.counter = counter;
    }

    /// The current signature counter.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// The raw credential id.
    pub fn credential_id(&self) -> &[u8] {
        &self.credential_id
    }

    /// The credential id as stored by the relying party.
    pub fn cred_id(&self) -> String {
        encoding::base64url(&self.credential_id)
    }

    /// The credential public key as a COSE_Key map.
    pub fn cose_key(&self) -> Value {
        let point = self.key.verifying_key().to_encoded_point(false);
        let coordinate = |c: Option<&p256::FieldBytes>| {
            Value::Bytes(c.map(|c| c.to_vec()).unwrap_or_default())
        };
        Value::Map(vec![
            (int(1), int(2)),
            (int(3), int(CoseAlgorithm::Es256.code())),
            (int(-1), int(1)),
            (int(-2), coordinate(point.x())),
            (int(-3), coordinate(point.y())),
        ])
    }

    /// Answer `options` like `navigator.credentials.create` would.
    pub fn register(
        &mut self,
        options: &CredentialCreationOptions,
        attestation: Attestation,
    ) -> WebAuthnCredentials {
        let options = &options.public_key;
        let challenge = encoding::base64url(&options.challenge);
        let client_data = self.client_data(ClientDataType::Create, &challenge);
        let client_data_hash = sha256(&client_data);

        // SAFETY: credential ids made here are 16 bytes long.
        let acd =
            AttestedCredentialData::new(self.aaguid, self.credential_id.clone(), self.cose_key())
                .unwrap();
        let auth_data = AuthenticatorData::new(&options.rp.id, self.counter)
            .set_flags(self.flags)
            .set_attested_credential_data(acd);
        let raw_auth_data = auth_data.to_vec();

        let (fmt, statement) = match attestation {
            Attestation::None => (formats::NONE, Vec::new()),
            Attestation::SelfSigned => {
                let sig = der_signature(&self.key, &[raw_auth_data.as_slice(), &client_data_hash]);
                (
                    formats::PACKED,
                    vec![
                        (text("alg"), int(CoseAlgorithm::Es256.code())),
                        (text("sig"), Value::Bytes(sig)),
                    ],
                )
            }
            Attestation::Packed { key, x5c } => {
                let sig = der_signature(&key, &[raw_auth_data.as_slice(), &client_data_hash]);
                (
                    formats::PACKED,
                    vec![
                        (text("alg"), int(CoseAlgorithm::Es256.code())),
                        (text("sig"), Value::Bytes(sig)),
                        (text("x5c"), certificates(x5c)),
                    ],
                )
            }
            Attestation::FidoU2f { key, certificate } => {
                let point = self.key.verifying_key().to_encoded_point(false);
                let sig = der_signature(
                    &key,
                    &[
                        &[0x00],
                        auth_data.rp_id_hash(),
                        &client_data_hash,
                        &self.credential_id,
                        point.as_bytes(),
                    ],
                );
                (
                    formats::FIDO_U2F,
                    vec![
                        (text("sig"), Value::Bytes(sig)),
                        (text("x5c"), certificates(vec![certificate])),
                    ],
                )
            }
        };

        let object = Value::Map(vec![
            (text("fmt"), text(fmt)),
            (text("attStmt"), Value::Map(statement)),
            (text("authData"), Value::Bytes(raw_auth_data)),
        ]);
        let mut attestation_object = Vec::new();
        // SAFETY: writing a `Value` into a `Vec` cannot fail.
        ciborium::ser::into_writer(&object, &mut attestation_object).unwrap();

        self.user_name = Some(options.user.name.clone());
        self.credentials(
            challenge,
            json!({
                "clientDataJSON": encoding::base64url(&client_data),
                "attestationObject": encoding::base64url(&attestation_object),
            }),
        )
    }

    /// Answer `options` like `navigator.credentials.get` would, bumping the counter first.
    pub fn authenticate(&mut self, options: &CredentialRequestOptions) -> WebAuthnCredentials {
        self.counter = self.counter.saturating_add(1);
        self.assert(options)
    }

    /// Answer `options` with the current counter, as a cloned authenticator would.
    pub fn assert(&self, options: &CredentialRequestOptions) -> WebAuthnCredentials {
        let options = &options.public_key;
        let challenge = encoding::base64url(&options.challenge);
        let client_data = self.client_data(ClientDataType::Get, &challenge);
        let auth_data = AuthenticatorData::new(&options.rp_id, self.counter)
            .set_flags(self.flags)
            .to_vec();
        let sig = der_signature(&self.key, &[auth_data.as_slice(), &sha256(&client_data)]);

        self.credentials(
            challenge,
            json!({
                "clientDataJSON": encoding::base64url(&client_data),
                "authenticatorData": encoding::base64url(&auth_data),
                "signature": encoding::base64url(&sig),
            }),
        )
    }

    fn client_data(&self, ty: ClientDataType, challenge: &str) -> Vec<u8> {
        json!({
            "type": ty.to_string(),
            "challenge": challenge,
            "origin": self.origin,
            "crossOrigin": false,
        })
        .to_string()
        .into_bytes()
    }

    fn credentials(&self, challenge: String, response: serde_json::Value) -> WebAuthnCredentials {
        let id = self.cred_id();
        WebAuthnCredentials {
            challenge: Some(challenge),
            username: self.user_name.clone(),
            webauthn: Some(json!({
                "id": id,
                "rawId": id,
                "type": "public-key",
                "response": response,
            })),
        }
    }
}

fn der_signature(key: &SigningKey, parts: &[&[u8]]) -> Vec<u8> {
    let signature: Signature = key.sign(&parts.concat());
    signature.to_der().as_bytes().to_vec()
}

fn certificates(der: Vec<Vec<u8>>) -> Value {
    Value::Array(der.into_iter().map(Value::Bytes).collect())
}

fn int(value: i64) -> Value {
    Value::Integer(Integer::from(value))
}

fn text(value: &str) -> Value {
    Value::Text(value.to_owned())
}
