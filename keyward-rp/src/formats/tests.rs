use ciborium::value::Value;
use keyward_trust::Certificate;
use keyward_types::{
    crypto::sha256,
    random_vec,
    webauthn::{
        AttestationConveyancePreference, CredentialCreationOptions,
        PublicKeyCredentialCreationOptions, PublicKeyCredentialRpEntity,
        PublicKeyCredentialUserEntity,
    },
    AttestationObject, AttestationStatement, CoseAlgorithm, NormalizedKey,
};
use p256::{ecdsa::SigningKey, pkcs8::DecodePrivateKey};

use super::*;
use crate::testing::{Attestation, SoftwareAuthenticator};

const ORIGIN: &str = "https://login.example.com";
const LEAF: &str = include_str!("../../tests/fixtures/leaf_direct.pem");
const LEAF_KEY: &str = include_str!("../../tests/fixtures/leaf_direct.pkcs8.pem");

fn options() -> CredentialCreationOptions {
    CredentialCreationOptions {
        public_key: PublicKeyCredentialCreationOptions {
            rp: PublicKeyCredentialRpEntity {
                id: "example.com".into(),
                name: "Example".into(),
            },
            user: PublicKeyCredentialUserEntity {
                id: random_vec(32).into(),
                name: "alice".into(),
                display_name: "Alice".into(),
            },
            challenge: random_vec(32).into(),
            pub_key_cred_params: vec![CoseAlgorithm::Es256.into()],
            timeout: None,
            exclude_credentials: Vec::new(),
            authenticator_selection: None,
            attestation: AttestationConveyancePreference::Direct,
        },
    }
}

struct Registration {
    object: AttestationObject,
    client_data_hash: [u8; 32],
    key: NormalizedKey,
}

fn register(attestation: Attestation) -> Registration {
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    let credential = authenticator
        .register(&options(), attestation)
        .credential()
        .unwrap();
    let object =
        AttestationObject::from_slice(credential.response.attestation_object.as_deref().unwrap())
            .unwrap();
    let key = NormalizedKey::from_cose(
        object
            .auth_data
            .attested_credential_data
            .as_ref()
            .unwrap()
            .key(),
    )
    .unwrap();
    Registration {
        object,
        client_data_hash: sha256(&credential.response.client_data_json),
        key,
    }
}

impl Registration {
    fn verify(&self) -> Result<VerifiedStatement, FormatError> {
        verify_statement(&self.object, &self.client_data_hash, &self.key)
    }
}

fn leaf_der() -> Vec<u8> {
    Certificate::from_pem(LEAF).unwrap()[0].der().to_vec()
}

fn leaf_key() -> SigningKey {
    SigningKey::from_pkcs8_pem(LEAF_KEY).unwrap()
}

fn statement(members: Vec<(&str, Value)>) -> AttestationStatement {
    AttestationStatement::from_value(Value::Map(
        members
            .into_iter()
            .map(|(name, value)| (Value::Text(name.into()), value))
            .collect(),
    ))
    .unwrap()
}

#[test]
fn none_needs_an_empty_statement() {
    let mut registration = register(Attestation::None);
    let verified = registration.verify().unwrap();
    assert_eq!(verified.kind, AttestationKind::None);
    assert!(verified.chain.is_empty());

    registration.object.att_stmt = statement(vec![("sig", Value::Bytes(vec![1, 2, 3]))]);
    assert_eq!(
        registration.verify().unwrap_err(),
        FormatError::UnexpectedStatement
    );
}

#[test]
fn packed_self_attestation() {
    let mut registration = register(Attestation::SelfSigned);
    let verified = registration.verify().unwrap();
    assert_eq!(verified.kind, AttestationKind::SelfAttestation);
    assert!(verified.chain.is_empty());

    registration.client_data_hash = sha256(b"another registration");
    assert_eq!(registration.verify().unwrap_err(), FormatError::BadSignature);
}

#[test]
fn self_attestation_algorithm_must_match_the_key() {
    let mut registration = register(Attestation::SelfSigned);
    registration.object.att_stmt.alg = Some(CoseAlgorithm::Rs256.code());
    assert_eq!(
        registration.verify().unwrap_err(),
        FormatError::AlgorithmMismatch {
            statement: "RS256".into(),
            key: "ES256".into(),
        }
    );
}

#[test]
fn packed_with_certificate() {
    let registration = register(Attestation::Packed {
        key: leaf_key(),
        x5c: vec![leaf_der()],
    });
    let verified = registration.verify().unwrap();
    assert_eq!(verified.kind, AttestationKind::Basic);
    assert_eq!(verified.chain.len(), 1);
    assert_eq!(verified.chain[0].der(), leaf_der().as_slice());
}

#[test]
fn packed_signed_by_another_key() {
    let stranger = SigningKey::from_slice(&[7; 32]).unwrap();
    let registration = register(Attestation::Packed {
        key: stranger,
        x5c: vec![leaf_der()],
    });
    assert_eq!(registration.verify().unwrap_err(), FormatError::BadSignature);
}

#[test]
fn packed_members_are_required() {
    let mut registration = register(Attestation::SelfSigned);
    let sig = registration.object.att_stmt.sig.clone().unwrap();

    registration.object.att_stmt = statement(vec![("sig", Value::Bytes(sig.clone()))]);
    assert_eq!(
        registration.verify().unwrap_err(),
        FormatError::MissingMember("alg")
    );

    registration.object.att_stmt = statement(vec![("alg", Value::Integer((-7).into()))]);
    assert_eq!(
        registration.verify().unwrap_err(),
        FormatError::MissingMember("sig")
    );

    registration.object.att_stmt = statement(vec![
        ("alg", Value::Integer(12345.into())),
        ("sig", Value::Bytes(sig)),
    ]);
    assert_eq!(
        registration.verify().unwrap_err(),
        FormatError::UnsupportedAlgorithm(12345)
    );
}

#[test]
fn packed_with_garbage_certificate() {
    let mut registration = register(Attestation::Packed {
        key: leaf_key(),
        x5c: vec![leaf_der()],
    });
    registration.object.att_stmt.x5c = vec![vec![0x30, 0x03, 0x02, 0x01, 0x01]];
    assert!(matches!(
        registration.verify(),
        Err(FormatError::InvalidCertificate(_))
    ));
}

#[test]
fn fido_u2f() {
    let mut registration = register(Attestation::FidoU2f {
        key: leaf_key(),
        certificate: leaf_der(),
    });
    let verified = registration.verify().unwrap();
    assert_eq!(verified.kind, AttestationKind::Basic);
    assert_eq!(verified.chain.len(), 1);

    registration.object.att_stmt.x5c.push(leaf_der());
    assert_eq!(
        registration.verify().unwrap_err(),
        FormatError::CertificateCount {
            expected: 1,
            found: 2
        }
    );
}

#[test]
fn fido_u2f_signature_covers_the_credential() {
    let mut registration = register(Attestation::FidoU2f {
        key: leaf_key(),
        certificate: leaf_der(),
    });
    let other = register(Attestation::None);
    registration.key = other.key;
    assert_eq!(registration.verify().unwrap_err(), FormatError::BadSignature);
}

#[test]
fn unknown_formats_are_rejected() {
    let mut registration = register(Attestation::None);
    registration.object.fmt = "tpm".into();
    assert_eq!(
        registration.verify().unwrap_err(),
        FormatError::UnsupportedFormat("tpm".into())
    );
}
