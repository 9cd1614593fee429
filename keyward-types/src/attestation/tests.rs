use ciborium::{cbor, value::Value};
use coset::{CborSerializable, CoseKeyBuilder};

use super::*;
use crate::{
    auth_data::{AttestedCredentialData, Flags},
    utils::rand::random_vec,
};

const AAGUID: [u8; 16] = [
    0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff,
];

fn auth_data() -> Vec<u8> {
    let key = CoseKeyBuilder::new_ec2_pub_key(
        coset::iana::EllipticCurve::P_256,
        random_vec(32),
        random_vec(32),
    )
    .algorithm(coset::iana::Algorithm::ES256)
    .build()
    .to_vec()
    .expect("key encodes");
    let key: Value = ciborium::de::from_reader(key.as_slice()).expect("key decodes");

    AuthenticatorData::new("keyward.dev", 0)
        .set_flags(Flags::UP)
        .set_attested_credential_data(
            AttestedCredentialData::new(Aaguid(AAGUID), random_vec(16), key)
                .expect("short credential id"),
        )
        .to_vec()
}

fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(value, &mut out).expect("encodes");
    out
}

#[test]
fn none_attestation_object() {
    let auth_data = auth_data();
    let object = cbor!({
        "fmt" => "none",
        "attStmt" => {},
        "authData" => Value::Bytes(auth_data.clone()),
    })
    .unwrap();

    let parsed = AttestationObject::from_slice(&encode(&object)).expect("valid object");
    assert_eq!(parsed.fmt, "none");
    assert!(parsed.att_stmt.is_empty());
    assert!(parsed.att_stmt.x5c.is_empty());
    assert_eq!(parsed.raw_auth_data, auth_data);
    assert_eq!(
        parsed.aaguid().map(|a| a.to_string()).as_deref(),
        Some("00112233-4455-6677-8899-aabbccddeeff")
    );
}

#[test]
fn packed_statement_members_are_extracted() {
    let object = cbor!({
        "fmt" => "packed",
        "attStmt" => {
            "alg" => -7,
            "sig" => Value::Bytes(vec![1, 2, 3]),
            "x5c" => [Value::Bytes(vec![0x30, 0x00]), Value::Bytes(vec![0x30, 0x01])],
        },
        "authData" => Value::Bytes(auth_data()),
    })
    .unwrap();

    let parsed = AttestationObject::from_slice(&encode(&object)).expect("valid object");
    assert_eq!(parsed.att_stmt.alg, Some(-7));
    assert_eq!(parsed.att_stmt.sig, Some(vec![1, 2, 3]));
    assert_eq!(parsed.att_stmt.x5c, vec![vec![0x30, 0x00], vec![0x30, 0x01]]);

    let stored = parsed.att_stmt.to_base64url();
    let back = AttestationStatement::from_base64url(&stored).expect("stored form reads back");
    assert_eq!(back, parsed.att_stmt);
}

#[test]
fn missing_members_are_reported() {
    let object = cbor!({ "fmt" => "none", "attStmt" => {} }).unwrap();
    assert_eq!(
        AttestationObject::from_slice(&encode(&object)),
        Err(DecodeError::MissingField("authData"))
    );

    let object = cbor!({ "attStmt" => {}, "authData" => Value::Bytes(auth_data()) }).unwrap();
    assert_eq!(
        AttestationObject::from_slice(&encode(&object)),
        Err(DecodeError::MissingField("fmt"))
    );
}

#[test]
fn x5c_entries_must_be_bytes() {
    let object = cbor!({
        "fmt" => "packed",
        "attStmt" => { "alg" => -7, "x5c" => ["not a certificate"] },
        "authData" => Value::Bytes(auth_data()),
    })
    .unwrap();
    assert!(matches!(
        AttestationObject::from_slice(&encode(&object)),
        Err(DecodeError::InvalidCbor(_))
    ));
}

#[test]
fn trailing_bytes_after_the_object_are_rejected() {
    let object = cbor!({
        "fmt" => "none",
        "attStmt" => {},
        "authData" => Value::Bytes(auth_data()),
    })
    .unwrap();
    let mut bytes = encode(&object);
    bytes.push(0xf6);
    assert_eq!(
        AttestationObject::from_slice(&bytes),
        Err(DecodeError::TrailingBytes { remaining: 1 })
    );
}

#[test]
fn authenticator_data_errors_surface() {
    let object = cbor!({
        "fmt" => "none",
        "attStmt" => {},
        "authData" => Value::Bytes(vec![0; 10]),
    })
    .unwrap();
    assert_eq!(
        AttestationObject::from_slice(&encode(&object)),
        Err(DecodeError::TooShort {
            needed: 37,
            available: 10
        })
    );
}
