//! Verification of signatures made by a credential key.

use keyward_types::{CoseAlgorithm, EllipticCurve, KeyType, NormalizedKey};
use rsa::{pkcs1v15, pss, BigUint, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use signature::Verifier;

use crate::SignatureError;

/// The algorithm `key` signs with: its `alg` member, or the one implied by its type and curve.
pub fn key_algorithm(key: &NormalizedKey) -> Result<CoseAlgorithm, SignatureError> {
    if let Some(alg) = key.alg {
        return Ok(alg);
    }
    match (key.kty, key.crv) {
        (KeyType::Ec, Some(EllipticCurve::P256)) => Ok(CoseAlgorithm::Es256),
        (KeyType::Ec, Some(EllipticCurve::P384)) => Ok(CoseAlgorithm::Es384),
        (KeyType::Rsa, _) => Ok(CoseAlgorithm::Rs256),
        (kty, crv) => Err(SignatureError::UnsupportedAlgorithm(format!(
            "{kty} key on curve {}",
            crv.map_or("none", EllipticCurve::name)
        ))),
    }
}

/// Check `signature` over `data` with the credential key `key`.
///
/// ECDSA signatures are DER encoded, unless the key carries `asn1: false` and the signature has
/// the length of a raw `r || s` pair.
pub fn verify_signature(
    key: &NormalizedKey,
    data: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    let alg = key_algorithm(key)?;
    let raw = key.asn1 == Some(false);
    match alg {
        CoseAlgorithm::Es256 => {
            let key = p256_key(key)?;
            let signature = if raw && signature.len() == 64 {
                p256::ecdsa::Signature::from_slice(signature)
            } else {
                p256::ecdsa::Signature::from_der(signature)
            }
            .map_err(|_| SignatureError::Malformed)?;
            key.verify(data, &signature)
                .map_err(|_| SignatureError::BadSignature)
        }
        CoseAlgorithm::Es384 => {
            let key = p384_key(key)?;
            let signature = if raw && signature.len() == 96 {
                p384::ecdsa::Signature::from_slice(signature)
            } else {
                p384::ecdsa::Signature::from_der(signature)
            }
            .map_err(|_| SignatureError::Malformed)?;
            key.verify(data, &signature)
                .map_err(|_| SignatureError::BadSignature)
        }
        CoseAlgorithm::Rs256 => verify_pkcs1v15(
            pkcs1v15::VerifyingKey::<Sha256>::new(rsa_key(key)?),
            data,
            signature,
        ),
        CoseAlgorithm::Rs384 => verify_pkcs1v15(
            pkcs1v15::VerifyingKey::<Sha384>::new(rsa_key(key)?),
            data,
            signature,
        ),
        CoseAlgorithm::Rs512 => verify_pkcs1v15(
            pkcs1v15::VerifyingKey::<Sha512>::new(rsa_key(key)?),
            data,
            signature,
        ),
        CoseAlgorithm::Ps256 => {
            let signature =
                pss::Signature::try_from(signature).map_err(|_| SignatureError::Malformed)?;
            pss::VerifyingKey::<Sha256>::new(rsa_key(key)?)
                .verify(data, &signature)
                .map_err(|_| SignatureError::BadSignature)
        }
        other => Err(SignatureError::UnsupportedAlgorithm(other.to_string())),
    }
}

/// The affine coordinates of an EC key, each `len` bytes long.
pub(crate) fn ec_coordinates(
    key: &NormalizedKey,
    len: usize,
) -> Result<(Vec<u8>, Vec<u8>), SignatureError> {
    let coordinate = |name: &str| {
        key.param_bytes(name)
            .filter(|bytes| bytes.len() == len)
            .ok_or_else(|| SignatureError::InvalidKey(format!("missing or malformed `{name}`")))
    };
    Ok((coordinate("x")?, coordinate("y")?))
}

fn expect_curve(key: &NormalizedKey, curve: EllipticCurve) -> Result<(), SignatureError> {
    match (key.kty, key.crv) {
        (KeyType::Ec, Some(crv)) if crv == curve => Ok(()),
        (KeyType::Ec, None) => Ok(()),
        _ => Err(SignatureError::InvalidKey(format!("not a {curve} key"))),
    }
}

fn p256_key(key: &NormalizedKey) -> Result<p256::ecdsa::VerifyingKey, SignatureError> {
    expect_curve(key, EllipticCurve::P256)?;
    let (x, y) = ec_coordinates(key, 32)?;
    let point = p256::EncodedPoint::from_affine_coordinates(
        p256::FieldBytes::from_slice(&x),
        p256::FieldBytes::from_slice(&y),
        false,
    );
    p256::ecdsa::VerifyingKey::from_encoded_point(&point)
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))
}

fn p384_key(key: &NormalizedKey) -> Result<p384::ecdsa::VerifyingKey, SignatureError> {
    expect_curve(key, EllipticCurve::P384)?;
    let (x, y) = ec_coordinates(key, 48)?;
    let point = p384::EncodedPoint::from_affine_coordinates(
        p384::FieldBytes::from_slice(&x),
        p384::FieldBytes::from_slice(&y),
        false,
    );
    p384::ecdsa::VerifyingKey::from_encoded_point(&point)
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))
}

fn rsa_key(key: &NormalizedKey) -> Result<RsaPublicKey, SignatureError> {
    if key.kty != KeyType::Rsa {
        return Err(SignatureError::InvalidKey("not an RSA key".into()));
    }
    let member = |name: &str| {
        key.param_bytes(name)
            .filter(|bytes| !bytes.is_empty())
            .map(|bytes| BigUint::from_bytes_be(&bytes))
            .ok_or_else(|| SignatureError::InvalidKey(format!("missing `{name}`")))
    };
    RsaPublicKey::new(member("n")?, member("e")?)
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))
}

fn verify_pkcs1v15<V>(key: V, data: &[u8], signature: &[u8]) -> Result<(), SignatureError>
where
    V: Verifier<pkcs1v15::Signature>,
{
    let signature =
        pkcs1v15::Signature::try_from(signature).map_err(|_| SignatureError::Malformed)?;
    key.verify(data, &signature)
        .map_err(|_| SignatureError::BadSignature)
}
