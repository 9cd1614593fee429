//! An owned, pre-parsed X.509 certificate.

use std::fmt;

use keyward_types::{encoding, CoseAlgorithm};
use p256::pkcs8::DecodePublicKey;
use rsa::{pkcs1v15, pss, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use signature::Verifier;
use x509_parser::pem::Pem;

use crate::CertificateError;


const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";

/// A DER certificate with the parts needed for anchoring extracted up front, so it can be shared
/// between threads and compared without re-parsing.
///
/// Names are kept as their raw DER encoding and compared byte for byte.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: Vec<u8>,
    issuer: Vec<u8>,
    subject_display: String,
    spki: Vec<u8>,
    tbs: Vec<u8>,
    signature_oid: String,
    signature: Vec<u8>,
    not_before: i64,
    not_after: i64,
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject_display)
            .field("signature_oid", &self.signature_oid)
            .finish_non_exhaustive()
    }
}

impl Certificate {
    /// Parse a single DER certificate. Bytes after the certificate are an error.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let (rest, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| CertificateError::Parse(e.to_string()))?;
        if !rest.is_empty() {
            return Err(CertificateError::Parse(format!(
                "{} bytes after the certificate",
                rest.len()
            )));
        }

        let tbs = &cert.tbs_certificate;
        Ok(Self {
            der: der.to_vec(),
            subject: tbs.subject.as_raw().to_vec(),
            issuer: tbs.issuer.as_raw().to_vec(),
            subject_display: tbs.subject.to_string(),
            spki: tbs.subject_pki.raw.to_vec(),
            tbs: tbs.as_ref().to_vec(),
            signature_oid: cert.signature_algorithm.algorithm.to_id_string(),
            signature: cert.signature_value.data.to_vec(),
            not_before: tbs.validity.not_before.timestamp(),
            not_after: tbs.validity.not_after.timestamp(),
        })
    }

    /// Parse every `CERTIFICATE` block of a PEM bundle.
    pub fn from_pem(pem: &str) -> Result<Vec<Self>, CertificateError> {
        Pem::iter_from_buffer(pem.as_bytes())
            .filter(|block| {
                block
                    .as_ref()
                    .map_or(true, |block| block.label == "CERTIFICATE")
            })
            .map(|block| {
                let block = block.map_err(|e| CertificateError::Parse(e.to_string()))?;
                Self::from_der(&block.contents)
            })
            .collect()
    }

    /// Parse a certificate given as text: a PEM bundle, or a single base64 DER certificate as
    /// metadata statements carry them.
    pub fn parse_text(text: &str) -> Result<Vec<Self>, CertificateError> {
        if text.contains("-----BEGIN") {
            let certs = Self::from_pem(text)?;
            if certs.is_empty() {
                return Err(CertificateError::Encoding);
            }
            return Ok(certs);
        }

        let compact: String = text.split_whitespace().collect();
        let der = encoding::try_from_base64(&compact)
            .or_else(|| encoding::try_from_base64url(&compact))
            .ok_or(CertificateError::Encoding)?;
        Self::from_der(&der).map(|cert| vec![cert])
    }

    /// The certificate as received.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The DER encoded subject name.
    pub fn subject(&self) -> &[u8] {
        &self.subject
    }

    /// The DER encoded issuer name.
    pub fn issuer(&self) -> &[u8] {
        &self.issuer
    }

    /// The subject in its RFC 4514 string form, for logs.
    pub fn subject_name(&self) -> &str {
        &self.subject_display
    }

    /// The DER SubjectPublicKeyInfo.
    pub fn public_key_der(&self) -> &[u8] {
        &self.spki
    }

    /// Whether `unix_time` lies within the validity period.
    pub fn is_valid_at(&self, unix_time: i64) -> bool {
        self.not_before <= unix_time && unix_time <= self.not_after
    }

    /// Whether `issuer`'s subject is this certificate's issuer and `issuer`'s key made its
    /// signature.
    pub fn is_issued_by(&self, issuer: &Certificate) -> bool {
        self.issuer == issuer.subject && self.verify_issued_by(issuer).is_ok()
    }

    /// Check this certificate's signature with the public key of `issuer`.
    pub fn verify_issued_by(&self, issuer: &Certificate) -> Result<(), CertificateError> {
        let spki = issuer.public_key_der();
        match self.signature_oid.as_str() {
            ECDSA_WITH_SHA256 => verify_p256(spki, &self.tbs, &self.signature),
            ECDSA_WITH_SHA384 => verify_p384(spki, &self.tbs, &self.signature),
            SHA256_WITH_RSA => verify_rsa(
                pkcs1v15::VerifyingKey::<Sha256>::new(rsa_key(spki)?),
                &self.tbs,
                &self.signature,
            ),
            SHA384_WITH_RSA => verify_rsa(
                pkcs1v15::VerifyingKey::<Sha384>::new(rsa_key(spki)?),
                &self.tbs,
                &self.signature,
            ),
            SHA512_WITH_RSA => verify_rsa(
                pkcs1v15::VerifyingKey::<Sha512>::new(rsa_key(spki)?),
                &self.tbs,
                &self.signature,
            ),
            other => Err(CertificateError::UnsupportedAlgorithm(other.to_owned())),
        }
    }

    /// Check a signature made by this certificate's key over `data`, as attestation statements
    /// carry them. ECDSA signatures are DER encoded.
    pub fn verify_signature(
        &self,
        alg: CoseAlgorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), CertificateError> {
        let spki = self.public_key_der();
        match alg {
            CoseAlgorithm::Es256 => verify_p256(spki, data, signature),
            CoseAlgorithm::Es384 => verify_p384(spki, data, signature),
            CoseAlgorithm::Rs256 => verify_rsa(
                pkcs1v15::VerifyingKey::<Sha256>::new(rsa_key(spki)?),
                data,
                signature,
            ),
            CoseAlgorithm::Rs384 => verify_rsa(
                pkcs1v15::VerifyingKey::<Sha384>::new(rsa_key(spki)?),
                data,
                signature,
            ),
            CoseAlgorithm::Rs512 => verify_rsa(
                pkcs1v15::VerifyingKey::<Sha512>::new(rsa_key(spki)?),
                data,
                signature,
            ),
            CoseAlgorithm::Ps256 => {
                let key = rsa_key(spki)?;
                let signature = pss::Signature::try_from(signature)
                    .map_err(|_| CertificateError::BadSignature)?;
                pss::VerifyingKey::<Sha256>::new(key)
                    .verify(data, &signature)
                    .map_err(|_| CertificateError::BadSignature)
            }
            other => Err(CertificateError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

fn verify_p256(spki: &[u8], data: &[u8], signature: &[u8]) -> Result<(), CertificateError> {
    let key = p256::ecdsa::VerifyingKey::from_public_key_der(spki)
        .map_err(|e| CertificateError::InvalidKey(e.to_string()))?;
    let signature =
        p256::ecdsa::Signature::from_der(signature).map_err(|_| CertificateError::BadSignature)?;
    key.verify(data, &signature)
        .map_err(|_| CertificateError::BadSignature)
}

fn verify_p384(spki: &[u8], data: &[u8], signature: &[u8]) -> Result<(), CertificateError> {
    let key = p384::ecdsa::VerifyingKey::from_public_key_der(spki)
        .map_err(|e| CertificateError::InvalidKey(e.to_string()))?;
    let signature =
        p384::ecdsa::Signature::from_der(signature).map_err(|_| CertificateError::BadSignature)?;
    key.verify(data, &signature)
        .map_err(|_| CertificateError::BadSignature)
}

fn rsa_key(spki: &[u8]) -> Result<RsaPublicKey, CertificateError> {
    RsaPublicKey::from_public_key_der(spki).map_err(|e| CertificateError::InvalidKey(e.to_string()))
}

fn verify_rsa<V>(key: V, data: &[u8], signature: &[u8]) -> Result<(), CertificateError>
where
    V: Verifier<pkcs1v15::Signature>,
{
    let signature =
        pkcs1v15::Signature::try_from(signature).map_err(|_| CertificateError::BadSignature)?;
    key.verify(data, &signature)
        .map_err(|_| CertificateError::BadSignature)
}
