//! Attestation statement formats.
//!
//! A format check proves that the statement was produced over this registration; whether the
//! certificates it carries are trusted is decided afterwards by the attestation verifier.

use keyward_trust::{Certificate, CertificateError};
use keyward_types::{AttestationObject, CoseAlgorithm, NormalizedKey};

use crate::{
    signature::{ec_coordinates, key_algorithm, verify_signature},
    SignatureError,
};

#[cfg(test)]
mod tests;

/// `fmt` of attestation objects without attestation.
pub const NONE: &str = "none";
/// `fmt` of the WebAuthn packed format.
pub const PACKED: &str = "packed";
/// `fmt` of FIDO U2F attestation.
pub const FIDO_U2F: &str = "fido-u2f";

/// A statement does not hold up for its format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The format is not one this relying party understands.
    #[error("unsupported attestation format {0}")]
    UnsupportedFormat(String),

    /// A `none` statement that is not empty.
    #[error("`none` attestation must have an empty statement")]
    UnexpectedStatement,

    /// A member the format requires is absent.
    #[error("attestation statement lacks `{0}`")]
    MissingMember(&'static str),

    /// The registration carries no attested credential data.
    #[error("attested credential data missing")]
    MissingCredentialData,

    /// `alg` is not a known algorithm.
    #[error("unsupported statement algorithm {0}")]
    UnsupportedAlgorithm(i64),

    /// A self attestation signed with another algorithm than the credential key's.
    #[error("statement algorithm {statement} does not match the credential key algorithm {key}")]
    AlgorithmMismatch {
        /// The statement's `alg`.
        statement: String,
        /// The credential key's algorithm.
        key: String,
    },

    /// `x5c` has the wrong number of certificates.
    #[error("`x5c` must hold {expected} certificate(s), found {found}")]
    CertificateCount {
        /// How many the format requires.
        expected: usize,
        /// How many there are.
        found: usize,
    },

    /// The attestation certificate cannot be used.
    #[error("invalid attestation certificate: {0}")]
    InvalidCertificate(String),

    /// The credential key cannot be used for this format.
    #[error("invalid credential key: {0}")]
    InvalidKey(String),

    /// The statement signature does not verify.
    #[error("attestation signature verification failed")]
    BadSignature,
}

/// How the authenticator attested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationKind {
    /// No attestation was conveyed.
    None,
    /// Signed with the credential key itself.
    SelfAttestation,
    /// Signed with an attestation key certified by `x5c`.
    Basic,
}

/// The outcome of a successful format check.
#[derive(Debug, Clone)]
pub struct VerifiedStatement {
    /// How the authenticator attested.
    pub kind: AttestationKind,
    /// The certificates to evaluate for trust, leaf first. Empty unless `kind` is `Basic`.
    pub chain: Vec<Certificate>,
}

impl VerifiedStatement {
    fn without_chain(kind: AttestationKind) -> Self {
        Self {
            kind,
            chain: Vec::new(),
        }
    }
}

/// Check the statement of `object` for its format.
///
/// `client_data_hash` is the SHA-256 of the `clientDataJSON` of the registration and `key` the
/// credential key from the attested credential data.
pub fn verify_statement(
    object: &AttestationObject,
    client_data_hash: &[u8; 32],
    key: &NormalizedKey,
) -> Result<VerifiedStatement, FormatError> {
    match object.fmt.as_str() {
        NONE => verify_none(object),
        PACKED => verify_packed(object, client_data_hash, key),
        FIDO_U2F => verify_fido_u2f(object, client_data_hash, key),
        other => Err(FormatError::UnsupportedFormat(other.to_owned())),
    }
}

fn verify_none(object: &AttestationObject) -> Result<VerifiedStatement, FormatError> {
    if !object.att_stmt.is_empty() {
        return Err(FormatError::UnexpectedStatement);
    }
    Ok(VerifiedStatement::without_chain(AttestationKind::None))
}

fn verify_packed(
    object: &AttestationObject,
    client_data_hash: &[u8; 32],
    key: &NormalizedKey,
) -> Result<VerifiedStatement, FormatError> {
    let statement = &object.att_stmt;
    let alg_code = statement.alg.ok_or(FormatError::MissingMember("alg"))?;
    let alg =
        CoseAlgorithm::try_from(alg_code).map_err(|_| FormatError::UnsupportedAlgorithm(alg_code))?;
    let sig = statement
        .sig
        .as_deref()
        .ok_or(FormatError::MissingMember("sig"))?;
    let signed = [object.raw_auth_data.as_slice(), client_data_hash.as_slice()].concat();

    if statement.x5c.is_empty() {
        let key_alg = key_algorithm(key).map_err(|e| FormatError::InvalidKey(e.to_string()))?;
        if key_alg != alg {
            return Err(FormatError::AlgorithmMismatch {
                statement: alg.to_string(),
                key: key_alg.to_string(),
            });
        }
        verify_signature(key, &signed, sig).map_err(|e| match e {
            SignatureError::BadSignature | SignatureError::Malformed => FormatError::BadSignature,
            other => FormatError::InvalidKey(other.to_string()),
        })?;
        return Ok(VerifiedStatement::without_chain(
            AttestationKind::SelfAttestation,
        ));
    }

    let chain = parse_chain(&statement.x5c)?;
    chain[0]
        .verify_signature(alg, &signed, sig)
        .map_err(certificate_failure)?;
    Ok(VerifiedStatement {
        kind: AttestationKind::Basic,
        chain,
    })
}

fn verify_fido_u2f(
    object: &AttestationObject,
    client_data_hash: &[u8; 32],
    key: &NormalizedKey,
) -> Result<VerifiedStatement, FormatError> {
    let statement = &object.att_stmt;
    let sig = statement
        .sig
        .as_deref()
        .ok_or(FormatError::MissingMember("sig"))?;
    if statement.x5c.len() != 1 {
        return Err(FormatError::CertificateCount {
            expected: 1,
            found: statement.x5c.len(),
        });
    }
    let chain = parse_chain(&statement.x5c)?;

    let credential = object
        .auth_data
        .attested_credential_data
        .as_ref()
        .ok_or(FormatError::MissingCredentialData)?;
    let (x, y) = ec_coordinates(key, 32).map_err(|e| FormatError::InvalidKey(e.to_string()))?;

    let mut signed = Vec::with_capacity(1 + 32 + 32 + credential.credential_id().len() + 65);
    signed.push(0x00);
    signed.extend_from_slice(object.auth_data.rp_id_hash());
    signed.extend_from_slice(client_data_hash);
    signed.extend_from_slice(credential.credential_id());
    signed.push(0x04);
    signed.extend_from_slice(&x);
    signed.extend_from_slice(&y);

    chain[0]
        .verify_signature(CoseAlgorithm::Es256, &signed, sig)
        .map_err(certificate_failure)?;
    Ok(VerifiedStatement {
        kind: AttestationKind::Basic,
        chain,
    })
}

fn parse_chain(x5c: &[Vec<u8>]) -> Result<Vec<Certificate>, FormatError> {
    x5c.iter()
        .map(|der| Certificate::from_der(der))
        .collect::<Result<_, _>>()
        .map_err(|e| FormatError::InvalidCertificate(e.to_string()))
}

fn certificate_failure(error: CertificateError) -> FormatError {
    match error {
        CertificateError::BadSignature => FormatError::BadSignature,
        other => FormatError::InvalidCertificate(other.to_string()),
    }
}
