//! Errors raised while evaluating attestation trust.

/// The attestation could not be tied to a trusted root. Fatal to the registration; never changes
/// any cache.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttestationRejected {
    /// No certificate of the chain leads to a trust root, or the chain is broken on the way there.
    #[error("attestation chain is not anchored: {0}")]
    NotAnchored(String),

    /// No trust roots are known for the authenticator model.
    #[error("unknown authenticator model {0}")]
    UnknownAuthenticatorModel(String),

    /// The statement has no certificates and self attestation is not accepted.
    #[error("self attestation is not allowed")]
    SelfAttestationNotAllowed,

    /// A certificate of the chain is not a parsable X.509 certificate.
    #[error("invalid attestation certificate: {0}")]
    InvalidCertificate(String),
}

/// Fetching or reading FIDO metadata failed. Recoverable: the last known good cache stays in use.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataFetchError {
    /// The request could not be sent or its body not read.
    #[error("metadata request failed: {0}")]
    Network(String),

    /// The request did not complete within the fetch timeout.
    #[error("metadata request timed out")]
    Timeout,

    /// The server answered with a non success status.
    #[error("metadata server answered with status {0}")]
    Status(u16),

    /// The table of contents is not a three part token with a JSON payload.
    #[error("invalid metadata token: {0}")]
    InvalidToken(String),

    /// A metadata statement is not valid JSON.
    #[error("invalid metadata statement: {0}")]
    InvalidStatement(String),

    /// The service has no source URL configured.
    #[error("metadata service has no source configured")]
    NotConfigured,
}

/// A certificate could not be parsed or its signature could not be checked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CertificateError {
    /// The DER could not be parsed as an X.509 certificate.
    #[error("invalid certificate DER: {0}")]
    Parse(String),

    /// The text is neither a PEM bundle nor base64 DER.
    #[error("certificate text is neither PEM nor base64 DER")]
    Encoding,

    /// The signature algorithm is not one that can be checked.
    #[error("unsupported certificate signature algorithm {0}")]
    UnsupportedAlgorithm(String),

    /// The issuer public key does not fit the signature algorithm.
    #[error("invalid issuer public key: {0}")]
    InvalidKey(String),

    /// The signature does not verify.
    #[error("certificate signature verification failed")]
    BadSignature,
}
