//! Errors produced while decoding client supplied binary data.

/// Malformed binary or CBOR input. Always fatal to the ceremony it occurred in, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffer ended before a field could be read, or is below a documented minimum length.
    #[error("buffer too short: needed {needed} bytes, {available} available")]
    TooShort {
        /// Number of bytes required at the point of failure.
        needed: usize,
        /// Number of bytes that were actually available.
        available: usize,
    },

    /// Bytes remained after every section the flags announced had been decoded.
    #[error("{remaining} trailing bytes after the last decoded section")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        remaining: usize,
    },

    /// A CBOR item could not be decoded or had an unexpected shape.
    #[error("invalid CBOR: {0}")]
    InvalidCbor(String),

    /// A required member of a CBOR map is absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

/// A COSE key could not be turned into a [`NormalizedKey`](crate::NormalizedKey). Fatal to the
/// ceremony.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyConversionError {
    /// The key map has no `kty` (label 1) member.
    #[error("COSE key has no key type")]
    MissingKeyType,

    /// The key type code is not one this relying party understands.
    #[error("unsupported COSE key type {0}")]
    UnsupportedKeyType(i64),

    /// The algorithm code is not in the COSE algorithm table.
    #[error("unsupported COSE algorithm {0}")]
    UnsupportedAlgorithm(i64),

    /// The EC curve code is not in the COSE curve table.
    #[error("unsupported COSE elliptic curve {0}")]
    UnsupportedCurve(i64),

    /// A label that is not defined for the resolved key type.
    #[error("unknown COSE label {label} for key type {kty}")]
    UnknownCoseLabel {
        /// The resolved key type name.
        kty: &'static str,
        /// The offending label, rendered as text.
        label: String,
    },

    /// A value whose CBOR type cannot be represented for its label.
    #[error("invalid value for COSE label {0}")]
    InvalidValue(String),
}
