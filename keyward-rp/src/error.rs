//! Ceremony errors.
//!
//! Every failure keeps its specific reason for logs and audit, while clients are only ever shown
//! [`CeremonyError::public_message`].

use std::fmt;

use keyward_trust::AttestationRejected;
use keyward_types::{webauthn::CredentialsError, DecodeError, KeyConversionError};

use crate::formats::FormatError;

/// The message clients receive for every rejected ceremony.
pub const PUBLIC_REJECTION: &str = "The WebAuthn ceremony could not be completed";

/// Where a ceremony stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CeremonyState {
    /// Options were handed out and a challenge is outstanding.
    ChallengeIssued,
    /// The client posted a credential that answers the challenge.
    CredentialReceived,
    /// Client data and authenticator data were decoded and checked.
    Decoded,
    /// The attestation, or the assertion signature, was verified.
    AttestationVerified,
    /// The ceremony succeeded and its outcome was persisted.
    Accepted,
    /// The ceremony failed.
    Rejected,
}

impl fmt::Display for CeremonyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ChallengeIssued => "challenge-issued",
            Self::CredentialReceived => "credential-received",
            Self::Decoded => "decoded",
            Self::AttestationVerified => "attestation-verified",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        })
    }
}

/// `clientDataJSON` does not belong to this ceremony.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientDataError {
    /// Not valid client data JSON.
    #[error("malformed client data: {0}")]
    Malformed(String),

    /// `type` is not the one of this ceremony.
    #[error("client data type is {found}, expected {expected}")]
    UnexpectedType {
        /// The type the ceremony requires.
        expected: &'static str,
        /// The type found.
        found: String,
    },

    /// The challenge signed over is not the one issued.
    #[error("client data challenge does not match")]
    ChallengeMismatch,

    /// The origin is not the relying party's.
    #[error("client data origin {0} is not allowed")]
    OriginMismatch(String),
}

/// An assertion signature could not be checked or is wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The key or its algorithm cannot be used for verification.
    #[error("unsupported signature algorithm {0}")]
    UnsupportedAlgorithm(String),

    /// The stored key is incomplete or not a valid point or modulus.
    #[error("invalid public key: {0}")]
    InvalidKey(String),

    /// The signature is not encoded as the algorithm expects.
    #[error("malformed signature")]
    Malformed,

    /// The signature does not verify.
    #[error("signature verification failed")]
    BadSignature,
}

/// A store could not serve the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A record with this key exists already.
    #[error("record {0} already exists")]
    Duplicate(String),

    /// The backing storage failed.
    #[error("storage failure: {0}")]
    Backend(String),
}

/// The configuration cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No relying party id.
    #[error("rp id is empty")]
    EmptyRpId,

    /// The origin is not an absolute URL.
    #[error("invalid origin {0}")]
    InvalidOrigin(String),

    /// An algorithm name is not a known COSE algorithm.
    #[error("unknown algorithm {0}")]
    UnknownAlgorithm(String),

    /// No algorithm is allowed at all.
    #[error("no algorithms configured")]
    NoAlgorithms,

    /// Challenges would be shorter than the minimum.
    #[error("challenge length {0} is below the minimum of {min}", min = crate::config::MIN_CHALLENGE_LENGTH)]
    ChallengeTooShort(usize),

    /// Metadata trust was selected without an enabled metadata source.
    #[error("metadata trust mode requires an enabled metadata source")]
    MdsNotEnabled,

    /// An environment variable holds an unusable value.
    #[error("invalid value {value:?} for {name}")]
    InvalidValue {
        /// The variable.
        name: &'static str,
        /// Its value.
        value: String,
    },

    /// The configuration document is not valid.
    #[error("invalid configuration: {0}")]
    Parse(String),
}

/// Why a ceremony was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// The posted payload is structurally invalid.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// The challenge was never issued, was already used, expired or belongs to the other ceremony.
    #[error("unknown challenge")]
    UnknownChallenge,

    /// The client data does not match the ceremony.
    #[error(transparent)]
    ClientData(#[from] ClientDataError),

    /// Authenticator data or the attestation object failed to decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The credential public key cannot be used.
    #[error(transparent)]
    Key(#[from] KeyConversionError),

    /// The authenticator data is for another relying party.
    #[error("rp id hash does not match")]
    RpIdMismatch,

    /// The user present flag is not set.
    #[error("user presence missing")]
    UserNotPresent,

    /// User verification was required but did not take place.
    #[error("user verification missing")]
    UserNotVerified,

    /// A registration without attested credential data.
    #[error("attested credential data missing")]
    MissingCredentialData,

    /// The credential key uses an algorithm the relying party does not accept.
    #[error("algorithm {0} is not allowed")]
    AlgorithmNotAllowed(String),

    /// The attestation statement is invalid for its format.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The attestation is not trusted.
    #[error(transparent)]
    Attestation(#[from] AttestationRejected),

    /// The credential id is registered already.
    #[error("credential already registered")]
    DuplicateCredential,

    /// No credential with this id is registered.
    #[error("credential not found")]
    CredentialNotFound,

    /// The credential is registered to another user.
    #[error("credential belongs to another user")]
    UserMismatch,

    /// The assertion signature does not verify.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// The signature counter did not move forward, the authenticator may be cloned.
    #[error("replay detected for credential {cred_id}: counter {received} after {stored}")]
    ReplayDetected {
        /// The credential.
        cred_id: String,
        /// The counter on record.
        stored: u32,
        /// The counter reported.
        received: u32,
    },

    /// A store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A rejected ceremony, with the state it was rejected in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason} (at {stage})")]
pub struct CeremonyError {
    stage: CeremonyState,
    reason: RejectReason,
}

impl CeremonyError {
    /// Reject at `stage` for `reason`.
    pub fn new(stage: CeremonyState, reason: impl Into<RejectReason>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }

    /// The state the ceremony was in when it failed.
    pub fn stage(&self) -> CeremonyState {
        self.stage
    }

    /// The specific reason, for logs and audit.
    pub fn reason(&self) -> &RejectReason {
        &self.reason
    }

    /// Whether the rejection is a suspected replay or cloned authenticator.
    pub fn is_replay(&self) -> bool {
        matches!(self.reason, RejectReason::ReplayDetected { .. })
    }

    /// The only text a client may be shown.
    pub fn public_message(&self) -> &'static str {
        PUBLIC_REJECTION
    }
}
