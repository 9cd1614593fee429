//! # Keyward Relying Party
//!
//! This crate defines a [`RelyingParty`] type that runs the server side of the [WebAuthn]
//! registration and authentication ceremonies. It issues challenges, checks what the browser posts
//! back against them, verifies attestation statements and assertion signatures, and keeps the
//! signature counter of every credential moving forward.
//!
//! Storage is left to the caller through the [`CredentialStore`] and [`ChallengeStore`] traits.
//! Whether an attestation is trusted is decided by a [`keyward_trust::AttestationVerifier`].
//!
//! This crate does not serve HTTP; each endpoint of a relying party maps to one async method.
//!
//! [WebAuthn]: https://w3c.github.io/webauthn/

mod config;
mod error;
pub mod formats;
mod relying_party;
pub mod signature;
pub mod store;

#[cfg(any(test, feature = "testable"))]
pub mod testing;

pub use self::{
    config::{RelyingPartyConfig, TrustMode, MIN_CHALLENGE_LENGTH},
    error::{
        CeremonyError, CeremonyState, ClientDataError, ConfigError, RejectReason, SignatureError,
        StoreError, PUBLIC_REJECTION,
    },
    relying_party::RelyingParty,
    store::{
        Ceremony, ChallengeBinding, ChallengeStore, CredentialStore, MemoryChallengeStore,
        MemoryCredentialStore,
    },
};
