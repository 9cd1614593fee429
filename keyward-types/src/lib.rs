//! # Keyward Types
//!
//! Wire and at-rest types for a WebAuthn relying party.
//!
//! Everything in here is pure: decoders take bytes the client sent and return typed values or a
//! [`DecodeError`], the key converter turns a COSE_Key into a [`NormalizedKey`], and
//! [`Authenticator`] is the record a credential store keeps between ceremonies.

#[macro_use]
mod utils;

pub mod attestation;
pub mod auth_data;
mod authenticator;
pub mod cose;
mod error;
pub mod webauthn;

// Re-exports
pub use self::{
    attestation::{AttestationObject, AttestationStatement},
    auth_data::{Aaguid, AuthenticatorData, Flags},
    authenticator::Authenticator,
    cose::{CoseAlgorithm, EllipticCurve, KeyType, NormalizedKey},
    error::{DecodeError, KeyConversionError},
    utils::{
        bytes::{Bytes, NotBase64Encoded},
        crypto, encoding,
        rand::random_vec,
        repr_enum::{CodeOutOfRange, UnknownName},
    },
};
