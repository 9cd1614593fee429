//! # Keyward Trust
//!
//! Decides whether an authenticator's attestation can be trusted.
//!
//! Roots come either from a [`TrustAnchorRegistry`] loaded at start up, or from the FIDO Metadata
//! Service through a cached [`MetadataService`]. Either way an [`AttestationVerifier`] anchors the
//! `x5c` chain of an attestation statement to those roots with [`anchor_chain`].

mod anchor;
mod certificate;
mod error;
pub mod mds;
mod registry;
mod verifier;

pub use self::{
    anchor::{anchor_chain, anchor_chain_at},
    certificate::Certificate,
    error::{AttestationRejected, CertificateError, MetadataFetchError},
    mds::{
        HttpMetadataFetcher, MdsCache, MdsConfig, MetadataEntry, MetadataFetcher, MetadataService,
    },
    registry::TrustAnchorRegistry,
    verifier::{AttestationPolicy, AttestationVerifier, UnknownModelPolicy},
};

#[cfg(any(test, feature = "testable"))]
pub use self::mds::MockMetadataFetcher;
