//! # Keyward
//!
//! Keyward is a collection of Rust libraries that implement the relying party side of
//! [WebAuthn][webauthn-3]: the server that hands out challenges, receives what the browser and the
//! authenticator produced, and decides whether to accept it. It is comprised of three
//! sub-libraries:
//!
//! - `keyward-types` - a library, usable as [`types`], with the wire and at-rest types: decoders for
//!   authenticator data, attestation objects and COSE keys, and the credential record.
//! - `keyward-trust` - a library, usable as [`trust`], which decides whether an attestation is
//!   trusted, from static roots or from the [FIDO Metadata Service][mds].
//! - `keyward-rp` - a library, usable as [`rp`], which runs the registration and authentication
//!   ceremonies.
//!
//! ## Basic Concepts
//!
//! A ceremony is two round trips. The relying party first issues options with a fresh challenge;
//! the browser asks an authenticator to sign over it; the relying party then checks the response
//! against the challenge it issued and against what it knows of the credential.
//!
//! Browser <-> [`RelyingParty`](rp::RelyingParty) <-> [`CredentialStore`](rp::CredentialStore)
//!
//! The [`RelyingParty`](rp::RelyingParty) type offers one method per endpoint:
//!
//! - [`start_registration()`](rp::RelyingParty::start_registration()) and
//!   [`finish_registration()`](rp::RelyingParty::finish_registration()) create a credential.
//! - [`start_authentication()`](rp::RelyingParty::start_authentication()) and
//!   [`finish_authentication()`](rp::RelyingParty::finish_authentication()) use it.
//!
//! Failures are [`CeremonyError`](rp::CeremonyError)s that keep their precise reason for logs,
//! while only [`public_message()`](rp::CeremonyError::public_message()) is meant for the client.
//!
//! A runnable demonstration binary is provided in `keyward/examples/usage.rs`.
//!
//! [webauthn-3]: https://www.w3.org/TR/webauthn-3/
//! [mds]: https://fidoalliance.org/metadata/
//!
//! ### Example: a registration followed by an authentication
//!
//! The browser side is played by the software authenticator of `keyward-rp`'s `testable` feature.
//!
//! ```
//! use keyward::rp::{
//!     testing::{Attestation, SoftwareAuthenticator},
//!     MemoryChallengeStore, MemoryCredentialStore, RelyingParty, RelyingPartyConfig,
//! };
//!
//! # tokio_test::block_on(async {
//! let config = RelyingPartyConfig::new("example.com", "https://login.example.com");
//! let rp = RelyingParty::from_config(
//!     config,
//!     MemoryCredentialStore::new(),
//!     MemoryChallengeStore::new(),
//! )?;
//! let mut authenticator = SoftwareAuthenticator::new("https://login.example.com");
//!
//! let options = rp.start_registration("alice", "Alice").await?;
//! let response = authenticator.register(&options, Attestation::None);
//! let record = rp.finish_registration(&response).await?;
//! assert_eq!(record.user_name, "alice");
//!
//! let options = rp.start_authentication(Some("alice")).await?;
//! let response = authenticator.authenticate(&options);
//! let record = rp.finish_authentication(&response).await?;
//! assert_eq!(record.counter, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # })
//! # .unwrap();
//! ```

pub use keyward_rp as rp;
pub use keyward_trust as trust;
pub use keyward_types as types;
