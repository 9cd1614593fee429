//! Types for the JSON surface of the WebAuthn ceremonies, as exchanged between the relying party
//! and the browser.
//!
//! <https://w3c.github.io/webauthn/>

mod assertion;
mod attestation;
mod common;
mod credentials;

pub use self::{assertion::*, attestation::*, common::*, credentials::*};
