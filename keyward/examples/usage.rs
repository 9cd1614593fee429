//! Sample relying party: registers a credential with packed attestation, then signs in with it.
use std::sync::Arc;

use keyward::{
    rp::{
        testing::{Attestation, SoftwareAuthenticator},
        CeremonyError, MemoryChallengeStore, MemoryCredentialStore, RelyingParty,
        RelyingPartyConfig,
    },
    trust::Certificate,
    types::webauthn::AttestationConveyancePreference,
};
use p256::{ecdsa::SigningKey, pkcs8::DecodePrivateKey};

const ORIGIN: &str = "https://login.example.com";

async fn sign_up_and_in(
    rp: &RelyingParty<Arc<MemoryCredentialStore>, MemoryChallengeStore>,
    authenticator: &mut SoftwareAuthenticator,
    attestation: Attestation,
) -> Result<u32, CeremonyError> {
    // The options would be serialized to JSON and sent to the browser.
    let options = rp.start_registration("alice", "Alice").await?;
    let response = authenticator.register(&options, attestation);
    let record = rp.finish_registration(&response).await?;
    println!(
        "registered {} for {} ({} attestation)",
        record.cred_id, record.user_name, record.fmt
    );

    let options = rp.start_authentication(Some("alice")).await?;
    let response = authenticator.authenticate(&options);
    let record = rp.finish_authentication(&response).await?;
    Ok(record.counter)
}

#[tokio::main]
async fn main() {
    let config = RelyingPartyConfig::new("example.com", ORIGIN)
        .with_attestation(AttestationConveyancePreference::Direct)
        .with_root_certificates([include_str!("../tests/fixtures/root.pem")]);
    let credentials = Arc::new(MemoryCredentialStore::new());
    let rp = RelyingParty::from_config(config, credentials.clone(), MemoryChallengeStore::new())
        .expect("configuration is valid");

    let leaf = Certificate::from_pem(include_str!("../tests/fixtures/leaf_direct.pem"))
        .expect("fixture certificate");
    let attestation = Attestation::Packed {
        key: SigningKey::from_pkcs8_pem(include_str!("../tests/fixtures/leaf_direct.pkcs8.pem"))
            .expect("fixture key"),
        x5c: leaf.iter().map(|cert| cert.der().to_vec()).collect(),
    };

    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    match sign_up_and_in(&rp, &mut authenticator, attestation).await {
        Ok(counter) => println!("signed in, signature counter is now {counter}"),
        Err(e) => println!("{} ({e})", e.public_message()),
    }

    // Presenting the same counter again looks like a cloned authenticator.
    let options = rp
        .start_authentication(Some("alice"))
        .await
        .expect("challenge issued");
    match rp.finish_authentication(&authenticator.assert(&options)).await {
        Ok(_) => println!("replay accepted"),
        Err(e) if e.is_replay() => println!("replay refused: {e}"),
        Err(e) => println!("unexpected rejection: {e}"),
    }
    println!("{} credential(s) on record", credentials.len().await);
}
