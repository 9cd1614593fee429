use std::sync::Arc;

use keyward_trust::{
    AttestationPolicy, AttestationRejected, AttestationVerifier, Certificate, MdsConfig,
    MetadataService, MockMetadataFetcher, TrustAnchorRegistry,
};
use keyward_types::{
    encoding,
    webauthn::{AttestationConveyancePreference, ClientDataType, UserVerificationRequirement},
    Aaguid, CoseAlgorithm, Flags, NormalizedKey,
};
use p256::{ecdsa::SigningKey, pkcs8::DecodePrivateKey};
use serde_json::json;
use url::Url;

use super::RelyingParty;
use crate::{
    testing::{Attestation, SoftwareAuthenticator},
    CeremonyError, CeremonyState, ClientDataError, ConfigError, CredentialStore,
    MemoryChallengeStore, MemoryCredentialStore, RejectReason, RelyingPartyConfig, SignatureError,
    PUBLIC_REJECTION,
};

const ORIGIN: &str = "https://login.example.com";
const ROOT: &str = include_str!("../../tests/fixtures/root.pem");
const OTHER_ROOT: &str = include_str!("../../tests/fixtures/other_root.pem");
const LEAF: &str = include_str!("../../tests/fixtures/leaf_direct.pem");
const LEAF_KEY: &str = include_str!("../../tests/fixtures/leaf_direct.pkcs8.pem");
const AAGUID: &str = "cb69481e-8ff7-4039-93ec-0a2729a154a8";

type Party = RelyingParty<Arc<MemoryCredentialStore>, MemoryChallengeStore, MockMetadataFetcher>;

fn config() -> RelyingPartyConfig {
    RelyingPartyConfig::new("example.com", ORIGIN)
}

fn setup(config: RelyingPartyConfig, roots: &[&str]) -> (Party, Arc<MemoryCredentialStore>) {
    let registry = TrustAnchorRegistry::new();
    registry.load(roots);
    let verifier = AttestationVerifier::new_static(Arc::new(registry), config.attestation_policy());
    let credentials = Arc::new(MemoryCredentialStore::new());
    let party = RelyingParty::new(
        config,
        credentials.clone(),
        MemoryChallengeStore::new(),
        verifier,
    )
    .unwrap();
    (party, credentials)
}

fn leaf_attestation() -> Attestation {
    Attestation::Packed {
        key: SigningKey::from_pkcs8_pem(LEAF_KEY).unwrap(),
        x5c: vec![Certificate::from_pem(LEAF).unwrap()[0].der().to_vec()],
    }
}

fn rejected(error: &CeremonyError) -> (CeremonyState, RejectReason) {
    (error.stage(), error.reason().clone())
}

async fn register(party: &Party, authenticator: &mut SoftwareAuthenticator, user: &str) {
    let options = party.start_registration(user, user).await.unwrap();
    let response = authenticator.register(&options, Attestation::None);
    party.finish_registration(&response).await.unwrap();
}

#[tokio::test]
async fn registration_options() {
    let (party, _) = setup(config(), &[]);
    let options = party
        .start_registration("alice", "Alice Liddell")
        .await
        .unwrap()
        .public_key;

    assert_eq!(options.rp.id, "example.com");
    assert_eq!(options.user.name, "alice");
    assert_eq!(options.user.display_name, "Alice Liddell");
    assert_eq!(options.user.id.len(), 32);
    assert_eq!(options.challenge.len(), 64);
    assert_eq!(
        options
            .pub_key_cred_params
            .iter()
            .map(|param| param.alg)
            .collect::<Vec<_>>(),
        [CoseAlgorithm::Es256, CoseAlgorithm::Rs256]
    );
    assert_eq!(options.timeout, Some(60_000));
    assert_eq!(options.attestation, AttestationConveyancePreference::None);
    assert!(options.exclude_credentials.is_empty());

    let again = party.start_registration("alice", "Alice").await.unwrap();
    assert_ne!(again.public_key.challenge, options.challenge);
}

#[tokio::test]
async fn register_then_authenticate() {
    let (party, credentials) = setup(config(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);

    let options = party.start_registration("alice", "Alice").await.unwrap();
    let response = authenticator.register(&options, Attestation::None);
    let record = party.finish_registration(&response).await.unwrap();

    assert_eq!(record.cred_id, authenticator.cred_id());
    assert_eq!(record.counter, 0);
    assert_eq!(record.user_name, "alice");
    assert_eq!(record.fmt, "none");
    assert_eq!(record.att_stmt, "oA");
    assert_eq!(record.aaguid, "00000000-0000-0000-0000-000000000000");
    let key = NormalizedKey::from_json(&record.public_key).unwrap();
    assert_eq!(key.alg, Some(CoseAlgorithm::Es256));
    assert_eq!(credentials.find_by_id(&record.cred_id).await.unwrap(), Some(record.clone()));

    let options = party.start_registration("alice", "Alice").await.unwrap();
    assert_eq!(
        options.public_key.exclude_credentials[0].id.as_slice(),
        authenticator.credential_id()
    );

    let options = party.start_authentication(Some("alice")).await.unwrap();
    assert_eq!(options.public_key.rp_id, "example.com");
    assert_eq!(options.public_key.allow_credentials.len(), 1);
    let response = authenticator.authenticate(&options);
    let updated = party.finish_authentication(&response).await.unwrap();
    assert_eq!(updated.counter, 1);
    assert_eq!(
        credentials.find_by_id(&record.cred_id).await.unwrap().unwrap().counter,
        1
    );
}

#[tokio::test]
async fn usernameless_authentication() {
    let (party, _) = setup(config(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    register(&party, &mut authenticator, "alice").await;

    let options = party.start_authentication(None).await.unwrap();
    assert!(options.public_key.allow_credentials.is_empty());
    let mut response = authenticator.authenticate(&options);
    response.username = None;
    let record = party.finish_authentication(&response).await.unwrap();
    assert_eq!(record.user_name, "alice");
}

#[tokio::test]
async fn challenges_are_single_use() {
    let (party, _) = setup(config(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    let options = party.start_registration("alice", "Alice").await.unwrap();
    let response = authenticator.register(&options, Attestation::None);
    party.finish_registration(&response).await.unwrap();

    let error = party.finish_registration(&response).await.unwrap_err();
    assert_eq!(
        rejected(&error),
        (CeremonyState::ChallengeIssued, RejectReason::UnknownChallenge)
    );
    assert_eq!(error.public_message(), PUBLIC_REJECTION);
}

#[tokio::test]
async fn challenge_of_the_other_ceremony() {
    let (party, _) = setup(config(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    let mut options = party.start_registration("alice", "Alice").await.unwrap();
    let authentication = party.start_authentication(Some("alice")).await.unwrap();
    options.public_key.challenge = authentication.public_key.challenge;

    let response = authenticator.register(&options, Attestation::None);
    let error = party.finish_registration(&response).await.unwrap_err();
    assert_eq!(error.reason(), &RejectReason::UnknownChallenge);
}

#[tokio::test]
async fn malformed_payload() {
    let (party, _) = setup(config(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    let options = party.start_registration("alice", "Alice").await.unwrap();
    let mut response = authenticator.register(&options, Attestation::None);
    response.webauthn.as_mut().unwrap()["rawId"] = json!("AAAA");

    let error = party.finish_registration(&response).await.unwrap_err();
    assert!(matches!(error.reason(), RejectReason::Credentials(_)));
    assert_eq!(error.stage(), CeremonyState::ChallengeIssued);
}

#[tokio::test]
async fn origin_must_match() {
    let (party, _) = setup(config(), &[]);
    let mut authenticator = SoftwareAuthenticator::new("https://evil.example");
    let options = party.start_registration("alice", "Alice").await.unwrap();
    let response = authenticator.register(&options, Attestation::None);

    let error = party.finish_registration(&response).await.unwrap_err();
    assert_eq!(
        rejected(&error),
        (
            CeremonyState::CredentialReceived,
            RejectReason::from(ClientDataError::OriginMismatch(
                "https://evil.example".into()
            ))
        )
    );
}

#[tokio::test]
async fn rp_id_must_match() {
    let (party, _) = setup(config(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    let mut options = party.start_registration("alice", "Alice").await.unwrap();
    options.public_key.rp.id = "evil.example".into();
    let response = authenticator.register(&options, Attestation::None);

    let error = party.finish_registration(&response).await.unwrap_err();
    assert_eq!(
        rejected(&error),
        (CeremonyState::CredentialReceived, RejectReason::RpIdMismatch)
    );
}

#[tokio::test]
async fn user_presence_and_verification() {
    let (party, _) = setup(config(), &[]);
    let mut absent = SoftwareAuthenticator::new(ORIGIN).with_flags(Flags::UV);
    let options = party.start_registration("alice", "Alice").await.unwrap();
    let response = absent.register(&options, Attestation::None);
    let error = party.finish_registration(&response).await.unwrap_err();
    assert_eq!(error.reason(), &RejectReason::UserNotPresent);

    let mut unverified = SoftwareAuthenticator::new(ORIGIN).with_flags(Flags::UP);
    let options = party.start_registration("alice", "Alice").await.unwrap();
    let response = unverified.register(&options, Attestation::None);
    party.finish_registration(&response).await.unwrap();

    let (strict, _) = party_with_uv_required();
    let mut unverified = SoftwareAuthenticator::new(ORIGIN).with_flags(Flags::UP);
    let options = strict.start_registration("bob", "Bob").await.unwrap();
    let response = unverified.register(&options, Attestation::None);
    let error = strict.finish_registration(&response).await.unwrap_err();
    assert_eq!(error.reason(), &RejectReason::UserNotVerified);
}

fn party_with_uv_required() -> (Party, Arc<MemoryCredentialStore>) {
    setup(
        config().with_user_verification(UserVerificationRequirement::Required),
        &[],
    )
}

#[tokio::test]
async fn algorithm_must_be_allowed() {
    let (party, credentials) = setup(config().with_algorithms(&[CoseAlgorithm::Rs256]), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    let options = party.start_registration("alice", "Alice").await.unwrap();
    let response = authenticator.register(&options, Attestation::None);

    let error = party.finish_registration(&response).await.unwrap_err();
    assert_eq!(
        error.reason(),
        &RejectReason::AlgorithmNotAllowed("ES256".into())
    );
    assert!(credentials.is_empty().await);
}

#[tokio::test]
async fn packed_attestation_anchored_to_a_static_root() {
    let config = config().with_attestation(AttestationConveyancePreference::Direct);
    let (party, _) = setup(config, &[ROOT]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    let options = party.start_registration("alice", "Alice").await.unwrap();
    let response = authenticator.register(&options, leaf_attestation());

    let record = party.finish_registration(&response).await.unwrap();
    assert_eq!(record.fmt, "packed");
}

#[tokio::test]
async fn packed_attestation_from_an_unknown_root() {
    let config = config().with_attestation(AttestationConveyancePreference::Direct);
    let (party, credentials) = setup(config, &[OTHER_ROOT]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    let options = party.start_registration("alice", "Alice").await.unwrap();
    let response = authenticator.register(&options, leaf_attestation());

    let error = party.finish_registration(&response).await.unwrap_err();
    assert_eq!(error.stage(), CeremonyState::Decoded);
    assert!(matches!(
        error.reason(),
        RejectReason::Attestation(AttestationRejected::NotAnchored(_))
    ));
    assert!(credentials.is_empty().await);
}

#[tokio::test]
async fn self_attestation_policy() {
    let direct = config().with_attestation(AttestationConveyancePreference::Direct);
    let (lenient, _) = setup(direct.clone(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    let options = lenient.start_registration("alice", "Alice").await.unwrap();
    let response = authenticator.register(&options, Attestation::SelfSigned);
    lenient.finish_registration(&response).await.unwrap();

    let (strict, _) = setup(direct.with_self_attestation(false), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    let options = strict.start_registration("alice", "Alice").await.unwrap();
    let response = authenticator.register(&options, Attestation::SelfSigned);
    let error = strict.finish_registration(&response).await.unwrap_err();
    assert_eq!(
        error.reason(),
        &RejectReason::Attestation(AttestationRejected::SelfAttestationNotAllowed)
    );
}

#[tokio::test]
async fn none_attestation_is_not_evaluated_unless_requested() {
    let strict = config().with_self_attestation(false);
    let (party_none, _) = setup(strict.clone(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    register(&party_none, &mut authenticator, "alice").await;

    let (party_direct, _) = setup(
        strict.with_attestation(AttestationConveyancePreference::Direct),
        &[],
    );
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    let options = party_direct.start_registration("alice", "Alice").await.unwrap();
    let response = authenticator.register(&options, Attestation::None);
    let error = party_direct.finish_registration(&response).await.unwrap_err();
    assert_eq!(
        error.reason(),
        &RejectReason::Attestation(AttestationRejected::SelfAttestationNotAllowed)
    );
}

#[tokio::test]
async fn duplicate_credentials_are_refused() {
    let (party, credentials) = setup(config(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    register(&party, &mut authenticator, "alice").await;

    let options = party.start_registration("mallory", "Mallory").await.unwrap();
    let response = authenticator.register(&options, Attestation::None);
    let error = party.finish_registration(&response).await.unwrap_err();
    assert_eq!(
        rejected(&error),
        (
            CeremonyState::AttestationVerified,
            RejectReason::DuplicateCredential
        )
    );
    assert_eq!(credentials.len().await, 1);
    assert_eq!(
        credentials.find_by_id(&authenticator.cred_id()).await.unwrap().unwrap().user_name,
        "alice"
    );
}

#[tokio::test]
async fn replayed_counter_is_detected() {
    let (party, credentials) = setup(config(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    register(&party, &mut authenticator, "alice").await;

    let options = party.start_authentication(Some("alice")).await.unwrap();
    party
        .finish_authentication(&authenticator.authenticate(&options))
        .await
        .unwrap();

    let options = party.start_authentication(Some("alice")).await.unwrap();
    let error = party
        .finish_authentication(&authenticator.assert(&options))
        .await
        .unwrap_err();
    assert!(error.is_replay());
    assert_eq!(
        rejected(&error),
        (
            CeremonyState::AttestationVerified,
            RejectReason::ReplayDetected {
                cred_id: authenticator.cred_id(),
                stored: 1,
                received: 1,
            }
        )
    );
    assert_eq!(error.public_message(), PUBLIC_REJECTION);

    authenticator.set_counter(0);
    let options = party.start_authentication(Some("alice")).await.unwrap();
    let error = party
        .finish_authentication(&authenticator.assert(&options))
        .await
        .unwrap_err();
    assert!(error.is_replay());
    assert_eq!(
        credentials.find_by_id(&authenticator.cred_id()).await.unwrap().unwrap().counter,
        1
    );
}

#[tokio::test]
async fn zero_counter() {
    let (party, _) = setup(config(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    register(&party, &mut authenticator, "alice").await;
    let options = party.start_authentication(Some("alice")).await.unwrap();
    let error = party
        .finish_authentication(&authenticator.assert(&options))
        .await
        .unwrap_err();
    assert!(error.is_replay());

    let (tolerant, _) = setup(config().with_tolerate_zero_counter(true), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    register(&tolerant, &mut authenticator, "alice").await;
    for _ in 0..2 {
        let options = tolerant.start_authentication(Some("alice")).await.unwrap();
        let record = tolerant
            .finish_authentication(&authenticator.assert(&options))
            .await
            .unwrap();
        assert_eq!(record.counter, 0);
    }

    let options = tolerant.start_authentication(Some("alice")).await.unwrap();
    tolerant
        .finish_authentication(&authenticator.authenticate(&options))
        .await
        .unwrap();
    authenticator.set_counter(0);
    let options = tolerant.start_authentication(Some("alice")).await.unwrap();
    let error = tolerant
        .finish_authentication(&authenticator.assert(&options))
        .await
        .unwrap_err();
    assert!(error.is_replay());
}

#[tokio::test]
async fn concurrent_assertions_with_one_counter() {
    let (party, credentials) = setup(config(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    register(&party, &mut authenticator, "alice").await;
    authenticator.set_counter(1);

    let first = party.start_authentication(Some("alice")).await.unwrap();
    let second = party.start_authentication(Some("alice")).await.unwrap();
    let (first, second) = (authenticator.assert(&first), authenticator.assert(&second));
    let (first, second) = tokio::join!(
        party.finish_authentication(&first),
        party.finish_authentication(&second),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|outcome| outcome.as_ref().is_err_and(CeremonyError::is_replay)));
    assert_eq!(
        credentials.find_by_id(&authenticator.cred_id()).await.unwrap().unwrap().counter,
        1
    );
}

#[tokio::test]
async fn unknown_credential() {
    let (party, _) = setup(config(), &[]);
    let mut registered = SoftwareAuthenticator::new(ORIGIN);
    register(&party, &mut registered, "alice").await;

    let mut stranger = SoftwareAuthenticator::new(ORIGIN);
    let options = party.start_authentication(None).await.unwrap();
    let error = party
        .finish_authentication(&stranger.authenticate(&options))
        .await
        .unwrap_err();
    assert_eq!(
        rejected(&error),
        (CeremonyState::ChallengeIssued, RejectReason::CredentialNotFound)
    );
}

#[tokio::test]
async fn credential_of_another_user() {
    let (party, _) = setup(config(), &[]);
    let mut alice = SoftwareAuthenticator::new(ORIGIN);
    register(&party, &mut alice, "alice").await;
    let mut bob = SoftwareAuthenticator::new(ORIGIN);
    register(&party, &mut bob, "bob").await;

    let options = party.start_authentication(Some("bob")).await.unwrap();
    let mut response = alice.authenticate(&options);
    response.username = None;
    let error = party.finish_authentication(&response).await.unwrap_err();
    assert_eq!(error.reason(), &RejectReason::UserMismatch);
}

#[tokio::test]
async fn signature_must_cover_this_assertion() {
    let (party, _) = setup(config(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    register(&party, &mut authenticator, "alice").await;

    let first = party.start_authentication(Some("alice")).await.unwrap();
    let second = party.start_authentication(Some("alice")).await.unwrap();
    let stolen = authenticator.authenticate(&first);
    let mut forged = authenticator.assert(&second);
    forged.webauthn.as_mut().unwrap()["response"]["signature"] =
        stolen.webauthn.as_ref().unwrap()["response"]["signature"].clone();

    let error = party.finish_authentication(&forged).await.unwrap_err();
    assert_eq!(
        rejected(&error),
        (
            CeremonyState::Decoded,
            RejectReason::from(SignatureError::BadSignature)
        )
    );
}

#[tokio::test]
async fn assertion_members_are_required() {
    let (party, _) = setup(config(), &[]);
    let mut authenticator = SoftwareAuthenticator::new(ORIGIN);
    register(&party, &mut authenticator, "alice").await;

    let options = party.start_authentication(Some("alice")).await.unwrap();
    let mut response = authenticator.authenticate(&options);
    let members = response.webauthn.as_mut().unwrap()["response"]
        .as_object_mut()
        .unwrap();
    members.remove("signature");

    let error = party.finish_authentication(&response).await.unwrap_err();
    assert!(matches!(error.reason(), RejectReason::Credentials(_)));
}

#[tokio::test]
async fn client_data_checks() {
    let (party, _) = setup(config(), &[]);
    let challenge = encoding::base64url(b"issued challenge");
    let client_data = |ty: &str, challenge: &str, origin: &str| {
        json!({ "type": ty, "challenge": challenge, "origin": origin })
            .to_string()
            .into_bytes()
    };

    party
        .check_client_data(
            &client_data("webauthn.get", &challenge, "https://login.example.com/"),
            ClientDataType::Get,
            &challenge,
        )
        .unwrap();
    assert_eq!(
        party
            .check_client_data(
                &client_data("webauthn.create", &challenge, ORIGIN),
                ClientDataType::Get,
                &challenge,
            )
            .unwrap_err(),
        ClientDataError::UnexpectedType {
            expected: "webauthn.get",
            found: "webauthn.create".into(),
        }
    );
    assert_eq!(
        party
            .check_client_data(
                &client_data("webauthn.get", &encoding::base64url(b"other"), ORIGIN),
                ClientDataType::Get,
                &challenge,
            )
            .unwrap_err(),
        ClientDataError::ChallengeMismatch
    );
    assert!(matches!(
        party.check_client_data(b"{\"type\":", ClientDataType::Get, &challenge),
        Err(ClientDataError::Malformed(_))
    ));
    assert!(matches!(
        party.check_client_data(
            &client_data("payment.get", &challenge, ORIGIN),
            ClientDataType::Get,
            &challenge
        ),
        Err(ClientDataError::Malformed(_))
    ));
}

#[tokio::test]
async fn attestation_trusted_through_metadata() {
    let root = Certificate::from_pem(ROOT).unwrap().remove(0);
    let toc = format!(
        "eyJhbGciOiJub25lIn0.{}.",
        encoding::base64url(
            json!({
                "entries": [{
                    "aaguid": AAGUID,
                    "metadataStatement": {
                        "description": "Keyward Test Key",
                        "attestationRootCertificates": [encoding::base64_padded(root.der())],
                    },
                }],
            })
            .to_string()
            .as_bytes()
        )
    )
    .into_bytes();
    let mut fetcher = MockMetadataFetcher::new();
    fetcher
        .expect_fetch()
        .times(1)
        .returning(move |_| Ok(toc.clone()));

    let mds = MdsConfig::with_source(Url::parse("https://mds.example.com/").unwrap());
    let config = config()
        .with_attestation(AttestationConveyancePreference::Direct)
        .with_mds(mds.clone());
    let verifier = AttestationVerifier::new_mds(
        Arc::new(MetadataService::new(mds, fetcher)),
        AttestationPolicy::default(),
    );
    let party = RelyingParty::new(
        config,
        MemoryCredentialStore::new(),
        MemoryChallengeStore::new(),
        verifier,
    )
    .unwrap();
    assert!(party.verifier().uses_metadata());

    let aaguid: Aaguid = AAGUID.parse().unwrap();
    let mut known = SoftwareAuthenticator::new(ORIGIN).with_aaguid(aaguid);
    let options = party.start_registration("alice", "Alice").await.unwrap();
    let record = party
        .finish_registration(&known.register(&options, leaf_attestation()))
        .await
        .unwrap();
    assert_eq!(record.aaguid, AAGUID);

    let mut unknown = SoftwareAuthenticator::new(ORIGIN);
    let options = party.start_registration("bob", "Bob").await.unwrap();
    let error = party
        .finish_registration(&unknown.register(&options, leaf_attestation()))
        .await
        .unwrap_err();
    assert!(matches!(
        error.reason(),
        RejectReason::Attestation(AttestationRejected::UnknownAuthenticatorModel(_))
    ));
}

#[test]
fn from_config() {
    let config = config().with_root_certificates([ROOT, "not a certificate"]);
    let party = RelyingParty::from_config(
        config,
        MemoryCredentialStore::new(),
        MemoryChallengeStore::new(),
    )
    .unwrap();
    assert!(!party.verifier().uses_metadata());
    assert_eq!(party.config().rp_id, "example.com");

    let invalid = RelyingParty::from_config(
        RelyingPartyConfig::new("", ORIGIN),
        MemoryCredentialStore::new(),
        MemoryChallengeStore::new(),
    );
    assert_eq!(invalid.err(), Some(ConfigError::EmptyRpId));
}
