use std::sync::Arc;

use keyward_trust::{
    AttestationVerifier, HttpMetadataFetcher, MetadataFetcher, MetadataService,
    TrustAnchorRegistry,
};
use keyward_types::{
    crypto::sha256,
    encoding, random_vec,
    webauthn::{
        AttestationConveyancePreference, AuthenticatorSelectionCriteria, ClientDataType,
        CollectedClientData, CredentialCreationOptions, CredentialRequestOptions,
        CredentialsError, PublicKeyCredentialCreationOptions, PublicKeyCredentialDescriptor,
        PublicKeyCredentialRequestOptions, PublicKeyCredentialRpEntity, PublicKeyCredentialType,
        PublicKeyCredentialUserEntity, UserVerificationRequirement, WebAuthnCredentials,
    },
    AttestationObject, Authenticator, AuthenticatorData, CoseAlgorithm, NormalizedKey,
};

use crate::{
    config::TrustMode,
    formats::{self, AttestationKind},
    signature::{key_algorithm, verify_signature},
    store::{Ceremony, ChallengeBinding, ChallengeStore, CredentialStore},
    CeremonyError, CeremonyState, ClientDataError, ConfigError, RejectReason, RelyingPartyConfig,
    StoreError,
};

#[cfg(test)]
mod tests;

/// Length of the user handles handed out at registration.
const USER_HANDLE_LENGTH: usize = 32;

/// Runs registration and authentication ceremonies for one relying party.
///
/// Each ceremony is a pair of calls: `start_*` issues a challenge and the options the browser
/// needs, `finish_*` checks what the browser posted back. Between the two, the only state kept is
/// the challenge in the [`ChallengeStore`].
pub struct RelyingParty<C, H, F = HttpMetadataFetcher> {
    config: RelyingPartyConfig,
    algorithms: Vec<CoseAlgorithm>,
    credentials: C,
    challenges: H,
    verifier: AttestationVerifier<F>,
}

impl<C, H> RelyingParty<C, H>
where
    C: CredentialStore,
    H: ChallengeStore,
{
    /// Build a relying party whose trust roots come from `config`: the static roots it lists, or
    /// FIDO metadata fetched over HTTP.
    pub fn from_config(
        config: RelyingPartyConfig,
        credentials: C,
        challenges: H,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let policy = config.attestation_policy();
        let verifier = match config.trust_mode {
            TrustMode::Static => {
                let registry = TrustAnchorRegistry::new();
                registry.load(&config.root_certificates);
                AttestationVerifier::new_static(Arc::new(registry), policy)
            }
            TrustMode::Mds => {
                let mds = MetadataService::from_config(config.mds.clone());
                AttestationVerifier::new_mds(Arc::new(mds), policy)
            }
        };
        Self::new(config, credentials, challenges, verifier)
    }
}

impl<C, H, F> RelyingParty<C, H, F>
where
    C: CredentialStore,
    H: ChallengeStore,
    F: MetadataFetcher,
{
    /// Build a relying party around an existing attestation verifier.
    pub fn new(
        config: RelyingPartyConfig,
        credentials: C,
        challenges: H,
        verifier: AttestationVerifier<F>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let algorithms = config.allowed_algorithms()?;
        Ok(Self {
            config,
            algorithms,
            credentials,
            challenges,
            verifier,
        })
    }

    /// The configuration in effect.
    pub fn config(&self) -> &RelyingPartyConfig {
        &self.config
    }

    /// The credential store.
    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    /// The attestation verifier.
    pub fn verifier(&self) -> &AttestationVerifier<F> {
        &self.verifier
    }

    /// Begin registering a credential for `user_name`.
    ///
    /// Credentials the user already has are listed in `excludeCredentials` so that an
    /// authenticator does not register twice.
    pub async fn start_registration(
        &self,
        user_name: &str,
        display_name: &str,
    ) -> Result<CredentialCreationOptions, CeremonyError> {
        let existing = self
            .credentials
            .find_by_user(user_name)
            .await
            .map_err(issue_failed)?;
        let challenge = self
            .issue_challenge(Some(user_name), Ceremony::Registration)
            .await?;

        Ok(CredentialCreationOptions {
            public_key: PublicKeyCredentialCreationOptions {
                rp: PublicKeyCredentialRpEntity {
                    id: self.config.rp_id.clone(),
                    name: self.config.rp_name.clone(),
                },
                user: PublicKeyCredentialUserEntity {
                    id: random_vec(USER_HANDLE_LENGTH).into(),
                    name: user_name.to_owned(),
                    display_name: display_name.to_owned(),
                },
                challenge: challenge.into(),
                pub_key_cred_params: self.algorithms.iter().copied().map(Into::into).collect(),
                timeout: Some(self.config.timeout_ms),
                exclude_credentials: descriptors(&existing),
                authenticator_selection: Some(AuthenticatorSelectionCriteria {
                    require_resident_key: false,
                    user_verification: self.config.user_verification,
                }),
                attestation: self.config.attestation,
            },
        })
    }

    /// Verify a registration response and persist the new credential.
    pub async fn finish_registration(
        &self,
        response: &WebAuthnCredentials,
    ) -> Result<Authenticator, CeremonyError> {
        let mut progress = Progress::new(Ceremony::Registration);

        let credential = response.credential().map_err(|e| progress.reject(e))?;
        let challenge = response.challenge.as_deref().unwrap_or_default();
        let binding = self
            .redeem_challenge(challenge, Ceremony::Registration)
            .await
            .map_err(|e| progress.reject(e))?;
        let user_name = match (binding.user_name, response.username.as_deref()) {
            (Some(bound), Some(claimed)) if bound != claimed => {
                return Err(progress.reject(RejectReason::UserMismatch))
            }
            (Some(bound), _) => bound,
            (None, _) => return Err(progress.reject(RejectReason::UnknownChallenge)),
        };
        progress.advance(CeremonyState::CredentialReceived);

        let client_data = &credential.response.client_data_json;
        self.check_client_data(client_data, ClientDataType::Create, challenge)
            .map_err(|e| progress.reject(e))?;
        let attestation_object = credential
            .response
            .attestation_object
            .as_deref()
            .ok_or(CredentialsError::MissingField("response.attestationObject"))
            .map_err(|e| progress.reject(e))?;
        let object = AttestationObject::from_slice(attestation_object)
            .map_err(|e| progress.reject(e))?;
        self.check_authenticator_data(&object.auth_data)
            .map_err(|e| progress.reject(e))?;
        let acd = object
            .auth_data
            .attested_credential_data
            .as_ref()
            .ok_or_else(|| progress.reject(RejectReason::MissingCredentialData))?;
        if acd.credential_id() != credential.raw_id.as_slice() {
            return Err(progress.reject(CredentialsError::IdMismatch));
        }
        let key = NormalizedKey::from_cose(acd.key()).map_err(|e| progress.reject(e))?;
        self.check_algorithm(&key).map_err(|e| progress.reject(e))?;
        progress.advance(CeremonyState::Decoded);

        let statement = formats::verify_statement(&object, &sha256(client_data), &key)
            .map_err(|e| progress.reject(e))?;
        let aaguid = acd.aaguid.to_string();
        if self.config.attestation == AttestationConveyancePreference::None
            && statement.kind == AttestationKind::None
        {
            log::debug!("attestation not requested, skipping trust evaluation");
        } else {
            self.verifier
                .verify(&statement.chain, Some(&aaguid))
                .await
                .map_err(|e| progress.reject(e))?;
        }
        progress.advance(CeremonyState::AttestationVerified);

        let record = Authenticator {
            counter: object.auth_data.counter,
            cred_id: encoding::base64url(acd.credential_id()),
            public_key: key.to_json(),
            ty: PublicKeyCredentialType::PublicKey,
            user_name,
            aaguid,
            fmt: object.fmt.clone(),
            att_stmt: object.att_stmt.to_base64url(),
        };
        let existing = self
            .credentials
            .find_by_id(&record.cred_id)
            .await
            .map_err(|e| progress.reject(e))?;
        if existing.is_some() {
            return Err(progress.reject(RejectReason::DuplicateCredential));
        }
        match self.credentials.insert(record.clone()).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(progress.reject(RejectReason::DuplicateCredential))
            }
            Err(e) => return Err(progress.reject(e)),
        }

        progress.advance(CeremonyState::Accepted);
        Ok(record)
    }

    /// Begin an authentication, for `user_name` or for whoever holds a discoverable credential.
    pub async fn start_authentication(
        &self,
        user_name: Option<&str>,
    ) -> Result<CredentialRequestOptions, CeremonyError> {
        let allowed = match user_name {
            Some(user_name) => self
                .credentials
                .find_by_user(user_name)
                .await
                .map_err(issue_failed)?,
            None => Vec::new(),
        };
        let challenge = self
            .issue_challenge(user_name, Ceremony::Authentication)
            .await?;

        Ok(CredentialRequestOptions {
            public_key: PublicKeyCredentialRequestOptions {
                challenge: challenge.into(),
                timeout: Some(self.config.timeout_ms),
                rp_id: self.config.rp_id.clone(),
                allow_credentials: descriptors(&allowed),
                user_verification: self.config.user_verification,
            },
        })
    }

    /// Verify an assertion and advance the credential's signature counter.
    ///
    /// Returns the record as updated.
    pub async fn finish_authentication(
        &self,
        response: &WebAuthnCredentials,
    ) -> Result<Authenticator, CeremonyError> {
        let mut progress = Progress::new(Ceremony::Authentication);

        let credential = response.credential().map_err(|e| progress.reject(e))?;
        let challenge = response.challenge.as_deref().unwrap_or_default();
        let binding = self
            .redeem_challenge(challenge, Ceremony::Authentication)
            .await
            .map_err(|e| progress.reject(e))?;
        let cred_id = encoding::base64url(&credential.raw_id);
        let mut record = self
            .credentials
            .find_by_id(&cred_id)
            .await
            .map_err(|e| progress.reject(e))?
            .ok_or_else(|| progress.reject(RejectReason::CredentialNotFound))?;
        let claimed = [binding.user_name.as_deref(), response.username.as_deref()];
        if claimed
            .into_iter()
            .flatten()
            .any(|user_name| user_name != record.user_name)
        {
            return Err(progress.reject(RejectReason::UserMismatch));
        }
        progress.advance(CeremonyState::CredentialReceived);

        let client_data = &credential.response.client_data_json;
        self.check_client_data(client_data, ClientDataType::Get, challenge)
            .map_err(|e| progress.reject(e))?;
        let raw_auth_data = credential
            .response
            .authenticator_data
            .as_deref()
            .ok_or(CredentialsError::MissingField("response.authenticatorData"))
            .map_err(|e| progress.reject(e))?;
        let signature = credential
            .response
            .signature
            .as_deref()
            .ok_or(CredentialsError::MissingField("response.signature"))
            .map_err(|e| progress.reject(e))?;
        let auth_data =
            AuthenticatorData::from_slice(raw_auth_data).map_err(|e| progress.reject(e))?;
        self.check_authenticator_data(&auth_data)
            .map_err(|e| progress.reject(e))?;
        progress.advance(CeremonyState::Decoded);

        let key = record.normalized_key().map_err(|e| progress.reject(e))?;
        let signed = [raw_auth_data.as_slice(), sha256(client_data).as_slice()].concat();
        verify_signature(&key, &signed, signature).map_err(|e| progress.reject(e))?;
        progress.advance(CeremonyState::AttestationVerified);

        let stored = record.counter;
        let received = auth_data.counter;
        let zero_tolerated = self.config.tolerate_zero_counter && stored == 0 && received == 0;
        if received <= stored && !zero_tolerated {
            return Err(progress.reject(replay(cred_id, stored, received)));
        }
        let swapped = self
            .credentials
            .update_counter(&cred_id, stored, received)
            .await
            .map_err(|e| progress.reject(e))?;
        if !swapped {
            return Err(progress.reject(replay(cred_id, stored, received)));
        }

        record.counter = received;
        progress.advance(CeremonyState::Accepted);
        Ok(record)
    }

    async fn issue_challenge(
        &self,
        user_name: Option<&str>,
        ceremony: Ceremony,
    ) -> Result<Vec<u8>, CeremonyError> {
        let challenge = random_vec(self.config.challenge_length);
        let binding = ChallengeBinding {
            user_name: user_name.map(str::to_owned),
            ceremony,
        };
        self.challenges
            .insert(encoding::base64url(&challenge), binding)
            .await
            .map_err(issue_failed)?;
        log::debug!("{ceremony:?} ceremony: {}", CeremonyState::ChallengeIssued);
        Ok(challenge)
    }

    async fn redeem_challenge(
        &self,
        challenge: &str,
        ceremony: Ceremony,
    ) -> Result<ChallengeBinding, RejectReason> {
        match self.challenges.take(challenge).await? {
            Some(binding) if binding.ceremony == ceremony => Ok(binding),
            Some(binding) => {
                log::debug!(
                    "challenge issued for {:?} redeemed in {ceremony:?}",
                    binding.ceremony
                );
                Err(RejectReason::UnknownChallenge)
            }
            None => Err(RejectReason::UnknownChallenge),
        }
    }

    fn check_client_data(
        &self,
        bytes: &[u8],
        expected: ClientDataType,
        challenge: &str,
    ) -> Result<CollectedClientData, ClientDataError> {
        let data = CollectedClientData::from_json_bytes(bytes)
            .map_err(|e| ClientDataError::Malformed(e.to_string()))?;
        if data.ty != expected {
            return Err(ClientDataError::UnexpectedType {
                expected: match expected {
                    ClientDataType::Create => "webauthn.create",
                    ClientDataType::Get => "webauthn.get",
                },
                found: data.ty.to_string(),
            });
        }
        let signed_challenge = encoding::try_from_base64url(&data.challenge);
        if signed_challenge.is_none() || signed_challenge != encoding::try_from_base64url(challenge)
        {
            return Err(ClientDataError::ChallengeMismatch);
        }
        if data.origin.trim_end_matches('/') != self.config.expected_origin() {
            return Err(ClientDataError::OriginMismatch(data.origin));
        }
        Ok(data)
    }

    fn check_authenticator_data(&self, auth_data: &AuthenticatorData) -> Result<(), RejectReason> {
        if !auth_data.matches_rp_id(&self.config.rp_id) {
            return Err(RejectReason::RpIdMismatch);
        }
        if !auth_data.user_present() {
            return Err(RejectReason::UserNotPresent);
        }
        if self.config.user_verification == UserVerificationRequirement::Required
            && !auth_data.user_verified()
        {
            return Err(RejectReason::UserNotVerified);
        }
        Ok(())
    }

    fn check_algorithm(&self, key: &NormalizedKey) -> Result<(), RejectReason> {
        let alg = key_algorithm(key)?;
        if !self.algorithms.contains(&alg) {
            return Err(RejectReason::AlgorithmNotAllowed(alg.to_string()));
        }
        Ok(())
    }
}

/// Tracks the state of one ceremony and stamps rejections with it.
struct Progress {
    ceremony: Ceremony,
    state: CeremonyState,
}

impl Progress {
    fn new(ceremony: Ceremony) -> Self {
        Self {
            ceremony,
            state: CeremonyState::ChallengeIssued,
        }
    }

    fn advance(&mut self, state: CeremonyState) {
        log::debug!("{:?} ceremony: {} -> {state}", self.ceremony, self.state);
        self.state = state;
    }

    fn reject(&self, reason: impl Into<RejectReason>) -> CeremonyError {
        let error = CeremonyError::new(self.state, reason);
        log::debug!(
            "{:?} ceremony: {} -> {}: {}",
            self.ceremony,
            self.state,
            CeremonyState::Rejected,
            error.reason()
        );
        error
    }
}

fn replay(cred_id: String, stored: u32, received: u32) -> RejectReason {
    log::warn!(
        "possible cloned authenticator: credential {cred_id} reported counter {received} after {stored}"
    );
    RejectReason::ReplayDetected {
        cred_id,
        stored,
        received,
    }
}

fn issue_failed(error: StoreError) -> CeremonyError {
    CeremonyError::new(CeremonyState::ChallengeIssued, error)
}

fn descriptors(records: &[Authenticator]) -> Vec<PublicKeyCredentialDescriptor> {
    records.iter().filter_map(Authenticator::descriptor).collect()
}
