//! Relying party configuration.

use std::{str::FromStr, time::Duration};

use keyward_trust::{AttestationPolicy, MdsConfig, UnknownModelPolicy};
use keyward_types::{
    webauthn::{AttestationConveyancePreference, UserVerificationRequirement},
    CoseAlgorithm,
};
use serde::Deserialize;
use url::Url;

use crate::ConfigError;


/// Challenges shorter than this are refused.
pub const MIN_CHALLENGE_LENGTH: usize = 32;

/// Where attestation roots come from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustMode {
    /// The configured `root_certificates`.
    #[default]
    Static,
    /// The roots FIDO metadata lists per authenticator model.
    Mds,
}

/// Everything a [`RelyingParty`](crate::RelyingParty) needs to know about itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelyingPartyConfig {
    /// The relying party id, a registrable domain.
    pub rp_id: String,

    /// Human readable relying party name.
    pub rp_name: String,

    /// The origin client data must carry, e.g. `https://login.example.com`.
    pub origin: String,

    /// COSE algorithm names accepted for credential keys, in order of preference.
    pub algorithms: Vec<String>,

    /// Attestation conveyance asked of authenticators.
    pub attestation: AttestationConveyancePreference,

    /// User verification asked of authenticators, and enforced when `required`.
    pub user_verification: UserVerificationRequirement,

    /// Challenge size in bytes.
    pub challenge_length: usize,

    /// Ceremony timeout handed to clients, in milliseconds.
    pub timeout_ms: u32,

    /// Where attestation roots come from.
    pub trust_mode: TrustMode,

    /// Roots for [`TrustMode::Static`], PEM or base64 DER.
    pub root_certificates: Vec<String>,

    /// Accept attestation statements without a certificate chain.
    pub allow_self_attestation: bool,

    /// What to do with models metadata does not know.
    pub unknown_model_policy: UnknownModelPolicy,

    /// Accept an authenticator that keeps reporting a counter of zero.
    pub tolerate_zero_counter: bool,

    /// FIDO metadata source.
    pub mds: MdsConfig,
}

impl Default for RelyingPartyConfig {
    fn default() -> Self {
        Self {
            rp_id: String::new(),
            rp_name: String::new(),
            origin: String::new(),
            algorithms: vec![
                CoseAlgorithm::Es256.name().to_owned(),
                CoseAlgorithm::Rs256.name().to_owned(),
            ],
            attestation: AttestationConveyancePreference::None,
            user_verification: UserVerificationRequirement::Preferred,
            challenge_length: 64,
            timeout_ms: 60_000,
            trust_mode: TrustMode::Static,
            root_certificates: Vec::new(),
            allow_self_attestation: true,
            unknown_model_policy: UnknownModelPolicy::Reject,
            tolerate_zero_counter: false,
            mds: MdsConfig::default(),
        }
    }
}

impl RelyingPartyConfig {
    /// A configuration for `rp_id` served from `origin`, everything else default.
    pub fn new(rp_id: impl Into<String>, origin: impl Into<String>) -> Self {
        let rp_id = rp_id.into();
        Self {
            rp_name: rp_id.clone(),
            rp_id,
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read the configuration from the process environment.
    ///
    /// `KEYWARD_RP_ID`, `KEYWARD_RP_NAME`, `KEYWARD_RP_ORIGIN`, `KEYWARD_MDS_URL`,
    /// `KEYWARD_MDS_TOKEN` and `KEYWARD_ATTESTATION_MODE` are recognised. Setting
    /// `KEYWARD_MDS_URL` switches to metadata trust.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Self::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(rp_id) = var("KEYWARD_RP_ID") {
            config.rp_name = rp_id.clone();
            config.rp_id = rp_id;
        }
        if let Some(rp_name) = var("KEYWARD_RP_NAME") {
            config.rp_name = rp_name;
        }
        if let Some(origin) = var("KEYWARD_RP_ORIGIN") {
            config.origin = origin;
        }
        if let Some(url) = var("KEYWARD_MDS_URL") {
            let url = Url::parse(&url).map_err(|_| ConfigError::InvalidValue {
                name: "KEYWARD_MDS_URL",
                value: url,
            })?;
            config.mds.enabled = true;
            config.mds.source_url = Some(url);
            config.trust_mode = TrustMode::Mds;
        }
        if let Some(token) = var("KEYWARD_MDS_TOKEN") {
            config.mds.bearer_token = Some(token);
        }
        if let Some(mode) = var("KEYWARD_ATTESTATION_MODE") {
            config.attestation = serde_json::from_value(serde_json::Value::String(
                mode.to_ascii_lowercase(),
            ))
            .map_err(|_| ConfigError::InvalidValue {
                name: "KEYWARD_ATTESTATION_MODE",
                value: mode,
            })?;
        }

        Ok(config)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rp_id.trim().is_empty() {
            return Err(ConfigError::EmptyRpId);
        }
        self.origin_url()?;
        if self.allowed_algorithms()?.is_empty() {
            return Err(ConfigError::NoAlgorithms);
        }
        if self.challenge_length < MIN_CHALLENGE_LENGTH {
            return Err(ConfigError::ChallengeTooShort(self.challenge_length));
        }
        if self.trust_mode == TrustMode::Mds && !self.mds.enabled {
            return Err(ConfigError::MdsNotEnabled);
        }
        Ok(())
    }

    /// The origin as a URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        match Url::parse(&self.origin) {
            Ok(url) if url.has_host() => Ok(url),
            _ => Err(ConfigError::InvalidOrigin(self.origin.clone())),
        }
    }

    /// The configured origin in the serialization client data uses, without a trailing slash.
    pub fn expected_origin(&self) -> &str {
        self.origin.trim_end_matches('/')
    }

    /// Parse [`Self::algorithms`].
    pub fn allowed_algorithms(&self) -> Result<Vec<CoseAlgorithm>, ConfigError> {
        self.algorithms
            .iter()
            .map(|name| {
                CoseAlgorithm::from_str(name)
                    .map_err(|_| ConfigError::UnknownAlgorithm(name.clone()))
            })
            .collect()
    }

    /// The attestation policy derived from this configuration.
    pub fn attestation_policy(&self) -> AttestationPolicy {
        AttestationPolicy {
            allow_self_attestation: self.allow_self_attestation,
            unknown_model: self.unknown_model_policy,
        }
    }

    /// The ceremony timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }

    /// Set the relying party name.
    pub fn with_rp_name(mut self, rp_name: impl Into<String>) -> Self {
        self.rp_name = rp_name.into();
        self
    }

    /// Set the accepted algorithms.
    pub fn with_algorithms(mut self, algorithms: &[CoseAlgorithm]) -> Self {
        self.algorithms = algorithms.iter().map(|alg| alg.name().to_owned()).collect();
        self
    }

    /// Set the attestation conveyance preference.
    pub fn with_attestation(mut self, attestation: AttestationConveyancePreference) -> Self {
        self.attestation = attestation;
        self
    }

    /// Set the user verification requirement.
    pub fn with_user_verification(mut self, requirement: UserVerificationRequirement) -> Self {
        self.user_verification = requirement;
        self
    }

    /// Set the challenge length in bytes.
    pub fn with_challenge_length(mut self, length: usize) -> Self {
        self.challenge_length = length;
        self
    }

    /// Trust the given roots statically.
    pub fn with_root_certificates<S: Into<String>>(
        mut self,
        roots: impl IntoIterator<Item = S>,
    ) -> Self {
        self.trust_mode = TrustMode::Static;
        self.root_certificates = roots.into_iter().map(Into::into).collect();
        self
    }

    /// Trust FIDO metadata.
    pub fn with_mds(mut self, mds: MdsConfig) -> Self {
        self.trust_mode = TrustMode::Mds;
        self.mds = mds;
        self
    }

    /// Set whether self attestation is accepted.
    pub fn with_self_attestation(mut self, allowed: bool) -> Self {
        self.allow_self_attestation = allowed;
        self
    }

    /// Set the policy for unknown authenticator models.
    pub fn with_unknown_model_policy(mut self, policy: UnknownModelPolicy) -> Self {
        self.unknown_model_policy = policy;
        self
    }

    /// Set whether a counter that stays at zero is accepted.
    pub fn with_tolerate_zero_counter(mut self, tolerate: bool) -> Self {
        self.tolerate_zero_counter = tolerate;
        self
    }
}
