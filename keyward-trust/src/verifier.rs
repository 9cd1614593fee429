use std::sync::Arc;

use serde::Deserialize;

use crate::{
    anchor_chain, AttestationRejected, Certificate, HttpMetadataFetcher, MetadataFetcher,
    MetadataService, TrustAnchorRegistry,
};


/// What to do when metadata knows no roots for an authenticator model.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownModelPolicy {
    /// Reject the attestation straight away.
    #[default]
    Reject,
    /// Force one metadata refresh and look again before rejecting. The lookup's own refresh
    /// counts, and forced refreshes are spaced by the metadata minimum refresh interval.
    RefreshOnce,
}

/// Knobs of attestation evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttestationPolicy {
    /// Accept statements that carry no certificate chain.
    pub allow_self_attestation: bool,
    /// Behavior for models without known roots, in metadata mode.
    pub unknown_model: UnknownModelPolicy,
}

impl Default for AttestationPolicy {
    fn default() -> Self {
        Self {
            allow_self_attestation: true,
            unknown_model: UnknownModelPolicy::Reject,
        }
    }
}

enum TrustSource<F> {
    Static(Arc<TrustAnchorRegistry>),
    Metadata(Arc<MetadataService<F>>),
}

/// Decides whether an attestation chain is trusted, either against a static set of roots or
/// against the roots FIDO metadata lists for the authenticator model.
pub struct AttestationVerifier<F = HttpMetadataFetcher> {
    source: TrustSource<F>,
    policy: AttestationPolicy,
}

impl<F> AttestationVerifier<F>
where
    F: MetadataFetcher,
{
    /// Trust the roots of `registry`.
    pub fn new_static(registry: Arc<TrustAnchorRegistry>, policy: AttestationPolicy) -> Self {
        Self {
            source: TrustSource::Static(registry),
            policy,
        }
    }

    /// Trust the roots metadata lists for each model.
    pub fn new_mds(mds: Arc<MetadataService<F>>, policy: AttestationPolicy) -> Self {
        Self {
            source: TrustSource::Metadata(mds),
            policy,
        }
    }

    /// The policy in effect.
    pub fn policy(&self) -> &AttestationPolicy {
        &self.policy
    }

    /// Whether roots come from metadata rather than a static registry.
    pub fn uses_metadata(&self) -> bool {
        matches!(self.source, TrustSource::Metadata(_))
    }

    /// Evaluate a leaf-first `chain` for the authenticator model `aaguid`.
    ///
    /// An empty chain is self attestation and is decided by the policy alone.
    pub async fn verify(
        &self,
        chain: &[Certificate],
        aaguid: Option<&str>,
    ) -> Result<(), AttestationRejected> {
        if chain.is_empty() {
            return if self.policy.allow_self_attestation {
                Ok(())
            } else {
                Err(AttestationRejected::SelfAttestationNotAllowed)
            };
        }

        match &self.source {
            TrustSource::Static(registry) => registry.verify_chain(chain),
            TrustSource::Metadata(mds) => {
                let aaguid = aaguid.filter(|id| !id.is_empty()).ok_or_else(|| {
                    AttestationRejected::UnknownAuthenticatorModel("no aaguid".into())
                })?;
                let roots = self.metadata_roots(mds, aaguid).await?;
                anchor_chain(chain, &roots)
            }
        }
    }

    /// Like [`Self::verify`], for a chain of DER certificates as found in `x5c`.
    pub async fn verify_der(
        &self,
        chain: &[Vec<u8>],
        aaguid: Option<&str>,
    ) -> Result<(), AttestationRejected> {
        let chain = chain
            .iter()
            .map(|der| Certificate::from_der(der))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AttestationRejected::InvalidCertificate(e.to_string()))?;
        self.verify(&chain, aaguid).await
    }

    async fn metadata_roots(
        &self,
        mds: &MetadataService<F>,
        aaguid: &str,
    ) -> Result<Vec<Certificate>, AttestationRejected> {
        let seen = mds.generation();
        let mut encoded = mds.get_attestation_root_certificates(aaguid).await;
        if encoded.is_empty() && self.policy.unknown_model == UnknownModelPolicy::RefreshOnce {
            match mds.force_refresh(seen).await {
                Ok(true) => log::debug!("no roots for {aaguid}, refreshed metadata once"),
                Ok(false) => {}
                Err(e) => log::warn!("metadata refresh for unknown model {aaguid} failed: {e}"),
            }
            encoded = mds
                .get_entry(aaguid)
                .map(|entry| entry.attestation_root_certificates)
                .unwrap_or_default();
        }

        if encoded.is_empty() {
            return Err(AttestationRejected::UnknownAuthenticatorModel(
                aaguid.to_owned(),
            ));
        }

        let mut roots = Vec::with_capacity(encoded.len());
        for text in &encoded {
            match Certificate::parse_text(text) {
                Ok(certs) => roots.extend(certs),
                Err(e) => log::warn!("skipping undecodable metadata root for {aaguid}: {e}"),
            }
        }
        Ok(roots)
    }
}
