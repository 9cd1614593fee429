use std::sync::{Arc, PoisonError, RwLock};

use crate::{anchor_chain, AttestationRejected, Certificate, CertificateError};

/// A statically configured set of attestation trust roots.
///
/// Readers take a cheap snapshot of the current set; writers replace the whole set, so a chain is
/// always evaluated against one consistent set of roots.
#[derive(Debug, Default)]
pub struct TrustAnchorRegistry {
    roots: RwLock<Arc<Vec<Certificate>>>,
}

impl TrustAnchorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `certs`.
    pub fn with_roots(certs: impl IntoIterator<Item = Certificate>) -> Self {
        Self {
            roots: RwLock::new(Arc::new(certs.into_iter().collect())),
        }
    }

    /// The current set of roots.
    pub fn snapshot(&self) -> Arc<Vec<Certificate>> {
        self.roots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, f: impl FnOnce(&mut Vec<Certificate>)) {
        let mut guard = self.roots.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::clone(&guard);
        f(&mut next);
        *guard = Arc::new(next);
    }

    /// Add a root. Adding a certificate that is already present does nothing.
    pub fn add(&self, cert: Certificate) {
        self.update(|roots| {
            if !roots.contains(&cert) {
                roots.push(cert);
            }
        });
    }

    /// Parse and add a DER root.
    pub fn add_der(&self, der: &[u8]) -> Result<(), CertificateError> {
        self.add(Certificate::from_der(der)?);
        Ok(())
    }

    /// Load roots given as PEM bundles or base64 DER strings.
    ///
    /// Entries that cannot be parsed are skipped with a warning. Returns the number of
    /// certificates added.
    pub fn load<S: AsRef<str>>(&self, entries: &[S]) -> usize {
        let mut loaded = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            match Certificate::parse_text(entry.as_ref()) {
                Ok(certs) => loaded.extend(certs),
                Err(e) => log::warn!("skipping trust root #{index}: {e}"),
            }
        }

        let mut added = 0;
        self.update(|roots| {
            for cert in loaded {
                if !roots.contains(&cert) {
                    roots.push(cert);
                    added += 1;
                }
            }
        });
        log::info!("loaded {added} attestation trust roots");
        added
    }

    /// Remove a root, comparing DER. Returns whether it was present.
    pub fn remove(&self, cert: &Certificate) -> bool {
        let mut removed = false;
        self.update(|roots| {
            let before = roots.len();
            roots.retain(|root| root.der() != cert.der());
            removed = roots.len() != before;
        });
        removed
    }

    /// Number of roots.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether there are no roots at all.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Anchor `chain` against the current roots.
    pub fn verify_chain(&self, chain: &[Certificate]) -> Result<(), AttestationRejected> {
        anchor_chain(chain, &self.snapshot())
    }
}
