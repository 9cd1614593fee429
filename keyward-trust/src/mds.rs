//! A cached view of the FIDO Metadata Service.
//!
//! The table of contents is fetched as a `header.payload.signature` token, its entries are
//! resolved into [`MetadataEntry`] values keyed by AAGUID, and the result is kept as one immutable
//! snapshot until it goes stale. Refreshing is single flight: callers that queue behind a running
//! refresh receive its outcome instead of fetching again.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
};

use tokio::{sync::Mutex, time::Instant};
use url::Url;

use crate::MetadataFetchError;

mod config;
mod fetcher;
mod toc;


pub use self::{
    config::MdsConfig,
    fetcher::{HttpMetadataFetcher, MetadataFetcher},
    toc::{MetadataEntry, UNKNOWN_AUTHENTICATOR},
};
use self::toc::{parse_statement, TableOfContents, TocEntry};

#[cfg(any(test, feature = "testable"))]
pub use self::fetcher::MockMetadataFetcher;

/// One consistent generation of metadata.
#[derive(Debug, Default)]
pub struct MdsCache {
    entries: HashMap<String, MetadataEntry>,
    last_update: Option<Instant>,
}

impl MdsCache {
    /// The entry for `aaguid`, compared case insensitively.
    pub fn get(&self, aaguid: &str) -> Option<&MetadataEntry> {
        self.entries.get(&aaguid.to_ascii_lowercase())
    }

    /// Number of known models.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no model is known.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// When this generation was fetched.
    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }
}

struct RefreshGate {
    generation: u64,
    outcome: Result<(), MetadataFetchError>,
    attempted_at: Option<Instant>,
}

/// Metadata lookups backed by a [`MetadataFetcher`].
pub struct MetadataService<F> {
    config: MdsConfig,
    fetcher: F,
    cache: RwLock<Arc<MdsCache>>,
    gate: Mutex<RefreshGate>,
    generation: AtomicU64,
}

impl MetadataService<HttpMetadataFetcher> {
    /// A service fetching over HTTPS with the configured bearer token.
    pub fn from_config(config: MdsConfig) -> Self {
        let fetcher = HttpMetadataFetcher::new(reqwest::Client::new(), config.bearer_token.clone());
        Self::new(config, fetcher)
    }
}

impl<F> MetadataService<F>
where
    F: MetadataFetcher,
{
    /// Create a service with an empty cache. Nothing is fetched until the first lookup.
    pub fn new(config: MdsConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            cache: RwLock::new(Arc::new(MdsCache::default())),
            gate: Mutex::new(RefreshGate {
                generation: 0,
                outcome: Ok(()),
                attempted_at: None,
            }),
            generation: AtomicU64::new(0),
        }
    }

    /// The configuration this service was built with.
    pub fn config(&self) -> &MdsConfig {
        &self.config
    }

    /// Whether metadata is consulted at all.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// The current cache generation.
    pub fn snapshot(&self) -> Arc<MdsCache> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// When the cache was last refreshed successfully.
    pub fn last_update(&self) -> Option<Instant> {
        self.snapshot().last_update
    }

    /// Number of known models.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether no model is known.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Whether `aaguid` is a known model.
    pub fn contains(&self, aaguid: &str) -> bool {
        self.snapshot().get(aaguid).is_some()
    }

    /// The cached entry for `aaguid`, without refreshing.
    pub fn get_entry(&self, aaguid: &str) -> Option<MetadataEntry> {
        self.snapshot().get(aaguid).cloned()
    }

    /// Whether the cache was never filled or has outlived the cache timeout.
    pub fn is_stale(&self) -> bool {
        match self.last_update() {
            Some(at) => at.elapsed() > self.config.cache_timeout(),
            None => true,
        }
    }

    /// Roots for `aaguid`, refreshing first when the cache is stale or empty.
    ///
    /// A failed refresh keeps serving the last known good cache. A disabled service always
    /// returns no roots.
    pub async fn get_attestation_root_certificates(&self, aaguid: &str) -> Vec<String> {
        if !self.is_enabled() {
            return Vec::new();
        }

        if self.is_stale() || self.is_empty() {
            if let Err(e) = self.refresh_cache().await {
                log::warn!("metadata refresh failed, using cached entries: {e}");
            }
        } else {
            log::debug!("metadata cache hit for {aaguid}");
        }

        self.snapshot()
            .get(aaguid)
            .map(|entry| entry.attestation_root_certificates.clone())
            .unwrap_or_default()
    }

    /// Number of refresh attempts so far, successful or not.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Fetch the table of contents and every statement, then replace the cache.
    ///
    /// On failure the previous cache is left untouched. A caller that had to wait for a refresh
    /// started by someone else gets that refresh's outcome.
    pub async fn refresh_cache(&self) -> Result<(), MetadataFetchError> {
        let seen = self.generation();
        let mut gate = self.gate.lock().await;
        if gate.generation != seen {
            return gate.outcome.clone();
        }
        self.run_refresh(&mut gate).await
    }

    /// Refresh on behalf of a model the cache does not know, as seen at generation `seen`.
    ///
    /// Nothing is fetched, and `Ok(false)` returned, when the service is disabled, when any
    /// refresh was attempted since `seen`, or when the last attempt is more recent than the
    /// minimum refresh interval.
    pub async fn force_refresh(&self, seen: u64) -> Result<bool, MetadataFetchError> {
        if !self.is_enabled() {
            return Ok(false);
        }
        let mut gate = self.gate.lock().await;
        if gate.generation != seen {
            return Ok(false);
        }
        if let Some(at) = gate.attempted_at {
            if at.elapsed() < self.config.min_refresh_interval() {
                log::debug!("metadata refreshed recently, not forcing another refresh");
                return Ok(false);
            }
        }
        self.run_refresh(&mut gate).await.map(|()| true)
    }

    async fn run_refresh(&self, gate: &mut RefreshGate) -> Result<(), MetadataFetchError> {
        gate.attempted_at = Some(Instant::now());
        let outcome = tokio::time::timeout(self.config.refresh_timeout(), self.fetch_cache())
            .await
            .unwrap_or(Err(MetadataFetchError::Timeout))
            .map(|cache| {
                log::info!("refreshed metadata for {} authenticator models", cache.len());
                *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(cache);
            });

        gate.generation += 1;
        gate.outcome = outcome.clone();
        self.generation.store(gate.generation, Ordering::Release);
        outcome
    }

    async fn fetch_cache(&self) -> Result<MdsCache, MetadataFetchError> {
        let url = self
            .config
            .source_url
            .as_ref()
            .ok_or(MetadataFetchError::NotConfigured)?;

        let token = self.fetch(url).await?;
        let toc = TableOfContents::from_token(&token)?;
        log::debug!("metadata token signature is not verified");

        let mut entries = HashMap::with_capacity(toc.entries.len());
        for toc_entry in toc.entries {
            let Some(aaguid) = toc_entry.aaguid.as_deref() else {
                log::debug!("skipping metadata entry without an aaguid");
                continue;
            };
            let entry = match self.resolve_entry(aaguid, &toc_entry).await {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("metadata statement for {aaguid} unavailable: {e}");
                    MetadataEntry::placeholder(aaguid, toc_entry.description.as_deref())
                }
            };
            entries.insert(entry.aaguid.clone(), entry);
        }

        Ok(MdsCache {
            entries,
            last_update: Some(Instant::now()),
        })
    }

    async fn resolve_entry(
        &self,
        aaguid: &str,
        toc_entry: &TocEntry,
    ) -> Result<MetadataEntry, MetadataFetchError> {
        let description = toc_entry.description.as_deref();
        if let Some(statement) = &toc_entry.metadata_statement {
            return MetadataEntry::from_statement(aaguid, description, statement.clone());
        }

        let Some(url) = &toc_entry.url else {
            return Ok(MetadataEntry::placeholder(aaguid, description));
        };
        let url = Url::parse(url).map_err(|e| MetadataFetchError::InvalidStatement(e.to_string()))?;
        let body = self.fetch(&url).await?;
        MetadataEntry::from_statement(aaguid, description, parse_statement(&body)?)
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, MetadataFetchError> {
        tokio::time::timeout(self.config.fetch_timeout(), self.fetcher.fetch(url))
            .await
            .map_err(|_| MetadataFetchError::Timeout)?
    }
}
