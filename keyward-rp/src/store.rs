//! Storage seams for credentials and outstanding challenges.
//!
//! The relying party never assumes a storage technology; it talks to these traits. The memory
//! implementations are enough for tests and single process deployments.

use std::{collections::HashMap, sync::Arc, time::Duration};

use keyward_types::Authenticator;
use tokio::{sync::Mutex, time::Instant};

use crate::StoreError;

/// The two ceremonies a challenge can be issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ceremony {
    /// Creating a credential.
    Registration,
    /// Asserting with an existing credential.
    Authentication,
}

/// What an outstanding challenge was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeBinding {
    /// The user the challenge was issued to, absent in usernameless authentication.
    pub user_name: Option<String>,
    /// The ceremony it belongs to.
    pub ceremony: Ceremony,
}

/// Persistence of credential records.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// The record with the base64url credential id `cred_id`.
    async fn find_by_id(&self, cred_id: &str) -> Result<Option<Authenticator>, StoreError>;

    /// Every record of `user_name`.
    async fn find_by_user(&self, user_name: &str) -> Result<Vec<Authenticator>, StoreError>;

    /// Persist a new record. Fails with [`StoreError::Duplicate`] if the id is taken.
    async fn insert(&self, record: Authenticator) -> Result<(), StoreError>;

    /// Set the counter of `cred_id` to `new` if it still is `expected`.
    ///
    /// Returns whether the swap happened. At most one of several concurrent updates from the same
    /// `expected` value may succeed.
    async fn update_counter(&self, cred_id: &str, expected: u32, new: u32)
        -> Result<bool, StoreError>;

    /// Delete a record. Returns whether it existed.
    async fn remove(&self, cred_id: &str) -> Result<bool, StoreError>;
}

/// Outstanding challenges, each usable once.
#[async_trait::async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Remember a base64url `challenge`.
    async fn insert(&self, challenge: String, binding: ChallengeBinding) -> Result<(), StoreError>;

    /// Remove and return the binding of `challenge`, if it is still outstanding.
    async fn take(&self, challenge: &str) -> Result<Option<ChallengeBinding>, StoreError>;
}

#[async_trait::async_trait]
impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    async fn find_by_id(&self, cred_id: &str) -> Result<Option<Authenticator>, StoreError> {
        (**self).find_by_id(cred_id).await
    }

    async fn find_by_user(&self, user_name: &str) -> Result<Vec<Authenticator>, StoreError> {
        (**self).find_by_user(user_name).await
    }

    async fn insert(&self, record: Authenticator) -> Result<(), StoreError> {
        (**self).insert(record).await
    }

    async fn update_counter(
        &self,
        cred_id: &str,
        expected: u32,
        new: u32,
    ) -> Result<bool, StoreError> {
        (**self).update_counter(cred_id, expected, new).await
    }

    async fn remove(&self, cred_id: &str) -> Result<bool, StoreError> {
        (**self).remove(cred_id).await
    }
}

#[async_trait::async_trait]
impl<S: ChallengeStore + ?Sized> ChallengeStore for Arc<S> {
    async fn insert(&self, challenge: String, binding: ChallengeBinding) -> Result<(), StoreError> {
        (**self).insert(challenge, binding).await
    }

    async fn take(&self, challenge: &str) -> Result<Option<ChallengeBinding>, StoreError> {
        (**self).take(challenge).await
    }
}

/// In-memory [`CredentialStore`].
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: Mutex<HashMap<String, Authenticator>>,
}

impl MemoryCredentialStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Whether there are no records.
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_id(&self, cred_id: &str) -> Result<Option<Authenticator>, StoreError> {
        Ok(self.records.lock().await.get(cred_id).cloned())
    }

    async fn find_by_user(&self, user_name: &str) -> Result<Vec<Authenticator>, StoreError> {
        let mut records: Vec<Authenticator> = self
            .records
            .lock()
            .await
            .values()
            .filter(|record| record.user_name == user_name)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.cred_id.cmp(&b.cred_id));
        Ok(records)
    }

    async fn insert(&self, record: Authenticator) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        if records.contains_key(&record.cred_id) {
            return Err(StoreError::Duplicate(record.cred_id));
        }
        records.insert(record.cred_id.clone(), record);
        Ok(())
    }

    async fn update_counter(
        &self,
        cred_id: &str,
        expected: u32,
        new: u32,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.lock().await;
        match records.get_mut(cred_id) {
            Some(record) if record.counter == expected => {
                record.counter = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove(&self, cred_id: &str) -> Result<bool, StoreError> {
        Ok(self.records.lock().await.remove(cred_id).is_some())
    }
}

struct PendingChallenge {
    binding: ChallengeBinding,
    expires_at: Option<Instant>,
}

/// In-memory [`ChallengeStore`] whose challenges optionally expire.
#[derive(Default)]
pub struct MemoryChallengeStore {
    pending: Mutex<HashMap<String, PendingChallenge>>,
    ttl: Option<Duration>,
}

impl MemoryChallengeStore {
    /// A store whose challenges never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose challenges expire `ttl` after being issued.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            pending: Mutex::default(),
            ttl: Some(ttl),
        }
    }

    /// Drop every expired challenge. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut pending = self.pending.lock().await;
        let before = pending.len();
        pending.retain(|_, entry| entry.expires_at.map_or(true, |at| at > now));
        before - pending.len()
    }

    /// Number of outstanding challenges, expired ones included.
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Whether no challenge is outstanding.
    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}

#[async_trait::async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn insert(&self, challenge: String, binding: ChallengeBinding) -> Result<(), StoreError> {
        let now = Instant::now();
        let expires_at = self.ttl.map(|ttl| now + ttl);
        let mut pending = self.pending.lock().await;
        if self.ttl.is_some() {
            pending.retain(|_, entry| entry.expires_at.map_or(true, |at| at > now));
        }
        pending.insert(
            challenge,
            PendingChallenge {
                binding,
                expires_at,
            },
        );
        Ok(())
    }

    async fn take(&self, challenge: &str) -> Result<Option<ChallengeBinding>, StoreError> {
        let Some(entry) = self.pending.lock().await.remove(challenge) else {
            return Ok(None);
        };
        match entry.expires_at {
            Some(at) if at <= Instant::now() => {
                log::debug!("challenge expired before use");
                Ok(None)
            }
            _ => Ok(Some(entry.binding)),
        }
    }
}
