//! Contact operations with a cache-aside read path.
//!
//! Reads consult the cache first and fall back to the store on a miss, then
//! populate the cache with what the store returned. Writes go to the store
//! and then delete every cache entry they made stale. The cache is best
//! effort throughout: a failing, slow or corrupt cache only costs a store
//! round trip and a log line.
//!
//! A read that raced with a write must not leave the pre-write value in the
//! cache. Every invalidation bumps a write epoch; a read snapshots the epoch
//! before going to the store and withdraws its cache entry if the epoch
//! moved while it was in flight.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use bytes::Bytes;
use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::application::repos::{ContactStore, DeleteOutcome, RepoError, UpdateOutcome};
use crate::cache::{CacheError, CacheKey, CacheStore};
use crate::domain::contact::{Contact, ContactId, NewContact, PhoneNumber};
use crate::domain::error::DomainError;

const CACHE_TARGET: &str = "phonebook::cache";
const CONTACTS_TARGET: &str = "phonebook::contacts";

#[derive(Debug, Error)]
pub enum ContactServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateContactCommand {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct UpdateContactCommand {
    pub id: ContactId,
    pub phone: String,
}

/// Upper bounds for a single store or cache call.
#[derive(Debug, Clone, Copy)]
pub struct OperationTimeouts {
    pub store: Duration,
    pub cache: Duration,
}

impl Default for OperationTimeouts {
    fn default() -> Self {
        Self {
            store: Duration::from_secs(5),
            cache: Duration::from_millis(250),
        }
    }
}

#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn ContactStore>,
    cache: Arc<dyn CacheStore>,
    timeouts: OperationTimeouts,
    write_epoch: Arc<AtomicU64>,
}

impl ContactService {
    pub fn new(
        store: Arc<dyn ContactStore>,
        cache: Arc<dyn CacheStore>,
        timeouts: OperationTimeouts,
    ) -> Self {
        Self {
            store,
            cache,
            timeouts,
            write_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn create(
        &self,
        command: CreateContactCommand,
    ) -> Result<ContactId, ContactServiceError> {
        let contact = NewContact::parse(&command.name, &command.phone)?;
        let id = self.store_call(self.store.insert_one(contact)).await?;

        self.invalidate(&[CacheKey::Collection]).await;
        info!(target = CONTACTS_TARGET, contact_id = %id, "Contact created");
        Ok(id)
    }

    /// Replace the phone number of one contact. Names are immutable once
    /// created.
    pub async fn update_phone(
        &self,
        command: UpdateContactCommand,
    ) -> Result<UpdateOutcome, ContactServiceError> {
        let phone = PhoneNumber::parse(&command.phone)?;
        let outcome = self
            .store_call(self.store.update_phone(command.id, &phone))
            .await?;

        self.invalidate(&CacheKey::affected_by_write(command.id))
            .await;
        info!(
            target = CONTACTS_TARGET,
            contact_id = %command.id,
            matched = outcome.matched,
            modified = outcome.modified,
            "Contact phone updated"
        );
        Ok(outcome)
    }

    /// Delete one contact. Deleting an id that no longer exists reports zero
    /// deletions rather than failing.
    pub async fn delete(&self, id: ContactId) -> Result<DeleteOutcome, ContactServiceError> {
        let outcome = self.store_call(self.store.delete_one(id)).await?;

        if outcome.deleted > 0 {
            self.invalidate(&CacheKey::affected_by_write(id)).await;
        }
        info!(
            target = CONTACTS_TARGET,
            contact_id = %id,
            deleted = outcome.deleted,
            "Contact delete processed"
        );
        Ok(outcome)
    }

    pub async fn list(&self) -> Result<Vec<Contact>, ContactServiceError> {
        let key = CacheKey::Collection;
        if let Some(contacts) = self.cached::<Vec<Contact>>(&key).await {
            return Ok(contacts);
        }

        let epoch = self.write_epoch.load(Ordering::SeqCst);
        let contacts = self.store_call(self.store.find_all()).await?;
        self.populate(&key, &contacts, epoch).await;
        Ok(contacts)
    }

    pub async fn get(&self, id: ContactId) -> Result<Contact, ContactServiceError> {
        let key = CacheKey::Contact(id);
        if let Some(contact) = self.cached::<Contact>(&key).await {
            return Ok(contact);
        }

        let epoch = self.write_epoch.load(Ordering::SeqCst);
        let contact = self
            .store_call(self.store.find_one(id))
            .await?
            .ok_or_else(|| DomainError::not_found("contact"))?;
        self.populate(&key, &contact, epoch).await;
        Ok(contact)
    }

    pub async fn store_health(&self) -> Result<(), RepoError> {
        self.store_call(self.store.health_check()).await
    }

    async fn store_call<T>(
        &self,
        operation: impl Future<Output = Result<T, RepoError>>,
    ) -> Result<T, RepoError> {
        timeout(self.timeouts.store, operation)
            .await
            .unwrap_or(Err(RepoError::Timeout))
    }

    async fn cache_call<T>(
        &self,
        operation: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        timeout(self.timeouts.cache, operation)
            .await
            .unwrap_or(Err(CacheError::Timeout))
    }

    async fn cached<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let kind = key.kind();
        match self.cache_call(self.cache.get(key)).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => {
                    counter!("phonebook_cache_hit_total", "kind" => kind).increment(1);
                    debug!(target = CACHE_TARGET, key = %key, "cache hit");
                    Some(value)
                }
                Err(err) => {
                    counter!("phonebook_cache_error_total", "kind" => kind).increment(1);
                    warn!(
                        target = CACHE_TARGET,
                        key = %key,
                        error = %err,
                        "Cached entry could not be decoded; reading through to the store"
                    );
                    None
                }
            },
            Ok(None) => {
                counter!("phonebook_cache_miss_total", "kind" => kind).increment(1);
                debug!(target = CACHE_TARGET, key = %key, "cache miss");
                None
            }
            Err(err) => {
                counter!("phonebook_cache_error_total", "kind" => kind).increment(1);
                warn!(
                    target = CACHE_TARGET,
                    key = %key,
                    backend = self.cache.backend(),
                    error = %err,
                    "Cache read failed; reading through to the store"
                );
                None
            }
        }
    }

    /// Store `value` under `key` unless a write was committed since `epoch`
    /// was read. The epoch is checked again after the write so that an
    /// invalidation landing between the check and the set cannot be undone.
    async fn populate<T: Serialize>(&self, key: &CacheKey, value: &T, epoch: u64) {
        if self.write_epoch.load(Ordering::SeqCst) != epoch {
            debug!(target = CACHE_TARGET, key = %key, "skipping populate after concurrent write");
            return;
        }

        let payload = match serde_json::to_vec(value) {
            Ok(payload) => Bytes::from(payload),
            Err(err) => {
                warn!(target = CACHE_TARGET, key = %key, error = %err, "Failed to encode cache entry");
                return;
            }
        };

        if let Err(err) = self.cache_call(self.cache.set(key, payload)).await {
            counter!("phonebook_cache_error_total", "kind" => key.kind()).increment(1);
            warn!(
                target = CACHE_TARGET,
                key = %key,
                backend = self.cache.backend(),
                error = %err,
                "Cache write failed"
            );
            return;
        }

        if self.write_epoch.load(Ordering::SeqCst) != epoch {
            debug!(target = CACHE_TARGET, key = %key, "withdrawing entry raced by a write");
            self.invalidate_keys(std::slice::from_ref(key)).await;
        }
    }

    async fn invalidate(&self, keys: &[CacheKey]) {
        self.write_epoch.fetch_add(1, Ordering::SeqCst);
        self.invalidate_keys(keys).await;
    }

    async fn invalidate_keys(&self, keys: &[CacheKey]) {
        if let Err(err) = self.cache_call(self.cache.delete(keys)).await {
            counter!("phonebook_cache_error_total", "kind" => "invalidate").increment(1);
            let keys = keys.iter().map(ToString::to_string).collect::<Vec<_>>();
            warn!(
                target = CACHE_TARGET,
                keys = ?keys,
                backend = self.cache.backend(),
                error = %err,
                "Cache invalidation failed; entries may be served stale until overwritten"
            );
        }
    }
}
