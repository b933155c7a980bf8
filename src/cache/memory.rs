//! In-process LRU cache backend.

use std::{
    num::NonZeroUsize,
    sync::{RwLock, RwLockWriteGuard},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use tracing::warn;

use super::keys::CacheKey;
use super::store::{CacheError, CacheStore};

const SOURCE: &str = "cache::memory";

struct Entry {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

/// Bounded in-process cache; least recently used entries are evicted first.
pub struct MemoryCache {
    entries: RwLock<LruCache<CacheKey, Entry>>,
    ttl: Option<Duration>,
}

impl MemoryCache {
    pub fn new(capacity: NonZeroUsize, ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // LruCache::get reorders entries, so every access takes the write side.
    fn entries(&self, op: &'static str) -> RwLockWriteGuard<'_, LruCache<CacheKey, Entry>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    op,
                    target_module = SOURCE,
                    lock_kind = "rwlock.write",
                    result = "poisoned_recovered",
                    "Recovered from poisoned cache lock"
                );
                poisoned.into_inner()
            }
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        let mut entries = self.entries("get");
        let now = Instant::now();
        let lookup = entries
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.value.clone()));
        match lookup {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                entries.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, value: Bytes) -> Result<(), CacheError> {
        let expires_at = self.ttl.map(|ttl| Instant::now() + ttl);
        self.entries("set").put(*key, Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, keys: &[CacheKey]) -> Result<(), CacheError> {
        let mut entries = self.entries("delete");
        for key in keys {
            entries.pop(key);
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
