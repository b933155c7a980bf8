use async_trait::async_trait;
use bytes::Bytes;

use super::keys::CacheKey;
use super::store::{CacheError, CacheStore};

/// Backend used when caching is disabled: every read misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

#[async_trait]
impl CacheStore for NullCache {
    async fn get(&self, _key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &CacheKey, _value: Bytes) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _keys: &[CacheKey]) -> Result<(), CacheError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "disabled"
    }
}
