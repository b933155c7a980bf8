//! The cache adapter seam.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use super::keys::CacheKey;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache operation timed out")]
    Timeout,
    #[error("cache configuration error: {0}")]
    Configuration(String),
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Key-value store used as a read accelerator.
///
/// Callers treat every error as a miss; nothing returned here is fatal.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError>;

    async fn set(&self, key: &CacheKey, value: Bytes) -> Result<(), CacheError>;

    /// Remove every listed key. Absent keys are not an error.
    async fn delete(&self, keys: &[CacheKey]) -> Result<(), CacheError>;

    fn backend(&self) -> &'static str;
}
