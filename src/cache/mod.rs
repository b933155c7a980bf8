//! Phonebook cache layer
//!
//! A key-value read accelerator in front of the contact store. Three
//! backends share the [`CacheStore`] seam:
//!
//! - **redis**: shared cache for multi-instance deployments
//! - **memory**: bounded in-process LRU (the default)
//! - **disabled**: every read misses
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"
//! url = "redis://127.0.0.1:6379"
//! ttl_seconds = 0
//! operation_timeout_ms = 250
//! ```

mod config;
mod keys;
mod memory;
mod null;
mod redis_cache;
mod store;

use std::sync::Arc;

use tracing::{info, warn};

pub use self::config::{CacheBackend, CacheConfig};
pub use keys::CacheKey;
pub use memory::MemoryCache;
pub use null::NullCache;
pub use redis_cache::RedisCache;
pub use store::{CacheError, CacheStore};

/// Build the configured backend.
///
/// An unreachable Redis server does not fail startup. If the first
/// connection fails the service runs uncached; once connected, the
/// connection manager reconnects on demand and every failed call degrades
/// to a miss. Only a malformed URL is fatal.
pub async fn connect(config: &CacheConfig) -> Result<Arc<dyn CacheStore>, CacheError> {
    let store: Arc<dyn CacheStore> = match &config.backend {
        CacheBackend::Redis { url } => match RedisCache::connect(url, config.ttl).await {
            Ok(cache) => {
                match cache.ping().await {
                    Ok(()) => info!(target = "phonebook::cache", "Connected to Redis"),
                    Err(err) => warn!(
                        target = "phonebook::cache",
                        error = %err,
                        "Redis did not answer PING; continuing with degraded cache"
                    ),
                }
                Arc::new(cache)
            }
            Err(err @ CacheError::Configuration(_)) => return Err(err),
            Err(err) => {
                warn!(
                    target = "phonebook::cache",
                    error = %err,
                    "Redis is unreachable; serving without a cache"
                );
                Arc::new(NullCache)
            }
        },
        CacheBackend::Memory => Arc::new(MemoryCache::new(config.memory_capacity, config.ttl)),
        CacheBackend::Disabled => Arc::new(NullCache),
    };

    info!(
        target = "phonebook::cache",
        configured = config.backend.label(),
        backend = store.backend(),
        "Cache backend ready"
    );
    Ok(store)
}
