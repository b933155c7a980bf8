//! Cache configuration.
//!
//! Selects the backend and bounds every cache call, via the `[cache]` table
//! of `phonebook.toml`.

use std::{num::NonZeroUsize, time::Duration};

const DEFAULT_MEMORY_CAPACITY: usize = 1024;
const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 250;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    Redis { url: String },
    Memory,
    Disabled,
}

impl CacheBackend {
    pub fn label(&self) -> &'static str {
        match self {
            CacheBackend::Redis { .. } => "redis",
            CacheBackend::Memory => "memory",
            CacheBackend::Disabled => "disabled",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Maximum entries held by the in-process backend.
    pub memory_capacity: NonZeroUsize,
    /// Optional expiry applied on every `set`; invalidation does not rely on it.
    pub ttl: Option<Duration>,
    /// Upper bound for a single cache call before it is treated as a miss.
    pub operation_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            memory_capacity: NonZeroUsize::new(DEFAULT_MEMORY_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
            ttl: None,
            operation_timeout: Duration::from_millis(DEFAULT_OPERATION_TIMEOUT_MS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend.clone(),
            memory_capacity: settings.memory_capacity,
            ttl: settings.ttl,
            operation_timeout: settings.operation_timeout,
        }
    }
}
