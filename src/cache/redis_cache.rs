//! Redis cache backend.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::{AsyncCommands, Client, RedisError, aio::ConnectionManager};

use super::keys::CacheKey;
use super::store::{CacheError, CacheStore};

impl From<RedisError> for CacheError {
    fn from(err: RedisError) -> Self {
        if err.is_timeout() {
            CacheError::Timeout
        } else {
            CacheError::backend(err)
        }
    }
}

/// Cache backed by a shared, auto-reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    ttl: Option<Duration>,
}

impl RedisCache {
    pub async fn connect(url: &str, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let client =
            Client::open(url).map_err(|err| CacheError::Configuration(err.to_string()))?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self { connection, ttl })
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut connection).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        let mut connection = self.connection.clone();
        let value: Option<Vec<u8>> = connection.get(key.to_string()).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &CacheKey, value: Bytes) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let key = key.to_string();
        match self.ttl.map(|ttl| ttl.as_secs().max(1)) {
            Some(seconds) => {
                let _: () = connection.set_ex(key, value.to_vec(), seconds).await?;
            }
            None => {
                let _: () = connection.set(key, value.to_vec()).await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, keys: &[CacheKey]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut connection = self.connection.clone();
        let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
        let _: () = connection.del(keys).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
