//! Key-value cache for user lookups.

use crate::model::User;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use rust_common::{TtlCache, TtlCacheConfig};
use std::time::Duration;
use thiserror::Error;

/// Cache errors. Callers recover from these locally.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Connection or command failure
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// Stored value could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// User cache keyed by an opaque string (the email).
#[async_trait]
pub trait UserCache: Send + Sync {
    /// Cached user, `None` on miss.
    async fn get(&self, key: &str) -> Result<Option<User>, CacheError>;

    /// Stores `user` under `key` for `ttl`.
    async fn set(&self, key: &str, user: &User, ttl: Duration) -> Result<(), CacheError>;
}

/// In-process cache.
#[derive(Debug, Clone)]
pub struct MemoryUserCache {
    inner: TtlCache<User>,
}

impl MemoryUserCache {
    /// Creates a cache holding at most `max_entries` users. Past that the
    /// least recently written user is evicted.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        let config = TtlCacheConfig::default()
            .with_namespace("user")
            .with_max_entries(max_entries);
        Self {
            inner: TtlCache::new(config),
        }
    }
}

impl Default for MemoryUserCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl UserCache for MemoryUserCache {
    async fn get(&self, key: &str) -> Result<Option<User>, CacheError> {
        Ok(self.inner.get(key).await)
    }

    async fn set(&self, key: &str, user: &User, ttl: Duration) -> Result<(), CacheError> {
        self.inner.set(key, user.clone(), Some(ttl)).await;
        Ok(())
    }
}

/// Redis cache storing users as JSON with `SET EX`.
#[derive(Clone)]
pub struct RedisUserCache {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisUserCache {
    /// Connects to Redis.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the URL is invalid or the server is unreachable.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self {
            conn,
            prefix: "user:".to_string(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

impl std::fmt::Debug for RedisUserCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisUserCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl UserCache for RedisUserCache {
    async fn get(&self, key: &str) -> Result<Option<User>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.key(key)).await?;

        value
            .map(|v| serde_json::from_str(&v))
            .transpose()
            .map_err(CacheError::from)
    }

    async fn set(&self, key: &str, user: &User, ttl: Duration) -> Result<(), CacheError> {
        let value = serde_json::to_string(user)?;
        let mut conn = self.conn.clone();

        conn.set_ex::<_, _, ()>(self.key(key), value, ttl.as_secs().max(1))
            .await?;
        Ok(())
    }
}
