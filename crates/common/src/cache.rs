//! Ephemeral key/value cache backed by Redis.
//!
//! Used for short-lived copies of graded submissions. Entries always carry
//! a TTL; nothing in this cache is authoritative, so callers treat write
//! failures as non-fatal.
//!
//! # Example
//!
//! ```ignore
//! use quizzes_common::cache::{EphemeralCache, RedisCache};
//! use std::time::Duration;
//!
//! let cache = RedisCache::new(Arc::new(redis_client), "quizzes");
//! cache.set("results:q:u:ts", &payload, Duration::from_secs(3600)).await?;
//! ```

use async_trait::async_trait;
use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A TTL-bounded JSON cache.
#[async_trait]
pub trait EphemeralCache: Send + Sync {
    /// Store `value` under `key` for `ttl`.
    async fn set(
        &self,
        key: &str,
        value: &serde_json::Value,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Fetch the value stored under `key`, if it has not expired.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CacheError>;
}

/// Shared handle to a cache implementation.
pub type EphemeralCacheService = Arc<dyn EphemeralCache>;

/// Redis implementation of [`EphemeralCache`].
#[derive(Clone)]
pub struct RedisCache {
    redis: Arc<RedisClient>,
    prefix: String,
}

impl RedisCache {
    /// Create a cache that namespaces every key with `prefix`.
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }
}

#[async_trait]
impl EphemeralCache for RedisCache {
    async fn set(
        &self,
        key: &str,
        value: &serde_json::Value,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let json_str =
            serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))?;

        // Redis rejects EX 0
        let ttl_secs = ttl.as_secs().max(1) as i64;

        self.redis
            .set::<(), _, _>(
                self.namespaced(key),
                json_str,
                Some(Expiration::EX(ttl_secs)),
                None,
                false,
            )
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;

        debug!(key = %key, ttl_secs, "Cached entry");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CacheError> {
        let result: Option<String> = self
            .redis
            .get(self.namespaced(key))
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;

        match result {
            Some(json_str) => {
                debug!(key = %key, "Cache hit");
                serde_json::from_str(&json_str)
                    .map(Some)
                    .map_err(|e| CacheError::Serialization(e.to_string()))
            }
            None => {
                debug!(key = %key, "Cache miss");
                Ok(None)
            }
        }
    }
}

/// Cache error type.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Redis operation failed.
    #[error("Redis error: {0}")]
    Redis(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<CacheError> for crate::AppError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Redis(msg) => Self::Redis(msg),
            CacheError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
