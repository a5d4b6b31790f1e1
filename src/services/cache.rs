use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::SelectionRequest;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Keys fetched per SCAN round trip while invalidating
const SCAN_BATCH: usize = 500;

/// Two-tier cache for ranked selections
///
/// L1 is an in-process moka cache holding serialized JSON; L2 is Redis,
/// shared across instances. Entries expire after the configured TTL in both
/// tiers.
pub struct CacheManager {
    redis: Arc<tokio::sync::Mutex<ConnectionManager>>,
    l1_cache: moka::future::Cache<String, Arc<str>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Connect to Redis and size the in-process tier
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Ok(Self {
            redis: Arc::new(tokio::sync::Mutex::new(redis)),
            l1_cache,
            ttl_secs,
        })
    }

    /// Look up a cached value, promoting L2 hits into L1
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let json = match self.l1_cache.get(key).await {
            Some(json) => {
                tracing::trace!("L1 cache hit: {}", key);
                json
            }
            None => {
                let json = self
                    .fetch_remote(key)
                    .await?
                    .ok_or_else(|| CacheError::CacheMiss(key.to_string()))?;
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache.insert(key.to_string(), Arc::clone(&json)).await;
                json
            }
        };

        Ok(serde_json::from_str(&json)?)
    }

    /// Store a value in both tiers
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json: Arc<str> = serde_json::to_string(value)?.into();
        self.l1_cache.insert(key.to_string(), Arc::clone(&json)).await;

        let mut conn = self.redis.lock().await;
        redis::cmd("SETEX")
            .arg(key)
            .arg(self.ttl_secs)
            .arg(&*json)
            .query_async::<()>(&mut *conn)
            .await?;

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Drop every entry whose key matches a Redis glob pattern
    ///
    /// Keys are walked with SCAN so a large keyspace never blocks Redis.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<(), CacheError> {
        // L1 has no pattern lookup; every L1 entry is a selection anyway
        self.l1_cache.invalidate_all();

        let mut conn = self.redis.lock().await;
        let mut cursor: u64 = 0;
        let mut removed = 0usize;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut *conn)
                .await?;

            if !keys.is_empty() {
                removed += keys.len();
                redis::cmd("UNLINK")
                    .arg(keys)
                    .query_async::<()>(&mut *conn)
                    .await?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        tracing::debug!("Invalidated {} cached entries matching {}", removed, pattern);
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            l1_size: self.l1_cache.entry_count(),
            ttl_secs: self.ttl_secs,
        }
    }

    async fn fetch_remote(&self, key: &str) -> Result<Option<Arc<str>>, CacheError> {
        let mut conn = self.redis.lock().await;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut *conn).await?;
        Ok(value.map(Arc::from))
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub l1_size: u64,
    pub ttl_secs: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Pattern matching every cached selection
    pub const SELECTION_PATTERN: &'static str = "selection:*";

    /// Build a cache key for a ranked selection
    pub fn selection(request: &SelectionRequest) -> String {
        let filters = serde_json::to_string(&request.filters).unwrap_or_default();
        format!(
            "selection:{}:{}:{}",
            request.required_flow, request.required_head, filters
        )
    }
}
