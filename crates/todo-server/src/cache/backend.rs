//! Byte-level cache backend with an L1 (DashMap) tier and an optional L2
//! (Redis) tier.

use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cached entry with TTL support.
///
/// The data is wrapped in `Arc` so hits hand out the bytes without copying.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<Vec<u8>>,
    pub cached_at: Instant,
    pub ttl: Duration,
}

impl CachedEntry {
    /// Create a new cached entry.
    pub fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data: Arc::new(data),
            cached_at: Instant::now(),
            ttl,
        }
    }

    /// Check if this entry has expired.
    pub fn is_expired(&self) -> bool {
        self.cached_at.elapsed() >= self.ttl
    }
}

/// Two-tier cache backend: L1 (DashMap) + optional L2 (Redis).
///
/// Redis errors never surface to callers: reads degrade to misses and writes
/// to no-ops, each with a `warn!` log. L2 writes and deletes are awaited so a
/// read that follows on this instance cannot resurrect an older L2 value.
#[derive(Clone)]
pub enum CacheBackend {
    /// Single-instance: local DashMap only
    Local(Arc<DashMap<String, CachedEntry>>),

    /// Redis + local L1
    Redis {
        redis: Pool,
        local: Arc<DashMap<String, CachedEntry>>,
    },
}

impl CacheBackend {
    /// Create a new local-only cache backend.
    pub fn new_local() -> Self {
        CacheBackend::Local(Arc::new(DashMap::new()))
    }

    /// Create a new Redis-backed cache backend.
    pub fn new_redis(redis_pool: Pool) -> Self {
        CacheBackend::Redis {
            redis: redis_pool,
            local: Arc::new(DashMap::new()),
        }
    }

    /// Get a value from the cache.
    ///
    /// Checks L1, then L2. An L2 hit is promoted to L1 for the key's
    /// remaining Redis TTL, so promotion never extends an entry's lifetime.
    pub async fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        match self {
            CacheBackend::Local(map) => {
                let result = get_local(map, key);
                if result.is_some() {
                    crate::metrics::record_cache_hit("L1");
                } else {
                    crate::metrics::record_cache_miss();
                }
                result
            }
            CacheBackend::Redis { redis, local } => {
                if let Some(data) = get_local(local, key) {
                    tracing::debug!(key = %key, "cache hit (L1)");
                    crate::metrics::record_cache_hit("L1");
                    return Some(data);
                }

                let mut conn = match redis.get().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to get Redis connection");
                        crate::metrics::record_cache_miss();
                        return None;
                    }
                };

                let reply: redis::RedisResult<(Option<Vec<u8>>, i64)> = redis::pipe()
                    .get(key)
                    .pttl(key)
                    .query_async(&mut conn)
                    .await;

                match reply {
                    Ok((Some(data), remaining_ms)) => {
                        tracing::debug!(key = %key, "cache hit (L2)");
                        crate::metrics::record_cache_hit("L2");

                        if remaining_ms > 0 {
                            let ttl = Duration::from_millis(remaining_ms.unsigned_abs());
                            let entry = CachedEntry::new(data, ttl);
                            let data = Arc::clone(&entry.data);
                            local.insert(key.to_string(), entry);
                            Some(data)
                        } else {
                            Some(Arc::new(data))
                        }
                    }
                    Ok((None, _)) => {
                        tracing::debug!(key = %key, "cache miss");
                        crate::metrics::record_cache_miss();
                        None
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Redis GET error");
                        crate::metrics::record_cache_miss();
                        None
                    }
                }
            }
        }
    }

    /// Set a value with a TTL, overwriting any previous entry.
    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        match self {
            CacheBackend::Local(map) => {
                map.insert(key.to_string(), CachedEntry::new(value, ttl));
            }
            CacheBackend::Redis { redis, local } => {
                let entry = CachedEntry::new(value, ttl);
                let data = Arc::clone(&entry.data);
                local.insert(key.to_string(), entry);

                let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                match redis.get().await {
                    Ok(mut conn) => {
                        if let Err(e) = conn.pset_ex::<_, _, ()>(key, &*data, ttl_ms).await {
                            tracing::warn!(key = %key, error = %e, "Redis SET error");
                        } else {
                            tracing::debug!(key = %key, ttl_ms, "cache set (L1+L2)");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Failed to get Redis connection");
                    }
                }
            }
        }
    }

    /// Remove an entry from every tier.
    pub async fn invalidate(&self, key: &str) {
        match self {
            CacheBackend::Local(map) => {
                map.remove(key);
                tracing::debug!(key = %key, "cache invalidated (local)");
            }
            CacheBackend::Redis { redis, local } => {
                local.remove(key);
                match redis.get().await {
                    Ok(mut conn) => {
                        if let Err(e) = conn.del::<_, ()>(key).await {
                            tracing::warn!(key = %key, error = %e, "Redis DEL error");
                        } else {
                            tracing::debug!(key = %key, "cache invalidated (L1+L2)");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Failed to get Redis connection");
                    }
                }
            }
        }
    }

    /// Get cache statistics (L1 only).
    pub fn stats(&self) -> CacheStats {
        match self {
            CacheBackend::Local(map) => CacheStats {
                l1_entries: map.len(),
                mode: self.mode(),
            },
            CacheBackend::Redis { local, .. } => CacheStats {
                l1_entries: local.len(),
                mode: self.mode(),
            },
        }
    }

    /// `"local"` or `"redis"`.
    pub fn mode(&self) -> &'static str {
        match self {
            CacheBackend::Local(_) => "local",
            CacheBackend::Redis { .. } => "redis",
        }
    }

    /// Check if Redis is reachable (for readiness checks).
    pub async fn is_redis_available(&self) -> bool {
        match self {
            CacheBackend::Local(_) => false,
            CacheBackend::Redis { redis, .. } => redis.get().await.is_ok(),
        }
    }
}

fn get_local(map: &DashMap<String, CachedEntry>, key: &str) -> Option<Arc<Vec<u8>>> {
    if let Some(entry) = map.get(key) {
        if !entry.is_expired() {
            return Some(Arc::clone(&entry.data));
        }
    }
    // Drop the expired entry unless a writer replaced it in the meantime.
    map.remove_if(key, |_, entry| entry.is_expired());
    None
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub l1_entries: usize,
    pub mode: &'static str,
}
