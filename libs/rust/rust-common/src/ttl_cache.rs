//! In-process key/value cache with per-entry expiry.
//!
//! Used as the local cache backend when no remote cache is configured.
//! Keys are namespaced so several caches can share a key space in logs.
//! The number of stored entries is bounded; past the bound the least
//! recently written entry is evicted.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Local cache configuration.
#[derive(Debug, Clone)]
pub struct TtlCacheConfig {
    /// Namespace for key isolation
    pub namespace: String,
    /// Default TTL for cache entries
    pub default_ttl: Duration,
    /// Maximum number of stored entries (a zero value is treated as one)
    pub max_entries: usize,
}

impl Default for TtlCacheConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            default_ttl: Duration::from_secs(3600),
            max_entries: 1000,
        }
    }
}

impl TtlCacheConfig {
    /// Create config with custom namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Create config with custom TTL.
    #[must_use]
    pub const fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Create config with a custom capacity.
    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Cloneable handle to a shared, bounded TTL map.
pub struct TtlCache<V> {
    config: TtlCacheConfig,
    entries: Arc<RwLock<LruCache<String, Entry<V>>>>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    /// Create an empty cache holding at most `config.max_entries` entries.
    #[must_use]
    pub fn new(config: TtlCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            entries: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    /// Get a live value.
    pub async fn get(&self, key: &str) -> Option<V> {
        let key = self.namespaced_key(key);
        let entries = self.entries.read().await;
        entries
            .peek(&key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Insert a value, replacing any previous one.
    ///
    /// When the cache is full, expired entries are dropped first; if none
    /// are, the least recently written entry is evicted.
    pub async fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        let key = self.namespaced_key(key);
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let now = Instant::now();

        let mut entries = self.entries.write().await;
        if entries.len() >= entries.cap().get() && !entries.contains(&key) {
            let expired: Vec<String> = entries
                .iter()
                .filter(|(_, entry)| entry.expires_at <= now)
                .map(|(k, _)| k.clone())
                .collect();
            for k in expired {
                entries.pop(&k);
            }
        }

        entries.put(
            key,
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    /// Remove a value.
    pub async fn delete(&self, key: &str) {
        let key = self.namespaced_key(key);
        self.entries.write().await.pop(&key);
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Maximum number of stored entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.max_entries.max(1)
    }

    /// Get the namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    fn namespaced_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.namespace, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = TtlCache::new(TtlCacheConfig::default());

        cache.set("key1", "value1".to_string(), None).await;

        assert_eq!(cache.get("key1").await, Some("value1".to_string()));
        assert_eq!(cache.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_namespace_isolation() {
        let shared = TtlCache::new(TtlCacheConfig::default().with_namespace("ns1"));
        let other = TtlCache {
            config: TtlCacheConfig::default().with_namespace("ns2"),
            entries: Arc::clone(&shared.entries),
        };

        shared.set("key", 1u32, None).await;
        other.set("key", 2u32, None).await;

        assert_eq!(shared.get("key").await, Some(1));
        assert_eq!(other.get("key").await, Some(2));
        assert_eq!(shared.len().await, 2);
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = TtlCache::new(TtlCacheConfig::default());

        cache.set("key", 7u8, Some(Duration::from_millis(1))).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(cache.get("key").await, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = TtlCache::new(TtlCacheConfig::default());

        cache.set("key", 1u8, None).await;
        cache.delete("key").await;

        assert_eq!(cache.get("key").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_entries_swept_over_capacity() {
        let cache = TtlCache::new(TtlCacheConfig::default().with_max_entries(2));

        cache.set("a", 1u8, Some(Duration::from_millis(1))).await;
        cache.set("b", 2u8, Some(Duration::from_millis(1))).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.set("c", 3u8, None).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("c").await, Some(3));
    }

    #[tokio::test]
    async fn test_live_entries_bounded_by_capacity() {
        let cache = TtlCache::new(TtlCacheConfig::default().with_max_entries(2));

        for i in 0..50u32 {
            cache
                .set(&format!("key-{i}"), i, Some(Duration::from_secs(600)))
                .await;
        }

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("key-0").await, None);
        assert_eq!(cache.get("key-48").await, Some(48));
        assert_eq!(cache.get("key-49").await, Some(49));
    }

    #[tokio::test]
    async fn test_rewrite_refreshes_eviction_order() {
        let cache = TtlCache::new(TtlCacheConfig::default().with_max_entries(2));

        cache.set("a", 1u8, None).await;
        cache.set("b", 2u8, None).await;
        cache.set("a", 3u8, None).await;
        cache.set("c", 4u8, None).await;

        assert_eq!(cache.get("a").await, Some(3));
        assert_eq!(cache.get("b").await, None);
        assert_eq!(cache.get("c").await, Some(4));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = TtlCache::<u8>::new(TtlCacheConfig::default().with_max_entries(0));
        assert_eq!(cache.capacity(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = TtlCache::new(TtlCacheConfig::default());
        let clone = cache.clone();

        clone.set("key", 5u8, None).await;

        assert_eq!(cache.get("key").await, Some(5));
    }
}
