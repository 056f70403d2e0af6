//! Generic TTL-bounded read cache, one instance per collection.
//!
//! Keys are content digests of normalized list requests
//! ([`stockroom_core::CacheKey`]), so equal requests hit the same entry.
//! Invalidation is coarse: any write to the collection clears the whole
//! cache before the write is attempted, which guarantees readers never see
//! a result computed from pre-write state after the write is acknowledged.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use stockroom_core::CacheKey;

/// How long cached list results stay valid.
pub const RESPONSE_TTL: Duration = Duration::from_secs(60 * 60);

/// A keyed cache of list results for one collection.
pub struct ResponseCache<T> {
    inner: Cache<CacheKey, Arc<Vec<T>>>,
}

impl<T> ResponseCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Cache with the default one-hour TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(RESPONSE_TTL)
    }

    /// Cache with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().time_to_live(ttl).build(),
        }
    }

    /// Look up a cached result, sweeping expired entries first.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<Vec<T>>> {
        self.inner.run_pending_tasks().await;
        self.inner.get(key).await
    }

    /// Store a result under its request digest.
    pub async fn insert(&self, key: CacheKey, values: Vec<T>) {
        self.inner.insert(key, Arc::new(values)).await;
    }

    /// Drop every entry. Called before any write to the collection.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

impl<T> Default for ResponseCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use stockroom_core::KeyEncoder;

    fn key(offset: u32) -> CacheKey {
        let mut enc = KeyEncoder::new();
        enc.u32(10);
        enc.u32(offset);
        enc.finish()
    }

    #[tokio::test]
    async fn stores_and_returns_entries() {
        let cache = ResponseCache::new();
        cache.insert(key(0), vec![1, 2, 3]).await;
        assert_eq!(cache.get(&key(0)).await.unwrap().as_slice(), &[1, 2, 3]);
        assert!(cache.get(&key(10)).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_all_clears_every_entry() {
        let cache = ResponseCache::new();
        cache.insert(key(0), vec![1]).await;
        cache.insert(key(10), vec![2]).await;
        cache.invalidate_all();
        assert!(cache.get(&key(0)).await.is_none());
        assert!(cache.get(&key(10)).await.is_none());
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = ResponseCache::with_ttl(Duration::from_millis(20));
        cache.insert(key(0), vec![1]).await;
        assert!(cache.get(&key(0)).await.is_some());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.get(&key(0)).await.is_none());
    }

    #[tokio::test]
    async fn insert_after_invalidate_is_served() {
        let cache = ResponseCache::new();
        cache.insert(key(0), vec![1]).await;
        cache.invalidate_all();
        cache.insert(key(0), vec![2]).await;
        assert_eq!(cache.get(&key(0)).await.unwrap().as_slice(), &[2]);
    }
}
