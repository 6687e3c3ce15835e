//! services/api/src/services/cache.rs
//!
//! Cache-aside helper shared by the read paths of every service.

use bookshelf_core::pagination::PageRequest;
use bookshelf_core::ports::{CacheService, PortResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How long a cached read stays valid. Writes do not evict, so this is also
/// the longest a reader can observe stale data.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Key for one page of a listing, e.g. `books:limit=10,page=1,sort=id desc`.
pub fn list_key(prefix: &str, request: &PageRequest) -> String {
    format!(
        "{}:limit={},page={},sort={}",
        prefix,
        request.limit(),
        request.page(),
        request.sort()
    )
}

/// Key for a single entity, e.g. `book:42`.
pub fn item_key(prefix: &str, id: i64) -> String {
    format!("{}:{}", prefix, id)
}

/// Returns the cached value for `key`, or runs `load` and stores its result.
///
/// Any cache failure (lookup, decode, encode, store) is logged and handled as a
/// miss. Only `load` can fail the call.
pub async fn cached<T, F, Fut>(cache: &dyn CacheService, key: &str, load: F) -> PortResult<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = PortResult<T>>,
{
    match cache.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                debug!(key = %key, "cache hit");
                return Ok(value);
            }
            Err(e) => warn!(key = %key, error = %e, "cached value could not be decoded"),
        },
        Ok(None) => debug!(key = %key, "cache miss"),
        Err(e) => warn!(key = %key, error = %e, "cache lookup failed"),
    }

    let value = load().await?;

    match serde_json::to_string(&value) {
        Ok(raw) => {
            if let Err(e) = cache.set(key, &raw, CACHE_TTL).await {
                warn!(key = %key, error = %e, "cache store failed");
            }
        }
        Err(e) => warn!(key = %key, error = %e, "value could not be encoded for cache"),
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryCache;
    use async_trait::async_trait;
    use bookshelf_core::ports::PortError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BrokenCache;

    #[async_trait]
    impl CacheService for BrokenCache {
        async fn get(&self, _key: &str) -> PortResult<Option<String>> {
            Err(PortError::Unexpected("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> PortResult<()> {
            Err(PortError::Unexpected("connection refused".into()))
        }
    }

    #[test]
    fn keys_are_deterministic() {
        let request = PageRequest::new(0, 0, "");
        assert_eq!(list_key("users", &request), "users:limit=10,page=1,sort=id desc");
        assert_eq!(item_key("book", 42), "book:42");
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache = MemoryCache::new();
        let loads = AtomicUsize::new(0);
        for _ in 0..2 {
            let value: Vec<i64> = cached(&cache, "k", || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1, 2, 3])
            })
            .await
            .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn loaded_values_are_stored_for_five_minutes() {
        let cache = MemoryCache::new();
        let _: i64 = cached(&cache, "book:1", || async { Ok(1) }).await.unwrap();
        assert_eq!(cache.ttl_of("book:1"), Some(Duration::from_secs(300)));
        assert_eq!(cache.ttl_of("book:2"), None);
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache.set("k", "not json", CACHE_TTL).await.unwrap();
        let value: i64 = cached(&cache, "k", || async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn broken_cache_never_fails_the_read() {
        let value: String = cached(&BrokenCache, "k", || async { Ok("fresh".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "fresh");
    }

    #[tokio::test]
    async fn loader_errors_are_not_cached() {
        let cache = MemoryCache::new();
        let result: PortResult<i64> =
            cached(&cache, "k", || async { Err(PortError::NotFound("gone".into())) }).await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
        assert!(!cache.contains("k"));
    }
}
