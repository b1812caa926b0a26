//! Typed TTL cache facade over `moka`.
//!
//! The pipeline keeps one cache instance per namespace (search results,
//! fetch results, reclassification orders) so unrelated values can never
//! collide on a key. Entries older than their TTL are treated as absent;
//! expiry is lazy and handled inside moka.

use std::hash::Hash;
use std::time::Duration;

use moka::sync::Cache;

/// A typed key/value cache with a uniform time-to-live.
///
/// Safe for concurrent use; reads never block writes. Values must be `Clone`
/// because a read hands out an owned copy of the cached value.
pub struct TtlCache<K, V> {
    inner: Cache<K, V>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache holding up to `capacity` entries, each valid for `ttl`.
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    /// Create a cache whose per-entry lifetime is decided by `expiry`
    /// (used by the fetch namespace to give Blocked entries a shorter TTL).
    pub fn with_expiry(
        capacity: u64,
        expiry: impl moka::Expiry<K, V> + Send + Sync + 'static,
    ) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity)
            .expire_after(expiry)
            .build();
        Self { inner }
    }

    /// Look up a key; expired entries read as absent.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    /// Insert or replace a value for `key`.
    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    /// Atomically return the cached value for `key` or compute, insert, and
    /// return it. Concurrent callers for the same key compute at most once.
    pub fn get_or_insert_with(&self, key: K, init: impl FnOnce() -> V) -> V {
        self.inner.get_with(key, init)
    }

    /// Drop every entry (test support).
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get() {
        let cache: TtlCache<String, Vec<String>> =
            TtlCache::new(16, Duration::from_secs(60));
        cache.insert("query".into(), vec!["https://x/1".into()]);
        assert_eq!(
            cache.get(&"query".to_string()),
            Some(vec!["https://x/1".to_string()])
        );
        assert_eq!(cache.get(&"other".to_string()), None);
    }

    #[test]
    fn expired_entry_reads_as_absent() {
        let cache: TtlCache<String, u32> = TtlCache::new(16, Duration::from_millis(10));
        cache.insert("k".into(), 1);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(cache.get(&"k".to_string()), None);
    }

    #[test]
    fn get_or_insert_computes_once() {
        let cache: TtlCache<String, u32> = TtlCache::new(16, Duration::from_secs(60));
        let v1 = cache.get_or_insert_with("k".into(), || 7);
        let v2 = cache.get_or_insert_with("k".into(), || 99);
        assert_eq!(v1, 7);
        assert_eq!(v2, 7);
    }

    #[test]
    fn per_entry_expiry_honored() {
        struct ShortForOdd;
        impl moka::Expiry<String, u32> for ShortForOdd {
            fn expire_after_create(
                &self,
                _key: &String,
                value: &u32,
                _created_at: std::time::Instant,
            ) -> Option<Duration> {
                if value % 2 == 1 {
                    Some(Duration::from_millis(10))
                } else {
                    Some(Duration::from_secs(60))
                }
            }
        }

        let cache: TtlCache<String, u32> = TtlCache::with_expiry(16, ShortForOdd);
        cache.insert("odd".into(), 1);
        cache.insert("even".into(), 2);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(cache.get(&"odd".to_string()), None);
        assert_eq!(cache.get(&"even".to_string()), Some(2));
    }
}
