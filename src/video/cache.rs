use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::hash::Hash;

/// Fixed-capacity key/value cache that evicts the least recently used entry.
#[derive(Clone)]
pub struct BoundedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<K, V>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { inner }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_values_are_returned() {
        let cache: BoundedCache<&'static str, u32> = BoundedCache::new(4);
        cache.insert("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"b"), None);
    }

    #[test]
    fn reinserting_replaces_value() {
        let cache: BoundedCache<u8, String> = BoundedCache::new(4);
        cache.insert(1, "one".to_string());
        cache.insert(1, "uno".to_string());
        assert_eq!(cache.get(&1).as_deref(), Some("uno"));
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn entry_count_stays_within_capacity() {
        let cache: BoundedCache<u32, u32> = BoundedCache::new(3);
        for key in 0..20 {
            cache.insert(key, key);
        }
        assert!(cache.entry_count() <= 3);
    }
}
