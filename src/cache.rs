use std::hash::Hash;

/// a key value store that is invalidated by hand
pub trait Cache<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;

    fn put(&self, key: K, value: V);

    fn evict(&self, key: &K);

    fn clear(&self);
}

#[derive(Debug, Clone)]
pub struct MokaCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: moka::sync::Cache<K, V>,
}

impl<K, V> MokaCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &str, capacity: u64) -> Self {
        MokaCache {
            inner: moka::sync::Cache::builder()
                .name(name)
                .max_capacity(capacity)
                .build(),
        }
    }
}

impl<K, V> Cache<K, V> for MokaCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    fn put(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    fn evict(&self, key: &K) {
        self.inner.invalidate(key);
    }

    fn clear(&self) {
        self.inner.invalidate_all();
    }
}
