// provider-store/src/cache.rs

use provider_core::Provider;
use provider_crypto::Address;
use std::collections::{HashMap, VecDeque};

/// Bounded cache of decoded providers, scoped to one execution context.
///
/// Every access carries the caller's context epoch. When the epoch differs
/// from the one the cache was filled under, the cache is flushed first, so a
/// speculative pass can never observe (or leave behind) another context's
/// records.
pub struct ProviderCache {
    entries: LruCache<Address, Provider>,
    epoch: u64,
}

impl ProviderCache {
    /// A capacity of zero disables caching
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            epoch: 0,
        }
    }

    pub fn get(&mut self, epoch: u64, address: &Address) -> Option<Provider> {
        self.sync_epoch(epoch);
        self.entries.get(address).cloned()
    }

    pub fn insert(&mut self, epoch: u64, provider: Provider) {
        self.sync_epoch(epoch);
        self.entries.insert(provider.address, provider);
    }

    pub fn remove(&mut self, epoch: u64, address: &Address) {
        self.sync_epoch(epoch);
        self.entries.remove(address);
    }

    pub fn flush(&mut self) {
        self.entries.clear();
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    fn sync_epoch(&mut self, epoch: u64) {
        if epoch != self.epoch {
            tracing::debug!(from = self.epoch, to = epoch, "provider cache context switch, flushing");
            self.entries.clear();
            self.epoch = epoch;
        }
    }
}

/// Simple LRU cache implementation
struct LruCache<K, V> {
    map: HashMap<K, V>,
    order: VecDeque<K>,
    capacity: usize,
}

impl<K: Clone + std::hash::Hash + Eq, V> LruCache<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if self.map.contains_key(key) {
            self.order.retain(|k| k != key);
            self.order.push_front(key.clone());
            self.map.get(key)
        } else {
            None
        }
    }

    fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if self.map.len() >= self.capacity && !self.map.contains_key(&key) {
            if let Some(old_key) = self.order.pop_back() {
                self.map.remove(&old_key);
            }
        }

        self.order.retain(|k| k != &key);
        self.order.push_front(key.clone());
        self.map.insert(key, value);
    }

    fn remove(&mut self, key: &K) {
        if self.map.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provider_crypto::{KeyPair, KeyScheme};

    fn provider(seed: u8) -> Provider {
        let kp = KeyPair::from_seed(KeyScheme::Ed25519, [seed; 32]).unwrap();
        Provider::new(kp.public_key().clone(), vec!["0001".into()], vec![], 0)
    }

    #[test]
    fn test_lru_cache() {
        let mut cache = LruCache::new(2);

        cache.insert(1, "a");
        cache.insert(2, "b");
        assert_eq!(cache.get(&1), Some(&"a"));

        cache.insert(3, "c"); // evicts 2
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&3), Some(&"c"));
    }

    #[test]
    fn test_same_epoch_hit() {
        let mut cache = ProviderCache::new(8);
        let p = provider(1);
        cache.insert(1, p.clone());
        assert_eq!(cache.get(1, &p.address), Some(p));
    }

    #[test]
    fn test_epoch_change_flushes() {
        let mut cache = ProviderCache::new(8);
        let p = provider(1);
        cache.insert(1, p.clone());

        assert_eq!(cache.get(2, &p.address), None);
        assert_eq!(cache.epoch(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_and_zero_capacity() {
        let mut cache = ProviderCache::new(4);
        let p = provider(2);
        cache.insert(0, p.clone());
        cache.remove(0, &p.address);
        assert_eq!(cache.get(0, &p.address), None);

        let mut disabled = ProviderCache::new(0);
        disabled.insert(0, p.clone());
        assert_eq!(disabled.len(), 0);
    }
}
