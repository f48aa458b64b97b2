//! A minimal TTL cache backing the geo provider's geocode/route results.
//!
//! No off-the-shelf caching crate is pulled in for this; it's a
//! `parking_lot` mutex guarding a plain map, the same primitive
//! `CircuitBreaker` (`services/geocoding.rs`) uses for its failure clock.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, (V, Instant)>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns `Some(value)` on a live hit, expiring (and dropping) the
    /// entry in place if its TTL has elapsed.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((value, inserted_at)) if inserted_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: K, value: V) {
        self.entries.lock().insert(key, (value, Instant::now()));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_put_then_hit_returns_equivalent_value() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(&"a".to_string()), None);
        cache.put("a".to_string(), 42);
        assert_eq!(cache.get(&"a".to_string()), Some(42));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_millis(20));
        cache.put("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn is_empty_reports_entry_count() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        assert!(cache.is_empty());
        cache.put("a", 1);
        assert!(!cache.is_empty());
        assert_eq!(cache.len(), 1);
    }
}
