//! Process-local TTL store.
//!
//! Entries carry their own time-to-live and are evicted lazily: an expired
//! entry is removed by the `get` that notices it. Nothing here persists; a
//! restart starts from an empty map.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use metrics::counter;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_HIT: &str = "quickcart_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "quickcart_cache_miss_total";
pub(crate) const METRIC_CACHE_INVALIDATE: &str = "quickcart_cache_invalidate_total";

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) <= self.ttl
    }
}

/// String-keyed map of values with per-entry TTL.
pub struct CacheStore<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for CacheStore<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> CacheStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Look up `key` as of `now`, removing the entry if it has expired.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        {
            let entries = rw_read(&self.entries, SOURCE, "get");
            match entries.get(key) {
                Some(entry) if entry.is_fresh_at(now) => {
                    counter!(METRIC_CACHE_HIT, "key" => key.to_string()).increment(1);
                    return Some(entry.data.clone());
                }
                Some(_) => {}
                None => {
                    counter!(METRIC_CACHE_MISS, "key" => key.to_string()).increment(1);
                    return None;
                }
            }
        }

        // A concurrent `set` may have refreshed the entry between the locks.
        let mut entries = rw_write(&self.entries, SOURCE, "get.evict");
        if entries
            .get(key)
            .is_some_and(|entry| !entry.is_fresh_at(now))
        {
            entries.remove(key);
        }
        counter!(METRIC_CACHE_MISS, "key" => key.to_string()).increment(1);
        None
    }

    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        self.set_at(key, value, ttl, Instant::now());
    }

    /// Store `value` under `key`, replacing any entry and starting a new TTL window at `now`.
    pub fn set_at(&self, key: &str, value: V, ttl: Duration, now: Instant) {
        rw_write(&self.entries, SOURCE, "set").insert(
            key.to_string(),
            CacheEntry {
                data: value,
                stored_at: now,
                ttl,
            },
        );
    }

    /// Remove one entry. Returns whether anything was removed.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = rw_write(&self.entries, SOURCE, "invalidate")
            .remove(key)
            .is_some();
        if removed {
            counter!(METRIC_CACHE_INVALIDATE, "key" => key.to_string()).increment(1);
        }
        removed
    }

    /// Remove every entry whose key contains `pattern`. Returns the number removed.
    pub fn invalidate_pattern(&self, pattern: &str) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate_pattern");
        let before = entries.len();
        entries.retain(|key, _| !key.contains(pattern));
        let removed = before - entries.len();
        drop(entries);

        if removed > 0 {
            counter!(METRIC_CACHE_INVALIDATE, "key" => format!("*{pattern}*"))
                .increment(removed as u64);
        }
        removed
    }

    /// Drop every entry. Returns the number removed.
    pub fn clear(&self) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "clear");
        let removed = entries.len();
        entries.clear();
        removed
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = rw_read(&self.entries, SOURCE, "keys")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    use super::*;

    const TTL: Duration = Duration::from_secs(120);

    #[test]
    fn get_returns_value_within_ttl() {
        let store = CacheStore::new();
        let now = Instant::now();
        store.set_at("products:all", vec![1, 2, 3], TTL, now);

        assert_eq!(store.get_at("products:all", now), Some(vec![1, 2, 3]));
        assert_eq!(store.get_at("products:all", now + TTL), Some(vec![1, 2, 3]));
    }

    #[test]
    fn expired_entry_is_removed_on_read() {
        let store = CacheStore::new();
        let now = Instant::now();
        store.set_at("banners:all", "hero".to_string(), TTL, now);

        let later = now + TTL + Duration::from_millis(1);
        assert_eq!(store.get_at("banners:all", later), None);
        assert!(store.is_empty());
    }

    #[test]
    fn set_overwrites_and_restarts_window() {
        let store = CacheStore::new();
        let now = Instant::now();
        store.set_at("categories:all", 1, TTL, now);
        store.set_at("categories:all", 2, TTL, now + TTL);

        let probe = now + TTL + Duration::from_secs(1);
        assert_eq!(store.get_at("categories:all", probe), Some(2));
    }

    #[test]
    fn invalidate_is_noop_when_absent() {
        let store: CacheStore<u8> = CacheStore::new();
        assert!(!store.invalidate("categories:all"));

        store.set("categories:all", 7, TTL);
        assert!(store.invalidate("categories:all"));
        assert_eq!(store.get("categories:all"), None);
    }

    #[test]
    fn pattern_invalidation_removes_exactly_matching_keys() {
        let store = CacheStore::new();
        for key in [
            "products:all",
            "products:featured",
            "categories:all",
            "banners:all",
            "stale-products:x",
        ] {
            store.set(key, key.len(), TTL);
        }

        let removed = store.invalidate_pattern("products:");

        assert_eq!(removed, 3);
        assert_eq!(store.keys(), vec!["banners:all", "categories:all"]);
    }

    #[test]
    fn clear_reports_evicted_count() {
        let store = CacheStore::new();
        store.set("a", 1, TTL);
        store.set("b", 2, TTL);

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let store = CacheStore::new();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store
                .entries
                .write()
                .expect("entries lock should be acquired");
            panic!("poison cache entries lock");
        }));

        store.set("products:all", 1, TTL);
        assert_eq!(store.get("products:all"), Some(1));
    }

    #[test]
    fn hits_and_misses_are_counted() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            let store = CacheStore::new();
            assert_eq!(store.get("categories:all"), None);
            store.set("categories:all", 1, TTL);
            assert_eq!(store.get("categories:all"), Some(1));
            assert_eq!(store.get("categories:all"), Some(1));
        });

        let counters: Vec<(String, u64)> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter_map(|(key, _, _, value)| match value {
                DebugValue::Counter(count) => Some((key.key().name().to_string(), count)),
                _ => None,
            })
            .collect();

        assert!(counters.contains(&(METRIC_CACHE_HIT.to_string(), 2)));
        assert!(counters.contains(&(METRIC_CACHE_MISS.to_string(), 1)));
    }
}
