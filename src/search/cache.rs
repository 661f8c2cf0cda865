//! Process-local TTL cache for search responses.
//!
//! Bounded map with TTL-check-on-read and oldest-first eviction on
//! insert-when-full. Not distributed: entries are never assumed consistent
//! across server instances.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::api::SearchResponse;
use crate::config::CacheConfig;

/// Short hex digest of a canonical key, as used for cache keys and logs.
pub fn digest_key(input: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

struct CacheEntry {
    value: SearchResponse,
    inserted_at: Instant,
}

/// Time-bounded, size-bounded in-memory cache keyed by canonicalized query
/// parameters.
pub struct ResultCache {
    ttl: Duration,
    capacity: usize,
    entries: HashMap<String, CacheEntry>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            ttl: Duration::from_millis(config.ttl_ms),
            capacity: config.capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl.as_millis() as u64
    }

    /// Fetch a live entry; expired entries are dropped on read. Absolute
    /// TTL, no sliding refresh.
    pub fn get(&mut self, key: &str) -> Option<SearchResponse> {
        match self.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => Some(entry.value.clone()),
            Some(_) => {
                self.entries.remove(key);
                self.order.retain(|k| k != key);
                None
            }
            None => None,
        }
    }

    /// Insert, evicting oldest entries first when at capacity.
    pub fn insert(&mut self, key: String, value: SearchResponse) {
        if self.entries.contains_key(&key) {
            self.order.retain(|k| *k != key);
        }
        while self.entries.len() >= self.capacity && !self.order.is_empty() {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(
            key.clone(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
        self.order.push_back(key);
    }

    /// Operational invalidation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(total: usize) -> SearchResponse {
        SearchResponse {
            results: Vec::new(),
            total,
            took_ms: 0,
            cache_hit: false,
        }
    }

    fn cache(ttl_ms: u64, capacity: usize) -> ResultCache {
        ResultCache::new(CacheConfig { ttl_ms, capacity })
    }

    #[test]
    fn hit_within_ttl_miss_after() {
        let mut c = cache(30, 8);
        c.insert("k".into(), response(3));
        assert!(c.get("k").is_some());

        std::thread::sleep(Duration::from_millis(60));
        assert!(c.get("k").is_none(), "expired entry must not be visible");
        assert!(c.is_empty(), "expired entry is dropped on read");
    }

    #[test]
    fn oldest_entry_is_evicted_when_full() {
        let mut c = cache(60_000, 2);
        c.insert("a".into(), response(1));
        c.insert("b".into(), response(2));
        c.insert("c".into(), response(3));
        assert!(c.get("a").is_none(), "oldest must be evicted");
        assert!(c.get("b").is_some());
        assert!(c.get("c").is_some());
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn reinsert_refreshes_position_and_value() {
        let mut c = cache(60_000, 2);
        c.insert("a".into(), response(1));
        c.insert("b".into(), response(2));
        c.insert("a".into(), response(10)); // refresh
        c.insert("c".into(), response(3)); // evicts b, not a
        assert_eq!(c.get("a").map(|r| r.total), Some(10));
        assert!(c.get("b").is_none());
    }

    #[test]
    fn clear_empties_everything() {
        let mut c = cache(60_000, 4);
        c.insert("a".into(), response(1));
        c.clear();
        assert!(c.is_empty());
        assert!(c.get("a").is_none());
    }

    #[test]
    fn digest_is_stable_and_short() {
        assert_eq!(digest_key("abc"), digest_key("abc"));
        assert_ne!(digest_key("abc"), digest_key("abd"));
        assert_eq!(digest_key("abc").len(), 16);
    }
}
