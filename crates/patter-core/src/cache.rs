//! Concurrent TTL cache with an injected time source.
//!
//! Both the provider resolver and the domain-id resolver cache lookups for a
//! short window. The clock is a trait so tests can expire entries without
//! sleeping.

use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic expiry in tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(now.timestamp_millis())),
        }
    }

    /// Move the clock forward by `secs` seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.now_ms.fetch_add(secs * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Concurrent map whose entries expire a fixed interval after insertion.
///
/// Expired entries are pruned lazily on read. Concurrent re-population after
/// a miss is harmless: inserts are atomic and later writers simply refresh
/// the expiry.
pub struct TtlCache<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        let secs = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        Self {
            entries: DashMap::new(),
            ttl: Duration::seconds(secs),
            clock,
        }
    }

    /// Fetch a live entry, pruning it if its TTL has lapsed.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Some(entry.value.clone());
            }
        }
        // The read guard is dropped above; removal here cannot deadlock.
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    /// Insert or refresh an entry with a full TTL.
    pub fn insert(&self, key: K, value: V) {
        let expires_at = self.clock.now() + self.ttl;
        self.entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Drop an entry regardless of expiry.
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Number of entries currently held, expired or not.
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

    fn manual() -> (Arc<ManualClock>, Arc<dyn Clock>) {
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let as_dyn: Arc<dyn Clock> = clock.clone();
        (clock, as_dyn)
    }

    #[test]
    fn hit_within_ttl() {
        let (_, clock) = manual();
        let cache: TtlCache<String, i64> = TtlCache::new(60, clock);
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let (manual, clock) = manual();
        let cache: TtlCache<String, i64> = TtlCache::new(60, clock);
        cache.insert("a".to_string(), 1);
        manual.advance_secs(61);
        assert_eq!(cache.get(&"a".to_string()), None);
        // Pruned on read, not just hidden.
        assert!(cache.is_empty());
    }

    #[test]
    fn entry_at_exact_boundary_is_expired() {
        let (manual, clock) = manual();
        let cache: TtlCache<String, i64> = TtlCache::new(60, clock);
        cache.insert("a".to_string(), 1);
        manual.advance_secs(60);
        assert_eq!(cache.get(&"a".to_string()), None);
    }

    #[test]
    fn reinsert_refreshes_expiry() {
        let (manual, clock) = manual();
        let cache: TtlCache<String, i64> = TtlCache::new(60, clock);
        cache.insert("a".to_string(), 1);
        manual.advance_secs(40);
        cache.insert("a".to_string(), 2);
        manual.advance_secs(40);
        assert_eq!(cache.get(&"a".to_string()), Some(2));
    }

    #[test]
    fn invalidate_removes_live_entry() {
        let (_, clock) = manual();
        let cache: TtlCache<String, i64> = TtlCache::new(60, clock);
        cache.insert("a".to_string(), 1);
        cache.invalidate(&"a".to_string());
        assert_eq!(cache.get(&"a".to_string()), None);
    }

    #[test]
    fn negative_results_are_cacheable() {
        let (_, clock) = manual();
        let cache: TtlCache<String, Option<i64>> = TtlCache::new(60, clock);
        cache.insert("missing".to_string(), None);
        // A cached None is a hit, distinct from an uncached miss.
        assert_eq!(cache.get(&"missing".to_string()), Some(None));
        assert_eq!(cache.get(&"never-seen".to_string()), None);
    }
}
