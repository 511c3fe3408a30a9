//! Bounded TTL cache for geolocation lookups
//!
//! Shared across all in-flight requests. Races are tolerated: the worst
//! case is a duplicate provider call or a slightly-stale record.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::geo::models::GeoRecord;

struct GeoCacheEntry {
    record: GeoRecord,
    fetched_at: Instant,
}

/// In-memory cache keyed by client IP string.
///
/// Entries are considered stale once older than the TTL. Stale entries are
/// not returned but linger until overwritten or evicted; when an insert
/// pushes the map past `max_entries`, the oldest half by fetch time is
/// dropped in one bulk pass rather than tracking strict LRU order.
pub struct GeoCache {
    entries: DashMap<String, GeoCacheEntry>,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl GeoCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self::with_clock(ttl, max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
            clock,
        }
    }

    /// Return the cached record for `ip` if present and not stale.
    pub fn get(&self, ip: &str) -> Option<GeoRecord> {
        let entry = self.entries.get(ip)?;
        if self.clock.now().duration_since(entry.fetched_at) < self.ttl {
            Some(entry.record.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, ip: String, record: GeoRecord) {
        self.entries.insert(
            ip,
            GeoCacheEntry {
                record,
                fetched_at: self.clock.now(),
            },
        );
        self.evict_if_over_bound();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_if_over_bound(&self) {
        if self.entries.len() <= self.max_entries {
            return;
        }

        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().fetched_at))
            .collect();
        by_age.sort_by_key(|(_, fetched_at)| *fetched_at);

        // Entries this old are very likely stale anyway.
        let to_drop = by_age.len() / 2;
        for (ip, _) in by_age.into_iter().take(to_drop) {
            self.entries.remove(&ip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test::ManualClock;

    fn record(ip: &str) -> GeoRecord {
        GeoRecord::unknown(ip)
    }

    #[test]
    fn test_fresh_entry_is_returned() {
        let cache = GeoCache::new(Duration::from_secs(300), 1000);
        cache.insert("1.1.1.1".to_string(), record("1.1.1.1"));
        assert_eq!(cache.get("1.1.1.1"), Some(record("1.1.1.1")));
    }

    #[test]
    fn test_entry_goes_stale_after_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = GeoCache::with_clock(Duration::from_secs(300), 1000, clock.clone());

        cache.insert("1.1.1.1".to_string(), record("1.1.1.1"));
        clock.advance(Duration::from_secs(299));
        assert!(cache.get("1.1.1.1").is_some());

        clock.advance(Duration::from_secs(2));
        assert!(cache.get("1.1.1.1").is_none());
    }

    #[test]
    fn test_insert_refreshes_staleness() {
        let clock = Arc::new(ManualClock::new());
        let cache = GeoCache::with_clock(Duration::from_secs(300), 1000, clock.clone());

        cache.insert("1.1.1.1".to_string(), record("1.1.1.1"));
        clock.advance(Duration::from_secs(301));
        cache.insert("1.1.1.1".to_string(), record("1.1.1.1"));
        assert!(cache.get("1.1.1.1").is_some());
    }

    #[test]
    fn test_eviction_drops_oldest_half() {
        let clock = Arc::new(ManualClock::new());
        let cache = GeoCache::with_clock(Duration::from_secs(3600), 4, clock.clone());

        for i in 0..5 {
            cache.insert(format!("10.0.0.{i}"), record(&format!("10.0.0.{i}")));
            clock.advance(Duration::from_secs(1));
        }

        // 5 entries exceeded the bound of 4, so the oldest 2 were evicted.
        assert_eq!(cache.len(), 3);
        assert!(cache.get("10.0.0.0").is_none());
        assert!(cache.get("10.0.0.1").is_none());
        assert!(cache.get("10.0.0.2").is_some());
        assert!(cache.get("10.0.0.3").is_some());
        assert!(cache.get("10.0.0.4").is_some());
    }

    #[test]
    fn test_no_eviction_at_bound() {
        let cache = GeoCache::new(Duration::from_secs(300), 3);
        for i in 0..3 {
            cache.insert(format!("10.0.0.{i}"), record(&format!("10.0.0.{i}")));
        }
        assert_eq!(cache.len(), 3);
    }
}
