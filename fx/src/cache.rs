//! Single-slot rate cache with a freshness window.

use std::sync::Arc;

use chrono::Duration;
use remitfx_common::time::{self, Timestamp};
use remitfx_common::RateSnapshot;
use tracing::debug;

/// Cached snapshot entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Arc<RateSnapshot>,
    fetched_at: Timestamp,
}

impl CacheEntry {
    fn new(snapshot: Arc<RateSnapshot>) -> Self {
        Self {
            snapshot,
            fetched_at: time::now(),
        }
    }

    fn is_valid(&self, ttl: Duration) -> bool {
        time::is_within(self.fetched_at, ttl)
    }
}

/// Holds the current rate snapshot.
///
/// Staleness is measured from install time, not from the snapshot's own
/// capture time. Not synchronized; the owner guards it.
#[derive(Debug)]
pub struct RateCache {
    entry: Option<CacheEntry>,
    ttl: Duration,
}

impl RateCache {
    /// Create an empty cache with the given freshness window.
    pub fn new(ttl: Duration) -> Self {
        Self { entry: None, ttl }
    }

    /// Get the snapshot if still fresh.
    pub fn get(&self) -> Option<Arc<RateSnapshot>> {
        match &self.entry {
            Some(entry) if entry.is_valid(self.ttl) => {
                debug!("Cache hit");
                Some(Arc::clone(&entry.snapshot))
            }
            Some(_) => {
                debug!("Cache entry expired");
                None
            }
            None => {
                debug!("Cache miss");
                None
            }
        }
    }

    /// Install a snapshot, stamped with the current time.
    pub fn insert(&mut self, snapshot: Arc<RateSnapshot>) {
        self.entry = Some(CacheEntry::new(snapshot));
    }

    /// When the current entry was installed, fresh or not.
    pub fn fetched_at(&self) -> Option<Timestamp> {
        self.entry.as_ref().map(|e| e.fetched_at)
    }

    /// Whether a fresh entry is present.
    pub fn is_valid(&self) -> bool {
        self.entry
            .as_ref()
            .map(|e| e.is_valid(self.ttl))
            .unwrap_or(false)
    }

    /// Drop the current entry.
    pub fn clear(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remitfx_common::RateOrigin;
    use rust_decimal_macros::dec;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    fn make_snapshot() -> Arc<RateSnapshot> {
        Arc::new(RateSnapshot::new(dec!(0.79), dec!(18.45), RateOrigin::Remote))
    }

    #[test]
    fn test_cache_insert_and_get() {
        let mut cache = RateCache::new(Duration::minutes(5));
        let snapshot = make_snapshot();

        cache.insert(snapshot.clone());

        let cached = cache.get().unwrap();
        assert!(Arc::ptr_eq(&cached, &snapshot));
        assert!(cache.is_valid());
    }

    #[test]
    fn test_cache_miss() {
        let cache = RateCache::new(Duration::minutes(5));

        assert!(cache.get().is_none());
        assert!(cache.fetched_at().is_none());
        assert!(!cache.is_valid());
    }

    #[test]
    fn test_cache_expiry() {
        let mut cache = RateCache::new(Duration::milliseconds(50));
        cache.insert(make_snapshot());

        // Should be valid immediately
        assert!(cache.get().is_some());

        // Wait for expiry
        sleep(StdDuration::from_millis(60));

        // Stale as a whole, but the install time is still known
        assert!(cache.get().is_none());
        assert!(cache.fetched_at().is_some());
    }

    #[test]
    fn test_staleness_ignores_capture_time() {
        let mut cache = RateCache::new(Duration::minutes(5));
        let mut old = RateSnapshot::new(dec!(0.79), dec!(18.45), RateOrigin::Remote);
        old.captured_at = time::now() - Duration::hours(1);

        cache.insert(Arc::new(old));

        assert!(cache.get().is_some());
    }

    #[test]
    fn test_cache_clear() {
        let mut cache = RateCache::new(Duration::minutes(5));
        cache.insert(make_snapshot());

        cache.clear();

        assert!(cache.get().is_none());
        assert!(cache.fetched_at().is_none());
    }
}
