//! Metrics collection for rate acquisition.

use std::sync::atomic::{AtomicU64, Ordering};

/// FX engine metrics.
pub struct Metrics {
    /// Total `get_rates` calls.
    pub rate_requests_total: AtomicU64,
    /// Requests answered from a fresh cache entry.
    pub cache_hits: AtomicU64,
    /// Requests that joined a fetch already in flight.
    pub coalesced_waits: AtomicU64,
    /// Fetch sequences started (retry chain counted once).
    pub fetches_started: AtomicU64,
    /// Individual remote attempts.
    pub remote_attempts: AtomicU64,
    /// Remote attempts that failed.
    pub remote_failures: AtomicU64,
    /// Fetch sequences that ended in synthetic rates.
    pub synthetic_fallbacks: AtomicU64,
    /// Explicit cache invalidations.
    pub invalidations: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            rate_requests_total: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            coalesced_waits: AtomicU64::new(0),
            fetches_started: AtomicU64::new(0),
            remote_attempts: AtomicU64::new(0),
            remote_failures: AtomicU64::new(0),
            synthetic_fallbacks: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn rate_requested(&self) {
        self.rate_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn coalesced_wait(&self) {
        self.coalesced_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_started(&self) {
        self.fetches_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one remote attempt.
    pub fn remote_attempt(&self, success: bool) {
        self.remote_attempts.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.remote_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn synthetic_fallback(&self) {
        self.synthetic_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn invalidated(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rate_requests_total: self.rate_requests_total.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            coalesced_waits: self.coalesced_waits.load(Ordering::Relaxed),
            fetches_started: self.fetches_started.load(Ordering::Relaxed),
            remote_attempts: self.remote_attempts.load(Ordering::Relaxed),
            remote_failures: self.remote_failures.load(Ordering::Relaxed),
            synthetic_fallbacks: self.synthetic_fallbacks.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP remitfx_rate_requests_total Total rate requests
# TYPE remitfx_rate_requests_total counter
remitfx_rate_requests_total {}

# HELP remitfx_cache_hits Rate requests served from cache
# TYPE remitfx_cache_hits counter
remitfx_cache_hits {}

# HELP remitfx_coalesced_waits Rate requests that joined an in-flight fetch
# TYPE remitfx_coalesced_waits counter
remitfx_coalesced_waits {}

# HELP remitfx_fetches_started Fetch sequences started
# TYPE remitfx_fetches_started counter
remitfx_fetches_started {}

# HELP remitfx_remote_attempts Remote rate requests sent
# TYPE remitfx_remote_attempts counter
remitfx_remote_attempts {}

# HELP remitfx_remote_failures Remote rate requests that failed
# TYPE remitfx_remote_failures counter
remitfx_remote_failures {}

# HELP remitfx_synthetic_fallbacks Fetch sequences answered with synthetic rates
# TYPE remitfx_synthetic_fallbacks counter
remitfx_synthetic_fallbacks {}

# HELP remitfx_invalidations Explicit cache invalidations
# TYPE remitfx_invalidations counter
remitfx_invalidations {}
"#,
            snapshot.rate_requests_total,
            snapshot.cache_hits,
            snapshot.coalesced_waits,
            snapshot.fetches_started,
            snapshot.remote_attempts,
            snapshot.remote_failures,
            snapshot.synthetic_fallbacks,
            snapshot.invalidations,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rate_requests_total: u64,
    pub cache_hits: u64,
    pub coalesced_waits: u64,
    pub fetches_started: u64,
    pub remote_attempts: u64,
    pub remote_failures: u64,
    pub synthetic_fallbacks: u64,
    pub invalidations: u64,
}
