//! Locale registry metrics.
//!
//! Counts how the registry's locale snapshot is served: from cache, from the
//! backing store, or not at all because the store failed.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters owned by one `LocaleRegistry`.
#[derive(Debug, Default)]
pub struct RegistryMetrics {
    /// Number of snapshot loads served from the cache store
    cache_hits: AtomicUsize,

    /// Number of snapshot loads that missed the cache store
    cache_misses: AtomicUsize,

    /// Number of fetches from the backing locale source
    fetches: AtomicUsize,

    /// Number of fetches that failed
    fetch_failures: AtomicUsize,

    /// Number of times the snapshot was invalidated
    invalidations: AtomicUsize,
}

impl RegistryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot served from cache.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a snapshot load that missed the cache.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fetch from the backing locale source.
    pub fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed fetch.
    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a snapshot invalidation.
    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    pub fn fetch_failures(&self) -> usize {
        self.fetch_failures.load(Ordering::Relaxed)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_cache_queries = hits + misses;
        let cache_hit_rate = if total_cache_queries > 0 {
            (hits as f64 / total_cache_queries as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            fetches: self.fetches(),
            fetch_failures: self.fetch_failures(),
            invalidations: self.invalidations(),
        }
    }
}

/// Snapshot of registry statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Number of cache hits
    pub cache_hits: usize,

    /// Number of cache misses
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    /// Number of backing-store fetches
    pub fetches: usize,

    /// Number of failed backing-store fetches
    pub fetch_failures: usize,

    /// Number of snapshot invalidations
    pub invalidations: usize,
}
