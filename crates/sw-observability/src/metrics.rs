//! Counters for strategy outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Outcome counters shared by every request handler.
#[derive(Debug, Default)]
pub struct StrategyMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    fallbacks: AtomicU64,
    failures: AtomicU64,
    revalidations: AtomicU64,
    revalidation_failures: AtomicU64,
    cache_write_failures: AtomicU64,
}

impl StrategyMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A response was served from a cache store.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A response was served from the network.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// The offline fallback page was served.
    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// A request failed with nothing to serve.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A background revalidation finished, successfully or not.
    pub fn record_revalidation(&self, ok: bool) {
        self.revalidations.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.revalidation_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Writing a response into a store failed.
    pub fn record_cache_write_failure(&self) {
        self.cache_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            revalidations: self.revalidations.load(Ordering::Relaxed),
            revalidation_failures: self.revalidation_failures.load(Ordering::Relaxed),
            cache_write_failures: self.cache_write_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable copy of [`StrategyMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub fallbacks: u64,
    pub failures: u64,
    pub revalidations: u64,
    pub revalidation_failures: u64,
    pub cache_write_failures: u64,
}

impl MetricsSnapshot {
    /// Total requests answered (hits, misses, fallbacks and failures).
    pub fn total(&self) -> u64 {
        self.hits + self.misses + self.fallbacks + self.failures
    }

    /// Fraction of answered requests served from cache.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = StrategyMetrics::new();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_failure();
        metrics.record_revalidation(true);
        metrics.record_revalidation(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.hits, 2);
        assert_eq!(snapshot.total(), 4);
        assert_eq!(snapshot.revalidations, 2);
        assert_eq!(snapshot.revalidation_failures, 1);
        assert!((snapshot.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_hit_ratio() {
        assert_eq!(MetricsSnapshot::default().hit_ratio(), 0.0);
    }
}
