//! Cache Statistics Module
//!
//! Tracks hits, misses, evictions and expiry-driven reclamation.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of Get calls that found a live entry
    pub hits: u64,
    /// Number of Get calls that returned absent
    pub misses: u64,
    /// Number of expired entries removed to enforce the capacity bound
    pub evictions: u64,
    /// Number of expired entries removed by Get while scanning
    pub expired_removed: u64,
    /// Number of expired entries removed by purge passes
    pub swept: u64,
    /// Number of purge passes run
    pub sweeps: u64,
    /// Entries linked in the store when the snapshot was taken
    pub entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Counters ==
/// Live counters shared by every engine operation.
///
/// Atomics let the read-locked Get path record hits and misses.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expired_removed: AtomicU64,
    swept: AtomicU64,
    sweeps: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expired_removed(&self, count: u64) {
        self.expired_removed.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_sweep(&self, removed: u64) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.swept.fetch_add(removed, Ordering::Relaxed);
    }

    /// Copies the counters into a snapshot carrying `entries`.
    pub(crate) fn snapshot(&self, entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expired_removed: self.expired_removed.load(Ordering::Relaxed),
            swept: self.swept.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            entries,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_starts_at_zero() {
        let counters = StatsCounters::default();
        assert_eq!(counters.snapshot(0), CacheStats::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let counters = StatsCounters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        assert_eq!(counters.snapshot(0).hit_rate(), 0.75);
    }

    #[test]
    fn test_record_sweep_counts_passes_and_removals() {
        let counters = StatsCounters::default();
        counters.record_sweep(3);
        counters.record_sweep(0);
        counters.record_eviction();
        counters.record_expired_removed(2);

        let stats = counters.snapshot(7);
        assert_eq!(stats.sweeps, 2);
        assert_eq!(stats.swept, 3);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.expired_removed, 2);
        assert_eq!(stats.entries, 7);
    }

    #[test]
    fn test_stats_serialize() {
        let counters = StatsCounters::default();
        counters.record_hit();

        let json = serde_json::to_value(counters.snapshot(1)).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["misses"], 0);
        assert_eq!(json["entries"], 1);
    }
}
