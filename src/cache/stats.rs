//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and expirations.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache performance counters.
///
/// Counters only grow until [`CacheStats::reset`]; `size` is filled in fresh
/// each time a snapshot is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted due to LRU policy
    pub evictions: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
    /// Current number of live entries
    pub size: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hits plus misses counted so far.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that hit, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    // == Reset ==
    /// Zeroes the four counters.
    pub fn reset(&mut self) {
        *self = Self {
            size: self.size,
            ..Self::default()
        };
    }

    // == Snapshot ==
    /// Copies the counters, stamping the given live size.
    pub fn snapshot(&self, size: usize) -> Self {
        Self { size, ..*self }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn counted(hits: u64, misses: u64) -> CacheStats {
        let mut stats = CacheStats::new();
        (0..hits).for_each(|_| stats.record_hit());
        (0..misses).for_each(|_| stats.record_miss());
        stats
    }

    #[test]
    fn test_hit_rate() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
        assert_eq!(counted(3, 1).hit_rate(), 0.75);
        assert_eq!(counted(0, 4).hit_rate(), 0.0);
        assert_eq!(counted(2, 0).lookups(), 2);
    }

    #[test]
    fn test_reset_zeroes_counters() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_eviction();
        stats.record_expiration();
        stats.reset();

        assert_eq!(stats, CacheStats::new());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut stats = CacheStats::new();
        stats.record_eviction();

        let snapshot = stats.snapshot(7);
        stats.record_eviction();

        assert_eq!(snapshot.evictions, 1);
        assert_eq!(snapshot.size, 7);
        assert_eq!(stats.evictions, 2);
    }

    #[test]
    fn test_stats_serialize() {
        let mut stats = CacheStats::new();
        stats.record_expiration();

        let json = serde_json::to_value(stats.snapshot(3)).unwrap();
        assert_eq!(json["expirations"], 1);
        assert_eq!(json["size"], 3);
    }
}
