//! Jar Statistics Module
//!
//! Tracks per-jar cache effectiveness and write-through outcomes.

use serde::Serialize;

// == Jar Stats ==
/// Per-jar counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JarStats {
    /// Lookups answered from the decode cache
    pub cache_hits: u64,
    /// Lookups that had to scan the packed string
    pub cache_misses: u64,
    /// Entries removed from the packed string (expired or unset)
    pub evictions: u64,
    /// `set` calls undone because the store truncated the write
    pub rollbacks: u64,
}

impl JarStats {
    // == Constructor ==
    /// Creates a new JarStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the cache hit counter.
    pub(crate) fn record_hit(&mut self) {
        self.cache_hits += 1;
    }

    // == Record Miss ==
    /// Increments the cache miss counter.
    pub(crate) fn record_miss(&mut self) {
        self.cache_misses += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Record Rollback ==
    /// Increments the rollback counter.
    pub(crate) fn record_rollback(&mut self) {
        self.rollbacks += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = JarStats::new();
        assert_eq!(stats.cache_hits, 0);
        assert_eq!(stats.cache_misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.rollbacks, 0);
    }

    #[test]
    fn test_hit_rate_no_lookups() {
        assert_eq!(JarStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = JarStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_eviction_and_rollback() {
        let mut stats = JarStats::new();
        stats.record_eviction();
        stats.record_eviction();
        stats.record_rollback();
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.rollbacks, 1);
    }

    #[test]
    fn test_stats_serialize() {
        let mut stats = JarStats::new();
        stats.record_hit();
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"cache_hits\":1"));
        assert!(json.contains("rollbacks"));
    }
}
