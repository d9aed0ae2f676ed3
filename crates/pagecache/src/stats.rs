//! Cache statistics tracking

/// Counters for cache activity since construction or the last `clear`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    hits: u64,
    misses: u64,
    inserts: u64,
    evictions: u64,
    removals: u64,
}

impl CacheStats {
    /// Create a zeroed stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_insert(&mut self) {
        self.inserts += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub(crate) fn record_removal(&mut self) {
        self.removals += 1;
    }

    /// Lookups that found their key
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that did not find their key
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// New keys linked into the cache
    pub fn inserts(&self) -> u64 {
        self.inserts
    }

    /// Entries dropped because capacity was exceeded
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Entries dropped by `remove` or `pop_oldest`
    pub fn removals(&self) -> u64 {
        self.removals
    }

    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
