//! Replays trace entries through a RecencyCache and builds a report

use std::fmt;

use pagecache::{CacheStats, RecencyCache, Result};
use serde::Serialize;
use tracing::debug;

use crate::trace::TraceEntry;

/// Recency order right after one access
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Accessed key
    pub key: String,
    /// Key evicted by this access, if any
    pub evicted: Option<String>,
    /// Keys most recently used first
    pub order: Vec<String>,
}

/// Counters copied out of `CacheStats`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub hit_ratio: f64,
}

impl From<&CacheStats> for StatsReport {
    fn from(stats: &CacheStats) -> Self {
        Self {
            hits: stats.hits(),
            misses: stats.misses(),
            inserts: stats.inserts(),
            evictions: stats.evictions(),
            hit_ratio: stats.hit_ratio(),
        }
    }
}

/// Outcome of replaying a whole trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub capacity: usize,
    pub accesses: usize,
    pub entries: usize,
    /// Final keys, most recently used first
    pub order: Vec<String>,
    /// Evicted keys in eviction order
    pub evicted: Vec<String>,
    pub stats: StatsReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
}

fn snapshot(cache: &RecencyCache<String, String>) -> Vec<String> {
    cache.snapshot_order().cloned().collect()
}

/// Feed every entry to a fresh cache of `capacity`
///
/// # Errors
/// * `pagecache::Error::InvalidCapacity` - `capacity` is zero
pub fn replay<I>(entries: I, capacity: usize, record_steps: bool) -> Result<Report>
where
    I: IntoIterator<Item = TraceEntry>,
{
    let mut cache = RecencyCache::new(capacity)?;
    let mut evicted = Vec::new();
    let mut steps = Vec::new();
    let mut accesses = 0;

    for entry in entries {
        accesses += 1;
        let key = entry.key.clone();
        let dropped = cache.access(entry.key, entry.contents).map(|(k, _)| k);

        if let Some(k) = &dropped {
            debug!(evicted = %k, accessed = %key, "page evicted");
            evicted.push(k.clone());
        }
        if record_steps {
            steps.push(Step {
                key,
                evicted: dropped,
                order: snapshot(&cache),
            });
        }
    }

    Ok(Report {
        capacity,
        accesses,
        entries: cache.len(),
        order: snapshot(&cache),
        evicted,
        stats: StatsReport::from(cache.stats()),
        steps,
    })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{} -> [{}]", step.key, step.order.join(", "))?;
            if let Some(k) = &step.evicted {
                write!(f, " (evicted {})", k)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "order: [{}]", self.order.join(", "))?;
        writeln!(f, "entries: {}/{}", self.entries, self.capacity)?;
        writeln!(f, "accesses: {}", self.accesses)?;
        writeln!(f, "evicted: [{}]", self.evicted.join(", "))?;
        writeln!(
            f,
            "hits: {} misses: {} evictions: {} hit_ratio: {:.2}",
            self.stats.hits, self.stats.misses, self.stats.evictions, self.stats.hit_ratio
        )
    }
}
