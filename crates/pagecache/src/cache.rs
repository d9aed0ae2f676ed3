//! Recency cache: entry store plus order index
//!
//! The entry store maps each key to the arena slot of its node; the order
//! index links those nodes from most to least recently used. Every public
//! operation updates both before returning.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::order::{self, OrderIndex, Slot};
use crate::stats::CacheStats;

/// Count-bounded cache that evicts its least recently used entry
///
/// # Example
/// ```
/// use pagecache::RecencyCache;
///
/// let mut cache = RecencyCache::new(2)?;
/// cache.access("a.com", "AAA");
/// cache.access("b.com", "BBB");
/// let evicted = cache.access("c.com", "CCC");
///
/// assert_eq!(evicted, Some(("a.com", "AAA")));
/// assert_eq!(cache.snapshot_order().collect::<Vec<_>>(), [&"c.com", &"b.com"]);
/// # Ok::<(), pagecache::Error>(())
/// ```
pub struct RecencyCache<K, V> {
    /// Entry store: key -> slot in the order index
    entries: HashMap<K, Slot, RandomState>,

    /// Recency order, owns keys and values
    order: OrderIndex<K, V>,

    capacity: usize,

    stats: CacheStats,
}

impl<K, V> RecencyCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create an empty cache holding at most `capacity` entries
    ///
    /// # Errors
    /// * `Error::InvalidCapacity` - `capacity` is zero
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        debug!(capacity, "creating recency cache");

        Ok(Self {
            entries: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            order: OrderIndex::with_capacity(capacity),
            capacity,
            stats: CacheStats::new(),
        })
    }

    /// Record an access to `key`, storing `value` as its content
    ///
    /// A present key has its value overwritten and moves to the front. An
    /// absent key is inserted at the front, and if that pushes the cache over
    /// capacity the least recently used entry is evicted and returned.
    pub fn access(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&slot) = self.entries.get(&key) {
            self.stats.record_hit();
            if let Some(stored) = self.order.value_mut(slot) {
                *stored = value;
            }
            self.order.promote(slot);
            return None;
        }

        self.stats.record_miss();
        self.insert(key, value);

        // an insert grows the cache by one, so one eviction restores the bound
        if self.entries.len() > self.capacity {
            self.evict()
        } else {
            None
        }
    }

    /// Look up `key`, promoting it to most recently used on a hit
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.get(key).copied() {
            Some(slot) => {
                self.stats.record_hit();
                self.order.promote(slot);
                self.order.entry(slot).map(|(_, value)| value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Look up `key` without changing the recency order
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.entries.get(key)?;
        self.order.entry(slot).map(|(_, value)| value)
    }

    /// Promote `key` to most recently used without touching its value
    ///
    /// Returns `false` if the key is not cached.
    pub fn touch<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.get(key) {
            Some(&slot) => {
                self.order.promote(slot);
                true
            }
            None => false,
        }
    }

    /// Check whether `key` is cached, without promoting it
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Remove `key` and return its value; absent keys are a no-op
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.entries.remove(key)?;
        let (_, value) = self.order.remove(slot)?;
        self.stats.record_removal();
        trace!(len = self.entries.len(), "removed entry");
        Some(value)
    }

    /// Remove and return the least recently used entry
    pub fn pop_oldest(&mut self) -> Option<(K, V)> {
        let slot = self.order.oldest()?;
        let entry = self.detach(slot)?;
        self.stats.record_removal();
        trace!(len = self.entries.len(), "popped least recently used entry");
        Some(entry)
    }

    /// Most recently used entry
    pub fn newest(&self) -> Option<(&K, &V)> {
        self.order.entry(self.order.newest()?)
    }

    /// Least recently used entry, the next eviction candidate
    pub fn oldest(&self) -> Option<(&K, &V)> {
        self.order.entry(self.order.oldest()?)
    }

    /// Keys from most to least recently used
    ///
    /// Read-only. The iterator can be cloned to walk the same order again.
    pub fn snapshot_order(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Entries from most to least recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.order.iter(),
        }
    }

    /// Position of `key` in the recency order, 0 being most recent
    pub fn recency_rank<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.entries.get(key)?;
        self.order.rank(slot)
    }

    /// Get the number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Drop every entry and reset statistics; capacity is kept
    pub fn clear(&mut self) {
        debug!(len = self.entries.len(), "clearing recency cache");
        self.entries.clear();
        self.order.clear();
        self.stats.reset();
    }

    /// Verify that the entry store and the order index agree
    ///
    /// Walks the whole order in both directions, so this is O(n). Intended
    /// for tests and debugging.
    pub fn check_invariants(&self) -> Result<()> {
        self.order.check_links()?;

        if self.entries.len() != self.order.len() {
            return Err(Error::invariant(format!(
                "entry store has {} keys, order index has {}",
                self.entries.len(),
                self.order.len()
            )));
        }
        if self.entries.len() > self.capacity {
            return Err(Error::invariant(format!(
                "{} entries exceed capacity {}",
                self.entries.len(),
                self.capacity
            )));
        }
        for (key, &slot) in &self.entries {
            if self.order.key(slot) != Some(key) {
                return Err(Error::invariant(format!(
                    "entry store points at slot {:?} holding another key",
                    slot
                )));
            }
        }

        Ok(())
    }

    fn insert(&mut self, key: K, value: V) {
        let slot = self.order.push_newest(key.clone(), value);
        self.entries.insert(key, slot);
        self.stats.record_insert();
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let slot = self.order.oldest()?;
        let entry = self.detach(slot)?;
        self.stats.record_eviction();
        trace!(
            len = self.entries.len(),
            capacity = self.capacity,
            "evicted least recently used entry"
        );
        Some(entry)
    }

    fn detach(&mut self, slot: Slot) -> Option<(K, V)> {
        let (key, value) = self.order.remove(slot)?;
        self.entries.remove(&key);
        Some((key, value))
    }
}

impl<K, V> fmt::Debug for RecencyCache<K, V>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order: Vec<&K> = self.order.iter().map(|(key, _)| key).collect();
        f.debug_struct("RecencyCache")
            .field("capacity", &self.capacity)
            .field("order", &order)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<'a, K, V> IntoIterator for &'a RecencyCache<K, V>
where
    K: Hash + Eq + Clone,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over entries, most recently used first
pub struct Iter<'a, K, V> {
    inner: order::Iter<'a, K, V>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over keys, most recently used first
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}
