// Property tests: RecencyCache against a VecDeque reference model.
//
// The model keeps keys most-recent-first; a cache with correct links must
// agree with it after every operation.

use std::collections::VecDeque;

use pagecache::RecencyCache;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Access(u8, u32),
    Remove(u8),
    Get(u8),
    Touch(u8),
    PopOldest,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // small key space so hits, re-accesses and evictions all happen
    prop_oneof![
        6 => (0u8..16, any::<u32>()).prop_map(|(k, v)| Op::Access(k, v)),
        1 => (0u8..16).prop_map(Op::Remove),
        1 => (0u8..16).prop_map(Op::Get),
        1 => (0u8..16).prop_map(Op::Touch),
        1 => Just(Op::PopOldest),
    ]
}

struct Model {
    order: VecDeque<(u8, u32)>,
    capacity: usize,
}

impl Model {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            capacity,
        }
    }

    fn take(&mut self, key: u8) -> Option<(u8, u32)> {
        let pos = self.order.iter().position(|(k, _)| *k == key)?;
        self.order.remove(pos)
    }

    fn access(&mut self, key: u8, value: u32) -> Option<(u8, u32)> {
        let hit = self.take(key).is_some();
        self.order.push_front((key, value));
        if !hit && self.order.len() > self.capacity {
            self.order.pop_back()
        } else {
            None
        }
    }

    fn promote(&mut self, key: u8) -> Option<u32> {
        let entry = self.take(key)?;
        self.order.push_front(entry);
        Some(entry.1)
    }

    fn keys(&self) -> Vec<u8> {
        self.order.iter().map(|(k, _)| *k).collect()
    }
}

fn snapshot(cache: &RecencyCache<u8, u32>) -> Vec<u8> {
    cache.snapshot_order().copied().collect()
}

proptest! {
    /// Property: len() never exceeds capacity
    #[test]
    fn prop_len_within_capacity(
        capacity in 1usize..8,
        accesses in prop::collection::vec((0u8..32, any::<u32>()), 0..200)
    ) {
        let mut cache = RecencyCache::new(capacity).unwrap();

        for (key, value) in accesses {
            cache.access(key, value);
            prop_assert!(cache.len() <= capacity);
        }
    }

    /// Property: the most recently accessed key is always first
    #[test]
    fn prop_last_access_is_newest(
        capacity in 1usize..8,
        accesses in prop::collection::vec((0u8..32, any::<u32>()), 1..200)
    ) {
        let mut cache = RecencyCache::new(capacity).unwrap();

        for (key, value) in accesses {
            cache.access(key, value);
            prop_assert_eq!(cache.newest(), Some((&key, &value)));
            prop_assert_eq!(snapshot(&cache).first().copied(), Some(key));
        }
    }

    /// Property: an eviction removes exactly the last key of the prior snapshot
    #[test]
    fn prop_eviction_takes_oldest(
        capacity in 1usize..8,
        accesses in prop::collection::vec((0u8..32, any::<u32>()), 0..200)
    ) {
        let mut cache = RecencyCache::new(capacity).unwrap();

        for (key, value) in accesses {
            let before = snapshot(&cache);
            let evicted = cache.access(key, value);

            match evicted {
                Some((evicted_key, _)) => {
                    prop_assert_eq!(before.last().copied(), Some(evicted_key));
                    prop_assert_eq!(before.len(), capacity);
                    prop_assert!(!cache.contains(&evicted_key));
                }
                None => prop_assert!(before.len() < capacity || before.contains(&key)),
            }
        }
    }

    /// Property: re-accessing the current newest key leaves the order unchanged
    #[test]
    fn prop_reaccess_newest_is_idempotent(
        capacity in 1usize..8,
        accesses in prop::collection::vec((0u8..32, any::<u32>()), 1..100)
    ) {
        let mut cache = RecencyCache::new(capacity).unwrap();
        for (key, value) in accesses {
            cache.access(key, value);
        }

        let (&key, &value) = cache.newest().unwrap();
        let before = snapshot(&cache);
        prop_assert_eq!(cache.access(key, value), None);
        prop_assert_eq!(snapshot(&cache), before);
    }

    /// Property: every operation agrees with the reference model and keeps links consistent
    #[test]
    fn prop_matches_reference_model(
        capacity in 1usize..8,
        ops in prop::collection::vec(op_strategy(), 0..300)
    ) {
        let mut cache = RecencyCache::new(capacity).unwrap();
        let mut model = Model::new(capacity);

        for op in ops {
            match op {
                Op::Access(key, value) => {
                    prop_assert_eq!(cache.access(key, value), model.access(key, value));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(cache.remove(&key), model.take(key).map(|(_, v)| v));
                }
                Op::Get(key) => {
                    prop_assert_eq!(cache.get(&key).copied(), model.promote(key));
                }
                Op::Touch(key) => {
                    prop_assert_eq!(cache.touch(&key), model.promote(key).is_some());
                }
                Op::PopOldest => {
                    prop_assert_eq!(cache.pop_oldest(), model.order.pop_back());
                }
            }

            prop_assert_eq!(snapshot(&cache), model.keys());
            prop_assert!(cache.check_invariants().is_ok());
        }
    }
}

#[test]
fn test_snapshot_restartable_after_many_ops() {
    let mut cache = RecencyCache::new(3).unwrap();
    for key in 0u8..10 {
        cache.access(key, u32::from(key));
    }
    cache.remove(&8);

    let keys = cache.snapshot_order();
    let first: Vec<_> = keys.clone().collect();
    let second: Vec<_> = keys.collect();
    assert_eq!(first, vec![&9u8, &7u8]);
    assert_eq!(first, second);
}
