//! Order index: the recency list, linked by arena slot
//!
//! Nodes live in a `Vec<Option<Node>>` and name their neighbors by slot
//! index instead of by pointer. Freed slots go on a free list and are
//! reused by the next insertion.
//!
//! ```text
//!   newest                                   oldest
//!     │                                        │
//!     ▼                                        ▼
//!   [ d ] ──less_recent──▶ [ c ] ──▶ [ b ] ──▶ [ a ] ──▶ None
//!   None ◀── [ d ] ◀──more_recent── [ c ] ◀── [ b ] ◀── [ a ]
//! ```

use std::iter::FusedIterator;

use crate::error::{Error, Result};

/// Arena slot holding one linked entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Slot(usize);

/// Node in the recency list
struct Node<K, V> {
    key: K,
    value: V,
    more_recent: Option<Slot>,
    less_recent: Option<Slot>,
}

/// Where a linked slot sits in the recency order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Sole entry: both newest and oldest
    Only,
    /// Front of a longer list; `less_recent` becomes the new newest
    Newest { less_recent: Slot },
    /// Back of a longer list; `more_recent` becomes the new oldest
    Oldest { more_recent: Slot },
    /// Between two entries that get spliced together
    Interior { more_recent: Slot, less_recent: Slot },
}

/// Doubly linked recency order over an index arena
pub(crate) struct OrderIndex<K, V> {
    nodes: Vec<Option<Node<K, V>>>,
    free_list: Vec<usize>,
    newest: Option<Slot>,
    oldest: Option<Slot>,
    len: usize,
}

impl<K, V> OrderIndex<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            newest: None,
            oldest: None,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn newest(&self) -> Option<Slot> {
        self.newest
    }

    pub(crate) fn oldest(&self) -> Option<Slot> {
        self.oldest
    }

    pub(crate) fn key(&self, slot: Slot) -> Option<&K> {
        self.node(slot).map(|node| &node.key)
    }

    pub(crate) fn entry(&self, slot: Slot) -> Option<(&K, &V)> {
        self.node(slot).map(|node| (&node.key, &node.value))
    }

    pub(crate) fn value_mut(&mut self, slot: Slot) -> Option<&mut V> {
        self.node_mut(slot).map(|node| &mut node.value)
    }

    /// Link a new entry at the newest end
    pub(crate) fn push_newest(&mut self, key: K, value: V) -> Slot {
        let slot = self.alloc(Node {
            key,
            value,
            more_recent: None,
            less_recent: None,
        });
        self.link_newest(slot);
        self.len += 1;
        slot
    }

    /// Move a linked entry to the newest end
    pub(crate) fn promote(&mut self, slot: Slot) {
        if self.newest == Some(slot) || self.node(slot).is_none() {
            return;
        }
        self.unlink(slot);
        self.link_newest(slot);
    }

    /// Unlink an entry and release its slot
    pub(crate) fn remove(&mut self, slot: Slot) -> Option<(K, V)> {
        self.node(slot)?;
        self.unlink(slot);
        let node = self.nodes[slot.0].take()?;
        self.free_list.push(slot.0);
        self.len -= 1;
        Some((node.key, node.value))
    }

    /// 0-based distance from the newest end
    pub(crate) fn rank(&self, slot: Slot) -> Option<usize> {
        self.slots().position(|s| s == slot)
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            index: self,
            next: self.newest,
            remaining: self.len,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free_list.clear();
        self.newest = None;
        self.oldest = None;
        self.len = 0;
    }

    /// Verify sentinels, link symmetry and that both walks cover every node
    pub(crate) fn check_links(&self) -> Result<()> {
        let live = self.nodes.iter().filter(|n| n.is_some()).count();
        if live != self.len {
            return Err(Error::invariant(format!(
                "arena holds {} nodes but len is {}",
                live, self.len
            )));
        }

        match (self.newest, self.oldest) {
            (None, None) if self.len == 0 => return Ok(()),
            (Some(_), Some(_)) if self.len > 0 => {}
            _ => {
                return Err(Error::invariant(format!(
                    "sentinels {:?}/{:?} inconsistent with len {}",
                    self.newest, self.oldest, self.len
                )))
            }
        }

        let mut steps = 0;
        let mut prev = None;
        let mut cursor = self.newest;
        while let Some(slot) = cursor {
            let node = self
                .node(slot)
                .ok_or_else(|| Error::invariant(format!("link to free slot {}", slot.0)))?;
            if node.more_recent != prev {
                return Err(Error::invariant(format!(
                    "slot {} more_recent is {:?}, expected {:?}",
                    slot.0, node.more_recent, prev
                )));
            }
            steps += 1;
            if steps > self.len {
                return Err(Error::invariant("cycle in less_recent links"));
            }
            prev = Some(slot);
            cursor = node.less_recent;
        }
        if steps != self.len || prev != self.oldest {
            return Err(Error::invariant(format!(
                "newest-to-oldest walk visited {} of {} entries",
                steps, self.len
            )));
        }

        // symmetry was checked on the way down, the reverse walk must retrace it
        let reverse = self.walk_more_recent().count();
        if reverse != self.len {
            return Err(Error::invariant(format!(
                "oldest-to-newest walk visited {} of {} entries",
                reverse, self.len
            )));
        }

        Ok(())
    }

    fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        std::iter::successors(self.newest, move |&slot| {
            self.node(slot).and_then(|node| node.less_recent)
        })
        .take(self.len)
    }

    fn walk_more_recent(&self) -> impl Iterator<Item = Slot> + '_ {
        std::iter::successors(self.oldest, move |&slot| {
            self.node(slot).and_then(|node| node.more_recent)
        })
        .take(self.len + 1)
    }

    fn position(&self, slot: Slot) -> Option<Position> {
        let node = self.node(slot)?;
        Some(match (node.more_recent, node.less_recent) {
            (None, None) => Position::Only,
            (None, Some(less_recent)) => Position::Newest { less_recent },
            (Some(more_recent), None) => Position::Oldest { more_recent },
            (Some(more_recent), Some(less_recent)) => Position::Interior {
                more_recent,
                less_recent,
            },
        })
    }

    /// Detach a slot from its neighbors; the node itself stays allocated
    fn unlink(&mut self, slot: Slot) {
        let Some(position) = self.position(slot) else {
            return;
        };

        match position {
            Position::Only => {
                self.newest = None;
                self.oldest = None;
            }
            Position::Newest { less_recent } => {
                self.set_more_recent(less_recent, None);
                self.newest = Some(less_recent);
            }
            Position::Oldest { more_recent } => {
                self.set_less_recent(more_recent, None);
                self.oldest = Some(more_recent);
            }
            Position::Interior {
                more_recent,
                less_recent,
            } => {
                self.set_less_recent(more_recent, Some(less_recent));
                self.set_more_recent(less_recent, Some(more_recent));
            }
        }

        if let Some(node) = self.node_mut(slot) {
            node.more_recent = None;
            node.less_recent = None;
        }
    }

    fn link_newest(&mut self, slot: Slot) {
        let previous = self.newest;
        if let Some(node) = self.node_mut(slot) {
            node.more_recent = None;
            node.less_recent = previous;
        }

        match previous {
            Some(prev) => self.set_more_recent(prev, Some(slot)),
            None => self.oldest = Some(slot),
        }
        self.newest = Some(slot);
    }

    fn set_more_recent(&mut self, slot: Slot, link: Option<Slot>) {
        if let Some(node) = self.node_mut(slot) {
            node.more_recent = link;
        }
    }

    fn set_less_recent(&mut self, slot: Slot, link: Option<Slot>) {
        if let Some(node) = self.node_mut(slot) {
            node.less_recent = link;
        }
    }

    fn node(&self, slot: Slot) -> Option<&Node<K, V>> {
        self.nodes.get(slot.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: Slot) -> Option<&mut Node<K, V>> {
        self.nodes.get_mut(slot.0).and_then(Option::as_mut)
    }

    fn alloc(&mut self, node: Node<K, V>) -> Slot {
        if let Some(idx) = self.free_list.pop() {
            self.nodes[idx] = Some(node);
            Slot(idx)
        } else {
            self.nodes.push(Some(node));
            Slot(self.nodes.len() - 1)
        }
    }
}

/// Entries from most to least recently used
pub(crate) struct Iter<'a, K, V> {
    index: &'a OrderIndex<K, V>,
    next: Option<Slot>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.index;
        let node = index.node(self.next?)?;
        self.next = node.less_recent;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
