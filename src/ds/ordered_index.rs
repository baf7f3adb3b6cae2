//! Ordered index: hash lookup plus an arena-backed recency/insertion order.
//!
//! Shared by the FIFO and LRU engines (and through LRU, by 2Q and LRU-K).
//! Each key maps to the `SlotId` of its list node; the node owns the key and
//! value so eviction from either end is O(1) without a second lookup.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<K, SlotId>          list: IntrusiveList<Entry<K, V>>
//!   ┌─────────┬─────────┐
//!   │  key A  │  id_1   │ ──────►  front ─► [A] ◄──► [B] ◄──► [C] ◄── back
//!   │  key B  │  id_2   │
//!   │  key C  │  id_3   │
//!   └─────────┴─────────┘
//! ```
//!
//! Which end counts as "newest" is up to the engine: LRU pushes to the
//! front, FIFO pushes to the back.
//!
//! ## Performance
//! - `push_front` / `push_back` / `move_to_front` / `remove`: O(1) average
//! - `iter` in either direction: O(n), no copying
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// Hash index over an intrusive list of `(key, value)` entries.
#[derive(Debug)]
pub struct OrderedIndex<K, V> {
    index: FxHashMap<K, SlotId>,
    list: IntrusiveList<Entry<K, V>>,
}

impl<K, V> OrderedIndex<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty index sized for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            list: IntrusiveList::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns the handle for `key`, if present.
    pub fn handle(&self, key: &K) -> Option<SlotId> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, id: SlotId) -> Option<(&K, &V)> {
        self.list.get(id).map(|e| (&e.key, &e.value))
    }

    pub fn value(&self, key: &K) -> Option<&V> {
        let id = self.handle(key)?;
        self.list.get(id).map(|e| &e.value)
    }

    pub fn value_mut(&mut self, id: SlotId) -> Option<&mut V> {
        self.list.get_mut(id).map(|e| &mut e.value)
    }

    /// Inserts a new key at the front. The key must not already be present.
    pub fn push_front(&mut self, key: K, value: V) -> SlotId {
        debug_assert!(!self.index.contains_key(&key));
        let id = self.list.push_front(Entry {
            key: key.clone(),
            value,
        });
        self.index.insert(key, id);
        id
    }

    /// Inserts a new key at the back. The key must not already be present.
    pub fn push_back(&mut self, key: K, value: V) -> SlotId {
        debug_assert!(!self.index.contains_key(&key));
        let id = self.list.push_back(Entry {
            key: key.clone(),
            value,
        });
        self.index.insert(key, id);
        id
    }

    pub fn move_to_front(&mut self, id: SlotId) -> bool {
        self.list.move_to_front(id)
    }

    /// Unlinks the node and drops its index entry.
    pub fn remove(&mut self, id: SlotId) -> Option<(K, V)> {
        let entry = self.list.remove(id)?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    pub fn remove_key(&mut self, key: &K) -> Option<(K, V)> {
        let id = self.handle(key)?;
        self.remove(id)
    }

    pub fn front(&self) -> Option<(&K, &V)> {
        self.list.front().map(|e| (&e.key, &e.value))
    }

    pub fn back(&self) -> Option<(&K, &V)> {
        self.list.back().map(|e| (&e.key, &e.value))
    }

    pub fn pop_front(&mut self) -> Option<(K, V)> {
        let id = self.list.front_id()?;
        self.remove(id)
    }

    pub fn pop_back(&mut self) -> Option<(K, V)> {
        let id = self.list.back_id()?;
        self.remove(id)
    }

    /// Iterates front to back; `.rev()` walks back to front.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + ExactSizeIterator {
        self.list.iter().map(|(_, e)| (&e.key, &e.value))
    }

    /// Drains every entry, front to back.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        let mut out = Vec::with_capacity(self.len());
        while let Some(entry) = self.list.pop_front() {
            out.push((entry.key, entry.value));
        }
        self.index.clear();
        out
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.list.debug_validate_invariants();
        assert_eq!(self.index.len(), self.list.len());
        for (key, &id) in &self.index {
            let entry = self.list.get(id).expect("index points to freed node");
            assert!(&entry.key == key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<K: Clone + Eq + Hash, V>(idx: &OrderedIndex<K, V>) -> Vec<K> {
        idx.iter().map(|(k, _)| k.clone()).collect()
    }

    #[test]
    fn ordered_index_push_both_ends() {
        let mut idx = OrderedIndex::with_capacity(4);
        idx.push_back("b", 2);
        idx.push_front("a", 1);
        idx.push_back("c", 3);
        assert_eq!(keys(&idx), vec!["a", "b", "c"]);
        assert_eq!(idx.front(), Some((&"a", &1)));
        assert_eq!(idx.back(), Some((&"c", &3)));
        idx.debug_validate_invariants();
    }

    #[test]
    fn ordered_index_move_and_remove_by_handle() {
        let mut idx = OrderedIndex::with_capacity(4);
        idx.push_front(1, "one");
        idx.push_front(2, "two");
        idx.push_front(3, "three");

        let id = idx.handle(&1).unwrap();
        assert!(idx.move_to_front(id));
        assert_eq!(keys(&idx), vec![1, 3, 2]);

        assert_eq!(idx.remove_key(&3), Some((3, "three")));
        assert!(!idx.contains(&3));
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.remove_key(&3), None);
        idx.debug_validate_invariants();
    }

    #[test]
    fn ordered_index_reverse_iteration() {
        let mut idx = OrderedIndex::with_capacity(3);
        for i in 0..3 {
            idx.push_back(i, i * 10);
        }
        let rev: Vec<_> = idx.iter().rev().map(|(_, v)| *v).collect();
        assert_eq!(rev, vec![20, 10, 0]);
    }

    #[test]
    fn ordered_index_pop_ends_and_drain() {
        let mut idx = OrderedIndex::with_capacity(4);
        for i in 0..4 {
            idx.push_back(i, ());
        }
        assert_eq!(idx.pop_front(), Some((0, ())));
        assert_eq!(idx.pop_back(), Some((3, ())));
        let drained: Vec<_> = idx.drain().into_iter().map(|(k, _)| k).collect();
        assert_eq!(drained, vec![1, 2]);
        assert!(idx.is_empty());
        assert!(!idx.contains(&1));
    }

    #[test]
    fn ordered_index_value_mut_updates_in_place() {
        let mut idx = OrderedIndex::with_capacity(1);
        let id = idx.push_back("k", 1);
        *idx.value_mut(id).unwrap() = 5;
        assert_eq!(idx.value(&"k"), Some(&5));
        assert_eq!(idx.get(id), Some((&"k", &5)));
    }
}
