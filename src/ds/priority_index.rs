//! Indexed binary min-heap keyed by `(references, last_reference)`.
//!
//! Unlike a lazy heap, every key has exactly one heap node and the index
//! tracks its current position, so a re-reference fixes the node in place
//! in O(log n) and removal of an arbitrary key needs no stale-entry sweep.
//!
//! ## Architecture
//!
//! ```text
//!   positions: FxHashMap<K, usize>        heap: Vec<Node<K, V>>
//!   ┌─────────┬──────┐                    [0] (refs=1, tick=3) "b"   ← min
//!   │   "a"   │  2   │                   /                     \
//!   │   "b"   │  0   │      [1] (refs=1, tick=7) "c"    [2] (refs=4, tick=5) "a"
//!   │   "c"   │  1   │
//!   └─────────┴──────┘
//! ```
//!
//! Priority order is ascending reference count, then ascending tick, so on
//! equal counts the entry referenced longest ago surfaces first. Ticks are
//! supplied by the caller and must be unique for a deterministic order.
//!
//! ## Performance
//! - `push` / `pop_min` / `touch` / `remove`: O(log n)
//! - `peek_min` / `contains`: O(1)
use std::hash::Hash;

use rustc_hash::FxHashMap;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    references: u64,
    last_reference: u64,
}

impl<K, V> Node<K, V> {
    #[inline]
    fn priority(&self) -> (u64, u64) {
        (self.references, self.last_reference)
    }
}

/// Binary min-heap with O(1) key → position lookup.
#[derive(Debug)]
pub struct PriorityIndex<K, V> {
    heap: Vec<Node<K, V>>,
    positions: FxHashMap<K, usize>,
}

impl<K, V> PriorityIndex<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            positions: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let pos = *self.positions.get(key)?;
        Some(&self.heap[pos].value)
    }

    /// Returns `(references, last_reference)` for `key`.
    pub fn priority(&self, key: &K) -> Option<(u64, u64)> {
        let pos = *self.positions.get(key)?;
        Some(self.heap[pos].priority())
    }

    /// Inserts a new key. The key must not already be present.
    pub fn push(&mut self, key: K, value: V, references: u64, tick: u64) {
        debug_assert!(!self.positions.contains_key(&key));
        let pos = self.heap.len();
        self.positions.insert(key.clone(), pos);
        self.heap.push(Node {
            key,
            value,
            references,
            last_reference: tick,
        });
        self.sift_up(pos);
    }

    /// Records one more reference to `key` at `tick` and restores heap order.
    pub fn touch(&mut self, key: &K, tick: u64) -> Option<&V> {
        let pos = *self.positions.get(key)?;
        let node = &mut self.heap[pos];
        node.references = node.references.saturating_add(1);
        node.last_reference = tick;
        let pos = self.fix(pos);
        Some(&self.heap[pos].value)
    }

    /// Replaces the value of `key` and records a reference at `tick`.
    /// Returns the previous value.
    pub fn update(&mut self, key: &K, value: V, tick: u64) -> Option<V> {
        let pos = *self.positions.get(key)?;
        let old = std::mem::replace(&mut self.heap[pos].value, value);
        self.touch(key, tick);
        Some(old)
    }

    pub fn peek_min(&self) -> Option<(&K, &V)> {
        self.heap.first().map(|node| (&node.key, &node.value))
    }

    pub fn pop_min(&mut self) -> Option<(K, V)> {
        if self.heap.is_empty() {
            return None;
        }
        Some(self.remove_at(0))
    }

    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let pos = *self.positions.get(key)?;
        Some(self.remove_at(pos))
    }

    /// Entries in eviction order (minimum priority first).
    pub fn iter_by_priority(&self) -> Vec<(&K, &V)> {
        let mut nodes: Vec<&Node<K, V>> = self.heap.iter().collect();
        nodes.sort_unstable_by_key(|node| node.priority());
        nodes.into_iter().map(|node| (&node.key, &node.value)).collect()
    }

    /// Removes every entry, in unspecified order.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        self.positions.clear();
        self.heap
            .drain(..)
            .map(|node| (node.key, node.value))
            .collect()
    }

    fn remove_at(&mut self, pos: usize) -> (K, V) {
        let node = self.heap.swap_remove(pos);
        self.positions.remove(&node.key);
        if pos < self.heap.len() {
            if let Some(p) = self.positions.get_mut(&self.heap[pos].key) {
                *p = pos;
            }
            self.fix(pos);
        }
        (node.key, node.value)
    }

    fn fix(&mut self, pos: usize) -> usize {
        let moved = self.sift_up(pos);
        if moved != pos {
            return moved;
        }
        self.sift_down(pos)
    }

    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[pos].priority() >= self.heap[parent].priority() {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) -> usize {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                return pos;
            }
            let right = left + 1;
            let mut smallest = left;
            if right < len && self.heap[right].priority() < self.heap[left].priority() {
                smallest = right;
            }
            if self.heap[smallest].priority() >= self.heap[pos].priority() {
                return pos;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        if let Some(p) = self.positions.get_mut(&self.heap[a].key) {
            *p = a;
        }
        if let Some(p) = self.positions.get_mut(&self.heap[b].key) {
            *p = b;
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.heap.len(), self.positions.len());
        for (pos, node) in self.heap.iter().enumerate() {
            assert_eq!(self.positions.get(&node.key), Some(&pos));
            if pos > 0 {
                let parent = (pos - 1) / 2;
                assert!(self.heap[parent].priority() <= node.priority());
            }
        }
    }
}
