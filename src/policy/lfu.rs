//! Least Frequently Used (LFU) cache.
//!
//! Evicts the entry with the fewest references. Among entries with the same
//! count, the one referenced longest ago goes first. "When" is a logical
//! tick bumped on every reference, so ties break deterministically.
//!
//! ## Architecture
//!
//! ```text
//!   entries: PriorityIndex<K, V>    min-heap on (references, last tick)
//!
//!                 (1, t3) "b"   ◄── next victim
//!                /          \
//!        (1, t7) "c"      (4, t5) "a"
//!
//!   add(new)   : pop the minimum if full, push with references = 1
//!   add(known) : replace value, references += 1, fix position
//!   get(hit)   : references += 1, fix position
//! ```
//!
//! ## Operations
//!
//! | Operation        | Time       | Notes                                  |
//! |------------------|------------|----------------------------------------|
//! | `add` / `get`    | O(log n)   | One sift per reference                 |
//! | `peek`/`contains`| O(1)       | No count change                        |
//! | `remove`         | O(log n)   | Removes from any heap position         |
//! | `keys`/`values`  | O(n log n) | Sorted copy in eviction order          |
//!
//! ## Thread Safety
//!
//! Not synchronized.
//!
//! ## Example Usage
//!
//! ```
//! use fast_cache::policy::lfu::LfuCache;
//!
//! let mut cache = LfuCache::new(2, None).unwrap();
//! cache.add("hot", 1);
//! cache.add("cold", 2);
//! cache.get(&"hot");
//!
//! cache.add("new", 3);
//! assert!(!cache.contains(&"cold"));
//! assert_eq!(cache.frequency(&"hot"), Some(2));
//! ```
use std::fmt;
use std::hash::Hash;

use crate::ds::PriorityIndex;
use crate::error::{ArgumentError, ConfigError};
use crate::traits::{CoreCache, EvictCallback, OrderedCache};

/// Bounded cache evicting the least frequently used entry.
pub struct LfuCache<K, V> {
    entries: PriorityIndex<K, V>,
    capacity: usize,
    tick: u64,
    on_evict: Option<EvictCallback<K, V>>,
}

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize, on_evict: Option<EvictCallback<K, V>>) -> Result<Self, ConfigError> {
        ConfigError::check_capacity(capacity)?;
        Ok(Self {
            entries: PriorityIndex::with_capacity(capacity),
            capacity,
            tick: 0,
            on_evict,
        })
    }

    /// Inserts `key` with one reference, or counts another reference to an
    /// existing key and replaces its value.
    ///
    /// Returns `true` if the least frequently used entry was evicted.
    pub fn add(&mut self, key: K, value: V) -> bool {
        self.add_with_refs(key, value, 1)
    }

    /// Like [`add`](Self::add), but a new entry starts with `references`
    /// instead of 1. Existing keys still gain exactly one reference.
    pub fn add_with_refs(&mut self, key: K, value: V, references: u64) -> bool {
        let tick = self.next_tick();
        if self.entries.contains(&key) {
            self.entries.update(&key, value, tick);
            return false;
        }

        let evicted = self.entries.len() >= self.capacity;
        if evicted {
            self.evict_min();
        }
        self.entries.push(key, value, references, tick);
        evicted
    }

    pub fn add_many(&mut self, keys: Vec<K>, values: Vec<V>) -> Result<usize, ArgumentError> {
        ArgumentError::check_batch(keys.len(), values.len())?;
        let mut evicted = 0;
        for (key, value) in keys.into_iter().zip(values) {
            if self.add(key, value) {
                evicted += 1;
            }
        }
        Ok(evicted)
    }

    /// Looks up `key`, counting a reference on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if !self.entries.contains(key) {
            return None;
        }
        let tick = self.next_tick();
        self.entries.touch(key, tick)
    }

    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// Reference count of `key`.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.entries.priority(key).map(|(references, _)| references)
    }

    /// Removes `key` without invoking the eviction callback.
    pub fn remove(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn remove_many(&mut self, keys: &[K]) -> usize {
        keys.iter().filter(|key| self.remove(key)).count()
    }

    /// Removes the next victim without invoking the callback.
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        self.entries.pop_min()
    }

    /// The next victim: fewest references, oldest tick.
    pub fn get_oldest(&self) -> Option<(&K, &V)> {
        self.entries.peek_min()
    }

    /// Keys in eviction order, next victim first; reversed with
    /// `newest_first`.
    pub fn keys(&self, newest_first: bool) -> Vec<K> {
        let mut keys: Vec<K> = self
            .entries
            .iter_by_priority()
            .into_iter()
            .map(|(k, _)| k.clone())
            .collect();
        if newest_first {
            keys.reverse();
        }
        keys
    }

    pub fn values(&self, newest_first: bool) -> Vec<&V> {
        let mut values: Vec<&V> = self
            .entries
            .iter_by_priority()
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        if newest_first {
            values.reverse();
        }
        values
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn purge(&mut self) {
        let drained = self.entries.drain();
        log::debug!("lfu purge: {} entries", drained.len());
        if let Some(cb) = self.on_evict.as_mut() {
            for (key, value) in drained {
                cb(key, value);
            }
        }
    }

    pub fn resize(&mut self, size: usize) -> Result<usize, ArgumentError> {
        let diff = self.entries.len().saturating_sub(size);
        ArgumentError::check_resize(size, diff)?;
        for _ in 0..diff {
            self.evict_min();
        }
        log::debug!("lfu resize: {} -> {}, evicted {}", self.capacity, size, diff);
        self.capacity = size;
        Ok(diff)
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict_min(&mut self) {
        if let Some((key, value)) = self.entries.pop_min() {
            log::trace!("lfu evict");
            if let Some(cb) = self.on_evict.as_mut() {
                cb(key, value);
            }
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.entries.debug_validate_invariants();
        assert!(self.entries.len() <= self.capacity);
    }
}

impl<K, V> fmt::Debug for LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("tick", &self.tick)
            .finish()
    }
}

impl<K, V> CoreCache<K, V> for LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn add(&mut self, key: K, value: V) -> bool {
        LfuCache::add(self, key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        LfuCache::get(self, key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        LfuCache::peek(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        LfuCache::contains(self, key)
    }

    fn remove(&mut self, key: &K) -> bool {
        LfuCache::remove(self, key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn purge(&mut self) {
        LfuCache::purge(self)
    }
}

impl<K, V> OrderedCache<K, V> for LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn add_many(&mut self, keys: Vec<K>, values: Vec<V>) -> Result<usize, ArgumentError> {
        LfuCache::add_many(self, keys, values)
    }

    fn remove_oldest(&mut self) -> Option<(K, V)> {
        LfuCache::remove_oldest(self)
    }

    fn get_oldest(&self) -> Option<(&K, &V)> {
        LfuCache::get_oldest(self)
    }

    fn keys(&self, newest_first: bool) -> Vec<K> {
        LfuCache::keys(self, newest_first)
    }

    fn values(&self, newest_first: bool) -> Vec<&V> {
        LfuCache::values(self, newest_first)
    }

    fn resize(&mut self, size: usize) -> Result<usize, ArgumentError> {
        LfuCache::resize(self, size)
    }
}
