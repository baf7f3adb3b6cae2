//! Least Recently Used (LRU) cache.
//!
//! Every hit moves an entry to the MRU end; capacity pressure evicts from
//! the LRU end. This engine is also the building block of the 2Q and LRU-K
//! engines, which compose two of them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                           LruCache<K, V> Layout                             │
//! │                                                                             │
//! │   entries: OrderedIndex<K, V>                                               │
//! │                                                                             │
//! │   ┌──────────┬──────────┐                                                   │
//! │   │   Key    │  SlotId  │     front (MRU)                      back (LRU)   │
//! │   ├──────────┼──────────┤        │                                 │        │
//! │   │  "k1"    │   id_0   │        ▼                                 ▼        │
//! │   │  "k2"    │   id_1   │      [k3] ◄──► [k1] ◄──► [k4] ◄──► [k2]           │
//! │   │  "k3"    │   id_2   │                                          │        │
//! │   │  "k4"    │   id_3   │                          evicted first ──┘        │
//! │   └──────────┴──────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation        | Time | Notes                                |
//! |------------------|------|--------------------------------------|
//! | `add`            | O(1) | New keys go to the front             |
//! | `get`            | O(1) | Moves the hit to the front           |
//! | `peek`           | O(1) | No reordering                        |
//! | `remove`         | O(1) | No callback                          |
//! | `keys` / `values`| O(n) | Either direction, no copy of index   |
//! | `resize`         | O(k) | Evicts the `k` least recent entries  |
//!
//! ## Thread Safety
//!
//! Not synchronized. Use [`TwoQueueCache`](crate::policy::two_q::TwoQueueCache)
//! or wrap in a lock when sharing across threads.
//!
//! ## Example Usage
//!
//! ```
//! use fast_cache::policy::lru::LruCache;
//!
//! let mut cache = LruCache::new(5, None).unwrap();
//! for i in 1..=5 {
//!     cache.add(i, i * 10);
//! }
//! cache.get(&3);
//! assert!(cache.add(6, 60));
//!
//! assert_eq!(cache.keys(true), vec![6, 3, 5, 4, 2]);
//! assert_eq!(cache.get_oldest(), Some((&2, &20)));
//! ```
use std::fmt;
use std::hash::Hash;

use crate::ds::OrderedIndex;
use crate::error::{ArgumentError, ConfigError};
use crate::traits::{CoreCache, EvictCallback, OrderedCache};

/// Bounded cache evicting the least recently used entry.
pub struct LruCache<K, V> {
    // front = MRU, back = LRU
    entries: OrderedIndex<K, V>,
    capacity: usize,
    on_evict: Option<EvictCallback<K, V>>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// `on_evict` runs for capacity evictions, resize shrinks and purges,
    /// never for explicit removals.
    pub fn new(capacity: usize, on_evict: Option<EvictCallback<K, V>>) -> Result<Self, ConfigError> {
        ConfigError::check_capacity(capacity)?;
        Ok(Self {
            entries: OrderedIndex::with_capacity(capacity),
            capacity,
            on_evict,
        })
    }

    /// Inserts or updates `key` and makes it the most recent entry.
    ///
    /// Returns `true` if the least recent entry was evicted.
    pub fn add(&mut self, key: K, value: V) -> bool {
        if let Some(id) = self.entries.handle(&key) {
            self.entries.move_to_front(id);
            if let Some(slot) = self.entries.value_mut(id) {
                *slot = value;
            }
            return false;
        }

        self.entries.push_front(key, value);
        if self.entries.len() > self.capacity {
            self.evict_oldest();
            return true;
        }
        false
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

    /// Looks up `key` and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let id = self.entries.handle(key)?;
        self.entries.move_to_front(id);
        self.entries.get(id).map(|(_, v)| v)
    }

    /// Looks up `key` without changing its recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.value(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// Removes `key` without invoking the eviction callback.
    pub fn remove(&mut self, key: &K) -> bool {
        self.entries.remove_key(key).is_some()
    }

    /// Removes `key` and hands back its entry. No callback.
    pub fn take(&mut self, key: &K) -> Option<(K, V)> {
        self.entries.remove_key(key)
    }

    pub fn remove_many(&mut self, keys: &[K]) -> usize {
        keys.iter().filter(|key| self.remove(key)).count()
    }

    /// Removes and returns the least recent entry without the callback.
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        self.entries.pop_back()
    }

    pub fn get_oldest(&self) -> Option<(&K, &V)> {
        self.entries.back()
    }

    /// Keys least recent first, or most recent first when `newest_first`.
    pub fn keys(&self, newest_first: bool) -> Vec<K> {
        if newest_first {
            self.entries.iter().map(|(k, _)| k.clone()).collect()
        } else {
            self.entries.iter().rev().map(|(k, _)| k.clone()).collect()
        }
    }

    pub fn values(&self, newest_first: bool) -> Vec<&V> {
        if newest_first {
            self.entries.iter().map(|(_, v)| v).collect()
        } else {
            self.entries.iter().rev().map(|(_, v)| v).collect()
        }
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

    /// Drops every entry, invoking the callback once per entry.
    pub fn purge(&mut self) {
        let drained = self.entries.drain();
        log::debug!("lru purge: {} entries", drained.len());
        if let Some(cb) = self.on_evict.as_mut() {
            for (key, value) in drained {
                cb(key, value);
            }
        }
    }

    /// Changes the capacity, evicting the least recent entries that no
    /// longer fit. Returns how many were evicted.
    pub fn resize(&mut self, size: usize) -> Result<usize, ArgumentError> {
        let diff = self.entries.len().saturating_sub(size);
        ArgumentError::check_resize(size, diff)?;
        for _ in 0..diff {
            self.evict_oldest();
        }
        log::debug!("lru resize: {} -> {}, evicted {}", self.capacity, size, diff);
        self.capacity = size;
        Ok(diff)
    }

    fn evict_oldest(&mut self) {
        if let Some((key, value)) = self.entries.pop_back() {
            log::trace!("lru evict");
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

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("has_callback", &self.on_evict.is_some())
            .finish()
    }
}

impl<K, V> CoreCache<K, V> for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn add(&mut self, key: K, value: V) -> bool {
        LruCache::add(self, key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        LruCache::get(self, key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        LruCache::peek(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        LruCache::contains(self, key)
    }

    fn remove(&mut self, key: &K) -> bool {
        LruCache::remove(self, key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn purge(&mut self) {
        LruCache::purge(self)
    }
}

impl<K, V> OrderedCache<K, V> for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn add_many(&mut self, keys: Vec<K>, values: Vec<V>) -> Result<usize, ArgumentError> {
        LruCache::add_many(self, keys, values)
    }

    fn remove_oldest(&mut self) -> Option<(K, V)> {
        LruCache::remove_oldest(self)
    }

    fn get_oldest(&self) -> Option<(&K, &V)> {
        LruCache::get_oldest(self)
    }

    fn keys(&self, newest_first: bool) -> Vec<K> {
        LruCache::keys(self, newest_first)
    }

    fn values(&self, newest_first: bool) -> Vec<&V> {
        LruCache::values(self, newest_first)
    }

    fn resize(&mut self, size: usize) -> Result<usize, ArgumentError> {
        LruCache::resize(self, size)
    }
}
