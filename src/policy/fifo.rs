//! First-In-First-Out (FIFO) cache.
//!
//! Entries are evicted strictly in insertion order. Lookups never reorder,
//! and re-adding an existing key replaces its value without moving it.
//!
//! ## Architecture
//!
//! ```text
//!   entries: OrderedIndex<K, V>
//!
//!   front (oldest, next victim)                    back (newest)
//!     │                                                │
//!     ▼                                                ▼
//!    [A] ◄──► [B] ◄──► [C] ◄──► [D] ◄──► [E]  ◄── add(F) pushes here
//!     │
//!     └── evicted when len > capacity
//! ```
//!
//! ## Operations
//!
//! | Operation        | Time | Notes                                   |
//! |------------------|------|-----------------------------------------|
//! | `add`            | O(1) | May evict the front entry               |
//! | `get` / `peek`   | O(1) | Identical: no reordering                |
//! | `remove`         | O(1) | No callback                             |
//! | `resize`         | O(k) | Evicts `k` oldest entries               |
//!
//! ## Thread Safety
//!
//! Not synchronized. Wrap in a `Mutex` or `RwLock` to share across threads.
//!
//! ## Example Usage
//!
//! ```
//! use fast_cache::policy::fifo::FifoCache;
//!
//! let mut cache = FifoCache::new(2, None).unwrap();
//! cache.add("a", 1);
//! cache.add("b", 2);
//! cache.get(&"a");
//! cache.add("c", 3);
//!
//! // "a" was first in, so it is first out regardless of the lookup
//! assert!(!cache.contains(&"a"));
//! assert_eq!(cache.keys(false), vec!["b", "c"]);
//! ```
use std::fmt;
use std::hash::Hash;

use crate::ds::OrderedIndex;
use crate::error::{ArgumentError, ConfigError};
use crate::traits::{CoreCache, EvictCallback, OrderedCache};

/// Bounded cache evicting in insertion order.
pub struct FifoCache<K, V> {
    // front = oldest, back = newest
    entries: OrderedIndex<K, V>,
    capacity: usize,
    on_evict: Option<EvictCallback<K, V>>,
}

impl<K, V> FifoCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache holding at most `capacity` entries.
    pub fn new(capacity: usize, on_evict: Option<EvictCallback<K, V>>) -> Result<Self, ConfigError> {
        ConfigError::check_capacity(capacity)?;
        Ok(Self {
            entries: OrderedIndex::with_capacity(capacity),
            capacity,
            on_evict,
        })
    }

    /// Inserts `key` at the back, or replaces its value in place.
    ///
    /// Returns `true` if the oldest entry was evicted to make room.
    pub fn add(&mut self, key: K, value: V) -> bool {
        if let Some(id) = self.entries.handle(&key) {
            if let Some(slot) = self.entries.value_mut(id) {
                *slot = value;
            }
            return false;
        }

        self.entries.push_back(key, value);
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

    /// Same as [`peek`](Self::peek): FIFO lookups never reorder.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.value(key)
    }

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

    pub fn remove_many(&mut self, keys: &[K]) -> usize {
        keys.iter().filter(|key| self.remove(key)).count()
    }

    /// Removes and returns the oldest entry without invoking the callback.
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        self.entries.pop_front()
    }

    pub fn get_oldest(&self) -> Option<(&K, &V)> {
        self.entries.front()
    }

    /// Keys oldest first, or newest first when `newest_first` is set.
    pub fn keys(&self, newest_first: bool) -> Vec<K> {
        if newest_first {
            self.entries.iter().rev().map(|(k, _)| k.clone()).collect()
        } else {
            self.entries.iter().map(|(k, _)| k.clone()).collect()
        }
    }

    pub fn values(&self, newest_first: bool) -> Vec<&V> {
        if newest_first {
            self.entries.iter().rev().map(|(_, v)| v).collect()
        } else {
            self.entries.iter().map(|(_, v)| v).collect()
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

    /// Drops every entry, invoking the callback for each one oldest first.
    pub fn purge(&mut self) {
        let drained = self.entries.drain();
        log::debug!("fifo purge: {} entries", drained.len());
        if let Some(cb) = self.on_evict.as_mut() {
            for (key, value) in drained {
                cb(key, value);
            }
        }
    }

    /// Changes the capacity, evicting the oldest entries that no longer fit.
    pub fn resize(&mut self, size: usize) -> Result<usize, ArgumentError> {
        let diff = self.entries.len().saturating_sub(size);
        ArgumentError::check_resize(size, diff)?;
        for _ in 0..diff {
            self.evict_oldest();
        }
        log::debug!("fifo resize: {} -> {}, evicted {}", self.capacity, size, diff);
        self.capacity = size;
        Ok(diff)
    }

    fn evict_oldest(&mut self) {
        if let Some((key, value)) = self.entries.pop_front() {
            log::trace!("fifo evict");
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

impl<K, V> fmt::Debug for FifoCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FifoCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("has_callback", &self.on_evict.is_some())
            .finish()
    }
}

impl<K, V> CoreCache<K, V> for FifoCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn add(&mut self, key: K, value: V) -> bool {
        FifoCache::add(self, key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        FifoCache::get(self, key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        FifoCache::peek(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        FifoCache::contains(self, key)
    }

    fn remove(&mut self, key: &K) -> bool {
        FifoCache::remove(self, key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn purge(&mut self) {
        FifoCache::purge(self)
    }
}

impl<K, V> OrderedCache<K, V> for FifoCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn add_many(&mut self, keys: Vec<K>, values: Vec<V>) -> Result<usize, ArgumentError> {
        FifoCache::add_many(self, keys, values)
    }

    fn remove_oldest(&mut self) -> Option<(K, V)> {
        FifoCache::remove_oldest(self)
    }

    fn get_oldest(&self) -> Option<(&K, &V)> {
        FifoCache::get_oldest(self)
    }

    fn keys(&self, newest_first: bool) -> Vec<K> {
        FifoCache::keys(self, newest_first)
    }

    fn values(&self, newest_first: bool) -> Vec<&V> {
        FifoCache::values(self, newest_first)
    }

    fn resize(&mut self, size: usize) -> Result<usize, ArgumentError> {
        FifoCache::resize(self, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<(&'static str, i32)>>>;

    fn recording() -> (Log, EvictCallback<&'static str, i32>) {
        let log: Log = Arc::default();
        let sink = Arc::clone(&log);
        (log, Box::new(move |k: &'static str, v: i32| sink.lock().unwrap().push((k, v))))
    }

    mod correctness {
        use super::*;

        mod basic_behavior {
            use super::*;

            #[test]
            fn rejects_zero_capacity() {
                let err = FifoCache::<u32, u32>::new(0, None).unwrap_err();
                assert!(err.message().contains("capacity"));
            }

            #[test]
            fn add_over_capacity_evicts_oldest() {
                let mut cache = FifoCache::new(1, None).unwrap();
                assert!(!cache.add("foo", 1));
                assert_eq!(cache.get(&"foo"), Some(&1));

                assert!(cache.add("bar", 2));
                assert_eq!(cache.len(), 1);
                assert_eq!(cache.get(&"bar"), Some(&2));
                assert_eq!(cache.get(&"foo"), None);

                assert!(!cache.add("bar", 100));
                assert_eq!(cache.len(), 1);
                assert_eq!(cache.get(&"bar"), Some(&100));
            }

            #[test]
            fn remove_missing_and_present() {
                let mut cache = FifoCache::new(1, None).unwrap();
                cache.add("foo", 1);
                assert!(!cache.remove(&"foo2"));
                assert_eq!(cache.len(), 1);
                assert!(cache.remove(&"foo"));
                assert!(cache.is_empty());
                assert_eq!(cache.get(&"foo"), None);
            }

            #[test]
            fn re_add_keeps_insertion_position() {
                let mut cache = FifoCache::new(128, None).unwrap();
                cache.add("foo", 1);
                cache.add("bar", 2);
                cache.add("baz", 3);
                cache.add("bar", 4);
                cache.add("foo", 5);

                assert_eq!(cache.keys(false), vec!["foo", "bar", "baz"]);
                assert_eq!(cache.keys(true), vec!["baz", "bar", "foo"]);
                assert_eq!(cache.values(false), vec![&5, &4, &3]);
                assert_eq!(cache.keys(false).len(), cache.len());
            }

            #[test]
            fn get_does_not_reorder() {
                let mut cache = FifoCache::new(3, None).unwrap();
                cache.add(1, "a");
                cache.add(2, "b");
                cache.add(3, "c");
                cache.get(&1);
                cache.add(4, "d");
                assert!(!cache.contains(&1));
                assert_eq!(cache.get_oldest(), Some((&2, &"b")));
            }
        }

        mod bulk_operations {
            use super::*;

            #[test]
            fn add_many_counts_evictions() {
                let mut cache = FifoCache::new(3, None).unwrap();
                let evicted = cache.add_many(vec![1, 2, 3, 4, 5], vec![10, 20, 30, 40, 50]);
                assert_eq!(evicted, Ok(2));
                assert_eq!(cache.keys(false), vec![3, 4, 5]);
            }

            #[test]
            fn add_many_length_mismatch_leaves_cache_untouched() {
                let mut cache = FifoCache::new(3, None).unwrap();
                cache.add(9, 9);
                let err = cache.add_many(vec![1, 2], vec![1]).unwrap_err();
                assert_eq!(err, ArgumentError::LengthMismatch { keys: 2, values: 1 });
                assert_eq!(cache.keys(false), vec![9]);
            }

            #[test]
            fn remove_many_counts_hits() {
                let mut cache = FifoCache::new(4, None).unwrap();
                cache.add_many(vec![1, 2, 3], vec![(); 3]).unwrap();
                assert_eq!(cache.remove_many(&[1, 3, 7]), 2);
                assert_eq!(cache.keys(false), vec![2]);
            }

            #[test]
            fn remove_oldest_skips_callback() {
                let (log, cb) = recording();
                let mut cache = FifoCache::new(2, Some(cb)).unwrap();
                cache.add("a", 1);
                cache.add("b", 2);
                assert_eq!(cache.remove_oldest(), Some(("a", 1)));
                assert!(cache.remove(&"b"));
                assert_eq!(cache.remove_oldest(), None);
                assert!(log.lock().unwrap().is_empty());
            }
        }

        mod callbacks_and_resize {
            use super::*;

            #[test]
            fn eviction_fires_callback_once() {
                let (log, cb) = recording();
                let mut cache = FifoCache::new(2, Some(cb)).unwrap();
                cache.add("a", 1);
                cache.add("b", 2);
                cache.add("c", 3);
                assert_eq!(*log.lock().unwrap(), vec![("a", 1)]);
            }

            #[test]
            fn purge_fires_callback_per_entry() {
                let (log, cb) = recording();
                let mut cache = FifoCache::new(3, Some(cb)).unwrap();
                cache.add("a", 1);
                cache.add("b", 2);
                cache.purge();
                assert!(cache.is_empty());
                assert_eq!(*log.lock().unwrap(), vec![("a", 1), ("b", 2)]);
            }

            #[test]
            fn resize_shrink_evicts_oldest() {
                let (log, cb) = recording();
                let mut cache = FifoCache::new(4, Some(cb)).unwrap();
                for (k, v) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
                    cache.add(k, v);
                }
                assert_eq!(cache.resize(2), Ok(2));
                assert_eq!(cache.capacity(), 2);
                assert_eq!(cache.keys(false), vec!["c", "d"]);
                assert_eq!(*log.lock().unwrap(), vec![("a", 1), ("b", 2)]);

                assert_eq!(cache.resize(10), Ok(0));
                cache.debug_validate_invariants();
            }

            #[test]
            fn resize_to_zero_is_rejected() {
                let mut cache = FifoCache::new(4, None).unwrap();
                cache.add(1, 1);
                cache.add(2, 2);
                let err = cache.resize(0).unwrap_err();
                assert_eq!(err.would_evict(), Some(2));
                assert_eq!(cache.len(), 2);
                assert_eq!(cache.capacity(), 4);
            }
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(u32, u32),
            Get(u32),
            Remove(u32),
            RemoveOldest,
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u32..40, any::<u32>()).prop_map(|(k, v)| Op::Add(k, v)),
                (0u32..40).prop_map(Op::Get),
                (0u32..40).prop_map(Op::Remove),
                Just(Op::RemoveOldest),
            ]
        }

        proptest! {
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_len_never_exceeds_capacity(
                capacity in 1usize..20,
                ops in prop::collection::vec(op_strategy(), 0..150)
            ) {
                let mut cache: FifoCache<u32, u32> = FifoCache::new(capacity, None).unwrap();
                for op in ops {
                    match op {
                        Op::Add(k, v) => { cache.add(k, v); },
                        Op::Get(k) => { cache.get(&k); },
                        Op::Remove(k) => { cache.remove(&k); },
                        Op::RemoveOldest => { cache.remove_oldest(); },
                    }
                    prop_assert!(cache.len() <= capacity);
                    cache.debug_validate_invariants();
                }
            }

            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_peek_never_reorders(
                keys in prop::collection::vec(0u32..30, 1..60),
                probe in 0u32..30
            ) {
                let mut cache: FifoCache<u32, u32> = FifoCache::new(16, None).unwrap();
                for k in keys {
                    cache.add(k, k);
                }
                let before = cache.keys(true);
                cache.peek(&probe);
                prop_assert_eq!(before, cache.keys(true));
            }
        }
    }
}
