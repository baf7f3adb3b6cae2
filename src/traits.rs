//! # Cache Trait Hierarchy
//!
//! The uniform contract shared by the single-threaded engines, split the
//! same way the engines differ:
//!
//! ```text
//!                 ┌──────────────────────────────────────────┐
//!                 │             CoreCache<K, V>              │
//!                 │                                          │
//!                 │  add(&mut, K, V) → bool (evicted)        │
//!                 │  get(&mut, &K) → Option<&V>              │
//!                 │  peek(&, &K) → Option<&V>                │
//!                 │  contains(&, &K) → bool                  │
//!                 │  remove(&mut, &K) → bool                 │
//!                 │  len / is_empty / capacity / purge       │
//!                 └─────────────────────┬────────────────────┘
//!                                       │
//!              ┌────────────────────────┴──────────────────────┐
//!              ▼                                               ▼
//!   ┌──────────────────────────────┐        Clock, Clock-Sweep, WSClock
//!   │     OrderedCache<K, V>       │        (fixed ring, no resize)
//!   │                              │
//!   │  add_many / remove_many      │
//!   │  remove_oldest / get_oldest  │
//!   │  keys(newest_first)          │
//!   │  values(newest_first)        │
//!   │  resize(n)                   │
//!   └──────────────────────────────┘
//!        FIFO, LRU, LFU
//! ```
//!
//! The 2Q and LRU-K engines lock internally, take `&self` and hand out
//! `Arc<V>`, so they expose the same operations as inherent methods and
//! carry the [`ConcurrentCache`] marker instead.
//!
//! ## Example Usage
//!
//! ```
//! use fast_cache::policy::fifo::FifoCache;
//! use fast_cache::policy::lru::LruCache;
//! use fast_cache::traits::{CoreCache, OrderedCache};
//!
//! fn warm<C: CoreCache<u32, &'static str>>(cache: &mut C) {
//!     cache.add(1, "one");
//!     cache.add(2, "two");
//! }
//!
//! let mut fifo = FifoCache::new(2, None).unwrap();
//! let mut lru = LruCache::new(2, None).unwrap();
//! warm(&mut fifo);
//! warm(&mut lru);
//! assert_eq!(fifo.keys(false), vec![1, 2]);
//! assert_eq!(lru.keys(true), vec![2, 1]);
//! ```

use crate::error::ArgumentError;

/// Callback invoked with the owned key and value of every evicted entry.
///
/// Runs synchronously inside the evicting call. It must not call back into
/// the cache that invoked it.
pub type EvictCallback<K, V> = Box<dyn FnMut(K, V) + Send + Sync>;

/// Operations every single-threaded engine supports.
pub trait CoreCache<K, V> {
    /// Inserts or updates `key`. Returns `true` if an entry was evicted.
    fn add(&mut self, key: K, value: V) -> bool;

    /// Looks up `key`, applying the engine's "touched" transition on a hit.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Looks up `key` without touching it.
    fn peek(&self, key: &K) -> Option<&V>;

    fn contains(&self, key: &K) -> bool;

    /// Removes `key` without invoking the eviction callback.
    fn remove(&mut self, key: &K) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    /// Drops every entry, invoking the eviction callback once per entry.
    fn purge(&mut self);
}

/// Engines that keep a total eviction order and can be resized.
pub trait OrderedCache<K, V>: CoreCache<K, V> {
    /// Adds each pair in turn. Returns the number of evictions.
    ///
    /// Nothing is inserted if the batches differ in length.
    fn add_many(&mut self, keys: Vec<K>, values: Vec<V>) -> Result<usize, ArgumentError>;

    /// Removes each key in turn. Returns how many were present.
    fn remove_many(&mut self, keys: &[K]) -> usize {
        keys.iter().filter(|key| self.remove(key)).count()
    }

    /// Removes the next eviction victim without invoking the callback.
    fn remove_oldest(&mut self) -> Option<(K, V)>;

    /// Returns the next eviction victim.
    fn get_oldest(&self) -> Option<(&K, &V)>;

    /// Keys in eviction order, or reversed when `newest_first` is set.
    fn keys(&self, newest_first: bool) -> Vec<K>;

    /// Values in the same order as [`keys`](Self::keys).
    fn values(&self, newest_first: bool) -> Vec<&V>;

    /// Changes the capacity, evicting the entries that no longer fit.
    /// Returns how many were evicted.
    fn resize(&mut self, size: usize) -> Result<usize, ArgumentError>;
}

/// Marker for engines that are safe to share across threads as-is.
pub trait ConcurrentCache: Send + Sync {}
