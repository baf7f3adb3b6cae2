//! Two-Queue (2Q) cache with a ghost list.
//!
//! Separates entries seen once from entries seen at least twice, so a burst
//! of one-off keys cannot flush the frequently used set. Keys evicted from
//! the probationary queue are remembered (without values) in a ghost list;
//! re-adding a ghost key skips probation entirely.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                        TwoQueueCache<K, V> Layout                           │
//! │                                                                             │
//! │   RwLock<TwoQueueCore>                                                      │
//! │   ┌─────────────────────────────────────────────────────────────────────┐   │
//! │   │  recent:   LruCache<K, Arc<V>>     seen once, target ⌊size·r⌋       │   │
//! │   │  frequent: LruCache<K, Arc<V>>     seen twice or more               │   │
//! │   │  ghost:    GhostList<K>            keys demoted out of `recent`     │   │
//! │   └─────────────────────────────────────────────────────────────────────┘   │
//! │                                                                             │
//! │   new key ──► recent ──(second add / get)──► frequent                       │
//! │                 │                                ▲                          │
//! │                 ▼ ensure_space                   │                          │
//! │               ghost ─────────(add again)─────────┘                          │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Eviction
//!
//! ```text
//!   ensure_space(ghost_hit):
//!     if recent.len + frequent.len < size: nothing to do
//!     if recent is non-empty and
//!        (recent.len > recent_size or (recent.len == recent_size and !ghost_hit)):
//!         demote recent's oldest into ghost
//!     else:
//!         drop frequent's oldest
//! ```
//!
//! When the queue chosen above is empty the other one gives up its oldest
//! entry instead, so `len() <= capacity()` always holds.
//!
//! ## Concurrency
//!
//! All state sits behind one `parking_lot::RwLock`. `get` takes the write
//! lock because a hit can promote; `peek`, `contains`, `keys`, `values` and
//! `len` take the read lock. The eviction callback runs while the write
//! lock is held and must not call back into the same cache.
//!
//! ## Example Usage
//!
//! ```
//! use fast_cache::policy::two_q::TwoQueueCache;
//!
//! let cache = TwoQueueCache::new(5).unwrap();
//! for (k, v) in [(1, "Java"), (2, "Go"), (3, "Python"), (4, "C++"), (5, "C")] {
//!     cache.add(k, v);
//! }
//! assert_eq!(cache.get(&3).as_deref(), Some(&"Python"));
//!
//! cache.add(6, "Rust");
//! assert_eq!(cache.keys(true), vec![3, 6, 5, 4, 2]);
//!
//! cache.remove(&5);
//! assert_eq!(cache.keys(true), vec![3, 6, 4, 2]);
//! ```
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::ds::GhostList;
use crate::error::{ArgumentError, ConfigError};
use crate::policy::lru::LruCache;
use crate::traits::{ConcurrentCache, EvictCallback};

/// Share of the capacity targeted for entries seen only once.
pub const DEFAULT_RECENT_RATIO: f64 = 0.25;

/// Ghost list size as a share of the capacity.
pub const DEFAULT_GHOST_RATIO: f64 = 0.50;

fn share(size: usize, ratio: f64) -> usize {
    (size as f64 * ratio) as usize
}

struct TwoQueueCore<K, V> {
    size: usize,
    recent_size: usize,
    recent_ratio: f64,
    ghost_ratio: f64,
    recent: LruCache<K, Arc<V>>,
    frequent: LruCache<K, Arc<V>>,
    ghost: GhostList<K>,
    on_evict: Option<EvictCallback<K, Arc<V>>>,
}

impl<K, V> TwoQueueCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn len(&self) -> usize {
        self.recent.len() + self.frequent.len()
    }

    fn add(&mut self, key: K, value: Arc<V>) -> bool {
        if self.frequent.contains(&key) {
            self.frequent.add(key, value);
            return false;
        }

        if self.recent.remove(&key) {
            self.frequent.add(key, value);
            return false;
        }

        if self.ghost.contains(&key) {
            let evicted = self.ensure_space(true);
            self.ghost.remove(&key);
            self.frequent.add(key, value);
            return evicted;
        }

        let evicted = self.ensure_space(false);
        self.recent.add(key, value);
        evicted
    }

    fn get(&mut self, key: &K) -> Option<Arc<V>> {
        if let Some(value) = self.frequent.get(key) {
            return Some(Arc::clone(value));
        }

        let (key, value) = self.recent.take(key)?;
        self.frequent.add(key, Arc::clone(&value));
        Some(value)
    }

    /// Frees one slot if the cache is full. Returns `true` if it evicted.
    fn ensure_space(&mut self, ghost_hit: bool) -> bool {
        let recent_len = self.recent.len();
        let frequent_len = self.frequent.len();
        if recent_len + frequent_len < self.size {
            return false;
        }

        let from_recent = recent_len > 0
            && (recent_len > self.recent_size
                || (recent_len == self.recent_size && !ghost_hit)
                || frequent_len == 0);

        let victim = if from_recent {
            self.recent.remove_oldest().inspect(|(key, _)| {
                self.ghost.record(key.clone());
            })
        } else {
            self.frequent.remove_oldest()
        };

        match victim {
            Some((key, value)) => {
                log::trace!("2q evict from {}", if from_recent { "recent" } else { "frequent" });
                if let Some(cb) = self.on_evict.as_mut() {
                    cb(key, value);
                }
                true
            },
            None => false,
        }
    }

    fn resize(&mut self, size: usize) -> Result<usize, ArgumentError> {
        let diff = self.len().saturating_sub(size);
        ArgumentError::check_resize(size, diff)?;

        self.size = size;
        self.recent_size = share(size, self.recent_ratio);
        for _ in 0..diff {
            self.ensure_space(true);
        }

        self.recent.resize(size)?;
        self.frequent.resize(size)?;
        self.ghost.resize(share(size, self.ghost_ratio));
        log::debug!("2q resize: size {}, evicted {}", size, diff);
        Ok(diff)
    }

    fn purge(&mut self) {
        let mut drained = Vec::with_capacity(self.len());
        while let Some(entry) = self.frequent.remove_oldest() {
            drained.push(entry);
        }
        while let Some(entry) = self.recent.remove_oldest() {
            drained.push(entry);
        }
        self.ghost.clear();
        log::debug!("2q purge: {} entries", drained.len());
        if let Some(cb) = self.on_evict.as_mut() {
            for (key, value) in drained {
                cb(key, value);
            }
        }
    }
}

/// Thread-safe 2Q cache. Values are shared as `Arc<V>`.
pub struct TwoQueueCache<K, V> {
    inner: RwLock<TwoQueueCore<K, V>>,
}

impl<K, V> TwoQueueCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache with [`DEFAULT_RECENT_RATIO`] and
    /// [`DEFAULT_GHOST_RATIO`] and no eviction callback.
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        Self::try_with_params(size, DEFAULT_RECENT_RATIO, DEFAULT_GHOST_RATIO, None)
    }

    /// Creates a cache with explicit ratios.
    ///
    /// Both ratios must lie in `[0, 1]`. A ghost share that rounds down to
    /// zero disables the ghost list.
    pub fn try_with_params(
        size: usize,
        recent_ratio: f64,
        ghost_ratio: f64,
        on_evict: Option<EvictCallback<K, Arc<V>>>,
    ) -> Result<Self, ConfigError> {
        ConfigError::check_capacity(size)?;
        ConfigError::check_ratio("recent ratio", recent_ratio)?;
        ConfigError::check_ratio("ghost ratio", ghost_ratio)?;

        let core = TwoQueueCore {
            size,
            recent_size: share(size, recent_ratio),
            recent_ratio,
            ghost_ratio,
            recent: LruCache::new(size, None)?,
            frequent: LruCache::new(size, None)?,
            ghost: GhostList::new(share(size, ghost_ratio)),
            on_evict,
        };
        Ok(Self {
            inner: RwLock::new(core),
        })
    }

    /// Inserts or updates `key`. Returns `true` if an entry was evicted.
    ///
    /// A key already in `recent` is promoted to `frequent`; a key found in
    /// the ghost list goes straight to `frequent`.
    pub fn add(&self, key: K, value: V) -> bool {
        self.inner.write().add(key, Arc::new(value))
    }

    /// Like [`add`](Self::add) for a value that is already shared.
    pub fn add_arc(&self, key: K, value: Arc<V>) -> bool {
        self.inner.write().add(key, value)
    }

    pub fn add_many(&self, keys: Vec<K>, values: Vec<V>) -> Result<usize, ArgumentError> {
        ArgumentError::check_batch(keys.len(), values.len())?;
        let mut core = self.inner.write();
        let mut evicted = 0;
        for (key, value) in keys.into_iter().zip(values) {
            if core.add(key, Arc::new(value)) {
                evicted += 1;
            }
        }
        Ok(evicted)
    }

    /// Looks up `key`. A hit in `recent` promotes the entry to `frequent`.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.inner.write().get(key)
    }

    /// Looks up `key` without promoting or reordering.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        let core = self.inner.read();
        core.frequent
            .peek(key)
            .or_else(|| core.recent.peek(key))
            .cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        let core = self.inner.read();
        core.frequent.contains(key) || core.recent.contains(key)
    }

    /// Removes `key` from whichever queue holds it, ghost list included.
    /// Returns `true` if a live entry was removed. No callback.
    pub fn remove(&self, key: &K) -> bool {
        let mut core = self.inner.write();
        if core.frequent.remove(key) || core.recent.remove(key) {
            return true;
        }
        core.ghost.remove(key);
        false
    }

    pub fn remove_many(&self, keys: &[K]) -> usize {
        keys.iter().filter(|key| self.remove(key)).count()
    }

    /// Removes the oldest entry of `recent`, or of `frequent` when `recent`
    /// is empty. No callback.
    pub fn remove_oldest(&self) -> Option<(K, Arc<V>)> {
        let mut core = self.inner.write();
        match core.recent.remove_oldest() {
            Some(entry) => Some(entry),
            None => core.frequent.remove_oldest(),
        }
    }

    pub fn get_oldest(&self) -> Option<(K, Arc<V>)> {
        let core = self.inner.read();
        core.recent
            .get_oldest()
            .or_else(|| core.frequent.get_oldest())
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
    }

    /// `frequent`'s keys followed by `recent`'s, each in the requested order.
    pub fn keys(&self, newest_first: bool) -> Vec<K> {
        let core = self.inner.read();
        let mut keys = core.frequent.keys(newest_first);
        keys.extend(core.recent.keys(newest_first));
        keys
    }

    pub fn values(&self, newest_first: bool) -> Vec<Arc<V>> {
        let core = self.inner.read();
        core.frequent
            .values(newest_first)
            .into_iter()
            .chain(core.recent.values(newest_first))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().size
    }

    pub fn recent_len(&self) -> usize {
        self.inner.read().recent.len()
    }

    pub fn frequent_len(&self) -> usize {
        self.inner.read().frequent.len()
    }

    pub fn ghost_len(&self) -> usize {
        self.inner.read().ghost.len()
    }

    /// Drops every entry and forgets all ghost keys. The callback runs once
    /// per live entry.
    pub fn purge(&self) {
        self.inner.write().purge();
    }

    /// Changes the capacity and recomputes the queue targets from the
    /// configured ratios. Returns how many entries were evicted.
    pub fn resize(&self, size: usize) -> Result<usize, ArgumentError> {
        self.inner.write().resize(size)
    }

    /// Validates internal invariants (debug-only).
    #[cfg(any(test, debug_assertions))]
    pub fn check_invariants(&self) -> Result<(), crate::error::InvariantError> {
        use crate::error::InvariantError;

        let core = self.inner.read();
        if core.len() > core.size {
            return Err(InvariantError::new(format!(
                "recent {} + frequent {} exceeds size {}",
                core.recent.len(),
                core.frequent.len(),
                core.size
            )));
        }
        if core.ghost.len() > core.ghost.capacity() {
            return Err(InvariantError::new(format!(
                "ghost list holds {} keys, capacity {}",
                core.ghost.len(),
                core.ghost.capacity()
            )));
        }
        for key in core.recent.keys(false) {
            if core.frequent.contains(&key) {
                return Err(InvariantError::new("key present in both recent and frequent"));
            }
            if core.ghost.contains(&key) {
                return Err(InvariantError::new("live recent key also tracked as ghost"));
            }
        }
        for key in core.frequent.keys(false) {
            if core.ghost.contains(&key) {
                return Err(InvariantError::new("live frequent key also tracked as ghost"));
            }
        }
        Ok(())
    }
}

impl<K, V> fmt::Debug for TwoQueueCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.read();
        f.debug_struct("TwoQueueCache")
            .field("size", &core.size)
            .field("recent_size", &core.recent_size)
            .field("recent_len", &core.recent.len())
            .field("frequent_len", &core.frequent.len())
            .field("ghost_len", &core.ghost.len())
            .finish()
    }
}

impl<K, V> ConcurrentCache for TwoQueueCache<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
}
