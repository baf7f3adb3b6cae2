//! LRU-K cache built from two LRU queues and an access counter.
//!
//! A key has to be referenced `k` times before it is trusted into the
//! `frequent` queue. Until then it lives in `recent`, which doubles as the
//! access history, and its references are counted per key. This
//! approximates "evict the entry whose K-th most recent access is oldest"
//! without storing K timestamps per key.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                          LruKCache<K, V> Layout                             │
//! │                                                                             │
//! │   RwLock<LruKCore>                                                          │
//! │   ┌─────────────────────────────────────────────────────────────────────┐   │
//! │   │  recent:   LruCache<K, Arc<V>>    fewer than k references           │   │
//! │   │  counts:   FxHashMap<K, usize>    one counter per `recent` key      │   │
//! │   │  frequent: LruCache<K, Arc<V>>    promoted, no counter kept         │   │
//! │   └─────────────────────────────────────────────────────────────────────┘   │
//! │                                                                             │
//! │   add/get ──► recent (count += 1) ──(count >= k)──► frequent                │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Eviction
//!
//! A new key first frees a slot when the cache is full: `recent`'s oldest
//! goes while `recent` holds at least its target share (`⌊size·ratio⌋`) of
//! entries, otherwise `frequent`'s oldest. A counter is dropped whenever
//! its key leaves `recent`.
//!
//! ## Concurrency
//!
//! Same locking as [`TwoQueueCache`](crate::policy::two_q::TwoQueueCache):
//! one `parking_lot::RwLock`, with `get` taking the write lock.
//!
//! ## Example Usage
//!
//! ```
//! use fast_cache::policy::lru_k::LruKCache;
//!
//! let cache = LruKCache::new(5, 2).unwrap();
//! cache.add("page", 1);
//! assert_eq!(cache.frequent_len(), 0);
//! assert_eq!(cache.access_count(&"page"), Some(1));
//!
//! // second reference promotes
//! cache.get(&"page");
//! assert_eq!(cache.frequent_len(), 1);
//! assert_eq!(cache.access_count(&"page"), None);
//! ```
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{ArgumentError, ConfigError};
use crate::policy::lru::LruCache;
use crate::policy::two_q::DEFAULT_RECENT_RATIO;
use crate::traits::{ConcurrentCache, EvictCallback};

/// Default number of references required for promotion.
pub const DEFAULT_K: usize = 2;

struct LruKCore<K, V> {
    size: usize,
    recent_size: usize,
    recent_ratio: f64,
    k: usize,
    recent: LruCache<K, Arc<V>>,
    frequent: LruCache<K, Arc<V>>,
    counts: FxHashMap<K, usize>,
    on_evict: Option<EvictCallback<K, Arc<V>>>,
}

impl<K, V> LruKCore<K, V>
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

        let evicted = if self.recent.contains(&key) {
            false
        } else {
            self.ensure_space()
        };
        self.recent.add(key.clone(), value);
        self.reference(key);
        evicted
    }

    fn get(&mut self, key: &K) -> Option<Arc<V>> {
        if let Some(value) = self.frequent.get(key) {
            return Some(Arc::clone(value));
        }

        let value = Arc::clone(self.recent.get(key)?);
        self.reference(key.clone());
        Some(value)
    }

    /// Counts one reference to a `recent` key and promotes it at `k`.
    fn reference(&mut self, key: K) {
        let count = self.counts.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count < self.k {
            return;
        }

        self.counts.remove(&key);
        if let Some((key, value)) = self.recent.take(&key) {
            self.frequent.add(key, value);
        }
    }

    /// Frees one slot if the cache is full. Returns `true` if it evicted.
    fn ensure_space(&mut self) -> bool {
        let recent_len = self.recent.len();
        let frequent_len = self.frequent.len();
        if recent_len + frequent_len < self.size {
            return false;
        }

        let from_recent = recent_len > 0 && (recent_len >= self.recent_size || frequent_len == 0);
        let victim = if from_recent {
            self.recent.remove_oldest().inspect(|(key, _)| {
                self.counts.remove(key);
            })
        } else {
            self.frequent.remove_oldest()
        };

        match victim {
            Some((key, value)) => {
                log::trace!("lru-k evict from {}", if from_recent { "recent" } else { "frequent" });
                if let Some(cb) = self.on_evict.as_mut() {
                    cb(key, value);
                }
                true
            },
            None => false,
        }
    }

    fn remove(&mut self, key: &K) -> bool {
        if self.frequent.remove(key) {
            return true;
        }
        self.counts.remove(key);
        self.recent.remove(key)
    }

    fn resize(&mut self, size: usize) -> Result<usize, ArgumentError> {
        let diff = self.len().saturating_sub(size);
        ArgumentError::check_resize(size, diff)?;

        self.size = size;
        self.recent_size = (size as f64 * self.recent_ratio) as usize;
        for _ in 0..diff {
            self.ensure_space();
        }

        self.recent.resize(size)?;
        self.frequent.resize(size)?;
        log::debug!("lru-k resize: size {}, evicted {}", size, diff);
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
        self.counts.clear();
        log::debug!("lru-k purge: {} entries", drained.len());
        if let Some(cb) = self.on_evict.as_mut() {
            for (key, value) in drained {
                cb(key, value);
            }
        }
    }
}

/// Thread-safe LRU-K cache. Values are shared as `Arc<V>`.
pub struct LruKCache<K, V> {
    inner: RwLock<LruKCore<K, V>>,
}

impl<K, V> LruKCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache promoting after `k` references, with the default
    /// recent ratio and no callback.
    pub fn new(size: usize, k: usize) -> Result<Self, ConfigError> {
        Self::try_with_params(size, DEFAULT_RECENT_RATIO, k, None)
    }

    pub fn try_with_params(
        size: usize,
        recent_ratio: f64,
        k: usize,
        on_evict: Option<EvictCallback<K, Arc<V>>>,
    ) -> Result<Self, ConfigError> {
        ConfigError::check_capacity(size)?;
        ConfigError::check_ratio("recent ratio", recent_ratio)?;
        if k == 0 {
            return Err(ConfigError::new("k must be greater than zero"));
        }

        let core = LruKCore {
            size,
            recent_size: (size as f64 * recent_ratio) as usize,
            recent_ratio,
            k,
            recent: LruCache::new(size, None)?,
            frequent: LruCache::new(size, None)?,
            counts: FxHashMap::with_capacity_and_hasher(size, Default::default()),
            on_evict,
        };
        Ok(Self {
            inner: RwLock::new(core),
        })
    }

    /// Inserts or updates `key` and counts a reference to it.
    ///
    /// The value is replaced wherever the key currently lives. Returns
    /// `true` if an entry was evicted to make room.
    pub fn add(&self, key: K, value: V) -> bool {
        self.inner.write().add(key, Arc::new(value))
    }

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

    /// Looks up `key`. A hit in `recent` counts as a reference and may
    /// promote the key.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.inner.write().get(key)
    }

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

    /// Removes `key` and its reference count. No callback.
    pub fn remove(&self, key: &K) -> bool {
        self.inner.write().remove(key)
    }

    pub fn remove_many(&self, keys: &[K]) -> usize {
        let mut core = self.inner.write();
        keys.iter().filter(|key| core.remove(key)).count()
    }

    /// Removes the oldest entry of `recent`, or of `frequent` when `recent`
    /// is empty. No callback.
    pub fn remove_oldest(&self) -> Option<(K, Arc<V>)> {
        let mut core = self.inner.write();
        if let Some((key, value)) = core.recent.remove_oldest() {
            core.counts.remove(&key);
            return Some((key, value));
        }
        core.frequent.remove_oldest()
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

    /// Promotion threshold.
    pub fn k(&self) -> usize {
        self.inner.read().k
    }

    pub fn recent_len(&self) -> usize {
        self.inner.read().recent.len()
    }

    pub fn frequent_len(&self) -> usize {
        self.inner.read().frequent.len()
    }

    /// References counted so far for a key still in `recent`.
    pub fn access_count(&self, key: &K) -> Option<usize> {
        self.inner.read().counts.get(key).copied()
    }

    pub fn purge(&self) {
        self.inner.write().purge();
    }

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
        if core.counts.len() != core.recent.len() {
            return Err(InvariantError::new(format!(
                "{} counters for {} recent keys",
                core.counts.len(),
                core.recent.len()
            )));
        }
        for (key, &count) in &core.counts {
            if !core.recent.contains(key) {
                return Err(InvariantError::new("counter kept for key outside recent"));
            }
            if count == 0 || count >= core.k {
                return Err(InvariantError::new(format!(
                    "recent key has count {count}, k = {}",
                    core.k
                )));
            }
            if core.frequent.contains(key) {
                return Err(InvariantError::new("key present in both recent and frequent"));
            }
        }
        Ok(())
    }
}

impl<K, V> fmt::Debug for LruKCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.read();
        f.debug_struct("LruKCache")
            .field("size", &core.size)
            .field("k", &core.k)
            .field("recent_len", &core.recent.len())
            .field("frequent_len", &core.frequent.len())
            .finish()
    }
}

impl<K, V> ConcurrentCache for LruKCache<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn languages() -> LruKCache<i32, &'static str> {
        let cache = LruKCache::new(5, 2).unwrap();
        for (k, v) in [(1, "Java"), (2, "Go"), (3, "Python"), (4, "C++"), (5, "C")] {
            cache.add(k, v);
        }
        cache
    }

    mod correctness {
        use super::*;

        mod construction {
            use super::*;

            #[test]
            fn rejects_bad_parameters() {
                assert!(LruKCache::<u32, u32>::new(0, 2).is_err());
                let err = LruKCache::<u32, u32>::new(4, 0).unwrap_err();
                assert!(err.message().contains('k'));
                assert!(LruKCache::<u32, u32>::try_with_params(4, 1.5, 2, None).is_err());
                assert_eq!(LruKCache::<u32, u32>::new(4, 3).unwrap().k(), 3);
            }
        }

        mod gating {
            use super::*;

            #[test]
            fn single_reference_stays_in_recent() {
                let cache = languages();
                assert_eq!(cache.frequent_len(), 0);
                assert_eq!(cache.recent_len(), 5);
                assert_eq!(cache.keys(true), vec![5, 4, 3, 2, 1]);
                for k in 1..=5 {
                    assert_eq!(cache.access_count(&k), Some(1));
                }
            }

            #[test]
            fn second_get_promotes() {
                let cache = languages();
                assert_eq!(cache.get(&3).as_deref(), Some(&"Python"));
                assert_eq!(cache.keys(true), vec![3, 5, 4, 2, 1]);
                assert_eq!(cache.frequent_len(), 1);
                assert_eq!(cache.access_count(&3), None);

                assert!(cache.add(6, "Rust"));
                assert_eq!(cache.keys(true), vec![3, 6, 5, 4, 2]);
                cache.check_invariants().unwrap();
            }

            #[test]
            fn second_add_promotes_and_replaces_value() {
                let cache = LruKCache::new(4, 2).unwrap();
                cache.add("a", 1);
                assert!(!cache.add("a", 2));
                assert_eq!(cache.frequent_len(), 1);
                assert_eq!(cache.peek(&"a").as_deref(), Some(&2));
                assert_eq!(cache.len(), 1);
            }

            #[test]
            fn re_add_below_k_updates_recent_value() {
                let cache = LruKCache::new(4, 3).unwrap();
                cache.add("a", 1);
                cache.add("b", 1);
                cache.add("a", 2);
                assert_eq!(cache.frequent_len(), 0);
                assert_eq!(cache.access_count(&"a"), Some(2));
                assert_eq!(cache.peek(&"a").as_deref(), Some(&2));
                assert_eq!(cache.keys(true), vec!["a", "b"]);
            }

            #[test]
            fn k_of_one_promotes_immediately() {
                let cache = LruKCache::new(3, 1).unwrap();
                cache.add(1, 1);
                assert_eq!(cache.frequent_len(), 1);
                assert_eq!(cache.recent_len(), 0);
                cache.check_invariants().unwrap();
            }

            #[test]
            fn get_miss_changes_nothing() {
                let cache = languages();
                assert!(cache.get(&99).is_none());
                assert_eq!(cache.access_count(&99), None);
                cache.check_invariants().unwrap();
            }
        }

        mod eviction {
            use super::*;

            #[test]
            fn new_key_never_overflows_capacity() {
                let cache = LruKCache::new(3, 2).unwrap();
                for k in 0..10 {
                    cache.add(k, k);
                    assert!(cache.len() <= 3);
                }
                cache.check_invariants().unwrap();
            }

            #[test]
            fn evicted_recent_key_loses_its_counter() {
                let cache = LruKCache::new(2, 3).unwrap();
                cache.add(1, 1);
                cache.add(1, 1);
                assert_eq!(cache.access_count(&1), Some(2));
                cache.add(2, 2);
                cache.add(3, 3);
                assert!(!cache.contains(&1));
                assert_eq!(cache.access_count(&1), None);
                cache.add(1, 1);
                assert_eq!(cache.access_count(&1), Some(1));
                cache.check_invariants().unwrap();
            }

            #[test]
            fn frequent_evicted_when_recent_below_share() {
                let cache = LruKCache::new(4, 2).unwrap();
                for k in 1..=4 {
                    cache.add(k, k);
                    cache.get(&k);
                }
                assert_eq!(cache.frequent_len(), 4);
                cache.add(5, 5);
                assert!(!cache.contains(&1));
                assert_eq!(cache.len(), 4);
            }

            #[test]
            fn callback_fires_for_evictions_and_purge() {
                let log: Arc<Mutex<Vec<u32>>> = Arc::default();
                let sink = Arc::clone(&log);
                let cb: EvictCallback<u32, Arc<u32>> =
                    Box::new(move |k: u32, _v: Arc<u32>| sink.lock().unwrap().push(k));
                let cache = LruKCache::try_with_params(2, 0.5, 2, Some(cb)).unwrap();
                cache.add(1, 1);
                cache.add(2, 2);
                cache.remove(&2);
                cache.add(3, 3);
                cache.add(4, 4);
                assert_eq!(*log.lock().unwrap(), vec![1]);
                cache.purge();
                let mut seen = log.lock().unwrap().clone();
                seen.sort();
                assert_eq!(seen, vec![1, 3, 4]);
                assert!(cache.is_empty());
                cache.check_invariants().unwrap();
            }
        }

        mod removal_and_resize {
            use super::*;

            #[test]
            fn remove_drops_counter() {
                let cache = languages();
                assert!(cache.remove(&2));
                assert!(!cache.remove(&2));
                assert_eq!(cache.access_count(&2), None);
                assert_eq!(cache.remove_many(&[1, 3, 42]), 2);
                assert_eq!(cache.len(), 2);
                cache.check_invariants().unwrap();
            }

            #[test]
            fn oldest_prefers_recent() {
                let cache = languages();
                cache.get(&1);
                assert_eq!(cache.get_oldest().map(|(k, _)| k), Some(2));
                assert_eq!(cache.remove_oldest().map(|(k, _)| k), Some(2));
                assert_eq!(cache.access_count(&2), None);
                cache.check_invariants().unwrap();
            }

            #[test]
            fn resize_shrinks() {
                let cache = languages();
                cache.get(&1);
                assert_eq!(cache.resize(2), Ok(3));
                assert_eq!(cache.len(), 2);
                assert_eq!(cache.capacity(), 2);
                cache.check_invariants().unwrap();

                let err = cache.resize(0).unwrap_err();
                assert_eq!(err.would_evict(), Some(2));
                assert_eq!(cache.len(), 2);
            }

            #[test]
            fn values_follow_keys() {
                let cache = languages();
                cache.get(&2);
                let values: Vec<&str> = cache.values(true).iter().map(|v| **v).collect();
                assert_eq!(values, vec!["Go", "C", "C++", "Python", "Java"]);
            }
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(u32),
            Get(u32),
            Remove(u32),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                3 => (0u32..30).prop_map(Op::Add),
                2 => (0u32..30).prop_map(Op::Get),
                1 => (0u32..30).prop_map(Op::Remove),
            ]
        }

        proptest! {
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_invariants_always_hold(
                size in 1usize..16,
                k in 1usize..4,
                recent_ratio in 0.0f64..=1.0,
                ops in prop::collection::vec(op_strategy(), 0..120)
            ) {
                let cache: LruKCache<u32, u32> =
                    LruKCache::try_with_params(size, recent_ratio, k, None).unwrap();
                for op in ops {
                    match op {
                        Op::Add(key) => { cache.add(key, key); },
                        Op::Get(key) => { cache.get(&key); },
                        Op::Remove(key) => { cache.remove(&key); },
                    }
                    prop_assert!(cache.len() <= size);
                    prop_assert!(cache.check_invariants().is_ok());
                }
            }
        }
    }
}
