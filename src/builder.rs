//! Unified cache builder for all eviction policies.
//!
//! Collects the tuning knobs of every engine in one place and hands back a
//! [`Cache`] that dispatches to the chosen policy. Values come back as owned
//! clones, which hides the `Arc<V>` wrapping of the locked engines.
//!
//! ## Example
//!
//! ```rust
//! use fast_cache::builder::{CacheBuilder, CachePolicy};
//!
//! let mut cache = CacheBuilder::new(100)
//!     .recent_ratio(0.3)
//!     .try_build::<u64, String>(CachePolicy::TwoQ)
//!     .unwrap();
//! cache.add(1, "hello".to_string());
//! assert_eq!(cache.get(&1), Some("hello".to_string()));
//! ```

use std::hash::Hash;
use std::time::Duration;

use crate::error::ConfigError;
use crate::policy::clock::ClockCache;
use crate::policy::clock_sweep::{ClockSweepCache, DEFAULT_MAX_USAGE_COUNT};
use crate::policy::fifo::FifoCache;
use crate::policy::lfu::LfuCache;
use crate::policy::lru::LruCache;
use crate::policy::lru_k::{DEFAULT_K, LruKCache};
use crate::policy::two_q::{DEFAULT_GHOST_RATIO, DEFAULT_RECENT_RATIO, TwoQueueCache};
use crate::policy::ws_clock::{DEFAULT_WINDOW, WsClockCache};

/// Available cache eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// First In, First Out eviction.
    Fifo,
    /// Least Recently Used eviction.
    Lru,
    /// Two queues plus a ghost list; uses `recent_ratio` and `ghost_ratio`.
    TwoQ,
    /// History-gated LRU; uses `k` and `recent_ratio`.
    LruK,
    /// Least Frequently Used eviction (heap-based).
    Lfu,
    /// Counting clock (GClock).
    Clock,
    /// Reference plus usage count clock; uses `max_usage_count`.
    ClockSweep,
    /// Working-set clock; uses `window`.
    WsClock,
}

/// Unified cache wrapper that provides a consistent API regardless of policy.
pub struct Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    inner: CacheInner<K, V>,
}

enum CacheInner<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    Fifo(FifoCache<K, V>),
    Lru(LruCache<K, V>),
    TwoQ(TwoQueueCache<K, V>),
    LruK(LruKCache<K, V>),
    Lfu(LfuCache<K, V>),
    Clock(ClockCache<K, V>),
    ClockSweep(ClockSweepCache<K, V>),
    WsClock(WsClockCache<K, V>),
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Insert or update a key. Returns `true` if an entry was evicted.
    pub fn add(&mut self, key: K, value: V) -> bool {
        match &mut self.inner {
            CacheInner::Fifo(c) => c.add(key, value),
            CacheInner::Lru(c) => c.add(key, value),
            CacheInner::TwoQ(c) => c.add(key, value),
            CacheInner::LruK(c) => c.add(key, value),
            CacheInner::Lfu(c) => c.add(key, value),
            CacheInner::Clock(c) => c.add(key, value),
            CacheInner::ClockSweep(c) => c.add(key, value),
            CacheInner::WsClock(c) => c.add(key, value),
        }
    }

    /// Look up a key, applying the policy's hit transition.
    pub fn get(&mut self, key: &K) -> Option<V> {
        match &mut self.inner {
            CacheInner::Fifo(c) => c.get(key).cloned(),
            CacheInner::Lru(c) => c.get(key).cloned(),
            CacheInner::TwoQ(c) => c.get(key).map(|v| V::clone(&v)),
            CacheInner::LruK(c) => c.get(key).map(|v| V::clone(&v)),
            CacheInner::Lfu(c) => c.get(key).cloned(),
            CacheInner::Clock(c) => c.get(key).cloned(),
            CacheInner::ClockSweep(c) => c.get(key).cloned(),
            CacheInner::WsClock(c) => c.get(key).cloned(),
        }
    }

    /// Look up a key without touching policy state.
    pub fn peek(&self, key: &K) -> Option<V> {
        match &self.inner {
            CacheInner::Fifo(c) => c.peek(key).cloned(),
            CacheInner::Lru(c) => c.peek(key).cloned(),
            CacheInner::TwoQ(c) => c.peek(key).map(|v| V::clone(&v)),
            CacheInner::LruK(c) => c.peek(key).map(|v| V::clone(&v)),
            CacheInner::Lfu(c) => c.peek(key).cloned(),
            CacheInner::Clock(c) => c.peek(key).cloned(),
            CacheInner::ClockSweep(c) => c.peek(key).cloned(),
            CacheInner::WsClock(c) => c.peek(key).cloned(),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        match &self.inner {
            CacheInner::Fifo(c) => c.contains(key),
            CacheInner::Lru(c) => c.contains(key),
            CacheInner::TwoQ(c) => c.contains(key),
            CacheInner::LruK(c) => c.contains(key),
            CacheInner::Lfu(c) => c.contains(key),
            CacheInner::Clock(c) => c.contains(key),
            CacheInner::ClockSweep(c) => c.contains(key),
            CacheInner::WsClock(c) => c.contains(key),
        }
    }

    /// Remove a key without firing eviction callbacks.
    pub fn remove(&mut self, key: &K) -> bool {
        match &mut self.inner {
            CacheInner::Fifo(c) => c.remove(key),
            CacheInner::Lru(c) => c.remove(key),
            CacheInner::TwoQ(c) => c.remove(key),
            CacheInner::LruK(c) => c.remove(key),
            CacheInner::Lfu(c) => c.remove(key),
            CacheInner::Clock(c) => c.delete(key),
            CacheInner::ClockSweep(c) => c.delete(key),
            CacheInner::WsClock(c) => c.delete(key),
        }
    }

    pub fn len(&self) -> usize {
        match &self.inner {
            CacheInner::Fifo(c) => c.len(),
            CacheInner::Lru(c) => c.len(),
            CacheInner::TwoQ(c) => c.len(),
            CacheInner::LruK(c) => c.len(),
            CacheInner::Lfu(c) => c.len(),
            CacheInner::Clock(c) => c.len(),
            CacheInner::ClockSweep(c) => c.len(),
            CacheInner::WsClock(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        match &self.inner {
            CacheInner::Fifo(c) => c.capacity(),
            CacheInner::Lru(c) => c.capacity(),
            CacheInner::TwoQ(c) => c.capacity(),
            CacheInner::LruK(c) => c.capacity(),
            CacheInner::Lfu(c) => c.capacity(),
            CacheInner::Clock(c) => c.capacity(),
            CacheInner::ClockSweep(c) => c.capacity(),
            CacheInner::WsClock(c) => c.capacity(),
        }
    }

    /// Clear all entries.
    pub fn purge(&mut self) {
        match &mut self.inner {
            CacheInner::Fifo(c) => c.purge(),
            CacheInner::Lru(c) => c.purge(),
            CacheInner::TwoQ(c) => c.purge(),
            CacheInner::LruK(c) => c.purge(),
            CacheInner::Lfu(c) => c.purge(),
            CacheInner::Clock(c) => c.purge(),
            CacheInner::ClockSweep(c) => c.purge(),
            CacheInner::WsClock(c) => c.purge(),
        }
    }

    /// The policy this cache was built with.
    pub fn policy(&self) -> CachePolicy {
        match &self.inner {
            CacheInner::Fifo(_) => CachePolicy::Fifo,
            CacheInner::Lru(_) => CachePolicy::Lru,
            CacheInner::TwoQ(_) => CachePolicy::TwoQ,
            CacheInner::LruK(_) => CachePolicy::LruK,
            CacheInner::Lfu(_) => CachePolicy::Lfu,
            CacheInner::Clock(_) => CachePolicy::Clock,
            CacheInner::ClockSweep(_) => CachePolicy::ClockSweep,
            CacheInner::WsClock(_) => CachePolicy::WsClock,
        }
    }
}

impl<K, V> std::fmt::Debug for Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("policy", &self.policy())
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Builder for creating cache instances.
///
/// Parameters that a policy does not use are ignored by it. Validation
/// happens in [`try_build`](Self::try_build), against the selected policy
/// only.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    capacity: usize,
    recent_ratio: f64,
    ghost_ratio: f64,
    k: usize,
    window: Duration,
    max_usage_count: u32,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity and default
    /// tuning for every policy.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            recent_ratio: DEFAULT_RECENT_RATIO,
            ghost_ratio: DEFAULT_GHOST_RATIO,
            k: DEFAULT_K,
            window: DEFAULT_WINDOW,
            max_usage_count: DEFAULT_MAX_USAGE_COUNT,
        }
    }

    /// Share of the capacity targeted by the probationary queue (2Q, LRU-K).
    pub fn recent_ratio(mut self, ratio: f64) -> Self {
        self.recent_ratio = ratio;
        self
    }

    /// Ghost list size as a share of the capacity (2Q).
    pub fn ghost_ratio(mut self, ratio: f64) -> Self {
        self.ghost_ratio = ratio;
        self
    }

    /// References needed before promotion (LRU-K).
    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Aging window (WSClock).
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Usage count ceiling (Clock-Sweep).
    pub fn max_usage_count(mut self, max: u32) -> Self {
        self.max_usage_count = max;
        self
    }

    /// Build a cache with the specified policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the capacity is zero or a parameter used
    /// by `policy` is out of range.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fast_cache::builder::{CacheBuilder, CachePolicy};
    ///
    /// let lru = CacheBuilder::new(100).try_build::<u64, String>(CachePolicy::Lru);
    /// assert!(lru.is_ok());
    ///
    /// let bad = CacheBuilder::new(100).k(0).try_build::<u64, String>(CachePolicy::LruK);
    /// assert!(bad.is_err());
    /// ```
    pub fn try_build<K, V>(&self, policy: CachePolicy) -> Result<Cache<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        let capacity = self.capacity;
        let inner = match policy {
            CachePolicy::Fifo => CacheInner::Fifo(FifoCache::new(capacity, None)?),
            CachePolicy::Lru => CacheInner::Lru(LruCache::new(capacity, None)?),
            CachePolicy::TwoQ => CacheInner::TwoQ(TwoQueueCache::try_with_params(
                capacity,
                self.recent_ratio,
                self.ghost_ratio,
                None,
            )?),
            CachePolicy::LruK => CacheInner::LruK(LruKCache::try_with_params(
                capacity,
                self.recent_ratio,
                self.k,
                None,
            )?),
            CachePolicy::Lfu => CacheInner::Lfu(LfuCache::new(capacity, None)?),
            CachePolicy::Clock => CacheInner::Clock(ClockCache::new(capacity, None)?),
            CachePolicy::ClockSweep => CacheInner::ClockSweep(ClockSweepCache::try_with_max_usage(
                capacity,
                self.max_usage_count,
                None,
            )?),
            CachePolicy::WsClock => {
                CacheInner::WsClock(WsClockCache::try_with_window(capacity, self.window, None)?)
            },
        };
        log::debug!("built {policy:?} cache with capacity {capacity}");
        Ok(Cache { inner })
    }
}
