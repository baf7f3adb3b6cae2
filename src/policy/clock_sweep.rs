//! Clock-Sweep cache: a clock with a reference count and a usage count per
//! slot, in the style of a buffer-pool replacement sweep.
//!
//! New entries start with one reference and no usage. Hits raise the usage
//! count up to `max_usage_count`. The hand first spends the reference, then
//! drains usage one step per pass, and evicts an entry once both are zero.
//!
//! ```text
//!   at hand:
//!     empty                      → reuse, nothing evicted
//!     references > 0             → references -= 1, advance
//!     references == 0, usage > 0 → usage -= 1, advance
//!     both zero                  → victim
//! ```
//!
//! Each slot can hold the hand for at most `1 + max_usage_count` advances
//! before it becomes a victim, so a scan finishes within
//! `(1 + max_usage_count) · capacity` steps.
//!
//! Not synchronized.
use std::fmt;
use std::hash::Hash;

use crate::ds::{ClockRing, Sweep};
use crate::error::ConfigError;
use crate::traits::{CoreCache, EvictCallback};

/// Usage cap applied by [`ClockSweepCache::new`].
pub const DEFAULT_MAX_USAGE_COUNT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SweepMeta {
    references: u32,
    usage: u32,
}

pub struct ClockSweepCache<K, V> {
    ring: ClockRing<K, V, SweepMeta>,
    max_usage_count: u32,
    on_evict: Option<EvictCallback<K, V>>,
}

impl<K, V> ClockSweepCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize, on_evict: Option<EvictCallback<K, V>>) -> Result<Self, ConfigError> {
        Self::try_with_max_usage(capacity, DEFAULT_MAX_USAGE_COUNT, on_evict)
    }

    /// Creates a cache whose usage counts saturate at `max_usage_count`.
    pub fn try_with_max_usage(
        capacity: usize,
        max_usage_count: u32,
        on_evict: Option<EvictCallback<K, V>>,
    ) -> Result<Self, ConfigError> {
        ConfigError::check_capacity(capacity)?;
        if max_usage_count == 0 {
            return Err(ConfigError::new("max usage count must be greater than zero"));
        }
        Ok(Self {
            ring: ClockRing::new(capacity),
            max_usage_count,
            on_evict,
        })
    }

    /// Inserts `key`, or bumps the usage of an existing key and replaces its
    /// value. Returns `true` if a resident entry was evicted.
    pub fn add(&mut self, key: K, value: V) -> bool {
        let max = self.max_usage_count;
        if let Some((slot_value, meta)) = self.ring.get_mut(&key) {
            meta.usage = meta.usage.saturating_add(1).min(max);
            *slot_value = value;
            return false;
        }

        self.evict_scan();
        let slot = self.ring.hand();
        let meta = SweepMeta {
            references: 1,
            usage: 0,
        };
        match self.ring.place(key, value, meta) {
            Some((old_key, old_value)) => {
                log::trace!("clock-sweep evict at slot {slot}");
                if let Some(cb) = self.on_evict.as_mut() {
                    cb(old_key, old_value);
                }
                true
            },
            None => false,
        }
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        let max = self.max_usage_count;
        self.ring.get_mut(key).map(|(value, meta)| {
            meta.usage = meta.usage.saturating_add(1).min(max);
            &*value
        })
    }

    pub fn peek(&self, key: &K) -> Option<&V> {
        self.ring.get(key).map(|(value, _)| value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.ring.contains(key)
    }

    pub fn usage_count(&self, key: &K) -> Option<u32> {
        self.ring.get(key).map(|(_, meta)| meta.usage)
    }

    pub fn max_usage_count(&self) -> u32 {
        self.max_usage_count
    }

    /// Empties the slot holding `key` without invoking the callback.
    pub fn delete(&mut self, key: &K) -> bool {
        self.ring.remove(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> bool {
        self.delete(key)
    }

    pub fn keys(&self) -> Vec<K> {
        self.ring.iter().map(|(k, _, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<&V> {
        self.ring.iter().map(|(_, v, _)| v).collect()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn purge(&mut self) {
        let drained = self.ring.drain();
        log::debug!("clock-sweep purge: {} entries", drained.len());
        if let Some(cb) = self.on_evict.as_mut() {
            for (key, value) in drained {
                cb(key, value);
            }
        }
    }

    /// Moves the hand to the next victim or empty slot; returns the number
    /// of advances taken.
    fn evict_scan(&mut self) -> usize {
        self.ring.sweep(|meta| {
            if meta.references > 0 {
                meta.references -= 1;
                Sweep::Advance
            } else if meta.usage > 0 {
                meta.usage -= 1;
                Sweep::Advance
            } else {
                Sweep::Stop
            }
        })
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.ring.debug_validate_invariants();
        for (_, _, meta) in self.ring.iter() {
            assert!(meta.references <= 1);
            assert!(meta.usage <= self.max_usage_count);
        }
    }
}

impl<K, V> fmt::Debug for ClockSweepCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockSweepCache")
            .field("len", &self.ring.len())
            .field("capacity", &self.ring.capacity())
            .field("max_usage_count", &self.max_usage_count)
            .field("hand", &self.ring.hand())
            .finish()
    }
}

impl<K, V> CoreCache<K, V> for ClockSweepCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn add(&mut self, key: K, value: V) -> bool {
        ClockSweepCache::add(self, key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        ClockSweepCache::get(self, key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        ClockSweepCache::peek(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        ClockSweepCache::contains(self, key)
    }

    fn remove(&mut self, key: &K) -> bool {
        ClockSweepCache::delete(self, key)
    }

    fn len(&self) -> usize {
        self.ring.len()
    }

    fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    fn purge(&mut self) {
        ClockSweepCache::purge(self)
    }
}
