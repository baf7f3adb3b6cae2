//! Counting Clock (GClock) cache.
//!
//! Each slot carries a reference count. Re-adding or reading a key bumps its
//! count; the hand decrements counts as it sweeps and evicts the first entry
//! it finds at zero.
//!
//! ## Architecture
//!
//! ```text
//!   ring: ClockRing<K, V, u64>
//!
//!      slot 0        slot 1        slot 2        slot 3
//!   ┌─────────┐   ┌─────────┐   ┌─────────┐   ┌─────────┐
//!   │ A  c=2  │   │ B  c=0  │   │ C  c=1  │   │ (empty) │
//!   └─────────┘   └─────────┘   └─────────┘   └─────────┘
//!        ▲
//!       hand      add(D): A c=2→1, advance; B c=0 → victim
//! ```
//!
//! ## Eviction scan
//!
//! ```text
//!   loop at hand:
//!     empty slot       → reuse it, nothing evicted
//!     count > 0        → count -= 1, advance
//!     count == 0       → evict, write new entry (count = refs), advance
//! ```
//!
//! With every count at `c` the scan ends within `(c + 1) · capacity` steps.
//!
//! ## Thread Safety
//!
//! Not synchronized; wrap in a `Mutex` for shared use.
//!
//! ## Example Usage
//!
//! ```
//! use fast_cache::policy::clock::ClockCache;
//!
//! let mut cache = ClockCache::new(2, None).unwrap();
//! cache.add("a", 1);
//! cache.add("b", 2);
//! cache.get(&"a");
//!
//! assert!(cache.add("c", 3));
//! assert_eq!(cache.len(), 2);
//! assert!(cache.contains(&"c"));
//! ```
use std::fmt;
use std::hash::Hash;

use crate::ds::{ClockRing, Sweep};
use crate::error::ConfigError;
use crate::traits::{CoreCache, EvictCallback};

/// Ring cache with an unbounded reference count per slot.
pub struct ClockCache<K, V> {
    ring: ClockRing<K, V, u64>,
    on_evict: Option<EvictCallback<K, V>>,
}

impl<K, V> ClockCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize, on_evict: Option<EvictCallback<K, V>>) -> Result<Self, ConfigError> {
        ConfigError::check_capacity(capacity)?;
        Ok(Self {
            ring: ClockRing::new(capacity),
            on_evict,
        })
    }

    /// Inserts `key` with a reference count of 1. An existing key gains one
    /// reference and takes the new value.
    ///
    /// Returns `true` if a resident entry was evicted to make room.
    pub fn add(&mut self, key: K, value: V) -> bool {
        self.add_with_refs(key, value, 1)
    }

    /// Like [`add`](Self::add), but a new entry starts at `references`.
    pub fn add_with_refs(&mut self, key: K, value: V, references: u64) -> bool {
        if let Some((slot_value, count)) = self.ring.get_mut(&key) {
            *count = count.saturating_add(1);
            *slot_value = value;
            return false;
        }

        self.ring.sweep(|count| {
            if *count > 0 {
                *count -= 1;
                Sweep::Advance
            } else {
                Sweep::Stop
            }
        });

        let slot = self.ring.hand();
        match self.ring.place(key, value, references) {
            Some((old_key, old_value)) => {
                log::trace!("clock evict at slot {slot}");
                if let Some(cb) = self.on_evict.as_mut() {
                    cb(old_key, old_value);
                }
                true
            },
            None => false,
        }
    }

    /// Looks up `key`, bumping its reference count on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.ring.get_mut(key).map(|(value, count)| {
            *count = count.saturating_add(1);
            &*value
        })
    }

    pub fn peek(&self, key: &K) -> Option<&V> {
        self.ring.get(key).map(|(value, _)| value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.ring.contains(key)
    }

    pub fn reference_count(&self, key: &K) -> Option<u64> {
        self.ring.get(key).map(|(_, count)| *count)
    }

    /// Empties the slot holding `key`. The eviction callback is not invoked.
    pub fn delete(&mut self, key: &K) -> bool {
        self.ring.remove(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> bool {
        self.delete(key)
    }

    /// Keys in slot order from slot 0.
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
        log::debug!("clock purge: {} entries", drained.len());
        if let Some(cb) = self.on_evict.as_mut() {
            for (key, value) in drained {
                cb(key, value);
            }
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.ring.debug_validate_invariants();
    }
}

impl<K, V> fmt::Debug for ClockCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockCache")
            .field("len", &self.ring.len())
            .field("capacity", &self.ring.capacity())
            .field("hand", &self.ring.hand())
            .finish()
    }
}

impl<K, V> CoreCache<K, V> for ClockCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn add(&mut self, key: K, value: V) -> bool {
        ClockCache::add(self, key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        ClockCache::get(self, key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        ClockCache::peek(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        ClockCache::contains(self, key)
    }

    fn remove(&mut self, key: &K) -> bool {
        ClockCache::delete(self, key)
    }

    fn len(&self) -> usize {
        self.ring.len()
    }

    fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    fn purge(&mut self) {
        ClockCache::purge(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording() -> (Arc<Mutex<Vec<(&'static str, i32)>>>, EvictCallback<&'static str, i32>) {
        let log: Arc<Mutex<Vec<(&'static str, i32)>>> = Arc::default();
        let sink = Arc::clone(&log);
        let cb: EvictCallback<&'static str, i32> =
            Box::new(move |k: &'static str, v: i32| sink.lock().unwrap().push((k, v)));
        (log, cb)
    }

    mod correctness {
        use super::*;

        mod basic_behavior {
            use super::*;

            #[test]
            fn rejects_zero_capacity() {
                assert!(ClockCache::<u32, u32>::new(0, None).is_err());
            }

            #[test]
            fn single_slot_replaces_entry() {
                let mut cache = ClockCache::new(1, None).unwrap();
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
            fn referenced_entry_survives_one_sweep() {
                let mut cache = ClockCache::new(3, None).unwrap();
                cache.add("a", 1);
                cache.add("b", 2);
                cache.add("c", 3);
                cache.get(&"b");
                cache.get(&"b");
                // a, c drop to 0 then a is the first zero the hand meets
                cache.add("d", 4);
                assert!(!cache.contains(&"a"));
                assert_eq!(cache.reference_count(&"b"), Some(2));
                cache.add("e", 5);
                assert!(!cache.contains(&"c"));
                assert!(cache.contains(&"b"));
                cache.debug_validate_invariants();
            }

            #[test]
            fn counts_track_adds_and_gets() {
                let mut cache = ClockCache::new(2, None).unwrap();
                cache.add("a", 1);
                assert_eq!(cache.reference_count(&"a"), Some(1));
                cache.add("a", 2);
                cache.get(&"a");
                assert_eq!(cache.reference_count(&"a"), Some(3));
                assert_eq!(cache.peek(&"a"), Some(&2));
                assert_eq!(cache.reference_count(&"a"), Some(3));
            }

            #[test]
            fn initial_references_delay_eviction() {
                let mut cache = ClockCache::new(2, None).unwrap();
                cache.add_with_refs("pinned", 1, 3);
                cache.add_with_refs("loose", 2, 0);
                cache.add("x", 3);
                assert!(cache.contains(&"pinned"));
                assert!(!cache.contains(&"loose"));
            }

            #[test]
            fn keys_follow_slot_order() {
                let mut cache = ClockCache::new(4, None).unwrap();
                for (i, k) in ["a", "b", "c"].into_iter().enumerate() {
                    cache.add(k, i as i32);
                }
                cache.delete(&"a");
                assert_eq!(cache.keys(), vec!["b", "c"]);
                assert_eq!(cache.values(), vec![&1, &2]);
            }
        }

        mod deletion_and_callbacks {
            use super::*;

            #[test]
            fn delete_frees_slot_without_callback() {
                let (log, cb) = recording();
                let mut cache = ClockCache::new(1, Some(cb)).unwrap();
                cache.add("foo", 1);
                assert!(!cache.delete(&"foo2"));
                assert_eq!(cache.len(), 1);
                assert!(cache.delete(&"foo"));
                assert_eq!(cache.len(), 0);
                assert_eq!(cache.get(&"foo"), None);
                assert!(log.lock().unwrap().is_empty());
            }

            #[test]
            fn eviction_reports_victim() {
                let (log, cb) = recording();
                let mut cache = ClockCache::new(1, Some(cb)).unwrap();
                cache.add("a", 1);
                cache.add("b", 2);
                assert_eq!(cache.get(&"a"), None);
                assert_eq!(cache.get(&"b"), Some(&2));
                cache.delete(&"a");
                cache.add("b", 3);
                assert_eq!(cache.get(&"b"), Some(&3));
                assert_eq!(*log.lock().unwrap(), vec![("a", 1)]);
            }

            #[test]
            fn purge_reports_every_entry() {
                let (log, cb) = recording();
                let mut cache = ClockCache::new(3, Some(cb)).unwrap();
                cache.add("a", 1);
                cache.add("b", 2);
                cache.purge();
                assert!(cache.is_empty());
                assert_eq!(*log.lock().unwrap(), vec![("a", 1), ("b", 2)]);
                cache.add("c", 3);
                assert_eq!(cache.keys(), vec!["c"]);
            }
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_bounded_and_consistent(
                capacity in 1usize..12,
                ops in prop::collection::vec((0u8..3, 0u32..24), 0..200)
            ) {
                let mut cache: ClockCache<u32, u32> = ClockCache::new(capacity, None).unwrap();
                for (op, key) in ops {
                    match op {
                        0 => { cache.add(key, key); },
                        1 => {
                            if let Some(v) = cache.get(&key) {
                                prop_assert_eq!(*v, key);
                            }
                        },
                        _ => { cache.delete(&key); },
                    }
                    prop_assert!(cache.len() <= capacity);
                    cache.debug_validate_invariants();
                }
            }
        }
    }
}
