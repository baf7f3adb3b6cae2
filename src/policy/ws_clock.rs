//! Working-Set Clock (WSClock) cache.
//!
//! Each slot holds a reference flag and the time of its last access. An
//! entry is *aged* once `last_access + window` lies in the past; aged,
//! unreferenced entries are preferred victims.
//!
//! ## Eviction scan
//!
//! The hand visits at most one full revolution:
//!
//! ```text
//!   at hand:
//!     empty                  → reuse, nothing evicted
//!     flag set               → clear flag, advance
//!     flag clear, aged       → victim
//!     flag clear, not aged   → remember if oldest so far, advance
//!
//!   after a full revolution:
//!     remembered slot        → victim (oldest last access)
//!     otherwise              → slot under the hand (its flag was just cleared)
//! ```
//!
//! An unreferenced entry still inside the window is never chosen while an
//! unreferenced aged one exists anywhere in the ring.
//!
//! ## Time
//!
//! Timestamps come from a [`TimeSource`]. [`MonotonicClock`] reads
//! [`Instant::now`]; tests substitute a manually advanced source.
//!
//! Not synchronized.
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::ds::ClockRing;
use crate::error::ConfigError;
use crate::traits::{CoreCache, EvictCallback};

/// Aging window applied by [`WsClockCache::new`].
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Supplies the current time to a [`WsClockCache`].
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-independent monotonic time via [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl TimeSource for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy)]
struct WsMeta {
    referenced: bool,
    last_access: Instant,
}

pub struct WsClockCache<K, V, T = MonotonicClock> {
    ring: ClockRing<K, V, WsMeta>,
    window: Duration,
    time: T,
    on_evict: Option<EvictCallback<K, V>>,
}

impl<K, V> WsClockCache<K, V, MonotonicClock>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache with the default five second window.
    pub fn new(capacity: usize, on_evict: Option<EvictCallback<K, V>>) -> Result<Self, ConfigError> {
        Self::try_with_window(capacity, DEFAULT_WINDOW, on_evict)
    }

    pub fn try_with_window(
        capacity: usize,
        window: Duration,
        on_evict: Option<EvictCallback<K, V>>,
    ) -> Result<Self, ConfigError> {
        Self::try_with_time_source(capacity, window, MonotonicClock, on_evict)
    }
}

impl<K, V, T> WsClockCache<K, V, T>
where
    K: Eq + Hash + Clone,
    T: TimeSource,
{
    pub fn try_with_time_source(
        capacity: usize,
        window: Duration,
        time: T,
        on_evict: Option<EvictCallback<K, V>>,
    ) -> Result<Self, ConfigError> {
        ConfigError::check_capacity(capacity)?;
        if window.is_zero() {
            return Err(ConfigError::new("window must be greater than zero"));
        }
        Ok(Self {
            ring: ClockRing::new(capacity),
            window,
            time,
            on_evict,
        })
    }

    /// Inserts `key` with its flag set. An existing key has its flag set and
    /// its value replaced; its last access time is left alone.
    ///
    /// Returns `true` if a resident entry was evicted.
    pub fn add(&mut self, key: K, value: V) -> bool {
        if let Some((slot_value, meta)) = self.ring.get_mut(&key) {
            meta.referenced = true;
            *slot_value = value;
            return false;
        }

        self.sweep();
        let slot = self.ring.hand();
        let meta = WsMeta {
            referenced: true,
            last_access: self.time.now(),
        };
        match self.ring.place(key, value, meta) {
            Some((old_key, old_value)) => {
                log::trace!("ws-clock evict at slot {slot}");
                if let Some(cb) = self.on_evict.as_mut() {
                    cb(old_key, old_value);
                }
                true
            },
            None => false,
        }
    }

    /// Looks up `key` and refreshes its last access time. The flag is not
    /// touched.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = self.time.now();
        self.ring.get_mut(key).map(|(value, meta)| {
            meta.last_access = now;
            &*value
        })
    }

    pub fn peek(&self, key: &K) -> Option<&V> {
        self.ring.get(key).map(|(value, _)| value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.ring.contains(key)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

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
        log::debug!("ws-clock purge: {} entries", drained.len());
        if let Some(cb) = self.on_evict.as_mut() {
            for (key, value) in drained {
                cb(key, value);
            }
        }
    }

    /// Leaves the hand on the slot to fill next. Returns the number of
    /// advances, never more than one revolution.
    fn sweep(&mut self) -> usize {
        let now = self.time.now();
        let window = self.window;
        let capacity = self.ring.capacity();
        let mut oldest: Option<(usize, Instant)> = None;

        for step in 0..capacity {
            let idx = self.ring.hand();
            let Some(meta) = self.ring.meta_at_mut(idx) else {
                return step;
            };
            if meta.referenced {
                meta.referenced = false;
            } else if meta
                .last_access
                .checked_add(window)
                .is_some_and(|deadline| deadline < now)
            {
                return step;
            } else if oldest.is_none_or(|(_, at)| meta.last_access < at) {
                oldest = Some((idx, meta.last_access));
            }
            self.ring.advance();
        }

        if let Some((idx, _)) = oldest {
            self.ring.set_hand(idx);
        }
        capacity
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.ring.debug_validate_invariants();
    }
}

impl<K, V, T> fmt::Debug for WsClockCache<K, V, T>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsClockCache")
            .field("len", &self.ring.len())
            .field("capacity", &self.ring.capacity())
            .field("window", &self.window)
            .field("hand", &self.ring.hand())
            .finish()
    }
}

impl<K, V, T> CoreCache<K, V> for WsClockCache<K, V, T>
where
    K: Eq + Hash + Clone,
    T: TimeSource,
{
    fn add(&mut self, key: K, value: V) -> bool {
        WsClockCache::add(self, key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        WsClockCache::get(self, key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        WsClockCache::peek(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        WsClockCache::contains(self, key)
    }

    fn remove(&mut self, key: &K) -> bool {
        WsClockCache::delete(self, key)
    }

    fn len(&self) -> usize {
        self.ring.len()
    }

    fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    fn purge(&mut self) {
        WsClockCache::purge(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone)]
    struct ManualClock(Arc<Mutex<Instant>>);

    impl ManualClock {
        fn new() -> Self {
            Self(Arc::new(Mutex::new(Instant::now())))
        }

        fn advance(&self, by: Duration) {
            *self.0.lock() += by;
        }
    }

    impl TimeSource for ManualClock {
        fn now(&self) -> Instant {
            *self.0.lock()
        }
    }

    fn manual(capacity: usize, window: Duration) -> (WsClockCache<&'static str, i32, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let cache = WsClockCache::try_with_time_source(capacity, window, clock.clone(), None).unwrap();
        (cache, clock)
    }

    mod correctness {
        use super::*;

        #[test]
        fn rejects_invalid_config() {
            assert!(WsClockCache::<u32, u32>::new(0, None).is_err());
            assert!(WsClockCache::<u32, u32>::try_with_window(2, Duration::ZERO, None).is_err());
            assert_eq!(
                WsClockCache::<u32, u32>::new(2, None).unwrap().window(),
                Duration::from_secs(5)
            );
        }

        #[test]
        fn single_slot_add_get_delete() {
            let mut c = WsClockCache::new(1, None).unwrap();
            c.add("a", 1);
            assert!(c.add("b", 2));
            assert_eq!(c.get(&"a"), None);
            assert_eq!(c.get(&"b"), Some(&2));
            assert_eq!(c.get(&"c"), None);
            assert!(!c.delete(&"a"));
            c.add("b", 3);
            assert_eq!(c.get(&"b"), Some(&3));
            assert!(c.delete(&"b"));
            assert!(c.is_empty());
        }

        #[test]
        fn all_referenced_evicts_under_hand() {
            let (mut c, clock) = manual(3, Duration::from_secs(10));
            c.add("a", 1);
            c.add("b", 2);
            c.add("c", 3);
            clock.advance(Duration::from_secs(1));
            c.add("d", 4);
            assert!(!c.contains(&"a"));
            assert_eq!(c.keys(), vec!["d", "b", "c"]);
            c.debug_validate_invariants();
        }

        #[test]
        fn fresh_unreferenced_entry_skipped_for_aged_one() {
            let (mut c, clock) = manual(3, Duration::from_secs(10));
            c.add("a", 1);
            c.add("b", 2);
            c.add("c", 3);
            clock.advance(Duration::from_secs(1));
            // clears every flag, evicts a; hand now rests on b
            c.add("d", 4);

            clock.advance(Duration::from_secs(20));
            c.get(&"b");
            // b: flag clear but recently read; c: flag clear and aged
            assert!(c.add("e", 5));
            assert!(c.contains(&"b"));
            assert!(!c.contains(&"c"));
        }

        #[test]
        fn no_aged_entry_picks_oldest_access() {
            let (mut c, clock) = manual(3, Duration::from_secs(60));
            c.add("a", 1);
            c.add("b", 2);
            c.add("c", 3);
            c.add("d", 4);
            // a evicted, flags of b and c cleared; hand on b
            clock.advance(Duration::from_secs(1));
            c.get(&"b");
            clock.advance(Duration::from_secs(1));
            c.get(&"c");
            // nothing aged: b has the oldest access among clear flags
            c.add("e", 5);
            assert!(!c.contains(&"b"));
            assert!(c.contains(&"c"));
            assert!(c.contains(&"d"));
        }

        #[test]
        fn re_add_sets_flag_without_refreshing_age() {
            let (mut c, clock) = manual(3, Duration::from_secs(10));
            c.add("a", 1);
            c.add("b", 2);
            c.add("c", 3);
            c.add("x", 0);
            // a evicted, b and c unflagged, hand on b
            clock.advance(Duration::from_secs(30));
            c.add("b", 20);

            c.add("y", 9);
            assert!(!c.contains(&"c"));
            assert_eq!(c.peek(&"b"), Some(&20));

            // b spent its flag on the last sweep and is still aged
            c.add("z", 7);
            assert!(!c.contains(&"b"));
            assert_eq!(c.len(), 3);
        }

        #[test]
        fn sweep_stays_within_one_revolution() {
            let (mut c, clock) = manual(8, Duration::from_secs(1));
            for (i, k) in ["a", "b", "c", "d", "e", "f", "g", "h"].into_iter().enumerate() {
                c.add(k, i as i32);
            }
            for _ in 0..3 {
                clock.advance(Duration::from_millis(100));
                assert!(c.sweep() <= c.capacity());
            }
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_len_never_exceeds_capacity(
                capacity in 1usize..10,
                ops in prop::collection::vec((0u8..4, 0u32..20), 0..150)
            ) {
                let clock = ManualClock::new();
                let mut c: WsClockCache<u32, u32, ManualClock> =
                    WsClockCache::try_with_time_source(capacity, Duration::from_secs(2), clock.clone(), None)
                        .unwrap();
                for (op, key) in ops {
                    match op {
                        0 => { c.add(key, key); },
                        1 => { c.get(&key); },
                        2 => { c.delete(&key); },
                        _ => clock.advance(Duration::from_millis(700)),
                    }
                    prop_assert!(c.len() <= capacity);
                    c.debug_validate_invariants();
                }
            }
        }
    }
}
