//! Fixed-size slot ring with a movable hand, shared by the Clock engines.
//!
//! The ring only owns placement: which slot a key lives in, where the hand
//! points, and what happens when a new entry is written under the hand.
//! Each engine stores its own per-slot metadata `M` (a reference count, a
//! reference/usage pair, a flag plus timestamp) and decides how the hand
//! moves during an eviction scan.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                       ClockRing<K, V, M>                              │
//!   │                                                                       │
//!   │   slots: Vec<Option<Slot<K, V, M>>>       hand ──────────┐            │
//!   │                                                          ▼            │
//!   │   index: FxHashMap<K, usize>        slot[0]  [A meta]                 │
//!   │   ┌─────────┬─────────┐             slot[1]  [B meta]  ◄── hand       │
//!   │   │  key A  │   0     │             slot[2]  [ empty ]                │
//!   │   │  key B  │   1     │             slot[3]  [C meta]                 │
//!   │   │  key C  │   3     │                                               │
//!   │   └─────────┴─────────┘             head is always slot[0]            │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Notes
//! - Slot count is fixed at construction; the ring never resizes.
//! - `remove` empties a slot without moving the hand.
//! - `iter` walks from slot 0 in slot order, skipping empty slots.
use std::hash::Hash;

use rustc_hash::FxHashMap;

#[derive(Debug)]
struct Slot<K, V, M> {
    key: K,
    value: V,
    meta: M,
}

/// Outcome of visiting the slot under the hand during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    /// Keep the entry and move the hand on.
    Advance,
    /// The entry under the hand is the victim.
    Stop,
}

/// Ring of `capacity` slots addressed by a hash index.
#[derive(Debug)]
pub struct ClockRing<K, V, M> {
    slots: Vec<Option<Slot<K, V, M>>>,
    index: FxHashMap<K, usize>,
    hand: usize,
    len: usize,
}

impl<K, V, M> ClockRing<K, V, M>
where
    K: Eq + Hash + Clone,
{
    /// Creates a ring with `capacity` empty slots and the hand at slot 0.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            hand: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Slot index currently under the hand.
    pub fn hand(&self) -> usize {
        self.hand
    }

    pub fn get(&self, key: &K) -> Option<(&V, &M)> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_ref().map(|s| (&s.value, &s.meta))
    }

    pub fn get_mut(&mut self, key: &K) -> Option<(&mut V, &mut M)> {
        let idx = *self.index.get(key)?;
        self.slots[idx]
            .as_mut()
            .map(|s| (&mut s.value, &mut s.meta))
    }

    /// Metadata of the entry in slot `idx`, or `None` for an empty slot.
    pub fn meta_at(&self, idx: usize) -> Option<&M> {
        self.slots.get(idx)?.as_ref().map(|s| &s.meta)
    }

    pub fn meta_at_mut(&mut self, idx: usize) -> Option<&mut M> {
        self.slots.get_mut(idx)?.as_mut().map(|s| &mut s.meta)
    }

    /// Moves the hand one slot forward, wrapping at the end.
    pub fn advance(&mut self) {
        if !self.slots.is_empty() {
            self.hand = (self.hand + 1) % self.slots.len();
        }
    }

    /// Points the hand at slot `idx`.
    pub fn set_hand(&mut self, idx: usize) {
        debug_assert!(idx < self.slots.len());
        self.hand = idx;
    }

    /// Advances the hand until it rests on an empty slot or `visit` returns
    /// [`Sweep::Stop`] for the entry under it. Returns the number of advances.
    ///
    /// `visit` must eventually stop (e.g. by decrementing a bounded counter);
    /// the ring does not cap the scan.
    pub fn sweep<F>(&mut self, mut visit: F) -> usize
    where
        F: FnMut(&mut M) -> Sweep,
    {
        let mut steps = 0;
        while let Some(slot) = self.slots.get_mut(self.hand).and_then(Option::as_mut) {
            match visit(&mut slot.meta) {
                Sweep::Stop => break,
                Sweep::Advance => {
                    self.advance();
                    steps += 1;
                },
            }
        }
        steps
    }

    /// Writes a new entry into the slot under the hand and advances the hand.
    ///
    /// Whatever occupied the slot is evicted and returned. The key must not
    /// already be present.
    pub fn place(&mut self, key: K, value: V, meta: M) -> Option<(K, V)> {
        debug_assert!(!self.index.contains_key(&key));
        if self.slots.is_empty() {
            return None;
        }
        let idx = self.hand;
        let evicted = self.slots[idx].take().map(|old| {
            self.index.remove(&old.key);
            self.len -= 1;
            (old.key, old.value)
        });
        self.index.insert(key.clone(), idx);
        self.slots[idx] = Some(Slot { key, value, meta });
        self.len += 1;
        self.advance();
        evicted
    }

    /// Empties the slot holding `key`; the hand stays where it is.
    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let idx = self.index.remove(key)?;
        let slot = self.slots[idx].take()?;
        self.len -= 1;
        Some((slot.key, slot.value))
    }

    /// Entries in slot order starting from slot 0.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V, &M)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|s| (&s.key, &s.value, &s.meta)))
    }

    /// Empties every slot in slot order and resets the hand to slot 0.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        let mut out = Vec::with_capacity(self.len);
        for slot in &mut self.slots {
            if let Some(s) = slot.take() {
                out.push((s.key, s.value));
            }
        }
        self.index.clear();
        self.hand = 0;
        self.len = 0;
        out
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.len, self.index.len());
        assert!(self.len <= self.slots.len());
        if !self.slots.is_empty() {
            assert!(self.hand < self.slots.len());
        }
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        assert_eq!(occupied, self.len);
        for (key, &idx) in &self.index {
            let slot = self.slots[idx].as_ref().expect("index points to empty slot");
            assert!(&slot.key == key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<V, M>(ring: &ClockRing<&'static str, V, M>) -> Vec<&'static str> {
        ring.iter().map(|(k, _, _)| *k).collect()
    }

    #[test]
    fn clock_ring_place_fills_slots_in_order() {
        let mut ring: ClockRing<&str, i32, u8> = ClockRing::new(3);
        assert_eq!(ring.place("a", 1, 0), None);
        assert_eq!(ring.place("b", 2, 0), None);
        assert_eq!(ring.hand(), 2);
        assert_eq!(ring.len(), 2);
        assert_eq!(keys(&ring), vec!["a", "b"]);
        ring.debug_validate_invariants();
    }

    #[test]
    fn clock_ring_place_evicts_occupant_and_wraps() {
        let mut ring: ClockRing<&str, i32, u8> = ClockRing::new(2);
        ring.place("a", 1, 0);
        ring.place("b", 2, 0);
        assert_eq!(ring.hand(), 0);
        assert_eq!(ring.place("c", 3, 0), Some(("a", 1)));
        assert!(!ring.contains(&"a"));
        assert_eq!(keys(&ring), vec!["c", "b"]);
        assert_eq!(ring.len(), 2);
        ring.debug_validate_invariants();
    }

    #[test]
    fn clock_ring_sweep_stops_on_victim() {
        let mut ring: ClockRing<&str, (), u32> = ClockRing::new(3);
        ring.place("a", (), 1);
        ring.place("b", (), 0);
        ring.place("c", (), 2);
        assert_eq!(ring.hand(), 0);

        let steps = ring.sweep(|count| {
            if *count > 0 {
                *count -= 1;
                Sweep::Advance
            } else {
                Sweep::Stop
            }
        });
        assert_eq!(steps, 1);
        assert_eq!(ring.hand(), 1);
        assert_eq!(ring.get(&"a").map(|(_, m)| *m), Some(0));
    }

    #[test]
    fn clock_ring_sweep_stops_at_empty_slot() {
        let mut ring: ClockRing<&str, (), u32> = ClockRing::new(3);
        ring.place("a", (), 5);
        ring.set_hand(0);
        let steps = ring.sweep(|_| Sweep::Advance);
        assert_eq!(steps, 1);
        assert_eq!(ring.hand(), 1);
        assert_eq!(ring.meta_at(1), None);
    }

    #[test]
    fn clock_ring_remove_keeps_hand() {
        let mut ring: ClockRing<&str, i32, ()> = ClockRing::new(3);
        ring.place("a", 1, ());
        ring.place("b", 2, ());
        let hand = ring.hand();
        assert_eq!(ring.remove(&"a"), Some(("a", 1)));
        assert_eq!(ring.remove(&"a"), None);
        assert_eq!(ring.hand(), hand);
        assert_eq!(keys(&ring), vec!["b"]);
        ring.debug_validate_invariants();
    }

    #[test]
    fn clock_ring_get_mut_updates_value_and_meta() {
        let mut ring: ClockRing<&str, i32, u8> = ClockRing::new(1);
        ring.place("a", 1, 0);
        if let Some((value, meta)) = ring.get_mut(&"a") {
            *value = 10;
            *meta = 3;
        }
        assert_eq!(ring.get(&"a"), Some((&10, &3)));
        assert_eq!(ring.meta_at(0), Some(&3));
        *ring.meta_at_mut(0).unwrap() = 4;
        assert_eq!(ring.get(&"a"), Some((&10, &4)));
    }

    #[test]
    fn clock_ring_drain_resets() {
        let mut ring: ClockRing<&str, i32, ()> = ClockRing::new(3);
        ring.place("a", 1, ());
        ring.place("b", 2, ());
        assert_eq!(ring.drain(), vec![("a", 1), ("b", 2)]);
        assert!(ring.is_empty());
        assert_eq!(ring.hand(), 0);
        assert_eq!(ring.capacity(), 3);
        ring.debug_validate_invariants();
    }
}
