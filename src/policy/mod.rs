//! Eviction engines.
//!
//! | Module        | Policy                    | Backing structure |
//! |---------------|---------------------------|-------------------|
//! | [`fifo`]      | First in, first out       | `OrderedIndex`    |
//! | [`lru`]       | Least recently used       | `OrderedIndex`    |
//! | [`two_q`]     | 2Q with ghost list        | two LRUs + ghost  |
//! | [`lru_k`]     | History-gated LRU         | two LRUs + counts |
//! | [`lfu`]       | Least frequently used     | `PriorityIndex`   |
//! | [`clock`]     | Counting clock (GClock)   | `ClockRing`       |
//! | [`clock_sweep`] | Reference + usage clock | `ClockRing`       |
//! | [`ws_clock`]  | Working-set clock         | `ClockRing`       |
//!
//! Only [`two_q`] and [`lru_k`] synchronize internally; the rest need
//! `&mut self` for every mutation.

pub mod clock;
pub mod clock_sweep;
pub mod fifo;
pub mod lfu;
pub mod lru;
pub mod lru_k;
pub mod two_q;
pub mod ws_clock;
