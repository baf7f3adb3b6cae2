pub mod clock_ring;
pub mod ghost_list;
pub mod intrusive_list;
pub mod ordered_index;
pub mod priority_index;
pub mod slot_arena;

pub use clock_ring::{ClockRing, Sweep};
pub use ghost_list::GhostList;
pub use intrusive_list::IntrusiveList;
pub use ordered_index::OrderedIndex;
pub use priority_index::PriorityIndex;
pub use slot_arena::{SlotArena, SlotId};
