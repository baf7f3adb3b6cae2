pub use crate::builder::{Cache, CacheBuilder, CachePolicy};
pub use crate::error::{ArgumentError, ConfigError, InvariantError};
pub use crate::policy::clock::ClockCache;
pub use crate::policy::clock_sweep::ClockSweepCache;
pub use crate::policy::fifo::FifoCache;
pub use crate::policy::lfu::LfuCache;
pub use crate::policy::lru::LruCache;
pub use crate::policy::lru_k::LruKCache;
pub use crate::policy::two_q::TwoQueueCache;
pub use crate::policy::ws_clock::{MonotonicClock, TimeSource, WsClockCache};
pub use crate::traits::{ConcurrentCache, CoreCache, EvictCallback, OrderedCache};
