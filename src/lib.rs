//! fast-cache: bounded in-memory caches with pluggable eviction policies.
//!
//! Every engine shares one contract: a fixed capacity, `add` reporting
//! whether something was evicted, `get` applying the policy's hit
//! transition, and side-effect free `peek`/`contains`. See [`policy`] for
//! the engines and [`builder`] for a policy-erased front end.
//!
//! ```
//! use fast_cache::prelude::*;
//!
//! let mut lru = LruCache::new(2, None).unwrap();
//! lru.add("a", 1);
//! lru.add("b", 2);
//! lru.get(&"a");
//! lru.add("c", 3);
//! assert!(!lru.contains(&"b"));
//! ```

pub mod builder;
pub mod ds;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod traits;
