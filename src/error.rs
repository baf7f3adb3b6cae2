//! Error types for the fast-cache library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned by constructors when cache parameters are
//!   invalid (zero capacity, out-of-range ratios, `k == 0`, ...).
//! - [`ArgumentError`]: Returned by operations whose arguments are malformed
//!   (mismatched `add_many` batches, `resize(0)`).
//! - [`InvariantError`]: Returned by debug-only `check_invariants` methods.
//!
//! Absence of a key is never an error; lookups return `Option`/`bool`.
//!
//! ## Example Usage
//!
//! ```
//! use fast_cache::error::ConfigError;
//! use fast_cache::policy::two_q::TwoQueueCache;
//!
//! let cache: Result<TwoQueueCache<String, i32>, ConfigError> =
//!     TwoQueueCache::try_with_params(100, 0.25, 0.5, None);
//! assert!(cache.is_ok());
//!
//! let bad = TwoQueueCache::<String, i32>::try_with_params(100, 2.0, 0.5, None);
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Only ever produced at construction time.
///
/// ```
/// use fast_cache::policy::lru::LruCache;
///
/// let err = LruCache::<u64, u64>::new(0, None).unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }

    pub(crate) fn check_capacity(capacity: usize) -> Result<(), Self> {
        if capacity == 0 {
            return Err(Self::new("capacity must be greater than zero"));
        }
        Ok(())
    }

    pub(crate) fn check_ratio(name: &str, ratio: f64) -> Result<(), Self> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(Self::new(format!("{name} must be within [0, 1], got {ratio}")));
        }
        Ok(())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// ArgumentError
// ---------------------------------------------------------------------------

/// Error returned when an operation receives malformed arguments.
///
/// The cache is left untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// `add_many` was called with key and value batches of different length.
    LengthMismatch { keys: usize, values: usize },
    /// `resize` was called with a size of zero. `would_evict` is the number
    /// of entries such a resize would have had to drop.
    InvalidSize { requested: usize, would_evict: usize },
}

impl ArgumentError {
    /// Number of entries the rejected resize would have evicted, if this is
    /// an [`ArgumentError::InvalidSize`].
    pub fn would_evict(&self) -> Option<usize> {
        match self {
            Self::InvalidSize { would_evict, .. } => Some(*would_evict),
            Self::LengthMismatch { .. } => None,
        }
    }

    pub(crate) fn check_batch(keys: usize, values: usize) -> Result<(), Self> {
        if keys != values {
            return Err(Self::LengthMismatch { keys, values });
        }
        Ok(())
    }

    pub(crate) fn check_resize(requested: usize, len: usize) -> Result<(), Self> {
        if requested == 0 {
            return Err(Self::InvalidSize {
                requested,
                would_evict: len,
            });
        }
        Ok(())
    }
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { keys, values } => write!(
                f,
                "key/value batch length mismatch: {keys} keys, {values} values"
            ),
            Self::InvalidSize {
                requested,
                would_evict,
            } => write!(
                f,
                "must provide a positive size (requested {requested}, would evict {would_evict})"
            ),
        }
    }
}

impl std::error::Error for ArgumentError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
