//! Concurrency primitives for cache population.
//!
//! - [`KeyedLock`]: per-key mutual exclusion used to serialize template
//!   compilation per path, with lease-counted tickets that disappear as soon as
//!   a key is no longer contended.

pub mod keyed_lock;

pub use keyed_lock::{KeyedLock, KeyedLockGuard};
