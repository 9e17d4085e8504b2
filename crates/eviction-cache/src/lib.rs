//! Byte-budgeted eviction cache
//!
//! An in-memory, recency-ordered index whose total size never exceeds a
//! configured budget. Evicted values are published on an [`EventBus`] so
//! that whoever owns the backing storage can clean up after them without
//! the cache knowing where that storage lives.

mod budget;
mod bus;
mod cache;
mod types;

pub use budget::parse_size;
pub use bus::{CacheEvent, EventBus};
pub use cache::EvictionCache;
pub use types::{CacheStats, CacheValue};
