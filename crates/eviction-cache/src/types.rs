//! Cache types

use serde::{Deserialize, Serialize};

/// A value that can be stored in an [`EvictionCache`](crate::EvictionCache).
///
/// The reported size is what the cache charges against its budget. Values
/// that keep the default implementation are item-counted: each one costs a
/// single unit.
pub trait CacheValue {
    fn size(&self) -> u64 {
        1
    }
}

/// Statistics about a cache tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_size: u64,
    pub limit: u64,
    pub hits: u64,
    pub misses: u64,
}
