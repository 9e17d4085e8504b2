//! Recency-ordered cache bounded by the total size of its values

use crate::bus::{CacheEvent, EventBus};
use crate::types::{CacheStats, CacheValue};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

struct Slot<V> {
    value: V,
    stamp: u64,
}

/// Index state guarded by a single lock.
///
/// `order` maps a monotonically increasing use stamp to its key, so the
/// first entry is always the least recently used one.
struct Index<V> {
    items: HashMap<String, Slot<V>>,
    order: BTreeMap<u64, String>,
    next_stamp: u64,
    size: u64,
}

impl<V: CacheValue> Index<V> {
    fn stamp(&mut self) -> u64 {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        stamp
    }

    fn promote(&mut self, key: &str) {
        let stamp = self.stamp();
        if let Some(slot) = self.items.get_mut(key) {
            self.order.remove(&slot.stamp);
            slot.stamp = stamp;
            self.order.insert(stamp, key.to_string());
        }
    }

    fn pop_oldest(&mut self) -> Option<V> {
        let (_, key) = self.order.pop_first()?;
        let slot = self.items.remove(&key)?;
        self.size -= slot.value.size();
        Some(slot.value)
    }
}

/// Byte-budgeted LRU cache.
///
/// Every mutating call leaves `size() <= limit()`. Entries pushed out to
/// restore that bound are published as [`CacheEvent::Evict`] on the bus,
/// least recently used first, after the index lock has been released and
/// before the mutating call returns.
///
/// Because the lock is already gone when an event fires, another caller may
/// `put` the same key again before the handler runs. The event then
/// describes a value that has been replaced, and a handler that deletes the
/// key's backing data also deletes the data of the new entry. Readers must
/// treat an indexed key whose data is missing as a miss and rebuild it.
pub struct EvictionCache<V> {
    index: RwLock<Index<V>>,
    limit: u64,
    bus: Arc<EventBus<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: CacheValue + Clone> EvictionCache<V> {
    pub fn new(limit: u64, bus: Arc<EventBus<V>>) -> Self {
        Self {
            index: RwLock::new(Index {
                items: HashMap::new(),
                order: BTreeMap::new(),
                next_stamp: 0,
                size: 0,
            }),
            limit,
            bus,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Insert or replace `key`, making it the most recently used entry.
    ///
    /// Returns `false` without touching the cache when the value alone is
    /// larger than the limit.
    pub fn put(&self, key: &str, value: V) -> bool {
        let value_size = value.size();
        if value_size > self.limit {
            debug!(key, size = value_size, limit = self.limit, "Rejected oversized value");
            return false;
        }

        let evicted = {
            let mut index = self.index.write();
            let stamp = index.stamp();

            let previous = index.items.insert(key.to_string(), Slot { value, stamp });
            if let Some(previous) = previous {
                index.order.remove(&previous.stamp);
                index.size -= previous.value.size();
            }
            index.order.insert(stamp, key.to_string());
            index.size += value_size;

            let mut evicted = Vec::new();
            while index.size > self.limit {
                match index.pop_oldest() {
                    Some(value) => evicted.push(value),
                    None => break,
                }
            }
            evicted
        };

        self.publish(evicted);
        true
    }

    /// Look up `key`. A hit counts as a use and promotes the entry.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut index = self.index.write();
        let value = index.items.get(key).map(|slot| slot.value.clone());

        match value {
            Some(value) => {
                index.promote(key);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Membership test without promotion
    pub fn has(&self, key: &str) -> bool {
        self.index.read().items.contains_key(key)
    }

    /// Evict every entry, least recently used first
    pub fn purge(&self) {
        let evicted = {
            let mut index = self.index.write();
            let mut evicted = Vec::with_capacity(index.items.len());
            while let Some(value) = index.pop_oldest() {
                evicted.push(value);
            }
            evicted
        };

        self.publish(evicted);
    }

    /// Keys ordered from most to least recently used
    pub fn keys(&self) -> Vec<String> {
        self.index.read().order.values().rev().cloned().collect()
    }

    pub fn stats(&self) -> CacheStats {
        let index = self.index.read();
        CacheStats {
            entries: index.items.len(),
            total_size: index.size,
            limit: self.limit,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn publish(&self, evicted: Vec<V>) {
        for value in evicted {
            self.bus.fire(CacheEvent::Evict, &value);
        }
    }
}

impl<V> EvictionCache<V> {
    pub fn size(&self) -> u64 {
        self.index.read().size
    }

    pub fn len(&self) -> usize {
        self.index.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}
