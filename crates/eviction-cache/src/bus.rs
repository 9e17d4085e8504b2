//! Synchronous publish/subscribe for cache events

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// Events published by an [`EvictionCache`](crate::EvictionCache)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheEvent {
    /// An entry left the cache; the payload is the evicted value
    Evict,
}

impl CacheEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CacheEvent::Evict => "event_evict",
        }
    }
}

impl fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type Handler<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Register of handlers keyed by event.
///
/// Handlers run synchronously on the firing thread, in the order they were
/// subscribed. There is no error channel: a handler that can fail logs the
/// failure itself and returns. A handler must not subscribe to the bus that
/// is invoking it.
pub struct EventBus<T> {
    handlers: RwLock<HashMap<CacheEvent, Vec<Handler<T>>>>,
}

impl<T> EventBus<T> {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Add one more handler for `event`
    pub fn subscribe<F>(&self, event: CacheEvent, handler: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .entry(event)
            .or_default()
            .push(Box::new(handler));
    }

    /// Invoke every handler registered for `event`. No-op without subscribers.
    pub fn fire(&self, event: CacheEvent, payload: &T) {
        let handlers = self.handlers.read();
        if let Some(list) = handlers.get(&event) {
            for handler in list {
                handler(payload);
            }
        }
    }

    pub fn subscribers(&self, event: CacheEvent) -> usize {
        self.handlers.read().get(&event).map_or(0, Vec::len)
    }
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
