//! Cache tiers: an eviction index paired with the store that holds its blobs

use crate::config::TierConfig;
use crate::pipeline::PreviewItem;
use content_store::{digest_str, ContentStore};
use eviction_cache::{CacheEvent, CacheValue, EventBus, EvictionCache};
use origin_fetcher::ResponseItem;
use std::sync::Arc;
use tracing::{debug, error};

/// One cache tier.
///
/// The tier owns its own event bus; every eviction deletes the blob the
/// evicted value names, so the store never outgrows the index for long.
pub struct Tier<V> {
    pub cache: Arc<EvictionCache<V>>,
    pub store: Arc<ContentStore>,
}

impl<V> Tier<V>
where
    V: CacheValue + Clone + Send + Sync + 'static,
{
    pub fn new(config: &TierConfig, blob_name: fn(&V) -> String) -> Self {
        let store = Arc::new(ContentStore::new(
            config.cache_dir.clone(),
            config.cache_prefix.clone(),
        ));

        let bus = Arc::new(EventBus::new());
        let cleanup = store.clone();
        bus.subscribe(CacheEvent::Evict, move |value: &V| {
            let name = blob_name(value);
            match cleanup.delete(&name) {
                Ok(()) => debug!(name = %name, "Deleted evicted blob"),
                Err(e) if e.is_not_found() => debug!(name = %name, "Evicted blob already gone"),
                Err(e) => error!(name = %name, error = %e, "Failed to delete evicted blob"),
            }
        });

        Self {
            cache: Arc::new(EvictionCache::new(config.cache_size, bus)),
            store,
        }
    }

    /// Create the store directory
    pub async fn init(&self) -> std::io::Result<()> {
        self.store.init().await
    }

    /// Drop every entry, deleting its blob
    pub fn purge(&self) {
        self.cache.purge();
    }
}

impl<V> Clone for Tier<V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            store: self.store.clone(),
        }
    }
}

/// Originals are indexed by URL and stored under the URL's digest
pub fn originals(config: &TierConfig) -> Tier<ResponseItem> {
    Tier::new(config, |item: &ResponseItem| digest_str(&item.url))
}

/// Previews are indexed and stored under the same key
pub fn previews(config: &TierConfig) -> Tier<PreviewItem> {
    Tier::new(config, |item: &PreviewItem| item.key.clone())
}
