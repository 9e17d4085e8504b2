//! Preview pipeline: fetch, fill, cache

use crate::error::Result;
use crate::tier::Tier;
use axum::http::HeaderMap;
use content_store::{digest_str, ContentStore};
use eviction_cache::{CacheValue, EvictionCache};
use image_fill::Transform;
use origin_fetcher::Fetch;
use std::sync::Arc;
use tracing::debug;

/// Cache entry for one rendered preview, charged at its encoded length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewItem {
    pub key: String,
    pub size: u64,
}

impl PreviewItem {
    pub fn new(key: &str, size: u64) -> Self {
        Self {
            key: key.to_string(),
            size,
        }
    }
}

impl CacheValue for PreviewItem {
    fn size(&self) -> u64 {
        self.size
    }
}

/// Encoded preview bytes and whether they came out of the preview tier
#[derive(Debug)]
pub struct Preview {
    pub body: Vec<u8>,
    pub from_cache: bool,
}

/// Key of the preview of `url` filled to `width`×`height`
pub fn cache_key(url: &str, width: u32, height: u32) -> String {
    digest_str(&format!("fill:{}:{}:{}", url, width, height))
}

pub struct PreviewPipeline {
    cache: Arc<EvictionCache<PreviewItem>>,
    store: Arc<ContentStore>,
    transform: Arc<dyn Transform>,
    fetcher: Arc<dyn Fetch>,
}

impl PreviewPipeline {
    pub fn new(
        previews: &Tier<PreviewItem>,
        transform: Arc<dyn Transform>,
        fetcher: Arc<dyn Fetch>,
    ) -> Self {
        Self {
            cache: previews.cache.clone(),
            store: previews.store.clone(),
            transform,
            fetcher,
        }
    }

    /// Produce the center-filled preview of `url`.
    ///
    /// A cached preview whose blob has gone missing is rebuilt. A preview
    /// larger than the tier budget is returned but never stored.
    pub async fn fill_center(
        &self,
        url: &str,
        width: u32,
        height: u32,
        headers: &HeaderMap,
    ) -> Result<Preview> {
        let key = cache_key(url, width, height);

        if self.cache.get(&key).is_some() {
            match self.store.read(&key).await {
                Ok(body) => {
                    debug!(url, width, height, key = %key, "Preview cache hit");
                    return Ok(Preview {
                        body,
                        from_cache: true,
                    });
                }
                Err(e) => debug!(key = %key, error = %e, "Indexed preview missing from store"),
            }
        }

        let source = self.fetcher.get(url, headers).await?;

        let transform = self.transform.clone();
        let body =
            tokio::task::spawn_blocking(move || transform.fill_center(&source, width, height))
                .await??;

        if self
            .cache
            .put(&key, PreviewItem::new(&key, body.len() as u64))
        {
            self.store.create(&key, &body).await?;
        }

        debug!(url, width, height, key = %key, size = body.len(), "Preview rendered");
        Ok(Preview {
            body,
            from_cache: false,
        })
    }
}
