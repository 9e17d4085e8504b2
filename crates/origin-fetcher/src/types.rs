//! Values exchanged by the transport

use eviction_cache::CacheValue;

/// Cache entry for one fetched original, charged at its body length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseItem {
    pub url: String,
    pub size: u64,
}

impl ResponseItem {
    pub fn new(url: &str, size: u64) -> Self {
        Self {
            url: url.to_string(),
            size,
        }
    }
}

impl CacheValue for ResponseItem {
    fn size(&self) -> u64 {
        self.size
    }
}

/// A fully read 200 response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Sniffed from the body, never taken from the origin's headers
    pub content_type: String,
    pub body: Vec<u8>,
    pub from_cache: bool,
}

impl FetchResponse {
    pub fn sniffed(body: Vec<u8>, from_cache: bool) -> Self {
        Self {
            content_type: image_fill::sniff_content_type(&body).to_string(),
            body,
            from_cache,
        }
    }
}
