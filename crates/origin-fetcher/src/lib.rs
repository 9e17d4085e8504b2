//! Origin image fetching
//!
//! [`CachingTransport`] sits between the fetch path and the network: it
//! serves originals it has already downloaded from a [`ContentStore`] tier
//! indexed by an [`EvictionCache`], upgrades plain-HTTP redirects to HTTPS,
//! and persists fresh bodies when the cache accepts them. [`HttpFetcher`]
//! builds requests on top of any [`Transport`], enforces an overall timeout
//! and rejects responses whose content type is not allow-listed.
//!
//! [`ContentStore`]: content_store::ContentStore
//! [`EvictionCache`]: eviction_cache::EvictionCache

mod error;
mod fetcher;
mod transport;
mod types;

#[cfg(test)]
mod test_origin;

pub use error::{FetchError, Result};
pub use fetcher::{forwardable_headers, Fetch, HttpFetcher};
pub use transport::{CachingTransport, Transport};
pub use types::{FetchResponse, ResponseItem};
