//! Caching transport for original images

use crate::error::{FetchError, Result};
use crate::types::{FetchResponse, ResponseItem};
use async_trait::async_trait;
use content_store::{digest_str, ContentStore};
use eviction_cache::EvictionCache;
use reqwest::header::USER_AGENT;
use reqwest::{redirect, Client, Request, Response, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Executes a prepared GET and yields a fully read 200 response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<FetchResponse>;
}

/// Network transport backed by the original-image cache tier.
///
/// The cache is keyed by the request URL; the store holds the body under the
/// URL's digest. Redirects are never followed, except that a 3xx answer to a
/// plain-HTTP request is retried once over HTTPS.
pub struct CachingTransport {
    client: Client,
    cache: Arc<EvictionCache<ResponseItem>>,
    store: Arc<ContentStore>,
}

impl CachingTransport {
    pub fn new(cache: Arc<EvictionCache<ResponseItem>>, store: Arc<ContentStore>) -> Result<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            cache,
            store,
        })
    }

    /// Serve `url` from the store if the index says it is there.
    ///
    /// A missing or unreadable blob is not an error: the caller falls back
    /// to the network and the entry is refreshed.
    async fn cached(&self, url: &str) -> Option<Vec<u8>> {
        if !self.cache.has(url) {
            return None;
        }

        match self.store.read(&digest_str(url)).await {
            Ok(body) => Some(body),
            Err(e) => {
                debug!(url, error = %e, "Indexed original missing from store");
                None
            }
        }
    }

    async fn round_trip(&self, request: Request) -> Result<Response> {
        let budget = request.timeout().copied();
        let started = Instant::now();
        let upgrade = if request.url().scheme() == "http" {
            request.try_clone()
        } else {
            None
        };

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| request_error(e, budget))?;

        if response.status().is_redirection() {
            if let Some(mut retry) = upgrade {
                if retry.url_mut().set_scheme("https").is_ok() {
                    debug!(url = %retry.url(), status = %response.status(), "Upgrading redirect to https");
                    if let Some(budget) = budget {
                        *retry.timeout_mut() = Some(budget.saturating_sub(started.elapsed()));
                    }
                    return self
                        .client
                        .execute(retry)
                        .await
                        .map_err(|e| request_error(e, budget));
                }
            }
        }

        Ok(response)
    }

    async fn fetch(&self, url: &str, request: Request) -> Result<Vec<u8>> {
        let method = request.method().clone();
        let user_agent = request
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        let budget = request.timeout().copied();
        let started = Instant::now();
        let response = self.round_trip(request).await?;
        let latency = started.elapsed();

        if response.status() != StatusCode::OK {
            warn!(
                method = %method,
                url,
                status = %response.status(),
                latency_us = latency.as_micros() as u64,
                user_agent = %user_agent,
                "Origin returned an error"
            );
            return Err(FetchError::ServerError {
                status: response.status(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| request_error(e, budget))?
            .to_vec();

        // Not covered by the request timeout
        if self
            .cache
            .put(url, ResponseItem::new(url, body.len() as u64))
        {
            self.store.create(&digest_str(url), &body).await?;
        } else {
            debug!(url, size = body.len(), "Original too large to cache");
        }

        Ok(body)
    }
}

/// Timeouts against the request's own budget are reported as such
fn request_error(err: reqwest::Error, budget: Option<Duration>) -> FetchError {
    match budget {
        Some(budget) if err.is_timeout() => FetchError::Timeout(budget),
        _ => FetchError::from(err),
    }
}

#[async_trait]
impl Transport for CachingTransport {
    async fn execute(&self, request: Request) -> Result<FetchResponse> {
        let url = request.url().to_string();

        if let Some(body) = self.cached(&url).await {
            debug!(url = %url, size = body.len(), "Original served from cache");
            return Ok(FetchResponse::sniffed(body, true));
        }

        let body = self.fetch(&url, request).await?;
        Ok(FetchResponse::sniffed(body, false))
    }
}
