//! Content-type gated fetcher

use crate::error::{FetchError, Result};
use crate::transport::Transport;
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName};
use reqwest::{Method, Request, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Headers that describe a single connection and must not be forwarded
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Retrieves the bytes of a remote image
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<Vec<u8>>;
}

/// Fetcher over any [`Transport`].
///
/// The timeout travels on the request and bounds the origin round trip and
/// body read, not the transport's cache bookkeeping.
pub struct HttpFetcher {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    supported_content_types: Vec<String>,
}

impl HttpFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        timeout: Duration,
        supported_content_types: Vec<String>,
    ) -> Self {
        Self {
            transport,
            timeout,
            supported_content_types,
        }
    }

    fn prepare(&self, url: &str, headers: &HeaderMap) -> Result<Request> {
        let raw = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("http://{}", url)
        };

        let parsed =
            Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))?;

        let mut request = Request::new(Method::GET, parsed);
        *request.headers_mut() = forwardable_headers(headers);
        *request.timeout_mut() = Some(self.timeout);
        Ok(request)
    }

    fn is_supported(&self, content_type: &str) -> bool {
        self.supported_content_types
            .iter()
            .any(|supported| content_type.contains(supported.as_str()))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<Vec<u8>> {
        let request = self.prepare(url, headers)?;

        let response = self.transport.execute(request).await?;

        if !self.is_supported(&response.content_type) {
            return Err(FetchError::UnsupportedContentType(response.content_type));
        }

        debug!(
            url,
            content_type = %response.content_type,
            size = response.body.len(),
            from_cache = response.from_cache,
            "Fetched original"
        );

        Ok(response.body)
    }
}

/// Copy of `headers` without hop-by-hop headers, anything named by
/// `Connection`, and the headers the client recomputes per request.
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let connection_listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    let mut forwarded = headers.clone();
    for name in HOP_BY_HOP.iter().chain(connection_listed.iter()) {
        forwarded.remove(name);
    }
    forwarded.remove(header::HOST);
    forwarded.remove(header::CONTENT_LENGTH);
    forwarded.remove(header::ACCEPT_ENCODING);
    forwarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_origin::{self, GIF_BYTES, PNG_BYTES};
    use crate::transport::CachingTransport;
    use crate::types::ResponseItem;
    use axum::extract::State;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use content_store::ContentStore;
    use eviction_cache::{EventBus, EvictionCache};
    use reqwest::header::HeaderValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{tempdir, TempDir};

    type Hits = Arc<AtomicUsize>;

    async fn png(State(hits): State<Hits>) -> impl IntoResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        PNG_BYTES
    }

    async fn gif(State(hits): State<Hits>) -> impl IntoResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        GIF_BYTES
    }

    async fn private(State(hits): State<Hits>, headers: AxumHeaders) -> impl IntoResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some("Bearer secret") => PNG_BYTES.into_response(),
            _ => StatusCode::UNAUTHORIZED.into_response(),
        }
    }

    async fn slow(State(hits): State<Hits>) -> impl IntoResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(500)).await;
        PNG_BYTES
    }

    async fn origin() -> (String, Hits) {
        let hits: Hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/a.png", get(png))
            .route("/a.gif", get(gif))
            .route("/private.png", get(private))
            .route("/slow.png", get(slow))
            .with_state(hits.clone());
        (test_origin::spawn(router).await, hits)
    }

    fn fetcher(timeout: Duration) -> (HttpFetcher, TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(ContentStore::new(dir.path(), "original"));
        let cache = Arc::new(EvictionCache::<ResponseItem>::new(
            1024 * 1024,
            Arc::new(EventBus::new()),
        ));
        let transport = CachingTransport::new(cache, store).unwrap();

        let fetcher = HttpFetcher::new(
            Arc::new(transport),
            timeout,
            vec!["image/jpeg".to_string(), "image/png".to_string()],
        );
        (fetcher, dir)
    }

    #[tokio::test]
    async fn test_supported_image() {
        let (base, _) = origin().await;
        let (fetcher, _dir) = fetcher(Duration::from_secs(5));

        let body = fetcher
            .get(&format!("{}/a.png", base), &HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(body, PNG_BYTES);
    }

    #[tokio::test]
    async fn test_unsupported_content_type_rejected_even_when_cached() {
        let (base, hits) = origin().await;
        let (fetcher, _dir) = fetcher(Duration::from_secs(5));
        let url = format!("{}/a.gif", base);

        for _ in 0..2 {
            let err = fetcher.get(&url, &HeaderMap::new()).await.unwrap_err();
            assert!(
                matches!(err, FetchError::UnsupportedContentType(ref ct) if ct == "image/gif"),
                "{}",
                err
            );
        }

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_forwards_authorization() {
        let (base, _) = origin().await;
        let (fetcher, _dir) = fetcher(Duration::from_secs(5));
        let url = format!("{}/private.png", base);

        let err = fetcher.get(&url, &HeaderMap::new()).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::ServerError { status } if status == reqwest::StatusCode::UNAUTHORIZED
        ));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        let body = fetcher.get(&url, &headers).await.unwrap();
        assert_eq!(body, PNG_BYTES);
    }

    #[tokio::test]
    async fn test_timeout() {
        let (base, _) = origin().await;
        let (fetcher, _dir) = fetcher(Duration::from_millis(50));

        let err = fetcher
            .get(&format!("{}/slow.png", base), &HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(after) if after == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_prepare_sets_request_timeout() {
        let dir = tempdir().unwrap();
        let store = Arc::new(ContentStore::new(dir.path(), "original"));
        let cache = Arc::new(EvictionCache::<ResponseItem>::new(
            1024,
            Arc::new(EventBus::new()),
        ));
        let transport = CachingTransport::new(cache, store).unwrap();
        let fetcher = HttpFetcher::new(Arc::new(transport), Duration::from_millis(750), vec![]);

        let request = fetcher.prepare("example.com/a.png", &HeaderMap::new()).unwrap();
        assert_eq!(request.timeout(), Some(&Duration::from_millis(750)));
        assert_eq!(request.url().as_str(), "http://example.com/a.png");
    }

    #[tokio::test]
    async fn test_schemeless_url_defaults_to_http() {
        let (base, hits) = origin().await;
        let (fetcher, _dir) = fetcher(Duration::from_secs(5));
        let schemeless = format!("{}/a.png", base.trim_start_matches("http://"));

        let body = fetcher.get(&schemeless, &HeaderMap::new()).await.unwrap();
        assert_eq!(body, PNG_BYTES);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let (fetcher, _dir) = fetcher(Duration::from_secs(5));

        let err = fetcher.get("", &HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[test]
    fn test_forwardable_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("proxy.local"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-trace", HeaderValue::from_static("abc"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));

        let forwarded = forwardable_headers(&headers);

        assert_eq!(forwarded.len(), 2);
        assert_eq!(forwarded[header::AUTHORIZATION], "Bearer secret");
        assert_eq!(forwarded[header::USER_AGENT], "curl/8.0");
    }

    #[tokio::test]
    async fn test_is_supported_matches_substring() {
        let (fetcher, _dir) = fetcher(Duration::from_secs(1));

        assert!(fetcher.is_supported("image/png"));
        assert!(fetcher.is_supported("image/jpeg"));
        assert!(!fetcher.is_supported("image/gif"));
        assert!(!fetcher.is_supported("application/octet-stream"));
    }
}
