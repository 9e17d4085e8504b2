//! In-process origins and image fixtures for tests

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use origin_fetcher::{Fetch, FetchError};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Origin that answers every URL with the same body, or always fails
pub struct FakeOrigin {
    body: Option<Vec<u8>>,
    calls: AtomicUsize,
    last_url: Mutex<Option<String>>,
}

impl FakeOrigin {
    pub fn serving(body: Vec<u8>) -> Self {
        Self {
            body: Some(body),
            calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            body: None,
            calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<String> {
        self.last_url.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for FakeOrigin {
    async fn get(&self, url: &str, _headers: &HeaderMap) -> origin_fetcher::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(url.to_string());

        self.body.clone().ok_or(FetchError::ServerError {
            status: StatusCode::NOT_FOUND,
        })
    }
}

/// PNG with a horizontal gradient so crops are distinguishable
pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let pixels = RgbaImage::from_fn(width, height, |x, _| {
        Rgba([(x * 255 / width.max(1)) as u8, 64, 128, 255])
    });

    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(pixels)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

/// Request counter shared with a spawned origin
pub type Hits = Arc<AtomicUsize>;

/// Serve `body` as `image/png` for every path on an ephemeral local port.
///
/// Returns the base URL and the number of requests served so far.
pub async fn spawn_png_origin(body: Vec<u8>) -> (String, Hits) {
    async fn serve(State((hits, body)): State<(Hits, Arc<Vec<u8>>)>) -> impl IntoResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        ([(header::CONTENT_TYPE, "image/png")], body.as_ref().clone())
    }

    let hits: Hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/{*path}", get(serve))
        .with_state((hits.clone(), Arc::new(body)));

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}", addr), hits)
}
