//! HTTP server for preview endpoints
//!
//! Provides /health and /fill/{width}/{height}/{*url}.

use crate::pipeline::{PreviewItem, PreviewPipeline};
use crate::tier::Tier;
use crate::types::HealthResponse;
use axum::{
    extract::{Path, RawQuery, Request, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use image_fill::sniff_content_type;
use origin_fetcher::ResponseItem;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Shared state for the HTTP server
pub struct ServerState {
    pub original: Tier<ResponseItem>,
    pub preview: Tier<PreviewItem>,
    pub pipeline: PreviewPipeline,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(
        original: Tier<ResponseItem>,
        preview: Tier<PreviewItem>,
        pipeline: PreviewPipeline,
    ) -> Self {
        Self {
            original,
            preview,
            pipeline,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/fill/{width}/{height}/{*url}", get(fill))
        .layer(middleware::from_fn(access_log))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `shutdown` resolves, then drain in-flight requests
pub async fn start_server<F>(state: SharedState, port: u16, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        original: state.original.cache.stats(),
        preview: state.preview.cache.stats(),
    })
}

/// Center-filled preview of the remote image named by the path tail
async fn fill(
    State(state): State<SharedState>,
    Path((width, height, url)): Path<(String, String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let (Some(width), Some(height)) = (parse_dimension(&width), parse_dimension(&height)) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let target = match query {
        Some(query) => format!("{}?{}", url, query),
        None => url,
    };

    match state
        .pipeline
        .fill_center(&target, width, height, &headers)
        .await
    {
        Ok(preview) => {
            let cache_status = if preview.from_cache { "HIT" } else { "MISS" };

            (
                [
                    (header::CONTENT_TYPE, sniff_content_type(&preview.body)),
                    (X_CACHE.clone(), cache_status),
                ],
                preview.body,
            )
                .into_response()
        }
        Err(e) => {
            error!(url = %target, width, height, error = %e, "Failed to build preview");
            e.into_response()
        }
    }
}

/// Decimal digits only; signs and overflow are rejected
fn parse_dimension(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// One line per request: client, method, URI, protocol, status, latency and agent
async fn access_log(request: Request, next: Next) -> Response {
    let started = Instant::now();

    let forwarded_for = header_or_dash(request.headers(), "x-forwarded-for");
    let user_agent = header_or_dash(request.headers(), "user-agent");
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let response = next.run(request).await;

    info!(
        forwarded_for = %forwarded_for,
        method = %method,
        uri = %uri,
        version = ?version,
        status = response.status().as_u16(),
        latency_us = started.elapsed().as_micros() as u64,
        user_agent = %user_agent,
        "Request served"
    );

    response
}

fn header_or_dash(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}
