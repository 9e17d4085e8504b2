//! Image preview proxy
//!
//! Fetches remote JPEG and PNG images, center-fills them to the requested
//! size and serves the result. Originals and previews are kept in two
//! byte-budgeted disk tiers.

mod config;
mod error;
mod pipeline;
mod server;
mod tier;
mod types;

#[cfg(test)]
mod testing;

use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::pipeline::PreviewPipeline;
use crate::server::{start_server, ServerState, SharedState};
use image_fill::TransformStack;
use origin_fetcher::{CachingTransport, HttpFetcher};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("imgpreview_proxy=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting image preview proxy...");

    let config = Config::from_env();
    info!("Port: {}", config.port);
    info!("Fetch timeout: {:?}", config.fetch_timeout);
    info!(
        "Supported content types: {}",
        config.supported_content_types.join(", ")
    );
    info!(
        "Original cache: {:?} ({} bytes)",
        config.original.cache_dir, config.original.cache_size
    );
    info!(
        "Preview cache: {:?} ({} bytes)",
        config.preview.cache_dir, config.preview.cache_size
    );

    // Cache tiers
    let original = tier::originals(&config.original);
    let preview = tier::previews(&config.preview);
    original.init().await?;
    preview.init().await?;

    // Fetch path: caching transport under a content-type gated fetcher
    let transport = CachingTransport::new(original.cache.clone(), original.store.clone())?;
    let fetcher = HttpFetcher::new(
        Arc::new(transport),
        config.fetch_timeout,
        config.supported_content_types.clone(),
    );

    let pipeline = PreviewPipeline::new(
        &preview,
        Arc::new(TransformStack::new()),
        Arc::new(fetcher),
    );
    let state: SharedState = Arc::new(ServerState::new(
        original.clone(),
        preview.clone(),
        pipeline,
    ));

    let served = start_server(state, config.port, shutdown_signal()).await;

    // Cached blobs do not outlive the process
    preview.purge();
    original.purge();
    info!("Cache tiers purged");

    served.map_err(|e| ProxyError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Unable to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal, gracefully shutting down...");
}
