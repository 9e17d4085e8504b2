//! Error types for the preview proxy

use crate::types::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use content_store::StoreError;
use image_fill::TransformError;
use origin_fetcher::FetchError;
use std::fmt;

#[derive(Debug)]
pub enum ProxyError {
    Fetch(FetchError),
    Transform(TransformError),
    Store(StoreError),
    /// The blocking transform task panicked or was cancelled
    Worker(tokio::task::JoinError),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Fetch(err) => write!(f, "Fetch error: {}", err),
            ProxyError::Transform(err) => write!(f, "Transform error: {}", err),
            ProxyError::Store(err) => write!(f, "Store error: {}", err),
            ProxyError::Worker(err) => write!(f, "Worker error: {}", err),
            ProxyError::Io(err) => write!(f, "IO error: {}", err),
            ProxyError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::Fetch(err) => Some(err),
            ProxyError::Transform(err) => Some(err),
            ProxyError::Store(err) => Some(err),
            ProxyError::Worker(err) => Some(err),
            ProxyError::Io(err) => Some(err.as_ref()),
            ProxyError::Config(_) => None,
        }
    }
}

impl From<FetchError> for ProxyError {
    fn from(err: FetchError) -> Self {
        ProxyError::Fetch(err)
    }
}

impl From<TransformError> for ProxyError {
    fn from(err: TransformError) -> Self {
        ProxyError::Transform(err)
    }
}

impl From<StoreError> for ProxyError {
    fn from(err: StoreError) -> Self {
        ProxyError::Store(err)
    }
}

impl From<tokio::task::JoinError> for ProxyError {
    fn from(err: tokio::task::JoinError) -> Self {
        ProxyError::Worker(err)
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        ProxyError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ProxyError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ProxyError::Config(err.to_string())
    }
}

/// Every failure to produce a preview is reported as a bad gateway
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: "Preview unavailable".to_string(),
            }),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = ProxyError::Fetch(FetchError::UnsupportedContentType("image/gif".to_string()));
        assert_eq!(
            format!("{}", err),
            "Fetch error: fetcher does not support content-type image/gif"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ProxyError::Config("bad directive".to_string());
        assert_eq!(format!("{}", err), "Configuration error: bad directive");
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err = ProxyError::from(TransformError::NotSupported);
        assert!(err.source().is_some());
        assert!(ProxyError::Config("x".to_string()).source().is_none());
    }

    #[test]
    fn test_every_error_is_bad_gateway() {
        let errors = vec![
            ProxyError::from(FetchError::InvalidUrl("http://".to_string())),
            ProxyError::from(TransformError::NotSupported),
            ProxyError::from(std::io::Error::other("disk full")),
        ];

        for err in errors {
            assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
        }
    }
}
