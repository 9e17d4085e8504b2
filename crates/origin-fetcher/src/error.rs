//! Error types for origin fetching

use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum FetchError {
    /// Connection-level failure: DNS, connect, TLS, body read
    Http(Box<reqwest::Error>),
    InvalidUrl(String),
    /// The origin answered with something other than 200
    ServerError { status: StatusCode },
    UnsupportedContentType(String),
    Timeout(Duration),
    Store(content_store::StoreError),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(err) => write!(f, "HTTP error: {}", err),
            FetchError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            FetchError::ServerError { status } => write!(f, "server error: {}", status),
            FetchError::UnsupportedContentType(content_type) => {
                write!(f, "fetcher does not support content-type {}", content_type)
            }
            FetchError::Timeout(after) => write!(f, "request timed out after {:?}", after),
            FetchError::Store(err) => write!(f, "Store error: {}", err),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(err) => Some(err.as_ref()),
            FetchError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(Box::new(err))
    }
}

impl From<content_store::StoreError> for FetchError {
    fn from(err: content_store::StoreError) -> Self {
        FetchError::Store(err)
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
