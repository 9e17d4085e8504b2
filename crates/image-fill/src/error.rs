//! Error types for image transforms

use std::fmt;

#[derive(Debug)]
pub enum TransformError {
    /// The buffer claimed to be in a supported format but did not decode
    Decode(image::ImageError),
    Encode(image::ImageError),
    /// No transform in the stack recognised the buffer
    NotSupported,
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::Decode(err) => write!(f, "Decode error: {}", err),
            TransformError::Encode(err) => write!(f, "Encode error: {}", err),
            TransformError::NotSupported => write!(f, "file not supported"),
        }
    }
}

impl std::error::Error for TransformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransformError::Decode(err) | TransformError::Encode(err) => Some(err),
            TransformError::NotSupported => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
