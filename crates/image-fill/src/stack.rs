//! Ordered stack of transforms

use crate::codec::{JpegFill, PngFill};
use crate::error::{Result, TransformError};

/// Capability shared by every codec and by the stack itself
pub trait Transform: Send + Sync {
    /// Whether this transform recognises the buffer's format
    fn is_supported(&self, source: &[u8]) -> bool;

    /// Decode, fill `width`×`height` around the center, re-encode in the
    /// source format
    fn fill_center(&self, source: &[u8], width: u32, height: u32) -> Result<Vec<u8>>;
}

/// Transforms tried in registration order; the first that supports a buffer
/// handles it.
pub struct TransformStack {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformStack {
    /// JPEG first, then PNG
    pub fn new() -> Self {
        Self::with(vec![Box::new(JpegFill), Box::new(PngFill)])
    }

    pub fn with(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    fn find(&self, source: &[u8]) -> Option<&dyn Transform> {
        self.transforms
            .iter()
            .find(|transform| transform.is_supported(source))
            .map(|transform| &**transform)
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for TransformStack {
    fn is_supported(&self, source: &[u8]) -> bool {
        self.find(source).is_some()
    }

    fn fill_center(&self, source: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        self.find(source)
            .ok_or(TransformError::NotSupported)?
            .fill_center(source, width, height)
    }
}
