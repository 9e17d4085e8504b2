//! Center-fill image transforms
//!
//! A [`Transform`] sniffs whether it can handle a buffer and produces a
//! resized copy that exactly fills a target box, cropping whichever
//! dimension overflows around the center. [`TransformStack`] tries a list of
//! codec-specific transforms in order and uses the first that claims the
//! buffer.

mod codec;
mod error;
mod sniff;
mod stack;

pub use codec::{JpegFill, PngFill};
pub use error::{Result, TransformError};
pub use sniff::sniff_content_type;
pub use stack::{Transform, TransformStack};
