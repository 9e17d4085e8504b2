//! Codec-specific fill transforms

use crate::error::{Result, TransformError};
use crate::stack::Transform;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Resample, crop around the center, and return exactly `width`×`height`.
///
/// Zero dimensions are clamped to one pixel; encoders reject empty images.
fn fill_center(source: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (width, height) = (width.max(1), height.max(1));
    source.resize_to_fill(width, height, FilterType::Triangle)
}

fn decode(source: &[u8], format: ImageFormat) -> Result<DynamicImage> {
    image::load_from_memory_with_format(source, format).map_err(TransformError::Decode)
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .map_err(TransformError::Encode)?;
    Ok(buffer.into_inner())
}

/// JPEG in, JPEG out
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegFill;

impl Transform for JpegFill {
    fn is_supported(&self, source: &[u8]) -> bool {
        matches!(image::guess_format(source), Ok(ImageFormat::Jpeg))
    }

    fn fill_center(&self, source: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let original = decode(source, ImageFormat::Jpeg)?;
        debug!(
            from_width = original.width(),
            from_height = original.height(),
            width,
            height,
            "Filling JPEG"
        );

        // JPEG carries no alpha channel
        let filled = DynamicImage::ImageRgb8(fill_center(&original, width, height).to_rgb8());
        encode(&filled, ImageFormat::Jpeg)
    }
}

/// PNG in, PNG out
#[derive(Debug, Default, Clone, Copy)]
pub struct PngFill;

impl Transform for PngFill {
    fn is_supported(&self, source: &[u8]) -> bool {
        matches!(image::guess_format(source), Ok(ImageFormat::Png))
    }

    fn fill_center(&self, source: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let original = decode(source, ImageFormat::Png)?;
        debug!(
            from_width = original.width(),
            from_height = original.height(),
            width,
            height,
            "Filling PNG"
        );

        encode(&fill_center(&original, width, height), ImageFormat::Png)
    }
}
