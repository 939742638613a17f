// src/compose/thumbnail.rs
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageResult};

pub const MAX_WIDTH: u32 = 1024;
pub const MAX_HEIGHT: u32 = 768;
pub const JPEG_QUALITY: u8 = 85;

/// Decode any supported image, shrink it to fit `MAX_WIDTH`×`MAX_HEIGHT`
/// (never enlarge) and re-encode as JPEG.
pub fn render_thumbnail(original: &[u8]) -> ImageResult<Vec<u8>> {
    let img = image::load_from_memory(original)?;
    let img = if img.width() > MAX_WIDTH || img.height() > MAX_HEIGHT {
        img.resize(MAX_WIDTH, MAX_HEIGHT, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))?;
    Ok(out.into_inner())
}
