use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

use crate::error::PipelineError;

/// Result of one compression pass: JPEG bytes plus the pixel dimensions
/// actually produced.
#[derive(Debug)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Target dimensions after capping the larger edge at `max_dimension`.
/// Aspect ratio is preserved, the smaller edge is floored to a whole pixel,
/// and images already inside the cap are left untouched (no upscaling).
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }
    if width >= height {
        let scaled = (height as u64 * max_dimension as u64 / width as u64) as u32;
        (max_dimension, scaled.max(1))
    } else {
        let scaled = (width as u64 * max_dimension as u64 / height as u64) as u32;
        (scaled.max(1), max_dimension)
    }
}

/// JPEG has no alpha channel, so transparent sources are composited onto
/// solid white before encoding.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut flat = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let a = px[3] as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a)) / 255) as u8;
        flat.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    flat
}

/// Resize and lossy-recompress source image bytes. The whole image stays in
/// memory for the duration of the request; the upload ceiling upstream bounds
/// that. Recompression is one-way: feeding the output back in at the same
/// quality is not guaranteed to reproduce identical bytes.
pub fn compress(source: &[u8], max_dimension: u32, quality: u8) -> Result<CompressedImage, PipelineError> {
    let img = image::load_from_memory(source)?;

    let (target_w, target_h) = scaled_dimensions(img.width(), img.height(), max_dimension.max(1));
    let img = if (target_w, target_h) != (img.width(), img.height()) {
        img.resize_exact(target_w, target_h, FilterType::Lanczos3)
    } else {
        img
    };

    let flat = flatten_onto_white(&img);

    let mut buf = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder.encode_image(&flat)?;

    Ok(CompressedImage {
        bytes: buf.into_inner(),
        width: target_w,
        height: target_h,
    })
}
