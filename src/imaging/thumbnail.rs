/// Storage payload compression and thumbnail generation
///
/// Saved states carry two independent encodings of the image: the
/// restorable payload (bounded to [`MAX_STORED_DIMENSION`]) and a small
/// preview thumbnail. Both are JPEG re-encodes carried as base64 strings
/// inside the JSON interchange document.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use crate::error::{EditorError, EditorResult};

/// Longest side of the stored restorable payload
pub const MAX_STORED_DIMENSION: u32 = 2048;

/// JPEG quality for the restorable payload (1-100)
pub const STORED_JPEG_QUALITY: u8 = 90;

/// Longest side of generated thumbnails
pub const THUMBNAIL_SIZE: u32 = 100;

/// JPEG quality for thumbnails (1-100)
pub const THUMBNAIL_JPEG_QUALITY: u8 = 70;

/// Re-encode an image for storage, bounding its longest side
///
/// Images already inside the bound are re-encoded without resizing.
/// Resized dimensions are rounded down to even values, which compresses
/// slightly better.
pub fn compress_for_storage(image: &DynamicImage) -> EditorResult<String> {
    let (w, h) = (image.width(), image.height());

    let bounded;
    let source = if w > MAX_STORED_DIMENSION || h > MAX_STORED_DIMENSION {
        let shrunk = image.resize(MAX_STORED_DIMENSION, MAX_STORED_DIMENSION, FilterType::Lanczos3);
        let even_w = (shrunk.width().max(2) / 2) * 2;
        let even_h = (shrunk.height().max(2) / 2) * 2;
        bounded = shrunk.resize_exact(even_w, even_h, FilterType::Lanczos3);
        &bounded
    } else {
        image
    };

    encode_jpeg_base64(source, STORED_JPEG_QUALITY)
}

/// Generate the small preview encoding for a saved state
pub fn generate_thumbnail(image: &DynamicImage) -> EditorResult<String> {
    let thumb = image.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3);
    encode_jpeg_base64(&thumb, THUMBNAIL_JPEG_QUALITY)
}

/// Recover the encoded bytes of a stored payload
pub fn payload_bytes(payload: &str) -> EditorResult<Vec<u8>> {
    BASE64
        .decode(payload)
        .map_err(|e| EditorError::InvalidImage(format!("stored payload is not base64: {e}")))
}

/// Decode a stored base64 JPEG payload back into pixels
pub fn decode_payload(payload: &str) -> EditorResult<DynamicImage> {
    let bytes = payload_bytes(payload)?;
    image::load_from_memory(&bytes).map_err(|e| EditorError::InvalidImage(e.to_string()))
}

/// Compress on a blocking worker thread
pub async fn compress_for_storage_async(image: DynamicImage) -> EditorResult<String> {
    tokio::task::spawn_blocking(move || compress_for_storage(&image))
        .await
        .map_err(|e| EditorError::Task(format!("compress worker: {e}")))?
}

fn encode_jpeg_base64(image: &DynamicImage, quality: u8) -> EditorResult<String> {
    // JPEG carries no alpha; flatten onto white like the export path
    let rgb = flatten_to_rgb(image);
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality).write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(BASE64.encode(out.into_inner()))
}

fn flatten_to_rgb(image: &DynamicImage) -> image::RgbImage {
    let rgba = image.to_rgba8();
    let mut flat = image::RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let a16 = a as u16;
        let blend = |c: u8| (((c as u16) * a16 + 255 * (255 - a16)) / 255) as u8;
        flat.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    flat
}
