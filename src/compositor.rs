/// Deterministic image compositing onto a square output surface
///
/// This module is pure: it receives the image, the transform, and the
/// output surface size as explicit arguments and never discovers a
/// rendering target implicitly. Identical inputs always produce
/// identical pixels.

use std::io::Cursor;

use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbaImage};

use crate::error::EditorResult;
use crate::transform::{OverlayType, Transform};

/// Overlay bar thickness as a fraction of the output side
const OVERLAY_BAR_FRACTION: f32 = 0.1;

/// Default quality fraction for lossy export formats
pub const DEFAULT_EXPORT_QUALITY: f32 = 0.9;

const OPAQUE_BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Closed set of raster export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Lossless; the quality parameter is ignored
    Png,
    /// Lossy; accepts a quality fraction in [0, 1]
    Jpeg,
    /// Accepts a quality fraction for interface symmetry, but the
    /// encoder used here is lossless so the value has no effect
    WebP,
}

impl ExportFormat {
    /// File extension for exported artifacts
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::WebP => "webp",
        }
    }
}

/// An encoded export: the suggested file name plus the encoded bytes
///
/// Writing the artifact to disk (or handing it to a share sheet) is the
/// caller's concern; the compositor only produces the payload.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Composite an image onto a square surface of side `output_size`
///
/// The image is cover-fit: scaled preserving aspect ratio so its shorter
/// dimension exactly fills the surface, then multiplied by the user
/// scale, centered, and translated by the transform offsets in surface
/// pixels. Overlay bars are drawn last and always occlude the image.
///
/// The transform must already satisfy the transform-record invariant
/// (scale above zero, finite offsets); validation lives upstream.
pub fn render(image: &DynamicImage, transform: &Transform, output_size: u32) -> RgbaImage {
    debug_assert!(output_size > 0);
    let mut canvas = RgbaImage::from_pixel(output_size, output_size, Rgba([0, 0, 0, 0]));

    let (src_w, src_h) = (image.width() as f32, image.height() as f32);
    debug_assert!(src_w > 0.0 && src_h > 0.0, "decode validates dimensions");

    // Cover fit: the shorter source dimension fills the square exactly,
    // the longer one overhangs and is cropped by the canvas bounds.
    let side = output_size as f32;
    let aspect = src_w / src_h;
    let (base_w, base_h) = if aspect > 1.0 {
        (side * aspect, side)
    } else {
        (side, side / aspect)
    };

    let draw_w = (base_w * transform.scale).round().max(1.0) as u32;
    let draw_h = (base_h * transform.scale).round().max(1.0) as u32;
    let scaled = image
        .resize_exact(draw_w, draw_h, FilterType::Lanczos3)
        .to_rgba8();

    // Center, then offset in surface pixel space
    let x = (side / 2.0 - draw_w as f32 / 2.0 + transform.offset_x).round() as i64;
    let y = (side / 2.0 - draw_h as f32 / 2.0 + transform.offset_y).round() as i64;
    imageops::overlay(&mut canvas, &scaled, x, y);

    draw_overlay(&mut canvas, transform.overlay_type);
    canvas
}

/// Draw the decorative bar pattern over the composited image
fn draw_overlay(canvas: &mut RgbaImage, overlay_type: OverlayType) {
    let side = canvas.width();
    let bar = (side as f32 * OVERLAY_BAR_FRACTION).round() as u32;

    match overlay_type {
        OverlayType::None => {}
        OverlayType::Cinematic => {
            fill_rect(canvas, 0, 0, side, bar);
            fill_rect(canvas, 0, side - bar, side, bar);
        }
        OverlayType::FullFrame => {
            fill_rect(canvas, 0, 0, side, bar);
            fill_rect(canvas, 0, side - bar, side, bar);
            fill_rect(canvas, 0, 0, bar, side);
            fill_rect(canvas, side - bar, 0, bar, side);
        }
    }
}

fn fill_rect(canvas: &mut RgbaImage, x0: u32, y0: u32, w: u32, h: u32) {
    for y in y0..(y0 + h).min(canvas.height()) {
        for x in x0..(x0 + w).min(canvas.width()) {
            canvas.put_pixel(x, y, OPAQUE_BLACK);
        }
    }
}

/// Render and encode in one of the supported export formats
///
/// `quality` is clamped to [0, 1] and defaults to
/// [`DEFAULT_EXPORT_QUALITY`]; it only affects JPEG output. The artifact
/// name is timestamped so successive exports never collide.
pub fn export(
    image: &DynamicImage,
    transform: &Transform,
    output_size: u32,
    format: ExportFormat,
    quality: Option<f32>,
) -> EditorResult<ExportArtifact> {
    let canvas = render(image, transform, output_size);
    let bytes = encode(&canvas, format, quality)?;

    let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ");
    let file_name = format!("edited-image-{}.{}", stamp, format.extension());

    Ok(ExportArtifact { file_name, bytes })
}

/// Encode a rendered surface without naming it
pub fn encode(canvas: &RgbaImage, format: ExportFormat, quality: Option<f32>) -> EditorResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    let (w, h) = canvas.dimensions();

    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut out).write_image(canvas.as_raw(), w, h, ExtendedColorType::Rgba8)?;
        }
        ExportFormat::Jpeg => {
            let flat = flatten_onto_white(canvas);
            let q = quality_to_jpeg(quality.unwrap_or(DEFAULT_EXPORT_QUALITY));
            JpegEncoder::new_with_quality(&mut out, q).write_image(
                flat.as_raw(),
                w,
                h,
                ExtendedColorType::Rgb8,
            )?;
        }
        ExportFormat::WebP => {
            WebPEncoder::new_lossless(&mut out).encode(canvas.as_raw(), w, h, ExtendedColorType::Rgba8)?;
        }
    }

    Ok(out.into_inner())
}

/// Map a [0, 1] quality fraction to the JPEG encoder's 1..=100 range
fn quality_to_jpeg(quality: f32) -> u8 {
    let q = if quality.is_finite() { quality.clamp(0.0, 1.0) } else { DEFAULT_EXPORT_QUALITY };
    ((q * 100.0).round() as u8).max(1)
}

/// JPEG has no alpha channel; composite transparent regions onto white
fn flatten_onto_white(canvas: &RgbaImage) -> image::RgbImage {
    let mut flat = image::RgbImage::new(canvas.width(), canvas.height());
    for (x, y, px) in canvas.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let a16 = a as u16;
        let blend = |c: u8| (((c as u16) * a16 + 255 * (255 - a16)) / 255) as u8;
        flat.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    flat
}
