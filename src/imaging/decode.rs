/// Upload validation and decoding
///
/// Raw bytes from the caller (file picker, clipboard, drag/drop) pass
/// through here before any image state is committed: file size check,
/// format sniff against the accepted closed set, then a full decode.
/// Nothing downstream ever sees a zero-dimension or undecodable image.

use std::fmt::Write as _;

use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};

use crate::error::{EditorError, EditorResult};

/// Default upload size limit (10MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Input formats the editor accepts
const ACCEPTED_FORMATS: [ImageFormat; 3] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

/// Validate and decode uploaded image bytes
///
/// Fails fast with a cause-specific error: oversized file, unsupported
/// format, or corrupt data. A successful return guarantees non-zero
/// dimensions.
pub fn decode_image(bytes: &[u8], max_size: usize) -> EditorResult<DynamicImage> {
    if bytes.len() > max_size {
        return Err(EditorError::FileTooLarge {
            size: bytes.len(),
            max: max_size,
        });
    }

    let format = image::guess_format(bytes)
        .map_err(|_| EditorError::UnsupportedFormat("unrecognized data".to_string()))?;

    if !ACCEPTED_FORMATS.contains(&format) {
        let name = format.extensions_str().first().copied().unwrap_or("unknown");
        return Err(EditorError::UnsupportedFormat(name.to_string()));
    }

    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| EditorError::InvalidImage(e.to_string()))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(EditorError::InvalidImage(
            "image has zero width or height".to_string(),
        ));
    }

    Ok(image)
}

/// Decode on a blocking worker thread
///
/// Decode is CPU-bound; this keeps it off the caller's event loop the
/// same way preview generation does in the rest of the app.
pub async fn decode_image_async(bytes: Vec<u8>, max_size: usize) -> EditorResult<DynamicImage> {
    tokio::task::spawn_blocking(move || decode_image(&bytes, max_size))
        .await
        .map_err(|e| EditorError::Task(format!("decode worker: {e}")))?
}

/// Content fingerprint of the uploaded bytes (hex SHA-256)
///
/// Used as the key for remembered per-image settings. Infallible, so a
/// fingerprint can never block an upload.
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(64);
    for byte in digest.as_slice() {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}
