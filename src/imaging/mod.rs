/// Image ingestion and payload encoding
///
/// This module handles:
/// - Validating and decoding uploaded image bytes
/// - Content fingerprints for the per-image settings cache
/// - Compressing images to a bounded size for storage
/// - Generating thumbnails for saved states

pub mod decode;
pub mod thumbnail;
