/// Error types shared across the editor engine
///
/// Every failure surfaced to the caller carries a short human-readable
/// message that distinguishes its cause (file too large vs. storage
/// limit reached vs. malformed import), so the UI layer can show it
/// directly without mapping codes.

use thiserror::Error;

/// Convenience alias used by every fallible operation in the crate
pub type EditorResult<T> = Result<T, EditorError>;

/// All failure modes of the engine
#[derive(Error, Debug)]
pub enum EditorError {
    /// The uploaded bytes are not one of the accepted input formats
    #[error("unsupported image format: {0} (use a JPG, PNG, or WebP image)")]
    UnsupportedFormat(String),

    /// The uploaded file exceeds the configured size limit
    #[error("file too large: {size} bytes (limit is {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    /// The bytes claimed to be an image but could not be decoded
    #[error("invalid image file: {0}")]
    InvalidImage(String),

    /// Render or export was requested with no image loaded
    #[error("no image loaded, nothing to render")]
    NoImage,

    /// A saved-state name was empty after trimming
    #[error("saved state name must not be empty")]
    EmptyName,

    /// A restore referenced a saved-state id that does not exist
    #[error("no saved state with id {0}")]
    UnknownState(String),

    /// Saving or importing would push the collection past the storage cap
    #[error("storage limit reached: {needed} bytes needed, {max} bytes allowed; delete some saved states first")]
    StorageLimit { needed: usize, max: usize },

    /// An import document failed shape validation
    #[error("invalid saved states format: {0}")]
    ImportFormat(String),

    /// A background worker task failed to complete
    #[error("background task failed: {0}")]
    Task(String),

    /// The underlying SQLite store rejected an operation
    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// Filesystem operation failed (data directory, export write)
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The image crate failed to encode or decode pixel data
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}
