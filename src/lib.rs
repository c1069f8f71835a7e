//! Transform history and composition engine for a promo image editor
//!
//! The engine behind an image editor that loads a raster image, applies
//! a reversible geometric transform (uniform scale + 2-D offset) and an
//! optional decorative overlay, then exports the composited result or
//! persists named snapshots for later recall.
//!
//! Components, leaf-first:
//! - [`transform`]: the transform record and its configured bounds
//! - [`history`]: the undo/redo state machine over transform records
//! - [`compositor`]: deterministic cover-fit rendering and export encoding
//! - [`imaging`]: upload validation, payload compression, thumbnails
//! - [`state`]: SQLite-backed saved states and preferences
//! - [`session`]: the composition root wiring user intents together
//!
//! The presentational UI, shortcut dispatch, and file acquisition are
//! external callers of [`session::EditorSession`]; nothing in this crate
//! touches a window or discovers a rendering surface implicitly.

pub mod compositor;
pub mod error;
pub mod history;
pub mod imaging;
pub mod session;
pub mod state;
pub mod transform;

pub use compositor::{ExportArtifact, ExportFormat, DEFAULT_EXPORT_QUALITY};
pub use error::{EditorError, EditorResult};
pub use history::TransformHistory;
pub use session::{EditorSession, Generation, SessionConfig, UploadOutcome};
pub use state::prefs::{EditorPreferences, PreferencesPatch};
pub use state::store::{SavedState, SavedStateStore, StoreConfig};
pub use transform::{OverlayType, Transform, TransformConstraints, TransformPatch};
