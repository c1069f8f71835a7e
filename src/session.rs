/// Editor session: the composition root
///
/// Owns the currently loaded image (or none) and wires user-level
/// intents to the engine components: transform mutation goes through the
/// history engine, rendering and export through the compositor, and
/// snapshot persistence through the saved-state store. Per-image
/// remembered settings live here as an owned cache keyed by content
/// fingerprint.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::{DynamicImage, RgbaImage};

use crate::compositor::{self, ExportArtifact, ExportFormat};
use crate::error::{EditorError, EditorResult};
use crate::history::TransformHistory;
use crate::imaging::decode;
use crate::imaging::thumbnail;
use crate::state::persist::Persistence;
use crate::state::prefs::{EditorPreferences, PreferencesManager, PreferencesPatch};
use crate::state::store::{SavedState, SavedStateStore, StoreConfig};
use crate::transform::{OverlayType, Transform, TransformConstraints, TransformPatch};

/// Session-level configuration
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Bounds applied to every transform mutation
    pub constraints: TransformConstraints,
    /// Upload size limit in bytes
    pub max_file_size: usize,
    /// Whether the per-image settings cache survives a saved-state
    /// restore; hosts that treat a restore as a clean slate set false
    pub remember_across_restores: bool,
    /// Caps forwarded to the saved-state store
    pub store: StoreConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            constraints: TransformConstraints::default(),
            max_file_size: decode::MAX_FILE_SIZE,
            remember_across_restores: true,
            store: StoreConfig::default(),
        }
    }
}

/// Token identifying one editing generation
///
/// Async work started under an older token is stale: its result must be
/// discarded instead of overwriting newer session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// The decoded image currently being edited
#[derive(Debug, Clone)]
pub struct LoadedImage {
    image: DynamicImage,
    fingerprint: Option<String>,
    source_len: usize,
}

impl LoadedImage {
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Content fingerprint of the source bytes, when one was computed
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Size of the undecoded source in bytes
    pub fn source_len(&self) -> usize {
        self.source_len
    }
}

/// Result of completing an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The image became the current one; `restored_settings` reports
    /// whether a remembered per-image transform was reinstated
    Applied { restored_settings: bool },
    /// A newer upload or restore superseded this one; nothing changed
    Stale,
}

/// The editing session
pub struct EditorSession {
    config: SessionConfig,
    image: Option<LoadedImage>,
    history: TransformHistory,
    store: SavedStateStore,
    prefs: PreferencesManager,
    settings_cache: HashMap<String, Transform>,
    generation: u64,
}

impl EditorSession {
    /// Open a session over the platform database
    pub fn open(config: SessionConfig) -> EditorResult<Self> {
        Self::new(Rc::new(Persistence::open()?), config)
    }

    /// Build a session over an explicit persistence handle
    pub fn new(persistence: Rc<Persistence>, config: SessionConfig) -> EditorResult<Self> {
        let store = SavedStateStore::new(Rc::clone(&persistence), config.store)?;
        let prefs = PreferencesManager::new(persistence)?;
        let initial = prefs.current().default_transform;

        Ok(Self {
            config,
            image: None,
            history: TransformHistory::new(initial, config.constraints),
            store,
            prefs,
            settings_cache: HashMap::new(),
            generation: 0,
        })
    }

    // ========== Generations ==========

    /// The current generation token
    pub fn generation(&self) -> Generation {
        Generation(self.generation)
    }

    /// Whether a token still refers to the current generation
    pub fn is_current(&self, token: Generation) -> bool {
        token.0 == self.generation
    }

    fn bump_generation(&mut self) -> Generation {
        self.generation += 1;
        Generation(self.generation)
    }

    // ========== Image lifecycle ==========

    /// Validate, decode, and install uploaded image bytes
    ///
    /// Decoding runs on a blocking worker. The generation is bumped up
    /// front, so an upload that is superseded before it completes is
    /// discarded rather than applied.
    pub async fn upload_image(&mut self, bytes: Vec<u8>) -> EditorResult<UploadOutcome> {
        let token = self.begin_upload();
        let fingerprint = decode::fingerprint(&bytes);
        let source_len = bytes.len();

        let image = decode::decode_image_async(bytes, self.config.max_file_size).await?;
        Ok(self.complete_upload(token, Some(fingerprint), source_len, image))
    }

    /// Start a new upload generation, invalidating in-flight work
    ///
    /// Callers that drive decoding themselves pair this with
    /// [`Self::complete_upload`]; [`Self::upload_image`] does both.
    pub fn begin_upload(&mut self) -> Generation {
        self.bump_generation()
    }

    /// Install a decoded image if its generation is still current
    ///
    /// A missing fingerprint only disables per-image settings memory for
    /// this image; it never blocks the upload itself.
    pub fn complete_upload(
        &mut self,
        token: Generation,
        fingerprint: Option<String>,
        source_len: usize,
        image: DynamicImage,
    ) -> UploadOutcome {
        if !self.is_current(token) {
            return UploadOutcome::Stale;
        }

        let remembered = if self.prefs.current().auto_save_settings {
            fingerprint
                .as_deref()
                .and_then(|fp| self.settings_cache.get(fp).copied())
        } else {
            None
        };
        let restored_settings = remembered.is_some();
        let initial = remembered.unwrap_or(self.prefs.current().default_transform);

        self.history.reset(initial);
        self.image = Some(LoadedImage {
            image,
            fingerprint,
            source_len,
        });
        UploadOutcome::Applied { restored_settings }
    }

    /// The current image, if one is loaded
    pub fn loaded_image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    // ========== Transform mutation ==========

    /// The live transform
    pub fn transform(&self) -> Transform {
        self.history.present()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Apply one committed transform change
    ///
    /// Continuous gestures (drag, wheel) must be coalesced by the caller
    /// into one call per committed step; each call here is one undo
    /// entry.
    pub fn update_transform(&mut self, patch: TransformPatch) -> Transform {
        let updated = self.history.update(patch);
        self.remember_current(updated);
        updated
    }

    /// Select an overlay; reselecting the active one turns it off
    pub fn toggle_overlay(&mut self, kind: OverlayType) -> Transform {
        let next = if self.transform().overlay_type == kind {
            OverlayType::None
        } else {
            kind
        };
        self.update_transform(TransformPatch::overlay(next))
    }

    pub fn undo(&mut self) -> Transform {
        let t = self.history.undo();
        self.remember_current(t);
        t
    }

    pub fn redo(&mut self) -> Transform {
        let t = self.history.redo();
        self.remember_current(t);
        t
    }

    /// Return to the preferred default transform as an undoable edit
    pub fn reset_transform(&mut self) -> Transform {
        self.bump_generation();
        let d = self.prefs.current().default_transform;
        self.update_transform(TransformPatch {
            scale: Some(d.scale),
            offset_x: Some(d.offset_x),
            offset_y: Some(d.offset_y),
            overlay_type: Some(d.overlay_type),
        })
    }

    fn remember_current(&mut self, transform: Transform) {
        if !self.prefs.current().auto_save_settings {
            return;
        }
        if let Some(fp) = self.image.as_ref().and_then(|img| img.fingerprint.clone()) {
            self.settings_cache.insert(fp, transform);
        }
    }

    // ========== Rendering and export ==========

    /// Composite the current image under the live transform
    pub fn render(&self, output_size: u32) -> EditorResult<RgbaImage> {
        let loaded = self.image.as_ref().ok_or(EditorError::NoImage)?;
        Ok(compositor::render(
            &loaded.image,
            &self.history.present(),
            output_size,
        ))
    }

    /// Render and encode an export artifact
    pub fn export(
        &self,
        output_size: u32,
        format: ExportFormat,
        quality: Option<f32>,
    ) -> EditorResult<ExportArtifact> {
        let loaded = self.image.as_ref().ok_or(EditorError::NoImage)?;
        compositor::export(
            &loaded.image,
            &self.history.present(),
            output_size,
            format,
            quality,
        )
    }

    /// Export and write the artifact into a directory
    pub fn export_to_dir(
        &self,
        dir: &Path,
        output_size: u32,
        format: ExportFormat,
        quality: Option<f32>,
    ) -> EditorResult<PathBuf> {
        let artifact = self.export(output_size, format, quality)?;
        let path = dir.join(&artifact.file_name);
        std::fs::write(&path, &artifact.bytes)?;
        println!("📦 Exported image: {}", path.display());
        Ok(path)
    }

    // ========== Saved states ==========

    /// Snapshot the current image and transform under a name
    pub fn save_current_state(&mut self, name: &str) -> EditorResult<SavedState> {
        let loaded = self.image.as_ref().ok_or(EditorError::NoImage)?;
        self.store
            .save_state(name, &loaded.image, self.history.present())
    }

    /// Load a saved state back into the session
    ///
    /// Restoring starts a fresh editing session on different content, so
    /// history is reset rather than appended to, and any in-flight async
    /// work is invalidated.
    pub fn restore_state(&mut self, id: &str) -> EditorResult<()> {
        let state = self
            .store
            .find(id)
            .ok_or_else(|| EditorError::UnknownState(id.to_string()))?
            .clone();

        let bytes = thumbnail::payload_bytes(&state.image_data)?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| EditorError::InvalidImage(e.to_string()))?;
        let fingerprint = decode::fingerprint(&bytes);

        self.bump_generation();
        if !self.config.remember_across_restores {
            self.settings_cache.clear();
        }

        self.history.reset(state.transform);
        self.image = Some(LoadedImage {
            image,
            fingerprint: Some(fingerprint),
            source_len: bytes.len(),
        });
        Ok(())
    }

    pub fn saved_states(&self) -> &[SavedState] {
        self.store.states()
    }

    pub fn delete_state(&mut self, id: &str) -> EditorResult<()> {
        self.store.delete_state(id)
    }

    pub fn clear_saved_states(&mut self) -> EditorResult<()> {
        self.store.clear_all()
    }

    pub fn export_states(&self) -> EditorResult<String> {
        self.store.export_states()
    }

    pub fn import_states(&mut self, document: &str) -> EditorResult<usize> {
        self.store.import_states(document)
    }

    pub fn storage_usage(&self) -> usize {
        self.store.storage_usage()
    }

    // ========== Preferences ==========

    pub fn preferences(&self) -> &EditorPreferences {
        self.prefs.current()
    }

    pub fn update_preferences(&mut self, patch: PreferencesPatch) -> EditorResult<EditorPreferences> {
        self.prefs.update(patch)
    }

    pub fn reset_preferences(&mut self) -> EditorResult<()> {
        self.prefs.reset()
    }
}
