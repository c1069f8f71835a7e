/// Saved-state collection with quota enforcement and import/export
///
/// Each saved state is a frozen, independent snapshot: a compressed
/// restorable image payload, the transform at save time, and a small
/// thumbnail. The collection is ordered most-recent-first, bounded by a
/// configured maximum count and a configured maximum serialized size,
/// and persisted whole after every successful mutation. Any mutation
/// that cannot complete leaves both the in-memory collection and the
/// persisted copy exactly as they were.

use std::rc::Rc;

use chrono::Utc;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EditorError, EditorResult};
use crate::imaging::thumbnail::{compress_for_storage, generate_thumbnail};
use crate::state::persist::{Persistence, SAVED_STATES_KEY};
use crate::transform::Transform;

/// Storage caps, adjustable by the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of states kept; the oldest beyond this are evicted
    pub max_states: usize,
    /// Maximum serialized size of the whole collection, in bytes
    pub max_storage_bytes: usize,
}

impl Default for StoreConfig {
    /// 50 states, 50MB — the limits the editor shipped with
    fn default() -> Self {
        Self {
            max_states: 50,
            max_storage_bytes: 50 * 1024 * 1024,
        }
    }
}

/// A named, persisted snapshot of an image and its transform
///
/// This is also the interchange shape: field names are camelCase on the
/// wire and unknown extra fields are tolerated on import, so documents
/// exported by newer versions still load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    /// Unique id, generated at save time
    pub id: String,
    /// User-supplied name, non-empty after trim
    pub name: String,
    /// Creation time in milliseconds since the epoch
    pub timestamp: i64,
    /// Restorable image payload (base64 JPEG, bounded dimensions)
    pub image_data: String,
    /// Transform snapshot at save time
    pub transform: Transform,
    /// Small preview encoding, independent from `image_data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// The persistent saved-state store
pub struct SavedStateStore {
    persistence: Rc<Persistence>,
    config: StoreConfig,
    states: Vec<SavedState>,
}

impl SavedStateStore {
    /// Open the store over the platform database with default caps
    pub fn open() -> EditorResult<Self> {
        Self::new(Rc::new(Persistence::open()?), StoreConfig::default())
    }

    /// Build a store over an explicit persistence handle and caps
    ///
    /// A corrupt persisted collection does not fail the open; it is
    /// reported and the store starts empty, matching how the editor has
    /// always treated an unreadable blob.
    pub fn new(persistence: Rc<Persistence>, config: StoreConfig) -> EditorResult<Self> {
        let states = match persistence.get(SAVED_STATES_KEY)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(states) => states,
                Err(e) => {
                    eprintln!("⚠️  Failed to parse saved states, starting empty: {e}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Ok(Self {
            persistence,
            config,
            states,
        })
    }

    /// The collection, most-recent-first
    pub fn states(&self) -> &[SavedState] {
        &self.states
    }

    /// Look up one state by id
    pub fn find(&self, id: &str) -> Option<&SavedState> {
        self.states.iter().find(|s| s.id == id)
    }

    /// Serialized size of the current collection in bytes
    pub fn storage_usage(&self) -> usize {
        serde_json::to_string(&self.states)
            .map(|json| json.len())
            .unwrap_or(0)
    }

    /// The configured caps
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Snapshot the given image and transform under a new saved state
    ///
    /// Compresses the image to its storage bound, generates the
    /// thumbnail, inserts at the front, evicts beyond the count cap, and
    /// persists. Fails atomically with [`EditorError::StorageLimit`] if
    /// the resulting collection would exceed the size cap.
    pub fn save_state(
        &mut self,
        name: &str,
        image: &DynamicImage,
        transform: Transform,
    ) -> EditorResult<SavedState> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditorError::EmptyName);
        }

        let image_data = compress_for_storage(image)?;
        let thumbnail = generate_thumbnail(image)?;

        let state = SavedState {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            image_data,
            transform,
            thumbnail: Some(thumbnail),
        };

        let mut updated = self.states.clone();
        updated.insert(0, state.clone());
        updated.truncate(self.config.max_states);

        self.commit(updated)?;
        println!("💾 Saved state '{}' ({} total)", state.name, self.states.len());
        Ok(state)
    }

    /// Remove one state by id; an absent id is a no-op, not an error
    pub fn delete_state(&mut self, id: &str) -> EditorResult<()> {
        if !self.states.iter().any(|s| s.id == id) {
            return Ok(());
        }
        let updated: Vec<SavedState> =
            self.states.iter().filter(|s| s.id != id).cloned().collect();
        self.commit(updated)
    }

    /// Empty the collection and remove its persisted representation
    pub fn clear_all(&mut self) -> EditorResult<()> {
        self.persistence.remove(SAVED_STATES_KEY)?;
        self.states.clear();
        Ok(())
    }

    /// Serialize the whole collection into the interchange document
    ///
    /// The output round-trips exactly through [`Self::import_states`].
    pub fn export_states(&self) -> EditorResult<String> {
        Ok(serde_json::to_string(&self.states)?)
    }

    /// Parse and merge an interchange document
    ///
    /// Every entry is validated against the saved-state shape before any
    /// mutation happens; one malformed entry rejects the whole document.
    /// Valid entries are prepended to the existing collection and the
    /// size cap is enforced the same way `save_state` enforces it.
    /// Returns the number of imported states.
    pub fn import_states(&mut self, document: &str) -> EditorResult<usize> {
        let raw: Vec<serde_json::Value> = serde_json::from_str(document).map_err(|e| {
            EditorError::ImportFormat(format!("document is not a JSON array: {e}"))
        })?;

        let mut imported = Vec::with_capacity(raw.len());
        for (index, value) in raw.into_iter().enumerate() {
            let state: SavedState = serde_json::from_value(value)
                .map_err(|e| EditorError::ImportFormat(format!("entry {index}: {e}")))?;
            imported.push(state);
        }

        let count = imported.len();
        let mut updated = imported;
        updated.extend(self.states.iter().cloned());

        self.commit(updated)?;
        println!("📥 Imported {count} saved states ({} total)", self.states.len());
        Ok(count)
    }

    /// Size-check, persist, then swap the in-memory collection
    ///
    /// The in-memory collection is only replaced after the persisted
    /// write succeeds, so a rejected write rolls back for free.
    fn commit(&mut self, updated: Vec<SavedState>) -> EditorResult<()> {
        let serialized = serde_json::to_string(&updated)?;
        if serialized.len() > self.config.max_storage_bytes {
            return Err(EditorError::StorageLimit {
                needed: serialized.len(),
                max: self.config.max_storage_bytes,
            });
        }

        self.persistence.put(SAVED_STATES_KEY, &serialized)?;
        self.states = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{OverlayType, TransformConstraints, TransformPatch};
    use image::RgbaImage;

    fn test_image() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 48, image::Rgba([80, 90, 100, 255])))
    }

    fn test_store(config: StoreConfig) -> SavedStateStore {
        SavedStateStore::new(Rc::new(Persistence::open_in_memory().unwrap()), config).unwrap()
    }

    fn overlay_transform() -> Transform {
        Transform::default().apply_clamped(
            TransformPatch::overlay(OverlayType::Cinematic),
            &TransformConstraints::default(),
        )
    }

    #[test]
    fn test_save_assigns_id_timestamp_and_thumbnail() {
        let mut store = test_store(StoreConfig::default());
        let saved = store
            .save_state("  My promo  ", &test_image(), overlay_transform())
            .unwrap();

        assert!(!saved.id.is_empty());
        assert_eq!(saved.name, "My promo");
        assert!(saved.timestamp > 0);
        assert!(saved.thumbnail.is_some());
        assert_eq!(store.states().len(), 1);
        assert_eq!(store.states()[0], saved);
    }

    #[test]
    fn test_empty_name_rejected_without_mutation() {
        let mut store = test_store(StoreConfig::default());
        let err = store
            .save_state("   ", &test_image(), Transform::default())
            .unwrap_err();
        assert!(matches!(err, EditorError::EmptyName));
        assert!(store.states().is_empty());
    }

    #[test]
    fn test_saved_state_is_frozen_copy() {
        let mut store = test_store(StoreConfig::default());
        let saved = store
            .save_state("frozen", &test_image(), Transform::default())
            .unwrap();

        // Later saves with a different live transform never touch it
        store
            .save_state("later", &test_image(), overlay_transform())
            .unwrap();

        let still = store.find(&saved.id).unwrap();
        assert_eq!(still.transform, Transform::default());
    }

    #[test]
    fn test_oldest_states_evicted_beyond_count_cap() {
        let mut store = test_store(StoreConfig {
            max_states: 2,
            ..StoreConfig::default()
        });

        let first = store.save_state("one", &test_image(), Transform::default()).unwrap();
        store.save_state("two", &test_image(), Transform::default()).unwrap();
        store.save_state("three", &test_image(), Transform::default()).unwrap();

        assert_eq!(store.states().len(), 2);
        assert_eq!(store.states()[0].name, "three");
        assert_eq!(store.states()[1].name, "two");
        assert!(store.find(&first.id).is_none());
    }

    #[test]
    fn test_size_cap_fails_atomically() {
        // Measure one entry, then cap at 1.5 entries: the first save
        // fits, the second crosses the threshold and must change nothing
        let mut probe = test_store(StoreConfig::default());
        probe.save_state("fits", &test_image(), Transform::default()).unwrap();
        let one_entry = probe.storage_usage();

        let mut store = test_store(StoreConfig {
            max_states: 50,
            max_storage_bytes: one_entry + one_entry / 2,
        });

        store.save_state("fits", &test_image(), Transform::default()).unwrap();
        let before = store.export_states().unwrap();

        let err = store
            .save_state("overflows", &test_image(), Transform::default())
            .unwrap_err();
        assert!(matches!(err, EditorError::StorageLimit { .. }));

        // Verified via export round-trip: byte-identical document
        assert_eq!(store.export_states().unwrap(), before);
        assert_eq!(store.states().len(), 1);
    }

    #[test]
    fn test_delete_absent_id_is_noop() {
        let mut store = test_store(StoreConfig::default());
        store.save_state("keep", &test_image(), Transform::default()).unwrap();

        store.delete_state("no-such-id").unwrap();
        assert_eq!(store.states().len(), 1);

        let id = store.states()[0].id.clone();
        store.delete_state(&id).unwrap();
        assert!(store.states().is_empty());
    }

    #[test]
    fn test_clear_all_removes_everything() {
        let mut store = test_store(StoreConfig::default());
        store.save_state("a", &test_image(), Transform::default()).unwrap();
        store.save_state("b", &test_image(), Transform::default()).unwrap();

        store.clear_all().unwrap();
        assert!(store.states().is_empty());
        assert_eq!(store.export_states().unwrap(), "[]");
    }

    #[test]
    fn test_export_import_full_round_trip() {
        let mut source = test_store(StoreConfig::default());
        source.save_state("first", &test_image(), overlay_transform()).unwrap();
        source.save_state("second", &test_image(), Transform::default()).unwrap();
        let document = source.export_states().unwrap();

        let mut target = test_store(StoreConfig::default());
        let count = target.import_states(&document).unwrap();

        assert_eq!(count, 2);
        assert_eq!(target.states(), source.states());
        // Order, fields, and values all survive
        assert_eq!(target.export_states().unwrap(), document);
    }

    #[test]
    fn test_import_prepends_to_existing() {
        let mut source = test_store(StoreConfig::default());
        source.save_state("imported", &test_image(), Transform::default()).unwrap();
        let document = source.export_states().unwrap();

        let mut target = test_store(StoreConfig::default());
        target.save_state("existing", &test_image(), Transform::default()).unwrap();
        target.import_states(&document).unwrap();

        assert_eq!(target.states()[0].name, "imported");
        assert_eq!(target.states()[1].name, "existing");
    }

    #[test]
    fn test_import_rejects_wrong_typed_field_atomically() {
        let mut store = test_store(StoreConfig::default());
        store.save_state("existing", &test_image(), Transform::default()).unwrap();
        let before = store.export_states().unwrap();

        // transform.scale is a string, not a number
        let document = r#"[{
            "id": "x", "name": "bad", "timestamp": 1,
            "imageData": "aGk=",
            "transform": {"scale": "1", "offsetX": 0, "offsetY": 0, "overlayType": null}
        }]"#;

        let err = store.import_states(document).unwrap_err();
        assert!(matches!(err, EditorError::ImportFormat(_)));
        assert!(err.to_string().contains("entry 0"));
        assert_eq!(store.export_states().unwrap(), before);
    }

    #[test]
    fn test_import_rejects_missing_required_field() {
        let mut store = test_store(StoreConfig::default());
        let document = r#"[{"id": "x", "name": "bad", "timestamp": 1}]"#;
        assert!(matches!(
            store.import_states(document).unwrap_err(),
            EditorError::ImportFormat(_)
        ));
    }

    #[test]
    fn test_import_tolerates_unknown_extra_fields() {
        let mut store = test_store(StoreConfig::default());
        let document = r#"[{
            "id": "x", "name": "ok", "timestamp": 1,
            "imageData": "aGk=",
            "transform": {"scale": 1.5, "offsetX": 10, "offsetY": -10, "overlayType": "cinematic"},
            "futureField": {"nested": true}
        }]"#;

        assert_eq!(store.import_states(document).unwrap(), 1);
        assert_eq!(store.states()[0].transform.overlay_type, OverlayType::Cinematic);
    }

    #[test]
    fn test_import_rejects_non_array_document() {
        let mut store = test_store(StoreConfig::default());
        assert!(matches!(
            store.import_states(r#"{"not": "an array"}"#).unwrap_err(),
            EditorError::ImportFormat(_)
        ));
    }

    #[test]
    fn test_import_respects_size_cap() {
        let mut source = test_store(StoreConfig::default());
        source.save_state("big", &test_image(), Transform::default()).unwrap();
        let document = source.export_states().unwrap();

        let mut tiny = test_store(StoreConfig {
            max_states: 50,
            max_storage_bytes: 100,
        });
        let err = tiny.import_states(&document).unwrap_err();
        assert!(matches!(err, EditorError::StorageLimit { .. }));
        assert!(tiny.states().is_empty());
    }

    #[test]
    fn test_storage_usage_tracks_serialized_size() {
        let mut store = test_store(StoreConfig::default());
        assert_eq!(store.storage_usage(), "[]".len());

        store.save_state("a", &test_image(), Transform::default()).unwrap();
        let usage = store.storage_usage();
        assert_eq!(usage, store.export_states().unwrap().len());
        assert!(usage > 2);
    }
}
