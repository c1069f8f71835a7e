/// Editor preferences blob
///
/// A small settings document (default transform, auto-save flag, theme)
/// persisted under its own key, independent from the saved-state
/// collection. Like the collection it is always read and written whole.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::EditorResult;
use crate::state::persist::{Persistence, PREFERENCES_KEY};
use crate::transform::Transform;

/// User preferences for the editor
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditorPreferences {
    /// Transform applied when loading an image with no remembered settings
    pub default_transform: Transform,
    /// Whether per-image settings are remembered across uploads
    pub auto_save_settings: bool,
    /// Theme flag; the engine only stores it
    pub dark_mode: bool,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            default_transform: Transform::default(),
            auto_save_settings: true,
            dark_mode: false,
        }
    }
}

/// A partial preferences update
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferencesPatch {
    pub default_transform: Option<Transform>,
    pub auto_save_settings: Option<bool>,
    pub dark_mode: Option<bool>,
}

/// Owns the live preferences and keeps them in sync with the store
pub struct PreferencesManager {
    persistence: Rc<Persistence>,
    current: EditorPreferences,
}

impl PreferencesManager {
    /// Load preferences, falling back to defaults when nothing is stored
    /// or the stored blob does not parse
    pub fn new(persistence: Rc<Persistence>) -> EditorResult<Self> {
        let current = match persistence.get(PREFERENCES_KEY)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(prefs) => prefs,
                Err(e) => {
                    eprintln!("⚠️  Failed to parse saved preferences, using defaults: {e}");
                    EditorPreferences::default()
                }
            },
            None => EditorPreferences::default(),
        };

        Ok(Self {
            persistence,
            current,
        })
    }

    /// The live preferences
    pub fn current(&self) -> &EditorPreferences {
        &self.current
    }

    /// Merge a patch, persist, and return the updated preferences
    ///
    /// The in-memory value only changes after the write succeeds.
    pub fn update(&mut self, patch: PreferencesPatch) -> EditorResult<EditorPreferences> {
        let updated = EditorPreferences {
            default_transform: patch
                .default_transform
                .unwrap_or(self.current.default_transform),
            auto_save_settings: patch
                .auto_save_settings
                .unwrap_or(self.current.auto_save_settings),
            dark_mode: patch.dark_mode.unwrap_or(self.current.dark_mode),
        };

        let json = serde_json::to_string(&updated)?;
        self.persistence.put(PREFERENCES_KEY, &json)?;
        self.current = updated.clone();
        Ok(updated)
    }

    /// Drop back to defaults and remove the persisted blob
    pub fn reset(&mut self) -> EditorResult<()> {
        self.persistence.remove(PREFERENCES_KEY)?;
        self.current = EditorPreferences::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformConstraints;
    use crate::transform::TransformPatch;

    fn manager() -> PreferencesManager {
        PreferencesManager::new(Rc::new(Persistence::open_in_memory().unwrap())).unwrap()
    }

    #[test]
    fn test_defaults_when_nothing_stored() {
        let m = manager();
        assert_eq!(*m.current(), EditorPreferences::default());
        assert!(m.current().auto_save_settings);
        assert!(!m.current().dark_mode);
    }

    #[test]
    fn test_update_persists_and_reloads() {
        let persistence = Rc::new(Persistence::open_in_memory().unwrap());

        let mut m = PreferencesManager::new(Rc::clone(&persistence)).unwrap();
        let custom_default = Transform::default().apply_clamped(
            TransformPatch::scale(1.5),
            &TransformConstraints::default(),
        );
        m.update(PreferencesPatch {
            default_transform: Some(custom_default),
            dark_mode: Some(true),
            ..PreferencesPatch::default()
        })
        .unwrap();

        // A fresh manager over the same persistence sees the update
        let reloaded = PreferencesManager::new(persistence).unwrap();
        assert_eq!(reloaded.current().default_transform.scale, 1.5);
        assert!(reloaded.current().dark_mode);
        // Untouched field kept its value
        assert!(reloaded.current().auto_save_settings);
    }

    #[test]
    fn test_corrupt_blob_falls_back_to_defaults() {
        let persistence = Rc::new(Persistence::open_in_memory().unwrap());
        persistence.put(PREFERENCES_KEY, "{not json").unwrap();

        let m = PreferencesManager::new(persistence).unwrap();
        assert_eq!(*m.current(), EditorPreferences::default());
    }

    #[test]
    fn test_reset_removes_persisted_blob() {
        let persistence = Rc::new(Persistence::open_in_memory().unwrap());

        let mut m = PreferencesManager::new(Rc::clone(&persistence)).unwrap();
        m.update(PreferencesPatch {
            dark_mode: Some(true),
            ..PreferencesPatch::default()
        })
        .unwrap();
        m.reset().unwrap();

        assert_eq!(*m.current(), EditorPreferences::default());
        assert_eq!(persistence.get(PREFERENCES_KEY).unwrap(), None);
    }
}
