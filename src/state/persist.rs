/// SQLite-backed key/value persistence
///
/// The editor keeps two durable blobs: the saved-state collection and
/// the preferences document. Each lives under its own fixed key so they
/// never collide and can be cleared independently. Values are always
/// read and written whole; there is no field-level persistence.

use std::path::PathBuf;

use rusqlite::{Connection, OptionalExtension};

use crate::error::EditorResult;

/// Namespace for the saved-state collection
pub const SAVED_STATES_KEY: &str = "image-editor-saved-states";

/// Namespace for editor preferences
pub const PREFERENCES_KEY: &str = "image-editor-preferences";

/// Handle to the on-disk (or in-memory) blob store
pub struct Persistence {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl Persistence {
    /// Open (or create) the database in the user's data directory
    ///
    /// - Linux: ~/.local/share/promo-editor/promo_editor.db
    /// - macOS: ~/Library/Application Support/promo-editor/promo_editor.db
    /// - Windows: %APPDATA%\promo-editor\promo_editor.db
    pub fn open() -> EditorResult<Self> {
        let db_path = Self::default_db_path();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)?;
        println!("📁 Editor database initialized at: {}", db_path.display());

        let persistence = Persistence {
            conn,
            db_path: Some(db_path),
        };
        persistence.init_schema()?;
        Ok(persistence)
    }

    /// Open a throwaway in-memory database (used by tests)
    pub fn open_in_memory() -> EditorResult<Self> {
        let persistence = Persistence {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        persistence.init_schema()?;
        Ok(persistence)
    }

    fn default_db_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("promo-editor");
        path.push("promo_editor.db");
        path
    }

    fn init_schema(&self) -> EditorResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS blobs (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Path to the database file, if this store is on disk
    pub fn path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Read a whole blob; `None` when the key has never been written
    pub fn get(&self, key: &str) -> EditorResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM blobs WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Replace a whole blob atomically
    pub fn put(&self, key: &str, value: &str) -> EditorResult<()> {
        self.conn.execute(
            "INSERT INTO blobs (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// Remove a blob entirely; absent keys are a no-op
    pub fn remove(&self, key: &str) -> EditorResult<()> {
        self.conn.execute("DELETE FROM blobs WHERE key = ?1", [key])?;
        Ok(())
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_put_remove_round_trip() {
        let p = Persistence::open_in_memory().unwrap();

        assert_eq!(p.get(SAVED_STATES_KEY).unwrap(), None);

        p.put(SAVED_STATES_KEY, "[]").unwrap();
        assert_eq!(p.get(SAVED_STATES_KEY).unwrap().as_deref(), Some("[]"));

        p.put(SAVED_STATES_KEY, "[1]").unwrap();
        assert_eq!(p.get(SAVED_STATES_KEY).unwrap().as_deref(), Some("[1]"));

        p.remove(SAVED_STATES_KEY).unwrap();
        assert_eq!(p.get(SAVED_STATES_KEY).unwrap(), None);
    }

    #[test]
    fn test_namespaces_are_independent() {
        let p = Persistence::open_in_memory().unwrap();
        p.put(SAVED_STATES_KEY, "states").unwrap();
        p.put(PREFERENCES_KEY, "prefs").unwrap();

        p.remove(SAVED_STATES_KEY).unwrap();

        assert_eq!(p.get(SAVED_STATES_KEY).unwrap(), None);
        assert_eq!(p.get(PREFERENCES_KEY).unwrap().as_deref(), Some("prefs"));
    }
}
