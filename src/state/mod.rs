/// Durable state module
///
/// This module handles everything that outlives the process:
/// - SQLite-backed key/value persistence (persist.rs)
/// - The saved-state collection with quota enforcement (store.rs)
/// - Editor preferences (prefs.rs)

pub mod persist;
pub mod prefs;
pub mod store;
