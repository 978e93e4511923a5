//! Retention stores for client identifiers
//!
//! The three identity scopes map to stores with different lifetimes: an
//! in-memory store (lost when dropped), and file-backed stores at either a
//! session-scoped or a device-scoped path. Which store backs which scope is
//! decided once at construction, not per call.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Backing storage for a client identifier
pub trait IdentityStore: Send + Sync {
    /// Load the stored identifier, if one exists
    fn load(&self) -> Option<String>;

    /// Persist an identifier, replacing any previous value
    fn save(&self, id: &str);
}

/// In-memory store; the identifier lives as long as the store itself
#[derive(Default)]
pub struct MemoryStore {
    value: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.value.lock().expect("identity store poisoned").clone()
    }

    fn save(&self, id: &str) {
        *self.value.lock().expect("identity store poisoned") = Some(id.to_string());
    }
}

/// File-backed store; the identifier survives as long as the file does
///
/// Used for both the session scope (a path cleared when the session ends)
/// and the persistent scope (a path cleared only by explicit user action).
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IdentityStore for FileStore {
    fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(_) => None,
        }
    }

    fn save(&self, id: &str) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(e) = fs::write(&self.path, id) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to persist client identity, continuing with in-memory value"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load().is_none());

        store.save("some-id");
        assert_eq!(store.load().as_deref(), Some("some-id"));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client_id");

        let store = FileStore::new(&path);
        assert!(store.load().is_none());
        store.save("persisted-id");

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.load().as_deref(), Some("persisted-id"));
    }

    #[test]
    fn test_file_store_ignores_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client_id");
        std::fs::write(&path, "  \n").unwrap();

        let store = FileStore::new(&path);
        assert!(store.load().is_none());
    }
}
