//! Client identity with lazy generation and session-scoped server override

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::store::{FileStore, IdentityStore, MemoryStore};

/// Retention scope for the client identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityScope {
    /// Survives handle re-creation against the same session store, distinct
    /// per session (the per-tab scope of the browser-facing deployment)
    Session,
    /// Survives across processes on the device
    Persistent,
    /// Lost when the identity is dropped
    Ephemeral,
}

/// Resolves and retains a per-client unique identifier
///
/// The identifier is generated lazily on first access, at most once per store
/// lifetime. A server-confirmed identity can override the live value for the
/// current session without touching the retention store — on reconnect the
/// client keeps issuing its own scope-derived id.
pub struct ClientIdentity {
    scope: IdentityScope,
    store: Arc<dyn IdentityStore>,
    /// Server-confirmed identity, session-scoped, never persisted
    server_id: Mutex<Option<String>>,
}

impl ClientIdentity {
    /// Create an identity for a scope with an explicit backing store
    ///
    /// The scope-to-store mapping is a deployment decision: session and
    /// persistent scopes normally use [`FileStore`]s at paths with the
    /// matching lifetime, ephemeral uses [`MemoryStore`].
    pub fn with_store(scope: IdentityScope, store: Arc<dyn IdentityStore>) -> Self {
        Self {
            scope,
            store,
            server_id: Mutex::new(None),
        }
    }

    /// Create an ephemeral identity backed by an in-memory store
    pub fn ephemeral() -> Self {
        Self::with_store(IdentityScope::Ephemeral, Arc::new(MemoryStore::new()))
    }

    /// Create a session-scoped identity backed by a file at `path`
    pub fn session(path: impl Into<std::path::PathBuf>) -> Self {
        Self::with_store(IdentityScope::Session, Arc::new(FileStore::new(path)))
    }

    /// Create a persistent identity backed by a file at `path`
    pub fn persistent(path: impl Into<std::path::PathBuf>) -> Self {
        Self::with_store(IdentityScope::Persistent, Arc::new(FileStore::new(path)))
    }

    /// The retention scope this identity was configured with
    pub fn scope(&self) -> IdentityScope {
        self.scope
    }

    /// The scope-derived identifier, generated and stored on first access
    pub fn id(&self) -> String {
        if let Some(existing) = self.store.load() {
            return existing;
        }

        let generated = Uuid::new_v4().to_string();
        self.store.save(&generated);
        tracing::debug!(scope = ?self.scope, id = %generated, "Generated client identity");
        generated
    }

    /// Record the server-assigned identity for the current session
    ///
    /// The override applies to self-omission comparisons only; the retention
    /// store keeps the scope-derived id for future reconnects.
    pub fn confirm(&self, server_id: impl Into<String>) {
        let server_id = server_id.into();
        tracing::debug!(id = %server_id, "Server confirmed client identity");
        *self.server_id.lock().expect("identity poisoned") = Some(server_id);
    }

    /// The identity used for self-omission: server-confirmed if one arrived
    /// this session, otherwise the scope-derived id
    pub fn live_id(&self) -> String {
        if let Some(confirmed) = self
            .server_id
            .lock()
            .expect("identity poisoned")
            .clone()
        {
            return confirmed;
        }
        self.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_v4_uuid(id: &str) -> bool {
        let parsed = match Uuid::parse_str(id) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };
        parsed.get_version_num() == 4 && id == id.to_lowercase()
    }

    #[test]
    fn test_id_is_stable_per_store() {
        let identity = ClientIdentity::ephemeral();

        let first = identity.id();
        let second = identity.id();

        assert_eq!(first, second);
        assert!(is_v4_uuid(&first));
    }

    #[test]
    fn test_fresh_store_generates_new_id() {
        let a = ClientIdentity::ephemeral();
        let b = ClientIdentity::ephemeral();

        assert_ne!(a.id(), b.id());
        assert!(is_v4_uuid(&b.id()));
    }

    #[test]
    fn test_session_scope_survives_handle_recreation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session_id");

        let first = ClientIdentity::session(&path).id();
        let second = ClientIdentity::session(&path).id();

        assert_eq!(first, second);
    }

    #[test]
    fn test_server_confirm_overrides_live_id_only() {
        let identity = ClientIdentity::ephemeral();
        let own = identity.id();

        identity.confirm("server-assigned");

        assert_eq!(identity.live_id(), "server-assigned");
        // The retention store still answers with the scope-derived id
        assert_eq!(identity.id(), own);
    }
}
