//! Connection registry
//!
//! Owns exactly one connection per logical path. The registry is an explicit
//! object with its own lifetime — there is no process-global state — so test
//! instances and multiple buses never share connections by accident.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;

use crate::observer::Observers;

use super::handle::{ConnectionHandle, ConnectionInner};
use super::status::ConnectionStatus;
use super::task;
use super::ConnectionConfig;

/// Registry state shared with handles (for removal on teardown)
pub(super) struct RegistryShared {
    connections: Mutex<HashMap<String, ConnectionHandle>>,
}

impl RegistryShared {
    /// Remove the entry for `path`, but only if it still refers to `inner`
    ///
    /// A torn-down connection may race a fresh `connect()` on the same path;
    /// the stale teardown must not evict the live replacement's entry.
    pub(super) fn remove(&self, path: &str, inner: &Arc<ConnectionInner>) {
        let mut connections = self.connections.lock().expect("registry poisoned");
        if let Some(existing) = connections.get(path) {
            if Arc::ptr_eq(&existing.inner, inner) {
                connections.remove(path);
            }
        }
    }
}

/// Registry of managed connections, keyed by endpoint path
pub struct ConnectionRegistry {
    /// Base WebSocket URL, scheme and host (e.g. `ws://127.0.0.1:8080`)
    base_url: String,
    config: ConnectionConfig,
    shared: Arc<RegistryShared>,
}

impl ConnectionRegistry {
    /// Create a registry for endpoints under the given base URL
    pub fn new(base_url: impl Into<String>, config: ConnectionConfig) -> Self {
        Self {
            base_url: base_url.into(),
            config,
            shared: Arc::new(RegistryShared {
                connections: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Open (or return) the connection for a path
    ///
    /// Idempotent: a second call with the same path before teardown returns
    /// the identical handle and does not open a second socket. The client
    /// identity is attached to the endpoint URL as a query parameter.
    pub fn connect(&self, path: &str, client_id: &str) -> ConnectionHandle {
        let mut connections = self.shared.connections.lock().expect("registry poisoned");

        if let Some(existing) = connections.get(path) {
            return existing.clone();
        }

        let url = format!(
            "{}{}?uuid={}",
            self.base_url.trim_end_matches('/'),
            path,
            client_id
        );

        let (outbound_tx, outbound_rx) = mpsc::channel(self.config.outbound_capacity);

        let inner = Arc::new(ConnectionInner {
            path: path.to_string(),
            url,
            config: self.config.clone(),
            status: Mutex::new(ConnectionStatus::Connecting),
            should_reconnect: AtomicBool::new(true),
            reconnect_attempts: std::sync::atomic::AtomicU32::new(0),
            outbound_tx,
            shutdown: tokio::sync::Notify::new(),
            message_observers: Observers::new("connection-message"),
            status_observers: Observers::new("connection-status"),
            last_pong: Mutex::new(None),
            registry: Arc::downgrade(&self.shared),
        });

        let handle = ConnectionHandle {
            inner: inner.clone(),
        };
        connections.insert(path.to_string(), handle.clone());

        tracing::info!(path, url = %handle.url(), "Opening connection");
        tokio::spawn(task::run(inner, outbound_rx));

        handle
    }

    /// Look up the connection for a path without creating one
    pub fn get(&self, path: &str) -> Option<ConnectionHandle> {
        self.shared
            .connections
            .lock()
            .expect("registry poisoned")
            .get(path)
            .cloned()
    }

    /// Number of live connections
    pub fn len(&self) -> usize {
        self.shared
            .connections
            .lock()
            .expect("registry poisoned")
            .len()
    }

    /// Whether the registry has no live connections
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seconds since the last liveness ack on a path, if the connection
    /// exists and has seen one
    pub fn seconds_since_pong(&self, path: &str) -> Option<u64> {
        let handle = self.get(path)?;
        let last = handle.last_pong()?;
        Some(Instant::now().duration_since(last).as_secs())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn fast_config() -> ConnectionConfig {
        ConnectionConfig::default()
            .base_interval(Duration::from_millis(10))
            .max_interval(Duration::from_millis(40))
            .max_reconnect_attempts(2)
    }

    /// Poll until the condition holds or the deadline passes
    async fn wait_for<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        // Nothing listens on port 9; the handles are still valid objects
        let registry = ConnectionRegistry::new("ws://127.0.0.1:9", fast_config());

        let first = registry.connect("/ws/broadcast", "client-a");
        let second = registry.connect("/ws/broadcast", "client-a");

        assert!(ConnectionHandle::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);

        first.disconnect();
    }

    #[tokio::test]
    async fn test_distinct_paths_get_distinct_connections() {
        let registry = ConnectionRegistry::new("ws://127.0.0.1:9", fast_config());

        let a = registry.connect("/ws/broadcast", "client-a");
        let b = registry.connect("/ws/other", "client-a");

        assert!(!ConnectionHandle::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);

        a.disconnect();
        b.disconnect();
    }

    #[tokio::test]
    async fn test_url_carries_client_identity() {
        let registry = ConnectionRegistry::new("ws://127.0.0.1:9/", fast_config());

        let handle = registry.connect("/ws/broadcast", "id-123");

        assert_eq!(handle.url(), "ws://127.0.0.1:9/ws/broadcast?uuid=id-123");
        handle.disconnect();
    }

    #[tokio::test]
    async fn test_disconnect_removes_from_registry() {
        let registry = ConnectionRegistry::new("ws://127.0.0.1:9", fast_config());

        let first = registry.connect("/ws/broadcast", "client-a");
        first.disconnect();
        assert!(registry.is_empty());

        // A fresh connect opens a new connection, not the torn-down one
        let second = registry.connect("/ws/broadcast", "client-a");
        assert!(!ConnectionHandle::ptr_eq(&first, &second));

        second.disconnect();
    }

    #[tokio::test]
    async fn test_stale_teardown_spares_fresh_connection() {
        use futures_util::StreamExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                tokio::spawn(async move {
                    if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
                        while let Some(Ok(_)) = ws.next().await {}
                    }
                });
            }
        });

        let registry = ConnectionRegistry::new(format!("ws://{}", addr), fast_config());

        let first = registry.connect("/ws/broadcast", "client-a");
        assert!(wait_for(|| first.is_connected(), Duration::from_secs(5)).await);

        // Teardown immediately followed by a fresh connect on the same path:
        // the old task's removal runs after the new entry is in place
        first.disconnect();
        let second = registry.connect("/ws/broadcast", "client-a");
        assert!(!ConnectionHandle::ptr_eq(&first, &second));
        assert!(wait_for(|| second.is_connected(), Duration::from_secs(5)).await);

        assert!(
            wait_for(
                || first.status() == ConnectionStatus::Disconnected,
                Duration::from_secs(5)
            )
            .await
        );
        tokio::time::sleep(Duration::from_millis(100)).await;

        // The stale teardown must not have evicted the live replacement
        let current = registry
            .get("/ws/broadcast")
            .expect("live connection evicted from registry");
        assert!(ConnectionHandle::ptr_eq(&current, &second));

        second.disconnect();
    }

    #[tokio::test]
    async fn test_reconnect_exhaustion_lands_on_disconnected() {
        let registry = ConnectionRegistry::new("ws://127.0.0.1:9", fast_config());
        let handle = registry.connect("/ws/broadcast", "client-a");

        let reached_terminal = wait_for(
            || handle.status() == ConnectionStatus::Disconnected,
            Duration::from_secs(5),
        )
        .await;

        assert!(reached_terminal, "status stuck at {}", handle.status());

        // The abandoned entry is dropped so a later connect() starts fresh
        let emptied = wait_for(|| registry.is_empty(), Duration::from_secs(5)).await;
        assert!(emptied);
    }
}
