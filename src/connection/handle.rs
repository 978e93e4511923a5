//! Connection handle shared between callers and the background task

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

use tokio::sync::{mpsc, Notify};

use crate::observer::Observers;
use crate::protocol::ClientFrame;
use crate::protocol::ServerFrame;

use super::registry::RegistryShared;
use super::status::{ConnectionStatus, StatusChange};
use super::ConnectionConfig;

/// State shared between the handle and the background task
pub(super) struct ConnectionInner {
    pub(super) path: String,
    pub(super) url: String,
    pub(super) config: ConnectionConfig,
    pub(super) status: Mutex<ConnectionStatus>,
    /// Cleared by `disconnect()`; once false the connection never reopens
    pub(super) should_reconnect: AtomicBool,
    pub(super) reconnect_attempts: AtomicU32,
    /// Serialized outbound frames for the socket task
    pub(super) outbound_tx: mpsc::Sender<String>,
    /// Teardown signal; carried out of band so a saturated outbound channel
    /// cannot swallow it
    pub(super) shutdown: Notify,
    pub(super) message_observers: Observers<ServerFrame>,
    pub(super) status_observers: Observers<StatusChange>,
    /// Updated whenever a `pong` liveness frame arrives
    pub(super) last_pong: Mutex<Option<Instant>>,
    /// Owning registry, for removal on teardown
    pub(super) registry: Weak<RegistryShared>,
}

impl ConnectionInner {
    /// Record a status transition and notify observers
    ///
    /// No-op (and no notification) when the status is unchanged.
    pub(super) fn set_status(&self, new: ConnectionStatus) {
        let old = {
            let mut guard = self.status.lock().expect("status poisoned");
            let old = *guard;
            if old == new {
                return;
            }
            *guard = new;
            old
        };

        tracing::debug!(path = %self.path, from = %old, to = %new, "Connection status changed");
        self.status_observers.notify(&StatusChange { old, new });
    }
}

/// Control handle for one managed connection
///
/// Cheap to clone; all clones refer to the same connection. The registry
/// returns the identical handle for repeated `connect()` calls on a path, so
/// handle identity can be checked with [`ConnectionHandle::ptr_eq`].
#[derive(Clone)]
pub struct ConnectionHandle {
    pub(super) inner: Arc<ConnectionInner>,
}

impl ConnectionHandle {
    /// The logical path this connection serves
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// The full endpoint URL, including the client identity query parameter
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Current status
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status.lock().expect("status poisoned")
    }

    /// Whether the connection is currently open
    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// When the last liveness ack arrived, if any
    pub fn last_pong(&self) -> Option<Instant> {
        *self.inner.last_pong.lock().expect("liveness poisoned")
    }

    /// Queue a frame for dispatch over the socket
    ///
    /// Returns `true` if the connection was open and the frame was handed to
    /// the socket task; `false` (with a logged warning) otherwise. Never
    /// returns an error: sending on a closed connection is a dropped frame,
    /// not a failure the caller must handle.
    pub fn send(&self, frame: &ClientFrame) -> bool {
        if !self.is_connected() {
            tracing::warn!(
                path = %self.inner.path,
                status = %self.status(),
                "Dropping outbound frame, connection not open"
            );
            return false;
        }

        match self.inner.outbound_tx.try_send(frame.to_wire()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = %self.inner.path, error = %e, "Failed to queue outbound frame");
                false
            }
        }
    }

    /// Register a message callback; chainable, no duplicate detection
    ///
    /// Callbacks receive every inbound frame except `pong` liveness acks,
    /// in arrival order. A panicking callback is isolated and logged.
    pub fn on_message<F>(&self, callback: F) -> &Self
    where
        F: Fn(&ServerFrame) + Send + Sync + 'static,
    {
        self.inner.message_observers.register(callback);
        self
    }

    /// Register a status callback; chainable, no duplicate detection
    ///
    /// Fired only on actual transitions, with the old and new status.
    pub fn on_status_change<F>(&self, callback: F) -> &Self
    where
        F: Fn(ConnectionStatus, ConnectionStatus) + Send + Sync + 'static,
    {
        self.inner
            .status_observers
            .register(move |change: &StatusChange| callback(change.old, change.new));
        self
    }

    /// Tear the connection down
    ///
    /// Terminal and synchronous: clears the reconnect flag so no backoff
    /// timer fires afterwards, tells the task to close the socket, and
    /// removes the connection from the owning registry. Idempotent after the
    /// first call; the path can be reconnected through a fresh `connect()`.
    pub fn disconnect(&self) {
        if !self.inner.should_reconnect.swap(false, Ordering::SeqCst) {
            return; // Already torn down
        }

        self.inner.shutdown.notify_one();

        if let Some(registry) = self.inner.registry.upgrade() {
            registry.remove(&self.inner.path, &self.inner);
        }

        tracing::info!(path = %self.inner.path, "Connection torn down");
    }

    /// Whether two handles control the same underlying connection
    pub fn ptr_eq(a: &ConnectionHandle, b: &ConnectionHandle) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Downgrade to a weak handle that does not keep the connection alive
    pub fn downgrade(&self) -> WeakConnectionHandle {
        WeakConnectionHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("path", &self.inner.path)
            .field("status", &self.status())
            .finish()
    }
}

/// Weak counterpart of [`ConnectionHandle`], for callbacks that must not keep
/// the connection alive through a reference cycle
#[derive(Clone)]
pub struct WeakConnectionHandle {
    inner: Weak<ConnectionInner>,
}

impl WeakConnectionHandle {
    /// Upgrade back to a strong handle, if the connection still exists
    pub fn upgrade(&self) -> Option<ConnectionHandle> {
        self.inner.upgrade().map(|inner| ConnectionHandle { inner })
    }
}
