//! The broadcast bus
//!
//! One shared connection, lazily created and reused for every channel.
//! Subscribe registers interest with the server once connected (or queues the
//! intent); publish goes out as a separate stateless HTTP request, and the
//! resulting fan-out frame arrives back over the duplex connection like any
//! other subscriber's message.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::connection::{
    ConnectionHandle, ConnectionRegistry, ConnectionStatus, WeakConnectionHandle,
};
use crate::error::{Error, PublishError, Result};
use crate::identity::ClientIdentity;
use crate::protocol::{ClientFrame, ServerFrame};

use super::channel::validate_channel;
use super::cluster::ClusterStatus;
use super::config::BusConfig;
use super::subscription::{PendingSubscription, SubscribeOptions, Subscription};

/// Bus state shared with the connection callbacks
struct BusShared {
    identity: Arc<ClientIdentity>,
    subscriptions: Mutex<Vec<Arc<Subscription>>>,
    pending: Mutex<Vec<PendingSubscription>>,
    /// Weak so the callback chain does not keep a torn-down connection alive
    connection: Mutex<Option<WeakConnectionHandle>>,
}

impl BusShared {
    /// Route one inbound frame
    fn on_frame(&self, frame: &ServerFrame, handle: &WeakConnectionHandle) {
        match frame {
            ServerFrame::Connected { client_id } => {
                // The server is authoritative once it has spoken; the
                // override is session-scoped and never persisted
                self.identity.confirm(client_id.clone());
            }
            ServerFrame::Welcome => {
                if let Some(handle) = handle.upgrade() {
                    self.flush_pending(&handle);
                }
            }
            ServerFrame::Broadcast { channel, data } => self.dispatch(channel, data, frame),
            ServerFrame::Subscribed { channel } => {
                tracing::debug!(channel, "Server acknowledged subscription");
            }
            ServerFrame::Unsubscribed { channel } => {
                tracing::debug!(channel, "Server acknowledged unsubscribe");
            }
            ServerFrame::Pong => {
                // Swallowed by the connection task before callbacks run
            }
        }
    }

    /// Deliver a broadcast to every matching local subscriber
    fn dispatch(&self, channel: &str, data: &Value, raw: &ServerFrame) {
        let live_id = self.identity.live_id();

        // Snapshot outside the lock so callbacks may subscribe/unsubscribe
        let matching: Vec<Arc<Subscription>> = self
            .subscriptions
            .lock()
            .expect("subscriptions poisoned")
            .iter()
            .filter(|sub| sub.wants(channel, data, &live_id))
            .cloned()
            .collect();

        tracing::trace!(channel, subscribers = matching.len(), "Dispatching broadcast");
        for subscription in matching {
            subscription.invoke(data, raw);
        }
    }

    /// Send every queued subscribe intent exactly once, then clear the queue
    ///
    /// An entry whose send fails (the link dropped again mid-flush) is
    /// re-queued for the next connect.
    fn flush_pending(&self, handle: &ConnectionHandle) {
        let drained: Vec<PendingSubscription> = {
            let mut pending = self.pending.lock().expect("pending poisoned");
            std::mem::take(&mut *pending)
        };
        if drained.is_empty() {
            return;
        }

        tracing::debug!(count = drained.len(), "Flushing pending subscriptions");
        let mut requeue = Vec::new();
        for entry in drained {
            let frame = ClientFrame::Subscribe {
                channel: entry.channel.clone(),
                omit_self: entry.options.omit_self,
            };
            if !handle.send(&frame) {
                requeue.push(entry);
            }
        }
        if !requeue.is_empty() {
            self.pending
                .lock()
                .expect("pending poisoned")
                .extend(requeue);
        }
    }

    fn current_connection(&self) -> Option<ConnectionHandle> {
        self.connection
            .lock()
            .expect("connection slot poisoned")
            .as_ref()
            .and_then(WeakConnectionHandle::upgrade)
    }
}

/// Channel-scoped pub/sub over one shared resilient connection
pub struct BroadcastBus {
    config: BusConfig,
    identity: Arc<ClientIdentity>,
    registry: ConnectionRegistry,
    http: reqwest::Client,
    shared: Arc<BusShared>,
}

impl BroadcastBus {
    /// Create a bus with the given endpoints and client identity
    ///
    /// No connection is opened until the first `subscribe`.
    pub fn new(config: BusConfig, identity: ClientIdentity) -> Self {
        let identity = Arc::new(identity);
        let registry =
            ConnectionRegistry::new(config.ws_base_url.clone(), config.connection.clone());

        Self {
            identity: identity.clone(),
            registry,
            http: reqwest::Client::new(),
            shared: Arc::new(BusShared {
                identity,
                subscriptions: Mutex::new(Vec::new()),
                pending: Mutex::new(Vec::new()),
                connection: Mutex::new(None),
            }),
            config,
        }
    }

    /// The client identity this bus publishes and compares against
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Whether server-side multi-instance fan-out is active
    ///
    /// Informational only: local dispatch runs the same code path either
    /// way, since the server decides whether a published message round-trips
    /// through the multi-instance relay or loops back directly.
    pub fn is_cluster_mode(&self) -> bool {
        self.config.cluster_mode
    }

    /// Current status of the shared connection, if one has been created
    pub fn connection_status(&self) -> Option<ConnectionStatus> {
        self.shared.current_connection().map(|h| h.status())
    }

    /// Number of local subscriptions
    pub fn subscription_count(&self) -> usize {
        self.shared
            .subscriptions
            .lock()
            .expect("subscriptions poisoned")
            .len()
    }

    /// Number of subscribe intents waiting for the connection
    pub fn pending_count(&self) -> usize {
        self.shared.pending.lock().expect("pending poisoned").len()
    }

    /// Subscribe to a channel
    ///
    /// Validates the channel name synchronously, registers the callback
    /// locally, and declares interest with the server — immediately when the
    /// shared connection is open, otherwise via the pending queue once it is.
    /// The callback receives the broadcast data and the raw frame.
    pub fn subscribe<F>(&self, channel: &str, callback: F, options: SubscribeOptions) -> Result<()>
    where
        F: Fn(&Value, &ServerFrame) + Send + Sync + 'static,
    {
        validate_channel(channel)?;

        self.shared
            .subscriptions
            .lock()
            .expect("subscriptions poisoned")
            .push(Arc::new(Subscription::new(
                channel,
                options,
                Box::new(callback),
            )));

        let handle = self.ensure_connection();
        let frame = ClientFrame::Subscribe {
            channel: channel.to_string(),
            omit_self: options.omit_self,
        };

        if handle.is_connected() && handle.send(&frame) {
            tracing::debug!(channel, "Subscribed");
        } else {
            self.shared
                .pending
                .lock()
                .expect("pending poisoned")
                .push(PendingSubscription {
                    channel: channel.to_string(),
                    options,
                });
            tracing::debug!(channel, "Connection not ready, subscription queued");

            // The task may have connected between the status check and the
            // push, in which case its flush already found an empty queue;
            // re-check and flush so the intent is not stranded until the
            // next reconnect
            if handle.is_connected() {
                self.shared.flush_pending(&handle);
            }
        }

        Ok(())
    }

    /// Drop all local subscriptions for a channel
    ///
    /// Withdraws interest with the server when the connection is open; the
    /// server's `unsubscribed` ack is informational.
    pub fn unsubscribe(&self, channel: &str) -> Result<()> {
        validate_channel(channel)?;

        let removed = {
            let mut subscriptions = self
                .shared
                .subscriptions
                .lock()
                .expect("subscriptions poisoned");
            let before = subscriptions.len();
            subscriptions.retain(|sub| sub.channel != channel);
            before - subscriptions.len()
        };
        self.shared
            .pending
            .lock()
            .expect("pending poisoned")
            .retain(|entry| entry.channel != channel);

        if removed > 0 {
            if let Some(handle) = self.shared.current_connection() {
                if handle.is_connected() {
                    handle.send(&ClientFrame::Unsubscribe {
                        channel: channel.to_string(),
                    });
                }
            }
            tracing::debug!(channel, removed, "Unsubscribed");
        }

        Ok(())
    }

    /// Publish a payload to a channel
    ///
    /// Best-effort: while the shared connection is not open this is a no-op
    /// beyond a warning, returning `Ok(None)` — no queueing, no retry. While
    /// connected, the payload is POSTed to the per-channel publish endpoint
    /// (with the live client identity attached to object payloads unless
    /// already present) and the response body is returned.
    pub async fn publish(&self, channel: &str, payload: Value) -> Result<Option<Value>> {
        validate_channel(channel)?;

        let connected = self
            .shared
            .current_connection()
            .map(|handle| handle.is_connected())
            .unwrap_or(false);
        if !connected {
            tracing::warn!(channel, "Cannot publish while disconnected, message dropped");
            return Ok(None);
        }

        let mut data = payload;
        if let Some(object) = data.as_object_mut() {
            if !object.contains_key("identity") {
                object.insert(
                    "identity".to_string(),
                    Value::String(self.identity.live_id()),
                );
            }
        }

        let url = format!(
            "{}/{}",
            self.config.publish_base_url.trim_end_matches('/'),
            channel
        );
        tracing::debug!(channel, %url, "Publishing");

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "data": data }))
            .send()
            .await
            .map_err(|e| Error::Publish(PublishError::Http(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::BadStatus(status.as_u16()).into());
        }

        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok(Some(body))
    }

    /// Query the stateless cluster status endpoint
    ///
    /// Returns `Ok(None)` when no status endpoint is configured.
    pub async fn cluster_status(&self) -> Result<Option<ClusterStatus>> {
        let url = match &self.config.status_url {
            Some(url) => url.clone(),
            None => {
                tracing::debug!("No cluster status endpoint configured");
                return Ok(None);
            }
        };

        let response = self.http.get(&url).send().await.map_err(Error::Status)?;
        let status = response
            .json::<ClusterStatus>()
            .await
            .map_err(Error::Status)?;
        Ok(Some(status))
    }

    /// Get the shared connection, creating it (and wiring the bus callbacks)
    /// on first use or after a terminal disconnect
    fn ensure_connection(&self) -> ConnectionHandle {
        let mut slot = self
            .shared
            .connection
            .lock()
            .expect("connection slot poisoned");

        if let Some(handle) = slot.as_ref().and_then(WeakConnectionHandle::upgrade) {
            if handle.status() != ConnectionStatus::Disconnected {
                return handle;
            }
        }

        let handle = self
            .registry
            .connect(&self.config.broadcast_path, &self.identity.id());

        let shared = self.shared.clone();
        let weak = handle.downgrade();
        handle.on_message(move |frame: &ServerFrame| shared.on_frame(frame, &weak));

        let shared = self.shared.clone();
        let weak = handle.downgrade();
        handle.on_status_change(move |_old, new| {
            if new == ConnectionStatus::Connected {
                if let Some(handle) = weak.upgrade() {
                    shared.flush_pending(&handle);
                }
            }
        });

        *slot = Some(handle.downgrade());
        handle
    }
}
