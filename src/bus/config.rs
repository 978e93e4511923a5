//! Bus configuration

use crate::connection::ConnectionConfig;

/// Default path of the duplex broadcast endpoint
pub const DEFAULT_BROADCAST_PATH: &str = "/ws/broadcast";

/// Configuration for a [`BroadcastBus`](super::BroadcastBus)
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// WebSocket base URL, scheme and host (e.g. `wss://example.org`)
    pub ws_base_url: String,

    /// Path of the duplex broadcast endpoint
    pub broadcast_path: String,

    /// HTTP prefix for the stateless publish endpoint; the channel name is
    /// appended as a path segment
    pub publish_base_url: String,

    /// Optional stateless status endpoint for cluster health queries
    pub status_url: Option<String>,

    /// Whether server-side multi-instance fan-out is active; fixed at
    /// construction (the render-time flag of the embedding application)
    pub cluster_mode: bool,

    /// Settings for the shared connection
    pub connection: ConnectionConfig,
}

impl BusConfig {
    /// Create a config with the two required endpoints and defaults elsewhere
    pub fn new(ws_base_url: impl Into<String>, publish_base_url: impl Into<String>) -> Self {
        Self {
            ws_base_url: ws_base_url.into(),
            broadcast_path: DEFAULT_BROADCAST_PATH.to_string(),
            publish_base_url: publish_base_url.into(),
            status_url: None,
            cluster_mode: false,
            connection: ConnectionConfig::default(),
        }
    }

    /// Set the broadcast endpoint path
    pub fn broadcast_path(mut self, path: impl Into<String>) -> Self {
        self.broadcast_path = path.into();
        self
    }

    /// Set the cluster status endpoint
    pub fn status_url(mut self, url: impl Into<String>) -> Self {
        self.status_url = Some(url.into());
        self
    }

    /// Mark server-side multi-instance fan-out as active
    pub fn cluster_mode(mut self, enabled: bool) -> Self {
        self.cluster_mode = enabled;
        self
    }

    /// Set the connection configuration
    pub fn connection(mut self, config: ConnectionConfig) -> Self {
        self.connection = config;
        self
    }
}
