//! Cluster status queries
//!
//! A stateless read-only endpoint reports whether server-side fan-out across
//! application instances is active. Polled on demand; not part of the duplex
//! protocol and irrelevant to local dispatch.

use serde::{Deserialize, Serialize};

/// Snapshot of the server-side broadcast backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    /// Identifier of the answering application instance
    pub instance_id: String,
    /// Whether the broadcast layer is enabled at all
    pub broadcast_enabled: bool,
    /// Whether the shared broadcast store is reachable
    pub redis_available: bool,
}

impl ClusterStatus {
    /// Whether multi-instance fan-out is actually working, as opposed to the
    /// degraded single-instance local loop
    pub fn fan_out_active(&self) -> bool {
        self.broadcast_enabled && self.redis_available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_wire_shape() {
        let status: ClusterStatus = serde_json::from_str(
            r#"{"instanceId":"web-1","broadcastEnabled":true,"redisAvailable":false}"#,
        )
        .unwrap();

        assert_eq!(status.instance_id, "web-1");
        assert!(status.broadcast_enabled);
        assert!(!status.redis_available);
        assert!(!status.fan_out_active());
    }

    #[test]
    fn test_fan_out_requires_both_flags() {
        let healthy = ClusterStatus {
            instance_id: "web-1".to_string(),
            broadcast_enabled: true,
            redis_available: true,
        };
        assert!(healthy.fan_out_active());

        let disabled = ClusterStatus {
            broadcast_enabled: false,
            ..healthy.clone()
        };
        assert!(!disabled.fan_out_active());
    }
}
