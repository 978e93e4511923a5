//! Frame definitions for both directions of the duplex connection

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames sent from this client to the broadcast endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Declare interest in a channel
    #[serde(rename_all = "camelCase")]
    Subscribe {
        /// Channel name in the `view:` namespace
        channel: String,
        /// Ask the server to suppress echoes of this client's own messages
        omit_self: bool,
    },

    /// Withdraw interest in a channel
    Unsubscribe { channel: String },
}

/// Frames received from the broadcast endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    /// Handshake ack carrying the server-assigned client identity
    #[serde(rename_all = "camelCase")]
    Connected { client_id: String },

    /// Post-handshake ready signal; triggers the pending-subscription flush
    Welcome,

    /// Fan-out payload for a channel
    Broadcast { channel: String, data: Value },

    /// Informational ack for a subscribe intent
    Subscribed { channel: String },

    /// Informational ack for an unsubscribe
    Unsubscribed { channel: String },

    /// Liveness ack; swallowed by the connection task
    Pong,
}

impl ClientFrame {
    /// Serialize to the wire representation
    ///
    /// Frame shapes are closed and serde-derived, so this cannot fail in
    /// practice; a failure would indicate a bug in the frame definitions.
    pub fn to_wire(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl ServerFrame {
    /// Parse a frame from inbound text
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_subscribe_wire_shape() {
        let frame = ClientFrame::Subscribe {
            channel: "view:chat:message:sent".to_string(),
            omit_self: true,
        };

        let wire: Value = serde_json::from_str(&frame.to_wire()).unwrap();
        assert_eq!(
            wire,
            json!({
                "type": "subscribe",
                "channel": "view:chat:message:sent",
                "omitSelf": true,
            })
        );
    }

    #[test]
    fn test_parse_connected_and_welcome() {
        let connected =
            ServerFrame::parse(r#"{"type":"connected","clientId":"abc-123"}"#).unwrap();
        assert_eq!(
            connected,
            ServerFrame::Connected {
                client_id: "abc-123".to_string()
            }
        );

        let welcome = ServerFrame::parse(r#"{"type":"welcome"}"#).unwrap();
        assert_eq!(welcome, ServerFrame::Welcome);
    }

    #[test]
    fn test_parse_broadcast_preserves_data() {
        let frame = ServerFrame::parse(
            r#"{"type":"broadcast","channel":"view:chat:message:sent","data":{"identity":"X","text":"hi"}}"#,
        )
        .unwrap();

        match frame {
            ServerFrame::Broadcast { channel, data } => {
                assert_eq!(channel, "view:chat:message:sent");
                assert_eq!(data["identity"], "X");
                assert_eq!(data["text"], "hi");
            }
            other => panic!("expected broadcast, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        assert!(ServerFrame::parse(r#"{"type":"mystery"}"#).is_err());
        assert!(ServerFrame::parse("not json at all").is_err());
    }
}
