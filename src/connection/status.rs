//! Connection status machine
//!
//! `Connecting → Connected` on open, `Connected → Reconnecting` on loss while
//! retries remain, `Reconnecting → Connecting` after the backoff delay, and
//! `Disconnected` as the terminal state (teardown or retry exhaustion).

/// Lifecycle status of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Opening the WebSocket
    Connecting,
    /// Open and exchanging frames
    Connected,
    /// Link lost, waiting out the backoff delay before the next attempt
    Reconnecting,
    /// Terminal: torn down or retries exhausted
    Disconnected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Disconnected => "disconnected",
        };
        write!(f, "{}", name)
    }
}

/// A status transition delivered to status callbacks
///
/// Only fired on actual transitions (`old != new`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// Status before the transition
    pub old: ConnectionStatus,
    /// Status after the transition
    pub new: ConnectionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(ConnectionStatus::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionStatus::Connected.to_string(), "connected");
        assert_eq!(ConnectionStatus::Reconnecting.to_string(), "reconnecting");
        assert_eq!(ConnectionStatus::Disconnected.to_string(), "disconnected");
    }
}
