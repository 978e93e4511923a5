//! Connection configuration

use std::time::Duration;

/// Configuration for a managed connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Base reconnect delay; the nth retry waits `n * base_interval`
    pub base_interval: Duration,

    /// Upper bound on the reconnect delay
    pub max_interval: Duration,

    /// Retries before the connection is abandoned
    pub max_reconnect_attempts: u32,

    /// Interval between outbound keepalive pings
    pub ping_interval: Duration,

    /// Capacity of the outbound frame channel
    pub outbound_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(5000),
            max_interval: Duration::from_millis(30_000),
            max_reconnect_attempts: 10,
            ping_interval: Duration::from_secs(30),
            outbound_capacity: 64,
        }
    }
}

impl ConnectionConfig {
    /// Set the base reconnect interval
    pub fn base_interval(mut self, interval: Duration) -> Self {
        self.base_interval = interval;
        self
    }

    /// Set the maximum reconnect interval
    pub fn max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Set the maximum number of reconnect attempts
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Set the keepalive ping interval
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Backoff delay before the given attempt (1-based)
    ///
    /// Linear in the attempt number, capped at `max_interval`:
    /// the 1st retry waits `base_interval`, the 2nd `2 * base_interval`, and
    /// so on.
    pub fn backoff_delay(&self, attempts: u32) -> Duration {
        std::cmp::min(self.base_interval.saturating_mul(attempts), self.max_interval)
    }

    /// Whether another retry is allowed for the given attempt number
    /// (incremented before the delay is computed)
    pub fn can_retry(&self, attempts: u32) -> bool {
        attempts <= self.max_reconnect_attempts
    }
}
