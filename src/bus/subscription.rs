//! Local subscriptions and the pending-subscription queue

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;

use crate::protocol::ServerFrame;

/// Per-subscriber delivery options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Skip delivery to this subscriber when the message's embedded identity
    /// equals the local client identity
    pub omit_self: bool,
}

impl SubscribeOptions {
    /// Enable self-omission
    pub fn omit_self(mut self) -> Self {
        self.omit_self = true;
        self
    }
}

/// Callback invoked with the broadcast data and the raw frame
pub(super) type SubscriberCallback = Box<dyn Fn(&Value, &ServerFrame) + Send + Sync>;

/// One local subscription
///
/// Several subscriptions may exist for the same channel, each with its own
/// options; they are invoked independently.
pub(super) struct Subscription {
    pub(super) channel: String,
    pub(super) options: SubscribeOptions,
    callback: SubscriberCallback,
}

impl Subscription {
    pub(super) fn new(
        channel: impl Into<String>,
        options: SubscribeOptions,
        callback: SubscriberCallback,
    ) -> Self {
        Self {
            channel: channel.into(),
            options,
            callback,
        }
    }

    /// Whether a broadcast on `channel` reaches this subscriber, given the
    /// current live identity
    pub(super) fn wants(&self, channel: &str, data: &Value, live_id: &str) -> bool {
        if self.channel != channel {
            return false;
        }
        if self.options.omit_self {
            if let Some(identity) = data.get("identity").and_then(Value::as_str) {
                if identity == live_id {
                    return false;
                }
            }
        }
        true
    }

    /// Invoke the callback, isolating a panic to this subscriber
    pub(super) fn invoke(&self, data: &Value, raw: &ServerFrame) {
        if catch_unwind(AssertUnwindSafe(|| (self.callback)(data, raw))).is_err() {
            tracing::error!(
                channel = %self.channel,
                "Subscriber callback panicked, continuing with remaining subscribers"
            );
        }
    }
}

/// A subscribe intent issued before the connection was ready
///
/// Each entry is sent to the server exactly once, immediately on the
/// connection entering the connected state, then removed from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct PendingSubscription {
    pub(super) channel: String,
    pub(super) options: SubscribeOptions,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn subscription(channel: &str, options: SubscribeOptions) -> Subscription {
        Subscription::new(channel, options, Box::new(|_, _| {}))
    }

    #[test]
    fn test_wants_matches_channel() {
        let sub = subscription("view:chat:message:sent", SubscribeOptions::default());
        let data = json!({"text": "hi"});

        assert!(sub.wants("view:chat:message:sent", &data, "me"));
        assert!(!sub.wants("view:chat:message:deleted", &data, "me"));
    }

    #[test]
    fn test_omit_self_skips_own_identity_only() {
        let sub = subscription(
            "view:chat:message:sent",
            SubscribeOptions::default().omit_self(),
        );

        let own = json!({"identity": "me", "text": "hi"});
        let other = json!({"identity": "someone-else", "text": "hi"});
        let anonymous = json!({"text": "hi"});

        assert!(!sub.wants("view:chat:message:sent", &own, "me"));
        assert!(sub.wants("view:chat:message:sent", &other, "me"));
        assert!(sub.wants("view:chat:message:sent", &anonymous, "me"));
    }

    #[test]
    fn test_without_omit_self_own_messages_are_delivered() {
        let sub = subscription("view:chat:message:sent", SubscribeOptions::default());
        let own = json!({"identity": "me"});

        assert!(sub.wants("view:chat:message:sent", &own, "me"));
    }
}
