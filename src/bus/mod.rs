//! Channel-scoped broadcast bus
//!
//! The bus layers pub/sub channels over one shared connection: it validates
//! channel names against the `view:` namespace, queues subscribe intents
//! issued before the connection is ready, relays inbound broadcast frames to
//! matching local subscribers (honouring self-omission), and publishes over a
//! separate stateless HTTP request whose fan-out comes back over the duplex
//! connection like any other message.

pub mod broadcast;
pub mod channel;
pub mod cluster;
pub mod config;
pub mod subscription;

pub use broadcast::BroadcastBus;
pub use channel::validate_channel;
pub use cluster::ClusterStatus;
pub use config::BusConfig;
pub use subscription::SubscribeOptions;
