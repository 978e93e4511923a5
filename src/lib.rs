//! Real-time broadcast client library
//!
//! Channel-scoped pub/sub for view components, carried over one resilient
//! WebSocket connection per endpoint with linear reconnect backoff, plus a
//! stateless HTTP publish path whose fan-out returns over the socket.
//!
//! # Architecture
//!
//! ```text
//!    BroadcastBus ──────────────► ConnectionRegistry
//!      │  subscribe/publish         │  one ConnectionHandle per path
//!      │                            ▼
//!      │                     [background task]
//!      │                      connect ► drive ► backoff ► reconnect
//!      │                            │
//!      │◄── on_message ─────────────┘  (tagged JSON frames)
//!      │
//!      └──► reqwest POST /{channel}   (publish, fan-out comes back above)
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use viewbus::bus::{BroadcastBus, BusConfig, SubscribeOptions};
//! use viewbus::identity::ClientIdentity;
//!
//! # async fn run() -> viewbus::error::Result<()> {
//! let config = BusConfig::new("ws://localhost:3000", "http://localhost:3000/api/broadcast");
//! let bus = BroadcastBus::new(config, ClientIdentity::ephemeral());
//!
//! bus.subscribe(
//!     "view:chat:message:sent",
//!     |data, _frame| println!("chat: {data}"),
//!     SubscribeOptions::default().omit_self(),
//! )?;
//!
//! bus.publish("view:chat:message:sent", serde_json::json!({"text": "hi"}))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod bus;
pub mod connection;
pub mod error;
pub mod identity;
pub mod observer;
pub mod protocol;

pub use bus::{BroadcastBus, BusConfig, ClusterStatus, SubscribeOptions};
pub use connection::{ConnectionConfig, ConnectionHandle, ConnectionRegistry, ConnectionStatus};
pub use error::{Error, Result};
pub use identity::{ClientIdentity, IdentityScope};
pub use protocol::{ClientFrame, ServerFrame};
