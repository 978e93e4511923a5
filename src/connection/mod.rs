//! Resilient duplex connections to the broadcast endpoint
//!
//! One connection per logical path, owned by an explicit [`ConnectionRegistry`]
//! rather than global state so independent instances (servers, tests) never
//! collide. Each connection is driven by a background task that opens the
//! WebSocket, forwards inbound frames to registered message callbacks, and
//! reconnects with bounded linear backoff when the link drops.
//!
//! # Architecture
//!
//! ```text
//!              ConnectionRegistry
//!         ┌──────────────────────────┐
//!         │ connections: HashMap<    │
//!         │   path, ConnectionHandle │
//!         │ >                        │
//!         └────────────┬─────────────┘
//!                      │ connect(path) — idempotent
//!                      ▼
//!              ConnectionHandle ── frames + shutdown ──► connection task
//!               on_message(cb)                          ▲        │
//!               on_status_change(cb)                    │        ▼
//!               send() / disconnect()               WebSocket (tungstenite)
//! ```

pub mod config;
pub mod handle;
pub mod registry;
pub mod status;

mod task;

pub use config::ConnectionConfig;
pub use handle::{ConnectionHandle, WeakConnectionHandle};
pub use registry::ConnectionRegistry;
pub use status::{ConnectionStatus, StatusChange};
