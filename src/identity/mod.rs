//! Client identity resolution and retention
//!
//! Every client carries a stable v4 UUID used by publishers to exclude their
//! own echoes. The identifier is generated lazily, at most once per retention
//! store lifetime, and may be overridden for the current session by a
//! server-confirmed identity delivered over the connection.

pub mod client;
pub mod store;

pub use client::{ClientIdentity, IdentityScope};
pub use store::{FileStore, IdentityStore, MemoryStore};
