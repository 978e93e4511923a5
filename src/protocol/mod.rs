//! Wire protocol for the duplex broadcast connection
//!
//! Frames are JSON objects tagged by a `type` field. Both directions are
//! modelled as closed enums so a new frame kind fails to compile at every
//! match site instead of silently falling through.

pub mod frame;

pub use frame::{ClientFrame, ServerFrame};
