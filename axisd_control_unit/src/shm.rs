//! Shared region integration.
//!
//! The region itself lives in `axisd_shared_memory`; this module decides
//! what the control unit mirrors into it and how it rendezvouses with the
//! companion task.

pub mod bridge;

pub use bridge::{BridgeError, Rendezvous, SharedStateBridge};
