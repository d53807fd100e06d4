//! Hardware collaborator interfaces.
//!
//! The control unit never talks to motion hardware directly. It calls an
//! [`driver::AxisDriver`] for axis commands and optionally rendezvous with a
//! [`driver::CompanionTask`] through the shared region handshake.

pub mod driver;
pub mod types;
