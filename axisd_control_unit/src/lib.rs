//! # axisd Control Unit Library
//!
//! Control core of a networked motion-axis controller. Remote clients send
//! tagged binary frames over TCP; the core updates its parameter tables,
//! scans up to ten axes, turns pending commands into trajectory profiles for
//! the axis driver, mirrors state into a shared region for a real-time
//! companion task and answers every batch with a status frame.
//!
//! ## Data flow
//!
//! ```text
//! client ─► server ─► Session ─► codec ─► ParameterStore
//!                                              │
//!                      ControlCore::tick ─► AxisDispatcher ─► TrajectoryEngine ─► AxisDriver
//!                                              │
//!                                       SharedStateBridge ─► StatusPublisher ─► client
//! ```

pub mod command;
pub mod config;
pub mod control;
pub mod cycle;
pub mod error;
pub mod protocol;
pub mod server;
pub mod shm;
pub mod state;
pub mod store;
