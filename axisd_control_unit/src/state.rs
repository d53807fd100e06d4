//! State machines.
//!
//! - `system`: process-wide lifecycle (IDLE → INIT → READY → STOP → IDLE)
//! - `axis`: per-axis runtime (connection, toggle, status word)

pub mod axis;
pub mod system;
