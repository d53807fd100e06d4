//! Prelude module for common re-exports.
//!
//! ```rust
//! use axisd_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{AXIS_COUNT, CONTROL_REGISTER_COUNT, POSITION_COUNT};

// ─── State ──────────────────────────────────────────────────────────
pub use crate::control_unit::state::{AxisType, ReferenceMode, SystemState};
pub use crate::control_unit::status::{StatusFlags, StatusSections};

// ─── Hardware collaborators ─────────────────────────────────────────
pub use crate::hal::driver::{AxisDriver, CompanionTask, HalError};
pub use crate::hal::types::{AxisFeedback, AxisHandle, AxisParameter, MotionCommand};

// ─── Shared region ──────────────────────────────────────────────────
pub use crate::shm::layout::{HandshakeFlags, SharedStatus, ShmLayout};
