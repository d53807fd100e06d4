//! Axis driver and companion task traits.
//!
//! This module defines:
//! - `AxisDriver` trait - pluggable hardware-command backend
//! - `CompanionTask` trait - cooperative real-time task sharing the status region
//! - `HalError` enum - error type for both
//! - `DriverFactory` / `CompanionFactory` - factory function types for registries

use crate::hal::types::{AxisFeedback, AxisHandle, AxisParameter, MotionCommand};
use crate::shm::layout::HandshakeFlags;
use thiserror::Error;

/// Error types for hardware collaborator operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Axis could not be reset or initialised.
    #[error("Connect failed for axis '{axis}': {reason}")]
    ConnectFailed { axis: String, reason: String },

    /// Handle does not refer to a connected axis.
    #[error("Axis handle {0} is not connected")]
    NotConnected(u32),

    /// Hardware refused or failed to execute a command.
    #[error("Command rejected: {0}")]
    CommandRejected(String),

    /// Hardware communication error.
    #[error("Hardware communication error: {0}")]
    CommunicationError(String),

    /// Driver or companion not found in the registry.
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// A factory with this name is already registered.
    #[error("Driver '{0}' is already registered")]
    DuplicateDriver(String),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn AxisDriver>;

/// Factory function type for creating companion task instances.
pub type CompanionFactory = fn() -> Box<dyn CompanionTask>;

/// Hardware-command backend for up to ten axes.
///
/// The control unit only calls these methods; how they reach physical
/// hardware is the driver's business. All calls happen from the scan, which
/// is serialised by the control core, so drivers need `Send` but not `Sync`.
///
/// # Lifecycle
///
/// 1. `connect_axis()` - once per typed axis at system INIT
/// 2. motion calls - from scans while the system is READY
/// 3. `disconnect_axis()` - at system STOP
/// 4. `shutdown()` - at process exit
pub trait AxisDriver: Send {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Reset and initialise the named axis.
    fn connect_axis(&mut self, name: &str) -> Result<AxisHandle, HalError>;

    fn disconnect_axis(&mut self, handle: AxisHandle) -> Result<(), HalError>;

    /// Start a point-to-point move.
    fn point_to_point(&mut self, handle: AxisHandle, command: &MotionCommand)
    -> Result<(), HalError>;

    /// Switch to open-loop output using the previously written ramp/value.
    fn open_loop(&mut self, handle: AxisHandle) -> Result<(), HalError>;

    /// Hold the axis at its current position.
    fn lock(&mut self, handle: AxisHandle) -> Result<(), HalError>;

    fn write_parameter(
        &mut self,
        handle: AxisHandle,
        parameter: AxisParameter,
        value: f64,
    ) -> Result<(), HalError>;

    /// Latest measured state, if the driver has any.
    ///
    /// Default: None (feedback arrives through the companion task instead).
    fn feedback(&self, _handle: AxisHandle) -> Option<AxisFeedback> {
        None
    }

    /// Release all hardware resources.
    /// Default: no-op
    fn shutdown(&mut self) -> Result<(), HalError> {
        Ok(())
    }
}

/// Cooperative real-time task sharing the status region.
///
/// When active, the control unit clears both handshake flags, calls
/// `trigger()` and waits (bounded) until the task has set both flags.
pub trait CompanionTask: Send {
    fn name(&self) -> &'static str;

    /// Whether the task is running. An inactive companion is never awaited.
    fn is_active(&self) -> bool;

    /// Kick the task for one rendezvous.
    fn trigger(&mut self, flags: &HandshakeFlags) -> Result<(), HalError>;
}
