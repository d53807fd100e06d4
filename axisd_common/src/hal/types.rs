//! Value types exchanged with axis drivers.

use crate::control_unit::state::ReferenceMode;

/// Opaque handle returned by `AxisDriver::connect_axis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisHandle(pub u32);

/// Point-to-point move as issued to the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionCommand {
    /// Absolute target or relative distance, depending on `reference`.
    pub position: f64,
    pub velocity: f64,
    pub acceleration: f64,
    /// `None` means unbounded jerk.
    pub jerk: Option<f64>,
    pub reference: ReferenceMode,
}

/// Tuning parameters written ahead of open-loop and lock sub-commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisParameter {
    OpenLoopRamp,
    OpenLoopValue,
}

/// Measured state reported by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisFeedback {
    /// Current set-point position.
    pub set_point: f64,
    /// Measured position.
    pub position: f32,
    /// Net motor current.
    pub net_current: f32,
}
