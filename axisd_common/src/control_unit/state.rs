//! State and identity enums for the control unit.
//!
//! All enums carry explicit discriminants matching their wire/shared-memory
//! encoding and provide a fallible `from_*` conversion.

use serde::{Deserialize, Serialize};

// ─── System lifecycle ───────────────────────────────────────────────

/// Process-wide lifecycle state.
///
/// Transitions are strictly `Idle → Init → Ready → Stop → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum SystemState {
    /// No axes connected, scans disabled.
    #[default]
    Idle = 0,
    /// Initialisation requested, executed on the next tick.
    Init = 1,
    /// Axes connected, scans enabled.
    Ready = 2,
    /// Stop requested, axes are disconnected on the next tick.
    Stop = 3,
}

impl SystemState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Init),
            2 => Some(Self::Ready),
            3 => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Lifecycle request carried by the `SystemRequest` wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SystemRequest {
    Init = 1,
    Stop = 3,
}

impl SystemRequest {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Init),
            3 => Some(Self::Stop),
            _ => None,
        }
    }
}

// ─── Axis identity ──────────────────────────────────────────────────

/// Mechanical variant of an axis slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(i32)]
pub enum AxisType {
    /// Indexing turret, reference mode selectable per axis.
    Turret = 0,
    /// Voice-coil pusher, always absolute.
    VcPusher = 1,
    /// Standard axis, absolute moves.
    StdAbs = 2,
    /// Standard axis, relative moves.
    StdRel = 3,
    /// Slot unused.
    #[default]
    NotApplicable = 9,
}

impl AxisType {
    #[inline]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Turret),
            1 => Some(Self::VcPusher),
            2 => Some(Self::StdAbs),
            3 => Some(Self::StdRel),
            9 => Some(Self::NotApplicable),
            _ => None,
        }
    }

    /// Whether an axis of this type is connected at system init.
    #[inline]
    pub const fn is_present(&self) -> bool {
        !matches!(self, Self::NotApplicable)
    }
}

/// Whether a commanded value is an absolute target or a relative offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceMode {
    Relative,
    Absolute,
}

// ─── Command register decoding ──────────────────────────────────────

/// Special handling selected by the high digits of a command register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubCommand {
    /// Plain point-to-point (selector 0 and any unassigned selector).
    PointToPoint,
    /// Selector 2: rewrite the work position, then move.
    ChangeWorkPosition,
    /// Selector 3: drive with a raw output value.
    OpenLoop,
    /// Selector 4: hold position.
    AxisLock,
}

impl SubCommand {
    #[inline]
    pub const fn from_selector(selector: i32) -> Self {
        match selector {
            2 => Self::ChangeWorkPosition,
            3 => Self::OpenLoop,
            4 => Self::AxisLock,
            _ => Self::PointToPoint,
        }
    }
}
