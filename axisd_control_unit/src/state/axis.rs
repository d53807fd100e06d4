//! Per-axis runtime state.
//!
//! Rebuilt at every system INIT. The dispatcher is the only writer.

use axisd_common::consts::AXIS_COUNT;
use axisd_common::control_unit::status::StatusFlags;
use axisd_common::hal::types::AxisHandle;

/// Runtime bookkeeping for one axis slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRuntime {
    /// Driver handle; `None` while disconnected.
    pub handle: Option<AxisHandle>,
    /// Flips once per executed command.
    pub toggle: bool,
    /// Status word published to clients and the region.
    pub status: StatusFlags,
    /// Commands executed since INIT.
    pub moved_count: u64,
    /// Last command register value consumed.
    pub last_command: f32,
    /// Set-point position used as the origin of absolute moves.
    pub set_point: f64,
}

impl Default for AxisRuntime {
    fn default() -> Self {
        Self {
            handle: None,
            toggle: false,
            status: StatusFlags::IN_POSITION,
            moved_count: 0,
            last_command: 0.0,
            set_point: 0.0,
        }
    }
}

impl AxisRuntime {
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Record one executed command: flip the toggle and publish `outcome`
    /// with bit 7 carrying the new toggle.
    pub fn complete(&mut self, command: f32, outcome: StatusFlags) {
        self.toggle = !self.toggle;
        self.status = outcome.with_toggle(self.toggle);
        self.last_command = command;
        self.moved_count += 1;
    }

    /// Reset for a fresh INIT, keeping nothing but the connection.
    pub fn reset(&mut self, handle: Option<AxisHandle>) {
        *self = Self {
            handle,
            ..Self::default()
        };
    }
}

/// Runtime for every axis slot.
pub type AxisTable = [AxisRuntime; AXIS_COUNT];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_axis_is_idle_and_in_position() {
        let axis = AxisRuntime::default();
        assert!(!axis.is_connected());
        assert_eq!(axis.status, StatusFlags::IN_POSITION);
        assert!(!axis.toggle);
    }

    #[test]
    fn complete_flips_toggle_into_bit_seven() {
        let mut axis = AxisRuntime::default();
        axis.complete(12.0, StatusFlags::empty());
        assert!(axis.toggle);
        assert_eq!(axis.status.bits(), 0x80);
        assert_eq!(axis.moved_count, 1);

        axis.complete(3.0, StatusFlags::IN_POSITION);
        assert!(!axis.toggle);
        assert_eq!(axis.status.bits(), 0x01);
        assert_eq!(axis.last_command, 3.0);
        assert_eq!(axis.moved_count, 2);
    }

    #[test]
    fn reset_keeps_only_the_handle() {
        let mut axis = AxisRuntime::default();
        axis.complete(1.0, StatusFlags::empty());
        axis.set_point = 40.0;
        axis.reset(Some(AxisHandle(4)));
        assert_eq!(axis.handle, Some(AxisHandle(4)));
        assert_eq!(axis.moved_count, 0);
        assert_eq!(axis.set_point, 0.0);
        assert_eq!(axis.status, StatusFlags::IN_POSITION);
    }
}
