//! Simulated axis state.
//!
//! Moves settle instantly: a point-to-point command places both the
//! set-point and the measured position on the target.

use axisd_common::control_unit::state::ReferenceMode;
use axisd_common::hal::types::{AxisFeedback, AxisParameter, MotionCommand};
use tracing::trace;

/// What the simulated axis is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisMode {
    #[default]
    Closed,
    OpenLoop,
    Locked,
}

/// One simulated axis.
#[derive(Debug, Clone)]
pub struct SimulatedAxis {
    name: String,
    connected: bool,
    set_point: f64,
    mode: AxisMode,
    open_loop_ramp: f64,
    open_loop_value: f64,
    moves: u64,
}

impl SimulatedAxis {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            connected: true,
            set_point: 0.0,
            mode: AxisMode::Closed,
            open_loop_ramp: 0.0,
            open_loop_value: 0.0,
            moves: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_point(&self) -> f64 {
        self.set_point
    }

    pub fn mode(&self) -> AxisMode {
        self.mode
    }

    /// Last written open-loop ramp and value.
    pub fn open_loop(&self) -> (f64, f64) {
        (self.open_loop_ramp, self.open_loop_value)
    }

    /// Number of point-to-point moves executed.
    pub fn moves(&self) -> u64 {
        self.moves
    }

    pub(crate) fn reconnect(&mut self) {
        self.connected = true;
        self.mode = AxisMode::Closed;
    }

    pub(crate) fn disconnect(&mut self) {
        self.connected = false;
    }

    pub(crate) fn apply_move(&mut self, command: &MotionCommand) {
        self.set_point = match command.reference {
            ReferenceMode::Absolute => command.position,
            ReferenceMode::Relative => self.set_point + command.position,
        };
        self.mode = AxisMode::Closed;
        self.moves += 1;
        trace!(axis = %self.name, set_point = self.set_point, "simulated move settled");
    }

    pub(crate) fn write_parameter(&mut self, parameter: AxisParameter, value: f64) {
        match parameter {
            AxisParameter::OpenLoopRamp => self.open_loop_ramp = value,
            AxisParameter::OpenLoopValue => self.open_loop_value = value,
        }
    }

    pub(crate) fn set_mode(&mut self, mode: AxisMode) {
        self.mode = mode;
    }

    /// Feedback as the hardware would report it.
    pub fn feedback(&self) -> AxisFeedback {
        let net_current = match self.mode {
            AxisMode::OpenLoop => self.open_loop_value as f32,
            AxisMode::Closed | AxisMode::Locked => 0.0,
        };
        AxisFeedback {
            set_point: self.set_point,
            position: self.set_point as f32,
            net_current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ptp(position: f64, reference: ReferenceMode) -> MotionCommand {
        MotionCommand {
            position,
            velocity: 10.0,
            acceleration: 10.0,
            jerk: None,
            reference,
        }
    }

    #[test]
    fn absolute_and_relative_moves() {
        let mut axis = SimulatedAxis::new("X");
        axis.apply_move(&ptp(100.0, ReferenceMode::Absolute));
        assert_eq!(axis.set_point(), 100.0);
        axis.apply_move(&ptp(-30.0, ReferenceMode::Relative));
        assert_eq!(axis.set_point(), 70.0);
        assert_eq!(axis.moves(), 2);
    }

    #[test]
    fn open_loop_reports_value_as_current() {
        let mut axis = SimulatedAxis::new("VC");
        axis.write_parameter(AxisParameter::OpenLoopValue, 1.5);
        assert_eq!(axis.feedback().net_current, 0.0);
        axis.set_mode(AxisMode::OpenLoop);
        assert_eq!(axis.feedback().net_current, 1.5);
    }
}
