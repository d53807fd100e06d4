//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements `AxisDriver` on top of in-memory
//! [`SimulatedAxis`] instances. Every call is appended to a shareable
//! [`CallLog`] so tests can observe what the control unit issued after the
//! driver has been boxed away.

use super::axis::{AxisMode, SimulatedAxis};
use axisd_common::hal::driver::{AxisDriver, HalError};
use axisd_common::hal::types::{AxisFeedback, AxisHandle, AxisParameter, MotionCommand};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Connect(String),
    Disconnect(AxisHandle),
    PointToPoint(AxisHandle, MotionCommand),
    OpenLoop(AxisHandle),
    Lock(AxisHandle),
    WriteParameter(AxisHandle, AxisParameter, f64),
}

/// Shared, append-only record of driver calls.
pub type CallLog = Arc<Mutex<Vec<DriverCall>>>;

/// Simulation driver implementing the `AxisDriver` trait.
pub struct SimulationDriver {
    axes: Vec<SimulatedAxis>,
    /// Axis names whose connect attempt fails.
    connect_faults: HashSet<String>,
    /// When set, every motion call fails after being recorded.
    reject_commands: bool,
    log: CallLog,
}

impl SimulationDriver {
    pub fn new() -> Self {
        Self {
            axes: Vec::new(),
            connect_faults: HashSet::new(),
            reject_commands: false,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail `connect_axis` for the given names.
    pub fn with_connect_faults<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connect_faults = names.into_iter().map(Into::into).collect();
        self
    }

    /// Fail every motion command with `HalError::CommandRejected`.
    pub fn rejecting_commands(mut self) -> Self {
        self.reject_commands = true;
        self
    }

    /// Handle to the call log.
    pub fn call_log(&self) -> CallLog {
        Arc::clone(&self.log)
    }

    /// Simulated axis behind `handle`.
    pub fn axis(&self, handle: AxisHandle) -> Option<&SimulatedAxis> {
        self.axes.get(handle.0 as usize)
    }

    fn record(&self, call: DriverCall) {
        self.log.lock().push(call);
    }

    fn connected_axis(&mut self, handle: AxisHandle) -> Result<&mut SimulatedAxis, HalError> {
        if self.reject_commands {
            return Err(HalError::CommandRejected(format!(
                "simulated rejection on handle {}",
                handle.0
            )));
        }
        match self.axes.get_mut(handle.0 as usize) {
            Some(axis) if axis.is_connected() => Ok(axis),
            _ => Err(HalError::NotConnected(handle.0)),
        }
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl AxisDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn connect_axis(&mut self, name: &str) -> Result<AxisHandle, HalError> {
        self.record(DriverCall::Connect(name.to_string()));
        if self.connect_faults.contains(name) {
            return Err(HalError::ConnectFailed {
                axis: name.to_string(),
                reason: "simulated reset failure".to_string(),
            });
        }

        // Reconnecting by name reuses the slot so the set-point survives.
        let index = match self.axes.iter().position(|a| a.name() == name) {
            Some(index) => {
                self.axes[index].reconnect();
                index
            }
            None => {
                self.axes.push(SimulatedAxis::new(name));
                self.axes.len() - 1
            }
        };

        info!(axis = name, handle = index, "simulated axis connected");
        Ok(AxisHandle(index as u32))
    }

    fn disconnect_axis(&mut self, handle: AxisHandle) -> Result<(), HalError> {
        self.record(DriverCall::Disconnect(handle));
        let axis = self
            .axes
            .get_mut(handle.0 as usize)
            .ok_or(HalError::NotConnected(handle.0))?;
        axis.disconnect();
        debug!(axis = axis.name(), "simulated axis disconnected");
        Ok(())
    }

    fn point_to_point(
        &mut self,
        handle: AxisHandle,
        command: &MotionCommand,
    ) -> Result<(), HalError> {
        self.record(DriverCall::PointToPoint(handle, *command));
        self.connected_axis(handle)?.apply_move(command);
        Ok(())
    }

    fn open_loop(&mut self, handle: AxisHandle) -> Result<(), HalError> {
        self.record(DriverCall::OpenLoop(handle));
        self.connected_axis(handle)?.set_mode(AxisMode::OpenLoop);
        Ok(())
    }

    fn lock(&mut self, handle: AxisHandle) -> Result<(), HalError> {
        self.record(DriverCall::Lock(handle));
        self.connected_axis(handle)?.set_mode(AxisMode::Locked);
        Ok(())
    }

    fn write_parameter(
        &mut self,
        handle: AxisHandle,
        parameter: AxisParameter,
        value: f64,
    ) -> Result<(), HalError> {
        self.record(DriverCall::WriteParameter(handle, parameter, value));
        self.connected_axis(handle)?.write_parameter(parameter, value);
        Ok(())
    }

    fn feedback(&self, handle: AxisHandle) -> Option<AxisFeedback> {
        self.axes
            .get(handle.0 as usize)
            .filter(|a| a.is_connected())
            .map(SimulatedAxis::feedback)
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        for axis in &mut self.axes {
            axis.disconnect();
        }
        info!("simulation driver shut down");
        Ok(())
    }
}
