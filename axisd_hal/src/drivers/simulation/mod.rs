//! Simulation driver module.
//!
//! Software stand-ins for the motion hardware and the real-time companion,
//! for development and testing without physical hardware.

mod axis;
mod companion;
mod driver;

pub use axis::{AxisMode, SimulatedAxis};
pub use companion::SimulatedCompanion;
pub use driver::{CallLog, DriverCall, SimulationDriver};

use axisd_common::hal::driver::{AxisDriver, CompanionTask};

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn AxisDriver> {
    Box::new(SimulationDriver::new())
}

/// Factory function to create an always-responsive simulated companion.
pub fn create_companion() -> Box<dyn CompanionTask> {
    Box::new(SimulatedCompanion::new())
}
