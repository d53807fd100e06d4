//! Built-in driver implementations.
//!
//! - [`simulation`] - Software simulation driver and companion for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `AxisDriver` (and optionally `CompanionTask`) from `axisd_common::hal::driver`
//! 3. Register the factories in [`register_all`]

pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Register every built-in driver and companion on `registry`.
pub fn register_all(registry: &mut DriverRegistry) {
    // Pre-registered names win.
    let _ = registry.register_driver("simulation", simulation::create_driver);
    let _ = registry.register_companion("simulation", simulation::create_companion);
}
