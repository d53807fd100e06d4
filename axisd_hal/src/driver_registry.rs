//! Driver registry for axis drivers and companion tasks.
//!
//! Provides a `DriverRegistry` struct for registering and retrieving driver
//! factories. This uses constructor-injection rather than global state.

use axisd_common::hal::driver::{
    AxisDriver, CompanionFactory, CompanionTask, DriverFactory, HalError,
};
use std::collections::HashMap;

/// Registry of available drivers and companion tasks.
///
/// Constructed at startup, populated via `register_*()`, and consulted once
/// when the control core is built. No global state.
pub struct DriverRegistry {
    drivers: HashMap<&'static str, DriverFactory>,
    companions: HashMap<&'static str, CompanionFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
            companions: HashMap::new(),
        }
    }

    /// Registry pre-populated with every built-in implementation.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_all(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Errors
    /// `HalError::DuplicateDriver` if the name is taken.
    pub fn register_driver(
        &mut self,
        name: &'static str,
        factory: DriverFactory,
    ) -> Result<(), HalError> {
        if self.drivers.contains_key(name) {
            return Err(HalError::DuplicateDriver(name.to_string()));
        }
        self.drivers.insert(name, factory);
        Ok(())
    }

    /// Register a companion task factory.
    ///
    /// # Errors
    /// `HalError::DuplicateDriver` if the name is taken.
    pub fn register_companion(
        &mut self,
        name: &'static str,
        factory: CompanionFactory,
    ) -> Result<(), HalError> {
        if self.companions.contains_key(name) {
            return Err(HalError::DuplicateDriver(name.to_string()));
        }
        self.companions.insert(name, factory);
        Ok(())
    }

    /// Create a driver instance by name.
    ///
    /// # Errors
    /// Returns `HalError::DriverNotFound` if no driver with the given name is registered.
    pub fn create_driver(&self, name: &str) -> Result<Box<dyn AxisDriver>, HalError> {
        let factory = self
            .drivers
            .get(name)
            .ok_or_else(|| HalError::DriverNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// Create a companion task instance by name.
    ///
    /// # Errors
    /// Returns `HalError::DriverNotFound` if no companion with the given name is registered.
    pub fn create_companion(&self, name: &str) -> Result<Box<dyn CompanionTask>, HalError> {
        let factory = self
            .companions
            .get(name)
            .ok_or_else(|| HalError::DriverNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// List all registered driver names.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.drivers.keys().copied().collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::simulation::SimulationDriver;

    fn create_test_driver() -> Box<dyn AxisDriver> {
        Box::new(SimulationDriver::new())
    }

    #[test]
    fn registry_register_and_create() {
        let mut reg = DriverRegistry::new();
        reg.register_driver("test_driver", create_test_driver).unwrap();

        let driver = reg.create_driver("test_driver").expect("should create");
        assert_eq!(driver.name(), "simulation");
    }

    #[test]
    fn registry_driver_not_found() {
        let reg = DriverRegistry::new();
        let result = reg.create_driver("nonexistent");
        assert!(matches!(result, Err(HalError::DriverNotFound(_))));
        assert!(matches!(
            reg.create_companion("nonexistent"),
            Err(HalError::DriverNotFound(_))
        ));
    }

    #[test]
    fn registry_list_drivers() {
        let mut reg = DriverRegistry::new();
        reg.register_driver("alpha", create_test_driver).unwrap();
        reg.register_driver("beta", create_test_driver).unwrap();

        let mut names = reg.list_drivers();
        names.sort();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn registry_duplicate_is_rejected() {
        let mut reg = DriverRegistry::new();
        reg.register_driver("dup", create_test_driver).unwrap();
        assert!(matches!(
            reg.register_driver("dup", create_test_driver),
            Err(HalError::DuplicateDriver(_))
        ));
    }

    #[test]
    fn builtin_registry_has_simulation() {
        let reg = DriverRegistry::with_builtin();
        assert!(reg.create_driver("simulation").is_ok());
        let companion = reg.create_companion("simulation").unwrap();
        assert!(companion.is_active());
    }
}
