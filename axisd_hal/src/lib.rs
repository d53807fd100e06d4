//! # axisd HAL Library
//!
//! Pluggable hardware collaborators for the control unit.
//!
//! Drivers implement `AxisDriver` and companion tasks implement
//! `CompanionTask`, both from `axisd_common::hal::driver`. The control unit
//! resolves the configured names through a [`DriverRegistry`].
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver and companion factory registration
//! - [`drivers`] - Built-in implementations

pub mod driver_registry;
pub mod drivers;

pub use crate::driver_registry::DriverRegistry;
