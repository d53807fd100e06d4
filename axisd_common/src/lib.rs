//! axisd Common Library
//!
//! Shared constants, state enums, hardware collaborator traits, the shared
//! status region layout and configuration loading for all axisd crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Table sizes and wire-level constants
//! - [`control_unit`] - System/axis state enums and status bitflags
//! - [`hal`] - `AxisDriver` / `CompanionTask` traits and their types
//! - [`shm`] - `SharedStatus` region layout
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience

pub mod config;
pub mod consts;
pub mod control_unit;
pub mod hal;
pub mod prelude;
pub mod shm;
