//! Command execution.
//!
//! - `register`: decoding of command register values into selector/payload
//! - `dispatcher`: per-axis command state machine run once per scan

pub mod dispatcher;
pub mod register;

pub use dispatcher::{AxisDispatcher, ScanReport};
pub use register::CommandWord;
