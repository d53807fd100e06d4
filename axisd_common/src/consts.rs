//! System-wide constants for the axisd workspace.
//!
//! Single source of truth for table sizes and wire-level scaling.

/// Number of axis slots.
pub const AXIS_COUNT: usize = 10;

/// Number of control registers (`CTR_FLG`).
pub const CONTROL_REGISTER_COUNT: usize = 80;

/// Number of measured position channels (two per axis).
pub const POSITION_COUNT: usize = 20;

/// Maximum axis name length in bytes, excluding the terminator.
pub const AXIS_NAME_CAPACITY: usize = 19;

/// Scale applied to floats carried as `i32` on the wire.
pub const FIXED_POINT_SCALE: f32 = 10_000.0;

/// Control register 19 value meaning "scan running".
pub const RUNNING_SENTINEL: f32 = 255.0;

/// Sub-command selector stride inside a command register value.
pub const SELECTOR_STRIDE: f32 = 10_000.0;

/// Default TCP port of the control channel.
pub const DEFAULT_PORT: u16 = 6666;

/// Default POSIX shared memory object name.
pub const DEFAULT_SHM_NAME: &str = "/axisd_status";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/axisd/axisd.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert_eq!(POSITION_COUNT, 2 * AXIS_COUNT);
        // Per-axis control slots go up to 60 + 9.
        assert!(60 + AXIS_COUNT <= CONTROL_REGISTER_COUNT);
        assert!(DEFAULT_SHM_NAME.starts_with('/'));
    }
}
