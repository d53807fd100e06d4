//! Control register table.
//!
//! Clients address the 80 control registers by numeric offset, so the flat
//! table is kept for the wire. Everything inside the control unit goes
//! through the named accessors below; [`LEGACY_LAYOUT`] documents which
//! offset backs which field.

use axisd_common::consts::{AXIS_COUNT, CONTROL_REGISTER_COUNT, RUNNING_SENTINEL};
use axisd_common::control_unit::state::{AxisType, ReferenceMode};

/// Legacy register offsets.
pub mod offset {
    pub const SPEED_FACTOR: usize = 10;
    pub const DP_SENSITIVITY: usize = 11;
    pub const LINEAR_UP_THRESHOLD: usize = 12;
    pub const REST_POSITION: usize = 13;
    pub const FORCE_CONTROL_THRESHOLD: usize = 14;
    pub const SCAN_FORCE_RATE: usize = 15;
    pub const TWEAK_BYPASS: usize = 16;
    pub const OPEN_LOOP_RAMP: usize = 17;
    pub const OPEN_LOOP_VALUE: usize = 18;
    pub const RUN_FLAG: usize = 19;
    pub const SOFT_LANDING_DISTANCE: usize = 40;
    pub const SOFT_LANDING_DURATION: usize = 41;

    pub const fn work_position(axis: usize) -> usize {
        axis
    }
    /// Per-axis slot sharing offsets 10..19 with the globals.
    pub const fn auxiliary(axis: usize) -> usize {
        10 + axis
    }
    pub const fn default_distance(axis: usize) -> usize {
        20 + axis
    }
    pub const fn default_duration(axis: usize) -> usize {
        30 + axis
    }
    pub const fn reference_mode(axis: usize) -> usize {
        50 + axis
    }
    pub const fn standby_position(axis: usize) -> usize {
        60 + axis
    }
}

/// Offset ranges and the field they hold.
pub const LEGACY_LAYOUT: &[(core::ops::Range<usize>, &str)] = &[
    (0..10, "work_position[axis]"),
    (10..11, "speed_factor"),
    (11..12, "dp_sensitivity"),
    (12..13, "linear_up_threshold"),
    (13..14, "rest_position"),
    (14..15, "force_control_threshold"),
    (15..16, "scan_force_rate"),
    (16..17, "tweak_bypass"),
    (17..18, "open_loop_ramp"),
    (18..19, "open_loop_value"),
    (19..20, "run_flag"),
    (20..30, "default_distance[axis]"),
    (30..40, "default_duration[axis]"),
    (40..41, "soft_landing_distance"),
    (41..42, "soft_landing_duration"),
    (50..60, "reference_mode[axis]"),
    (60..70, "standby_position[axis]"),
];

// ─── Defaults applied at system INIT ────────────────────────────────

pub const SPEED_FACTOR_DEFAULT: f32 = 4.5;
pub const DP_SENSITIVITY_DEFAULT: f32 = 150.0;
pub const LINEAR_UP_THRESHOLD_DEFAULT: f32 = 800.0;
pub const REST_POSITION_DEFAULT: f32 = 1000.0;
pub const FORCE_CONTROL_THRESHOLD_DEFAULT: f32 = 3000.0;
pub const SCAN_FORCE_RATE_DEFAULT: f32 = 10.0;
pub const SOFT_LANDING_DISTANCE_DEFAULT: f32 = 250.0;
pub const SOFT_LANDING_DURATION_DEFAULT: f32 = 0.005;
pub const TURRET_DEFAULT_DISTANCE: f32 = 10.0;
pub const LINEAR_DEFAULT_DISTANCE: f32 = 1000.0;
pub const DEFAULT_DURATION: f32 = 1.0;

/// The 80 control registers.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlTable {
    values: [f32; CONTROL_REGISTER_COUNT],
}

impl Default for ControlTable {
    fn default() -> Self {
        Self {
            values: [0.0; CONTROL_REGISTER_COUNT],
        }
    }
}

impl ControlTable {
    pub fn values(&self) -> &[f32; CONTROL_REGISTER_COUNT] {
        &self.values
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// Overwrite the leading registers. Caller checks capacity.
    pub(crate) fn copy_prefix(&mut self, values: &[f32]) {
        self.values[..values.len()].copy_from_slice(values);
    }

    /// Field held at `index`, for diagnostics.
    pub fn field_name(index: usize) -> Option<&'static str> {
        LEGACY_LAYOUT
            .iter()
            .find(|(range, _)| range.contains(&index))
            .map(|(_, name)| *name)
    }

    // ─── Globals ────────────────────────────────────────────────────

    #[inline]
    pub fn speed_factor(&self) -> f32 {
        self.values[offset::SPEED_FACTOR]
    }

    #[inline]
    pub fn open_loop_ramp(&self) -> f32 {
        self.values[offset::OPEN_LOOP_RAMP]
    }

    #[inline]
    pub fn open_loop_value(&self) -> f32 {
        self.values[offset::OPEN_LOOP_VALUE]
    }

    /// Register 19 holds the running sentinel.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.values[offset::RUN_FLAG] == RUNNING_SENTINEL
    }

    pub fn set_running(&mut self, running: bool) {
        self.values[offset::RUN_FLAG] = if running { RUNNING_SENTINEL } else { 0.0 };
    }

    // ─── Per-axis ───────────────────────────────────────────────────

    #[inline]
    pub fn work_position(&self, axis: usize) -> f32 {
        self.values[offset::work_position(axis)]
    }

    pub fn set_work_position(&mut self, axis: usize, value: f32) {
        self.values[offset::work_position(axis)] = value;
    }

    #[inline]
    pub fn default_distance(&self, axis: usize) -> f32 {
        self.values[offset::default_distance(axis)]
    }

    #[inline]
    pub fn default_duration(&self, axis: usize) -> f32 {
        self.values[offset::default_duration(axis)]
    }

    /// Zero selects relative, anything else absolute.
    #[inline]
    pub fn reference_mode(&self, axis: usize) -> ReferenceMode {
        if self.values[offset::reference_mode(axis)] == 0.0 {
            ReferenceMode::Relative
        } else {
            ReferenceMode::Absolute
        }
    }

    #[inline]
    pub fn standby_position(&self, axis: usize) -> f32 {
        self.values[offset::standby_position(axis)]
    }

    /// Registers mirrored into the shared region for `axis`.
    pub fn mirrored_offsets(axis: usize) -> [usize; 4] {
        [
            offset::work_position(axis),
            offset::auxiliary(axis),
            offset::reference_mode(axis),
            offset::standby_position(axis),
        ]
    }

    /// Reset registers for a fresh system INIT.
    ///
    /// Per-axis slots go first because the auxiliary slots share offsets
    /// with the globals, which must end up holding their defaults.
    pub fn load_defaults(&mut self, types: &[AxisType; AXIS_COUNT]) {
        for (axis, kind) in types.iter().enumerate() {
            self.values[offset::work_position(axis)] = 0.0;
            self.values[offset::auxiliary(axis)] = 0.0;
            self.values[offset::default_distance(axis)] = match kind {
                AxisType::Turret => TURRET_DEFAULT_DISTANCE,
                _ => LINEAR_DEFAULT_DISTANCE,
            };
            self.values[offset::default_duration(axis)] = DEFAULT_DURATION;
        }

        self.values[offset::SPEED_FACTOR] = SPEED_FACTOR_DEFAULT;
        self.values[offset::DP_SENSITIVITY] = DP_SENSITIVITY_DEFAULT;
        self.values[offset::LINEAR_UP_THRESHOLD] = LINEAR_UP_THRESHOLD_DEFAULT;
        self.values[offset::REST_POSITION] = REST_POSITION_DEFAULT;
        self.values[offset::FORCE_CONTROL_THRESHOLD] = FORCE_CONTROL_THRESHOLD_DEFAULT;
        self.values[offset::SCAN_FORCE_RATE] = SCAN_FORCE_RATE_DEFAULT;
        self.values[offset::TWEAK_BYPASS] = 0.0;
        self.values[offset::OPEN_LOOP_RAMP] = 0.0;
        self.values[offset::OPEN_LOOP_VALUE] = 0.0;
        self.values[offset::RUN_FLAG] = 0.0;
        self.values[offset::SOFT_LANDING_DISTANCE] = SOFT_LANDING_DISTANCE_DEFAULT;
        self.values[offset::SOFT_LANDING_DURATION] = SOFT_LANDING_DURATION_DEFAULT;
    }
}
