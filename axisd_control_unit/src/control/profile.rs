//! Trajectory profile generators.
//!
//! ```text
//! d = target - set_point          (absolute)
//! d = payload                     (relative)
//! T = max(T_default * |d| / d_default, T_default)
//!
//! parabolic       v = |d| / (T/2)   a = v / (T/2)   j = unbounded
//! minimum jerk    v = 2|d| / T      a = 4v / T      j = 4a / T
//! energy optimal  v = 1.5|d| / T    a = 4.5v / T    j = 9a / T
//! ```
//!
//! A rate that comes out exactly zero is replaced by `zero_rate_floor` so the
//! driver never receives a zero-rate command.

use axisd_common::control_unit::state::ReferenceMode;
use axisd_common::hal::types::MotionCommand;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ZERO_RATE_FLOOR: f64 = 10.0;
pub const DEFAULT_IN_POSITION_WINDOW: f64 = 1.0;

/// Profile family, fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProfileFamily {
    /// Cheapest; acceleration is discontinuous at the midpoint.
    #[default]
    Parabolic,
    MinimumJerk,
    EnergyOptimal,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrajectoryError {
    #[error("{field} is not finite")]
    NonFinite { field: &'static str },

    #[error("{field} must be positive, got {value}")]
    NonPositiveDefault { field: &'static str, value: f64 },
}

/// Inputs for one point-to-point move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRequest {
    pub reference: ReferenceMode,
    /// Absolute target, or the relative distance.
    pub value: f64,
    /// Current set-point position of the axis.
    pub set_point: f64,
    pub default_distance: f64,
    pub default_duration: f64,
}

/// Output of one planning call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPlan {
    pub distance: f64,
    pub duration: f64,
    pub velocity: f64,
    pub acceleration: f64,
    /// `None` means unbounded.
    pub jerk: Option<f64>,
    pub target_position: f64,
    pub reference_mode: ReferenceMode,
    pub in_position: bool,
}

impl TrajectoryPlan {
    /// Driver command: absolute target or relative distance.
    pub fn to_command(&self) -> MotionCommand {
        let position = match self.reference_mode {
            ReferenceMode::Absolute => self.target_position,
            ReferenceMode::Relative => self.distance,
        };
        MotionCommand {
            position,
            velocity: self.velocity,
            acceleration: self.acceleration,
            jerk: self.jerk,
            reference: self.reference_mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryEngine {
    family: ProfileFamily,
    zero_rate_floor: f64,
    in_position_window: f64,
}

impl Default for TrajectoryEngine {
    fn default() -> Self {
        Self::new(ProfileFamily::default())
    }
}

impl TrajectoryEngine {
    pub const fn new(family: ProfileFamily) -> Self {
        Self {
            family,
            zero_rate_floor: DEFAULT_ZERO_RATE_FLOOR,
            in_position_window: DEFAULT_IN_POSITION_WINDOW,
        }
    }

    pub const fn with_zero_rate_floor(mut self, floor: f64) -> Self {
        self.zero_rate_floor = floor;
        self
    }

    pub const fn with_in_position_window(mut self, window: f64) -> Self {
        self.in_position_window = window;
        self
    }

    #[inline]
    pub const fn family(&self) -> ProfileFamily {
        self.family
    }

    /// Plan one move.
    ///
    /// # Errors
    /// `NonFinite` for NaN/infinite inputs, `NonPositiveDefault` when the
    /// axis default distance or duration is zero or negative.
    pub fn plan(&self, request: &MoveRequest) -> Result<TrajectoryPlan, TrajectoryError> {
        finite("value", request.value)?;
        finite("set_point", request.set_point)?;
        positive("default_distance", request.default_distance)?;
        positive("default_duration", request.default_duration)?;

        let (distance, target_position) = match request.reference {
            ReferenceMode::Absolute => (request.value - request.set_point, request.value),
            ReferenceMode::Relative => (request.value, request.set_point + request.value),
        };
        let span = distance.abs();
        let ratio = span / request.default_distance;
        let duration = (request.default_duration * ratio).max(request.default_duration);

        let (velocity, acceleration, jerk) = match self.family {
            ProfileFamily::Parabolic => {
                let half = duration / 2.0;
                let v = span / half;
                (v, v / half, None)
            }
            ProfileFamily::MinimumJerk => {
                let v = 2.0 * span / duration;
                let a = 4.0 * v / duration;
                (v, a, Some(4.0 * a / duration))
            }
            ProfileFamily::EnergyOptimal => {
                let v = 1.5 * span / duration;
                let a = 4.5 * v / duration;
                (v, a, Some(9.0 * a / duration))
            }
        };

        Ok(TrajectoryPlan {
            distance,
            duration,
            velocity: self.floor(velocity),
            acceleration: self.floor(acceleration),
            jerk: jerk.map(|j| self.floor(j)),
            target_position,
            reference_mode: request.reference,
            in_position: span <= self.in_position_window,
        })
    }

    #[inline]
    fn floor(&self, rate: f64) -> f64 {
        if rate == 0.0 { self.zero_rate_floor } else { rate }
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), TrajectoryError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TrajectoryError::NonFinite { field })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), TrajectoryError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(TrajectoryError::NonPositiveDefault { field, value })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
