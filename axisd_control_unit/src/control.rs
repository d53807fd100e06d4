//! Motion planning.
//!
//! Point-to-point moves are turned into velocity/acceleration/jerk limits
//! by one of three profile families, chosen per deployment.

pub mod profile;

pub use profile::{MoveRequest, ProfileFamily, TrajectoryEngine, TrajectoryError, TrajectoryPlan};
