//! Shared state bridge.
//!
//! Owns the optional status region and the optional companion task. The
//! region is absent when shared memory is disabled or its creation failed;
//! every mirror call is then a no-op and the system keeps serving TCP.
//!
//! Rendezvous with the companion:
//!
//! ```text
//! enter = 0, exit = 0 ─► trigger() ─► spin until enter != 0 && exit != 0
//!                                          └─ deadline ─► HandshakeTimedOut
//! ```

use crate::store::{ControlTable, ParameterStore};
use axisd_common::consts::AXIS_COUNT;
use axisd_common::control_unit::status::StatusFlags;
use axisd_common::hal::driver::{CompanionTask, HalError};
use axisd_common::hal::types::AxisFeedback;
use axisd_common::shm::layout::SharedStatus;
use axisd_shared_memory::SharedRegion;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Busy polls before the wait starts yielding the CPU.
const SPIN_BEFORE_YIELD: u32 = 64;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("companion handshake timed out after {0:?}")]
    HandshakeTimedOut(Duration),

    #[error("companion trigger failed: {0}")]
    Trigger(#[from] HalError),
}

/// How a rendezvous ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendezvous {
    Completed { waited: Duration },
    /// No active companion, or no region to meet in.
    Skipped,
}

pub struct SharedStateBridge {
    region: Option<SharedRegion<SharedStatus>>,
    companion: Option<Box<dyn CompanionTask>>,
    timeout: Duration,
}

impl SharedStateBridge {
    pub fn new(companion: Option<Box<dyn CompanionTask>>, timeout: Duration) -> Self {
        Self {
            region: None,
            companion,
            timeout,
        }
    }

    /// Bridge with neither region nor companion.
    pub fn detached() -> Self {
        Self::new(None, Duration::ZERO)
    }

    pub fn attach_region(&mut self, region: SharedRegion<SharedStatus>) {
        info!(segment = region.name(), "status region attached to bridge");
        self.region = Some(region);
    }

    /// Detach the region, returning it so the caller decides when it drops.
    pub fn release_region(&mut self) -> Option<SharedRegion<SharedStatus>> {
        self.region.take()
    }

    pub fn region(&self) -> Option<&SharedStatus> {
        self.region.as_ref().map(SharedRegion::get)
    }

    #[inline]
    pub fn has_region(&self) -> bool {
        self.region.is_some()
    }

    pub fn companion_active(&self) -> bool {
        self.companion.as_ref().is_some_and(|c| c.is_active())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ─── Mirrors ────────────────────────────────────────────────────

    /// Per-axis control registers the companion reads.
    pub fn mirror_controls(&mut self, control: &ControlTable) {
        let Some(region) = self.region.as_mut() else {
            return;
        };
        let shared = region.get_mut();
        for axis in 0..AXIS_COUNT {
            for index in ControlTable::mirrored_offsets(axis) {
                shared.ctr_flag[index] = control.values()[index];
            }
        }
    }

    pub fn mirror_status(&mut self, status: &[StatusFlags; AXIS_COUNT]) {
        if let Some(region) = self.region.as_mut() {
            let shared = region.get_mut();
            for (slot, word) in shared.stat_flag.iter_mut().zip(status) {
                *slot = word.bits();
            }
        }
    }

    /// Axis names and type codes.
    pub fn mirror_identity(&mut self, store: &ParameterStore) {
        let Some(region) = self.region.as_mut() else {
            return;
        };
        let shared = region.get_mut();
        for axis in 0..AXIS_COUNT {
            shared.axis_name[axis] = SharedStatus::encode_name(store.name(axis));
            shared.axis_type[axis] = store.axis_type(axis) as i32;
        }
    }

    pub fn write_force_limits(&mut self, limits: &[f32; AXIS_COUNT]) {
        if let Some(region) = self.region.as_mut() {
            region.get_mut().force_limit = *limits;
        }
    }

    /// Driver feedback for one axis.
    pub fn mirror_feedback(&mut self, axis: usize, feedback: &AxisFeedback) {
        if let Some(region) = self.region.as_mut() {
            let shared = region.get_mut();
            shared.set_point_pos[axis] = feedback.set_point;
            shared.vc_pos[axis] = feedback.position;
            shared.net_current[axis] = feedback.net_current;
        }
    }

    /// Set-point maintained by an active companion.
    pub fn set_point(&self, axis: usize) -> Option<f64> {
        if !self.companion_active() {
            return None;
        }
        self.region().map(|shared| shared.set_point_pos[axis])
    }

    // ─── Handshake ──────────────────────────────────────────────────

    /// Trigger the companion and wait, bounded, for it to set both flags.
    ///
    /// # Errors
    /// `HandshakeTimedOut` when the flags are still clear at the deadline,
    /// `Trigger` when the companion refuses the kick.
    pub fn rendezvous(&mut self) -> Result<Rendezvous, BridgeError> {
        let (Some(region), Some(companion)) = (self.region.as_ref(), self.companion.as_mut())
        else {
            return Ok(Rendezvous::Skipped);
        };
        if !companion.is_active() {
            return Ok(Rendezvous::Skipped);
        }

        let flags = &region.get().handshake;
        flags.clear();
        companion.trigger(flags)?;

        let start = Instant::now();
        let mut polls = 0u32;
        loop {
            if flags.is_complete() {
                let waited = start.elapsed();
                debug!(?waited, companion = companion.name(), "rendezvous complete");
                return Ok(Rendezvous::Completed { waited });
            }
            if start.elapsed() >= self.timeout {
                return Err(BridgeError::HandshakeTimedOut(self.timeout));
            }
            if polls < SPIN_BEFORE_YIELD {
                polls += 1;
                std::hint::spin_loop();
            } else {
                std::thread::yield_now();
            }
        }
    }
}

impl std::fmt::Debug for SharedStateBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStateBridge")
            .field("region", &self.region)
            .field("companion", &self.companion.as_ref().map(|c| c.name()))
            .field("timeout", &self.timeout)
            .finish()
    }
}
