//! Simulated real-time companion.

use axisd_common::hal::driver::{CompanionTask, HalError};
use axisd_common::shm::layout::HandshakeFlags;
use tracing::trace;

/// Companion that acknowledges the handshake synchronously on trigger.
#[derive(Debug, Clone)]
pub struct SimulatedCompanion {
    active: bool,
    responsive: bool,
    triggers: u64,
}

impl SimulatedCompanion {
    /// Active and responsive.
    pub fn new() -> Self {
        Self {
            active: true,
            responsive: true,
            triggers: 0,
        }
    }

    /// Active but never sets the flags; every rendezvous times out.
    pub fn unresponsive() -> Self {
        Self {
            responsive: false,
            ..Self::new()
        }
    }

    /// Not running at all; rendezvous is skipped.
    pub fn inactive() -> Self {
        Self {
            active: false,
            ..Self::new()
        }
    }

    pub fn triggers(&self) -> u64 {
        self.triggers
    }
}

impl Default for SimulatedCompanion {
    fn default() -> Self {
        Self::new()
    }
}

impl CompanionTask for SimulatedCompanion {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn trigger(&mut self, flags: &HandshakeFlags) -> Result<(), HalError> {
        self.triggers += 1;
        if self.responsive {
            flags.acknowledge();
        }
        trace!(triggers = self.triggers, "simulated companion triggered");
        Ok(())
    }
}
