//! Control core and its lifecycle tick.
//!
//! [`ControlCore`] owns every piece of mutable state: the parameter store,
//! the dispatcher, the shared state bridge and the axis driver. Transports
//! feed it frames and call [`ControlCore::tick`]; nothing else mutates it.
//!
//! ```text
//! IDLE  ─ (client INIT) ─► INIT  ─ initialize_axes ─► READY
//!   ▲                                                   │ scan every tick
//!   └──── disconnect axes ◄── STOP ◄─ (client STOP / run flag cleared)
//! ```

use crate::command::dispatcher::{AxisDispatcher, ScanReport};
use crate::config::NodeConfig;
use crate::control::profile::TrajectoryEngine;
use crate::error::CoreError;
use crate::protocol::codec::Frame;
use crate::protocol::status::StatusSnapshot;
use crate::protocol::tag::Tag;
use crate::shm::bridge::{BridgeError, SharedStateBridge};
use crate::state::system::{SystemEvent, TransitionResult};
use crate::store::{ParameterStore, StoreError};
use axisd_common::consts::{AXIS_COUNT, POSITION_COUNT};
use axisd_common::control_unit::state::SystemState;
use axisd_common::hal::driver::{AxisDriver, CompanionTask};
use axisd_common::shm::layout::SharedStatus;
use axisd_hal::DriverRegistry;
use axisd_shared_memory::SharedRegion;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(50);

/// Construction parameters not tied to a config file.
#[derive(Debug, Clone)]
pub struct CoreSettings {
    pub engine: TrajectoryEngine,
    /// Shared region name; `None` runs TCP-only.
    pub shm_name: Option<String>,
    pub handshake_timeout: Duration,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            engine: TrajectoryEngine::default(),
            shm_name: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl CoreSettings {
    pub fn from_config(config: &NodeConfig) -> Self {
        let engine = TrajectoryEngine::new(config.motion.profile)
            .with_zero_rate_floor(config.motion.zero_rate_floor)
            .with_in_position_window(config.motion.in_position_window);
        Self {
            engine,
            shm_name: config.shm.enabled.then(|| config.shm.name.clone()),
            handshake_timeout: Duration::from_millis(config.companion.handshake_timeout_ms),
        }
    }
}

/// Running totals, for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub ticks: u64,
    pub scans: u64,
    pub commands: u64,
    pub hardware_failures: u64,
    pub handshake_timeouts: u64,
}

pub struct ControlCore {
    store: ParameterStore,
    dispatcher: AxisDispatcher,
    bridge: SharedStateBridge,
    driver: Box<dyn AxisDriver>,
    shm_name: Option<String>,
    stats: TickStats,
}

impl ControlCore {
    pub fn new(
        driver: Box<dyn AxisDriver>,
        companion: Option<Box<dyn CompanionTask>>,
        settings: CoreSettings,
    ) -> Self {
        info!(
            driver = driver.name(),
            version = driver.version(),
            profile = ?settings.engine.family(),
            "control core created"
        );
        Self {
            store: ParameterStore::new(),
            dispatcher: AxisDispatcher::new(settings.engine),
            bridge: SharedStateBridge::new(companion, settings.handshake_timeout),
            driver,
            shm_name: settings.shm_name,
            stats: TickStats::default(),
        }
    }

    /// Resolve driver and companion by name and build the core.
    ///
    /// # Errors
    /// `CoreError::Hal` when a configured name is not registered.
    pub fn from_config(config: &NodeConfig, registry: &DriverRegistry) -> Result<Self, CoreError> {
        let driver = registry.create_driver(&config.hal.driver)?;
        let companion = if config.companion.enabled {
            Some(registry.create_companion(&config.companion.name)?)
        } else {
            None
        };
        Ok(Self::new(driver, companion, CoreSettings::from_config(config)))
    }

    /// Apply one client frame.
    pub fn apply_frame(&mut self, frame: &Frame<'_>) -> Result<(), StoreError> {
        self.store.apply_frame(frame)?;
        if frame.tag() == Some(Tag::ForceLimit) {
            self.bridge.write_force_limits(self.store.force_limits());
        }
        Ok(())
    }

    /// Advance the lifecycle by one step. Returns the state afterwards.
    pub fn tick(&mut self) -> SystemState {
        self.stats.ticks += 1;
        match self.store.system_state() {
            SystemState::Idle => {}
            SystemState::Init => {
                match self.initialize_axes() {
                    Ok(connected) => info!(connected, "axes initialised"),
                    Err(e) => error!("initialisation incomplete, status region disabled: {e}"),
                }
                self.store.control_mut().set_running(true);
                self.advance(SystemEvent::InitComplete);
            }
            SystemState::Ready => {
                self.scan();
                if !self.store.control().is_running() {
                    info!("run flag cleared, stopping");
                    self.advance(SystemEvent::StopRequested);
                }
            }
            SystemState::Stop => {
                self.store.control_mut().set_running(false);
                self.dispatcher.disconnect_all(self.driver.as_mut());
                self.bridge.mirror_controls(self.store.control());
                self.advance(SystemEvent::StopComplete);
                info!("axes disconnected, system idle");
            }
        }
        self.store.system_state()
    }

    fn scan(&mut self) {
        match self
            .dispatcher
            .scan(&mut self.store, self.driver.as_mut(), &mut self.bridge)
        {
            Ok(report) => self.record(&report),
            Err(BridgeError::HandshakeTimedOut(timeout)) => {
                self.stats.scans += 1;
                self.stats.handshake_timeouts += 1;
                warn!(?timeout, "companion did not answer the handshake");
            }
            Err(e) => {
                self.stats.scans += 1;
                warn!("handshake failed: {e}");
            }
        }
    }

    fn record(&mut self, report: &ScanReport) {
        self.stats.scans += 1;
        self.stats.commands += report.executed as u64;
        self.stats.hardware_failures += report.hardware_failures as u64;
        if report.executed > 0 {
            debug!(
                executed = report.executed,
                hardware_failures = report.hardware_failures,
                planning_failures = report.planning_failures,
                "scan"
            );
        }
    }

    fn advance(&mut self, event: SystemEvent) {
        if let TransitionResult::Rejected(reason) = self.store.advance(event) {
            warn!(?event, "lifecycle step rejected: {reason}");
        }
    }

    /// Bring every typed axis up for a fresh READY period.
    ///
    /// Axes are connected and control defaults loaded even when the shared
    /// region cannot be created; that failure is returned after the rest of
    /// the work is done and the system runs without a region.
    pub fn initialize_axes(&mut self) -> Result<usize, CoreError> {
        let types = *self.store.axis_types();
        self.store.control_mut().load_defaults(&types);
        self.store.clear_commands();

        self.dispatcher.disconnect_all(self.driver.as_mut());
        let connected = self.dispatcher.connect_all(&self.store, self.driver.as_mut());

        let region = self.open_region();

        self.bridge.mirror_identity(&self.store);
        self.bridge.mirror_controls(self.store.control());
        self.bridge.mirror_status(&self.dispatcher.status_words());
        self.bridge.write_force_limits(self.store.force_limits());
        self.dispatcher
            .refresh_feedback(self.driver.as_ref(), &mut self.bridge);

        region.map(|()| connected)
    }

    fn open_region(&mut self) -> Result<(), CoreError> {
        // Dropping the previous handle unlinks it before the name is reused.
        drop(self.bridge.release_region());
        let Some(name) = self.shm_name.as_deref() else {
            return Ok(());
        };
        let region = SharedRegion::<SharedStatus>::create(name)?;
        self.bridge.attach_region(region);
        Ok(())
    }

    /// Current status for a reply.
    pub fn snapshot(&self) -> StatusSnapshot {
        let region = self.bridge.region();
        StatusSnapshot {
            system: self.store.system_state(),
            positions: region.map_or([0.0; POSITION_COUNT], |r| r.vc_pos),
            status: self.dispatcher.status_words(),
            currents: region.map_or([0.0; AXIS_COUNT], |r| r.net_current),
            pending: *self.store.commands(),
            region_present: region.is_some(),
        }
    }

    /// Disconnect axes, stop the driver and release the region.
    pub fn shutdown(&mut self) {
        self.dispatcher.disconnect_all(self.driver.as_mut());
        if let Err(e) = self.driver.shutdown() {
            warn!("driver shutdown failed: {e}");
        }
        drop(self.bridge.release_region());
        info!(
            ticks = self.stats.ticks,
            commands = self.stats.commands,
            "control core shut down"
        );
    }

    // ─── Accessors ──────────────────────────────────────────────────

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &AxisDispatcher {
        &self.dispatcher
    }

    pub fn bridge(&self) -> &SharedStateBridge {
        &self.bridge
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    pub fn system_state(&self) -> SystemState {
        self.store.system_state()
    }
}

impl std::fmt::Debug for ControlCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlCore")
            .field("system", &self.store.system_state())
            .field("driver", &self.driver.name())
            .field("bridge", &self.bridge)
            .field("stats", &self.stats)
            .finish()
    }
}
