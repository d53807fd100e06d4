//! Axis dispatcher.
//!
//! One scan walks every connected axis with a pending command, executes it
//! according to the axis type and consumes the mailbox:
//!
//! | type        | reference          | default       | open-loop / lock                 |
//! |-------------|--------------------|---------------|----------------------------------|
//! | TURRET      | register 50 + axis | trajectory    | driver call                      |
//! | VC_PUSHER   | absolute           | trajectory    | ramp + value written, then call  |
//! | STD_ABS     | absolute           | trajectory    | trajectory                       |
//! | STD_REL     | relative           | trajectory    | trajectory                       |
//!
//! A VC_PUSHER change-work-position command stores its payload as the new
//! work position and then moves there. Hardware failures are logged and
//! counted; the status word still reports the command as issued.

use crate::command::register::CommandWord;
use crate::control::profile::{MoveRequest, TrajectoryEngine, TrajectoryPlan};
use crate::shm::bridge::{BridgeError, Rendezvous, SharedStateBridge};
use crate::state::axis::{AxisRuntime, AxisTable};
use crate::store::ParameterStore;
use axisd_common::consts::AXIS_COUNT;
use axisd_common::control_unit::state::{AxisType, ReferenceMode, SubCommand};
use axisd_common::control_unit::status::StatusFlags;
use axisd_common::hal::driver::{AxisDriver, HalError};
use axisd_common::hal::types::{AxisHandle, AxisParameter};
use tracing::{debug, info, warn};

/// Target of the per-command debug events.
pub const COMMAND_LOG_TARGET: &str = "axisd::command_log";

/// What one scan did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// Commands consumed.
    pub executed: usize,
    /// Driver calls that returned an error.
    pub hardware_failures: usize,
    /// Moves that could not be planned.
    pub planning_failures: usize,
    pub rendezvous: Rendezvous,
}

impl Default for ScanReport {
    fn default() -> Self {
        Self {
            executed: 0,
            hardware_failures: 0,
            planning_failures: 0,
            rendezvous: Rendezvous::Skipped,
        }
    }
}

/// Result of executing one command.
struct Outcome {
    status: StatusFlags,
    hardware_failed: bool,
    planning_failed: bool,
    message: &'static str,
    result: String,
}

impl Outcome {
    fn from_call(status: StatusFlags, message: &'static str, call: Result<(), HalError>) -> Self {
        match call {
            Ok(()) => Self {
                status,
                hardware_failed: false,
                planning_failed: false,
                message,
                result: "ok".to_string(),
            },
            Err(e) => Self {
                status,
                hardware_failed: true,
                planning_failed: false,
                message,
                result: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct AxisDispatcher {
    engine: TrajectoryEngine,
    axes: AxisTable,
}

impl AxisDispatcher {
    pub fn new(engine: TrajectoryEngine) -> Self {
        Self {
            engine,
            axes: [AxisRuntime::default(); AXIS_COUNT],
        }
    }

    pub fn engine(&self) -> &TrajectoryEngine {
        &self.engine
    }

    pub fn axis(&self, axis: usize) -> Option<&AxisRuntime> {
        self.axes.get(axis)
    }

    pub fn axes(&self) -> &AxisTable {
        &self.axes
    }

    pub fn status_words(&self) -> [StatusFlags; AXIS_COUNT] {
        core::array::from_fn(|axis| self.axes[axis].status)
    }

    pub fn connected_count(&self) -> usize {
        self.axes.iter().filter(|a| a.is_connected()).count()
    }

    // ─── Connection lifecycle ───────────────────────────────────────

    /// Connect every typed axis and reset all runtimes. Axes whose connect
    /// fails stay disconnected and are skipped by later scans.
    pub fn connect_all(&mut self, store: &ParameterStore, driver: &mut dyn AxisDriver) -> usize {
        for (axis, runtime) in self.axes.iter_mut().enumerate() {
            let kind = store.axis_type(axis);
            let handle = if kind.is_present() {
                match driver.connect_axis(store.name(axis)) {
                    Ok(handle) => {
                        info!(axis, name = store.name(axis), ?kind, "axis connected");
                        Some(handle)
                    }
                    Err(e) => {
                        warn!(axis, name = store.name(axis), "axis connect failed: {e}");
                        None
                    }
                }
            } else {
                None
            };
            runtime.reset(handle);
            if let Some(handle) = handle {
                runtime.set_point = driver.feedback(handle).map_or(0.0, |f| f.set_point);
            }
        }
        self.connected_count()
    }

    pub fn disconnect_all(&mut self, driver: &mut dyn AxisDriver) {
        for (axis, runtime) in self.axes.iter_mut().enumerate() {
            if let Some(handle) = runtime.handle.take() {
                match driver.disconnect_axis(handle) {
                    Ok(()) => debug!(axis, "axis disconnected"),
                    Err(e) => warn!(axis, "axis disconnect failed: {e}"),
                }
            }
        }
    }

    // ─── Scan ───────────────────────────────────────────────────────

    /// Execute pending commands, mirror state and meet the companion.
    ///
    /// A no-op unless the system is READY and the run flag is set.
    ///
    /// # Errors
    /// Only the rendezvous can fail; commands are consumed either way.
    pub fn scan(
        &mut self,
        store: &mut ParameterStore,
        driver: &mut dyn AxisDriver,
        bridge: &mut SharedStateBridge,
    ) -> Result<ScanReport, BridgeError> {
        if !store.allows_scan() {
            return Ok(ScanReport::default());
        }

        let mut report = ScanReport::default();
        for axis in 0..AXIS_COUNT {
            let command = store.command(axis);
            let Some(handle) = self.axes[axis].handle else {
                continue;
            };
            if command == 0.0 {
                continue;
            }

            let word = CommandWord::decode(command);
            let outcome = self.execute(axis, handle, word, store, driver, bridge);
            debug!(
                target: COMMAND_LOG_TARGET,
                axis,
                payload = word.payload,
                message = outcome.message,
                result = %outcome.result,
            );

            report.executed += 1;
            report.hardware_failures += usize::from(outcome.hardware_failed);
            report.planning_failures += usize::from(outcome.planning_failed);
            self.axes[axis].complete(command, outcome.status);
            store.clear_command(axis);
        }

        bridge.mirror_controls(store.control());
        bridge.mirror_status(&self.status_words());
        if !bridge.companion_active() {
            self.refresh_feedback(driver, bridge);
        }
        report.rendezvous = bridge.rendezvous()?;
        Ok(report)
    }

    /// Pull driver feedback into the runtimes and the region.
    pub fn refresh_feedback(&mut self, driver: &dyn AxisDriver, bridge: &mut SharedStateBridge) {
        for (axis, runtime) in self.axes.iter_mut().enumerate() {
            let Some(handle) = runtime.handle else {
                continue;
            };
            if let Some(feedback) = driver.feedback(handle) {
                runtime.set_point = feedback.set_point;
                bridge.mirror_feedback(axis, &feedback);
            }
        }
    }

    fn execute(
        &mut self,
        axis: usize,
        handle: AxisHandle,
        word: CommandWord,
        store: &mut ParameterStore,
        driver: &mut dyn AxisDriver,
        bridge: &SharedStateBridge,
    ) -> Outcome {
        let sub = word.sub_command();
        match store.axis_type(axis) {
            AxisType::Turret => match sub {
                SubCommand::OpenLoop => Outcome::from_call(
                    StatusFlags::IN_POSITION,
                    "open loop",
                    driver.open_loop(handle),
                ),
                SubCommand::AxisLock => {
                    Outcome::from_call(StatusFlags::IN_POSITION, "axis lock", driver.lock(handle))
                }
                _ => {
                    let reference = store.control().reference_mode(axis);
                    self.move_axis(axis, handle, reference, word.raw, store, driver, bridge)
                }
            },
            AxisType::VcPusher => match sub {
                SubCommand::ChangeWorkPosition => {
                    store.control_mut().set_work_position(axis, word.payload);
                    self.move_axis(
                        axis,
                        handle,
                        ReferenceMode::Absolute,
                        word.payload,
                        store,
                        driver,
                        bridge,
                    )
                }
                SubCommand::OpenLoop | SubCommand::AxisLock => {
                    let control = store.control();
                    let locking = sub == SubCommand::AxisLock;
                    // Locking zeroes the open-loop output first.
                    let value = if locking {
                        0.0
                    } else {
                        f64::from(control.open_loop_value())
                    };
                    let tuned = driver
                        .write_parameter(
                            handle,
                            AxisParameter::OpenLoopRamp,
                            f64::from(control.open_loop_ramp()),
                        )
                        .and_then(|()| {
                            driver.write_parameter(handle, AxisParameter::OpenLoopValue, value)
                        });
                    let (message, call) = if locking {
                        ("axis lock", tuned.and_then(|()| driver.lock(handle)))
                    } else {
                        ("open loop", tuned.and_then(|()| driver.open_loop(handle)))
                    };
                    Outcome::from_call(StatusFlags::IN_POSITION, message, call)
                }
                SubCommand::PointToPoint => self.move_axis(
                    axis,
                    handle,
                    ReferenceMode::Absolute,
                    word.raw,
                    store,
                    driver,
                    bridge,
                ),
            },
            AxisType::StdAbs => self.move_axis(
                axis,
                handle,
                ReferenceMode::Absolute,
                word.raw,
                store,
                driver,
                bridge,
            ),
            AxisType::StdRel => self.move_axis(
                axis,
                handle,
                ReferenceMode::Relative,
                word.raw,
                store,
                driver,
                bridge,
            ),
            AxisType::NotApplicable => Outcome::from_call(StatusFlags::IN_POSITION, "idle", Ok(())),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn move_axis(
        &mut self,
        axis: usize,
        handle: AxisHandle,
        reference: ReferenceMode,
        value: f32,
        store: &ParameterStore,
        driver: &mut dyn AxisDriver,
        bridge: &SharedStateBridge,
    ) -> Outcome {
        let set_point = bridge
            .set_point(axis)
            .or_else(|| driver.feedback(handle).map(|f| f.set_point))
            .unwrap_or(self.axes[axis].set_point);

        let request = MoveRequest {
            reference,
            value: f64::from(value),
            set_point,
            default_distance: f64::from(store.control().default_distance(axis)),
            default_duration: f64::from(store.control().default_duration(axis)),
        };

        let plan: TrajectoryPlan = match self.engine.plan(&request) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(axis, value, "move not planned: {e}");
                return Outcome {
                    status: StatusFlags::empty(),
                    hardware_failed: false,
                    planning_failed: true,
                    message: "point to point",
                    result: e.to_string(),
                };
            }
        };

        let call = driver.point_to_point(handle, &plan.to_command());
        if let Err(e) = &call {
            warn!(axis, target = plan.target_position, "point-to-point failed: {e}");
        }
        self.axes[axis].set_point = plan.target_position;

        let status = if plan.in_position {
            StatusFlags::IN_POSITION
        } else {
            StatusFlags::empty()
        };
        Outcome::from_call(status, "point to point", call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::system::SystemEvent;
    use crate::store::control::offset;
    use axisd_common::control_unit::state::SystemRequest;
    use axisd_common::hal::types::MotionCommand;
    use axisd_hal::drivers::simulation::{CallLog, DriverCall, SimulationDriver};

    struct Rig {
        store: ParameterStore,
        dispatcher: AxisDispatcher,
        driver: SimulationDriver,
        bridge: SharedStateBridge,
        log: CallLog,
    }

    /// READY system with axis 0 TURRET, 1 VC_PUSHER, 2 STD_ABS, 3 STD_REL.
    fn rig() -> Rig {
        let mut store = ParameterStore::new();
        store.set_axis_types(&[0, 1, 2, 3]).unwrap();
        for (axis, name) in ["T", "VC", "ABS", "REL"].iter().enumerate() {
            store.set_axis_name(axis, name).unwrap();
        }
        let types = *store.axis_types();
        store.control_mut().load_defaults(&types);
        store.control_mut().set_running(true);
        store.request_system(SystemRequest::Init).unwrap();
        store.advance(SystemEvent::InitComplete);

        let mut driver = SimulationDriver::new();
        let log = driver.call_log();
        let mut dispatcher = AxisDispatcher::new(TrajectoryEngine::default());
        assert_eq!(dispatcher.connect_all(&store, &mut driver), 4);
        log.lock().clear();

        Rig {
            store,
            dispatcher,
            driver,
            bridge: SharedStateBridge::detached(),
            log,
        }
    }

    impl Rig {
        fn scan(&mut self) -> ScanReport {
            self.dispatcher
                .scan(&mut self.store, &mut self.driver, &mut self.bridge)
                .unwrap()
        }

        fn calls(&self) -> Vec<DriverCall> {
            self.log.lock().clone()
        }
    }

    fn ptp_target(call: &DriverCall) -> Option<MotionCommand> {
        match call {
            DriverCall::PointToPoint(_, command) => Some(*command),
            _ => None,
        }
    }

    #[test]
    fn vc_pusher_open_loop_selector_skips_trajectory() {
        let mut rig = rig();
        rig.store.set_command_floats(&[0.0, 35_000.0]).unwrap();
        let report = rig.scan();

        assert_eq!(report.executed, 1);
        let calls = rig.calls();
        assert!(calls.iter().all(|c| ptp_target(c).is_none()));
        assert!(matches!(calls.last(), Some(DriverCall::OpenLoop(_))));
        assert!(matches!(
            calls[0],
            DriverCall::WriteParameter(_, AxisParameter::OpenLoopRamp, _)
        ));
        assert_eq!(rig.store.command(1), 0.0);
    }

    fn open_loop_value_written(calls: &[DriverCall]) -> Option<f64> {
        calls.iter().find_map(|call| match call {
            DriverCall::WriteParameter(_, AxisParameter::OpenLoopValue, value) => Some(*value),
            _ => None,
        })
    }

    #[test]
    fn vc_pusher_lock_zeroes_open_loop_value() {
        let mut rig = rig();
        let mut values = rig.store.control().values()[..20].to_vec();
        values[offset::OPEN_LOOP_VALUE] = 42.0;
        rig.store.set_control_floats(&values).unwrap();

        rig.store.set_command_floats(&[0.0, 40_000.0]).unwrap();
        rig.scan();
        let calls = rig.calls();
        assert_eq!(open_loop_value_written(&calls), Some(0.0));
        assert!(matches!(calls.last(), Some(DriverCall::Lock(_))));

        rig.log.lock().clear();
        rig.store.set_command_floats(&[0.0, 35_000.0]).unwrap();
        rig.scan();
        let calls = rig.calls();
        assert_eq!(open_loop_value_written(&calls), Some(42.0));
        assert!(matches!(calls.last(), Some(DriverCall::OpenLoop(_))));
    }

    #[test]
    fn turret_lock_needs_no_parameters() {
        let mut rig = rig();
        rig.store.set_command_floats(&[45_000.0]).unwrap();
        rig.scan();
        let calls = rig.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], DriverCall::Lock(_)));
        assert!(rig.dispatcher.axis(0).unwrap().status.contains(StatusFlags::IN_POSITION));
    }

    #[test]
    fn change_work_position_rewrites_register_then_moves() {
        let mut rig = rig();
        rig.store.set_command_floats(&[0.0, 20_125.0]).unwrap();
        rig.scan();

        assert_eq!(rig.store.control().work_position(1), 125.0);
        let command = rig.calls().iter().find_map(ptp_target).unwrap();
        assert_eq!(command.position, 125.0);
        assert_eq!(command.reference, ReferenceMode::Absolute);
    }

    #[test]
    fn std_axes_force_their_reference() {
        let mut rig = rig();
        rig.store.set_command_floats(&[0.0, 0.0, 300.0, -40.0]).unwrap();
        let report = rig.scan();
        assert_eq!(report.executed, 2);

        let moves: Vec<MotionCommand> = rig.calls().iter().filter_map(ptp_target).collect();
        assert_eq!(moves[0].reference, ReferenceMode::Absolute);
        assert_eq!(moves[0].position, 300.0);
        assert_eq!(moves[1].reference, ReferenceMode::Relative);
        assert_eq!(moves[1].position, -40.0);
    }

    #[test]
    fn toggle_flips_once_per_command() {
        let mut rig = rig();
        rig.store.set_command_floats(&[0.0, 0.0, 300.0]).unwrap();
        rig.scan();
        let first = rig.dispatcher.axis(2).unwrap().status;
        assert!(first.contains(StatusFlags::TOGGLE));
        // Long move: not in position.
        assert!(!first.contains(StatusFlags::IN_POSITION));

        rig.scan();
        assert_eq!(rig.dispatcher.axis(2).unwrap().status, first);

        rig.store.set_command_floats(&[0.0, 0.0, 300.5]).unwrap();
        rig.scan();
        let second = rig.dispatcher.axis(2).unwrap();
        assert!(!second.status.contains(StatusFlags::TOGGLE));
        assert!(second.status.contains(StatusFlags::IN_POSITION));
        assert_eq!(second.moved_count, 2);
    }

    #[test]
    fn hardware_failure_still_consumes_the_mailbox() {
        let mut store = ParameterStore::new();
        store.set_axis_types(&[2]).unwrap();
        store.control_mut().load_defaults(&[AxisType::StdAbs; AXIS_COUNT]);
        store.control_mut().set_running(true);
        store.request_system(SystemRequest::Init).unwrap();
        store.advance(SystemEvent::InitComplete);

        let mut driver = SimulationDriver::new().rejecting_commands();
        let mut dispatcher = AxisDispatcher::new(TrajectoryEngine::default());
        dispatcher.connect_all(&store, &mut driver);
        let mut bridge = SharedStateBridge::detached();

        store.set_command_floats(&[50.0]).unwrap();
        let report = dispatcher.scan(&mut store, &mut driver, &mut bridge).unwrap();
        assert_eq!(report.hardware_failures, 1);
        assert_eq!(store.command(0), 0.0);
        assert!(dispatcher.axis(0).unwrap().toggle);
    }

    #[test]
    fn scan_is_a_noop_unless_running() {
        let mut rig = rig();
        rig.store.control_mut().set_running(false);
        rig.store.set_command_floats(&[0.0, 0.0, 300.0]).unwrap();
        assert_eq!(rig.scan(), ScanReport::default());
        assert_eq!(rig.store.command(2), 300.0);
        assert!(rig.calls().is_empty());
    }

    #[test]
    fn disconnect_all_releases_handles() {
        let mut rig = rig();
        rig.dispatcher.disconnect_all(&mut rig.driver);
        assert_eq!(rig.dispatcher.connected_count(), 0);
        assert_eq!(
            rig.calls()
                .iter()
                .filter(|c| matches!(c, DriverCall::Disconnect(_)))
                .count(),
            4
        );
    }
}
