//! Control core tests through the public API.
//!
//! Verifies:
//! 1. a relative axis gets the planned point-to-point command.
//! 2. oversized tables are rejected without touching the store.
//! 3. an unresponsive companion times out but commands are still consumed.
//! 4. a responsive companion completes the rendezvous every scan.
//! 5. the STOP cycle disconnects every axis.

use axisd_common::control_unit::state::{ReferenceMode, SystemState};
use axisd_common::control_unit::status::StatusFlags;
use axisd_common::hal::driver::CompanionTask;
use axisd_control_unit::cycle::{ControlCore, CoreSettings};
use axisd_control_unit::protocol::codec::{Frames, encode_frame, push_fixed_point, push_i32s};
use axisd_control_unit::protocol::tag::Tag;
use axisd_control_unit::store::{StoreError, Table};
use axisd_hal::drivers::simulation::{CallLog, DriverCall, SimulatedCompanion, SimulationDriver};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

// ─── Helpers ────────────────────────────────────────────────────────

static COUNTER: AtomicU32 = AtomicU32::new(0);

fn unique_shm(suffix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("/axisd_it_{}_{suffix}_{n}", std::process::id())
}

fn core_with(
    companion: Option<Box<dyn CompanionTask>>,
    shm_name: Option<String>,
) -> (ControlCore, CallLog) {
    let driver = SimulationDriver::new();
    let log = driver.call_log();
    let settings = CoreSettings {
        shm_name,
        handshake_timeout: Duration::from_millis(5),
        ..CoreSettings::default()
    };
    (ControlCore::new(Box::new(driver), companion, settings), log)
}

fn apply(core: &mut ControlCore, tag: Tag, payload: &[u8]) -> Result<(), StoreError> {
    let mut bytes = Vec::new();
    encode_frame(tag, payload, &mut bytes);
    let frame = Frames::new(&bytes).next().expect("one frame");
    core.apply_frame(&frame)
}

fn fixed(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::new();
    push_fixed_point(&mut out, values);
    out
}

/// One relative axis named "REL", brought to READY.
fn ready_relative(core: &mut ControlCore) {
    let mut types = Vec::new();
    push_i32s(&mut types, &[3]);
    apply(core, Tag::AxisName0, b"REL").unwrap();
    apply(core, Tag::AxisType, &types).unwrap();
    apply(core, Tag::SystemInit, &[]).unwrap();
    assert_eq!(core.tick(), SystemState::Ready);
    assert_eq!(core.dispatcher().connected_count(), 1);
}

// ─── Tests ──────────────────────────────────────────────────────────

#[test]
fn relative_axis_receives_planned_move() {
    let (mut core, log) = core_with(None, None);
    ready_relative(&mut core);
    log.lock().clear();

    apply(&mut core, Tag::CommandFloats, &fixed(&[25.0])).unwrap();
    assert_eq!(core.tick(), SystemState::Ready);

    let calls = log.lock().clone();
    let command = calls
        .iter()
        .find_map(|call| match call {
            DriverCall::PointToPoint(_, command) => Some(*command),
            _ => None,
        })
        .expect("point-to-point issued");
    // 25 of a 1000 default distance: the 1 s default duration wins.
    assert_eq!(command.reference, ReferenceMode::Relative);
    assert_eq!(command.position, 25.0);
    assert_eq!(command.velocity, 50.0);
    assert_eq!(command.acceleration, 100.0);
    assert_eq!(command.jerk, None);

    assert_eq!(core.store().command(0), 0.0);
    let runtime = core.dispatcher().axis(0).unwrap();
    assert_eq!(runtime.set_point, 25.0);
    assert!(runtime.status.contains(StatusFlags::TOGGLE));
    assert_eq!(core.stats().commands, 1);
}

#[test]
fn oversized_table_is_rejected() {
    let (mut core, _) = core_with(None, None);
    apply(&mut core, Tag::CommandFloats, &fixed(&[1.0; 4])).unwrap();

    let err = apply(&mut core, Tag::CommandFloats, &fixed(&[9.0; 11])).unwrap_err();
    assert_eq!(
        err,
        StoreError::PayloadTooLarge {
            table: Table::Commands,
            capacity: 10,
            requested: 11,
        }
    );
    assert_eq!(core.store().command(0), 1.0);
    assert_eq!(core.store().command(4), 0.0);

    let err = apply(&mut core, Tag::VcPosition, &[]).unwrap_err();
    assert_eq!(err, StoreError::NotWritable(Tag::VcPosition));
}

#[test]
fn unresponsive_companion_times_out_but_consumes_commands() {
    let (mut core, _) = core_with(
        Some(Box::new(SimulatedCompanion::unresponsive())),
        Some(unique_shm("timeout")),
    );
    ready_relative(&mut core);
    assert!(core.bridge().has_region());

    apply(&mut core, Tag::CommandFloats, &fixed(&[5.0])).unwrap();
    assert_eq!(core.tick(), SystemState::Ready);

    assert_eq!(core.stats().handshake_timeouts, 1);
    assert_eq!(core.store().command(0), 0.0);
    let runtime = core.dispatcher().axis(0).unwrap();
    assert_eq!(runtime.moved_count, 1);
    assert!(runtime.toggle);
    core.shutdown();
}

#[test]
fn responsive_companion_completes_every_scan() {
    let (mut core, _) = core_with(
        Some(Box::new(SimulatedCompanion::new())),
        Some(unique_shm("rendezvous")),
    );
    ready_relative(&mut core);

    for _ in 0..3 {
        core.tick();
    }
    assert_eq!(core.stats().scans, 3);
    assert_eq!(core.stats().handshake_timeouts, 0);
    assert!(core.snapshot().region_present);
    core.shutdown();
}

#[test]
fn stop_cycle_disconnects_axes() {
    let (mut core, log) = core_with(None, None);
    ready_relative(&mut core);
    log.lock().clear();

    apply(&mut core, Tag::SystemRequest, &[3]).unwrap();
    assert_eq!(core.system_state(), SystemState::Stop);
    assert_eq!(core.tick(), SystemState::Idle);

    assert_eq!(core.dispatcher().connected_count(), 0);
    assert!(!core.store().control().is_running());
    assert!(
        log.lock()
            .iter()
            .any(|call| matches!(call, DriverCall::Disconnect(_)))
    );

    // A second INIT starts a fresh READY period.
    apply(&mut core, Tag::SystemInit, &[]).unwrap();
    assert_eq!(core.tick(), SystemState::Ready);
    assert_eq!(core.dispatcher().connected_count(), 1);
}
