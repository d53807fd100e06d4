//! Shared region lifecycle tests.
//!
//! Verifies:
//! 1. create zeroes the object and peers see writes.
//! 2. attach to a missing object is NotFound.
//! 3. dropping the owner unlinks the name.
//! 4. handshake flags are visible across handles.

use axisd_common::shm::layout::SharedStatus;
use axisd_shared_memory::{SharedRegion, ShmError, ShmResult};
use proptest::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

// ─── Helpers ────────────────────────────────────────────────────────

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Unique object names to avoid collisions with parallel tests.
fn test_name(suffix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("/axisd_test_{}_{suffix}_{n}", std::process::id())
}

// ─── Tests ──────────────────────────────────────────────────────────

#[test]
fn create_zeroes_and_peer_sees_writes() -> ShmResult<()> {
    let name = test_name("peer");
    let mut owner = SharedRegion::<SharedStatus>::create(&name)?;
    assert!(owner.is_owner());
    assert!(owner.get().ctr_flag.iter().all(|&v| v == 0.0));

    owner.get_mut().ctr_flag[19] = 255.0;
    owner.get_mut().set_point_pos[3] = -12.5;
    owner.get_mut().axis_name[0] = SharedStatus::encode_name("TURRET_A");

    let peer = SharedRegion::<SharedStatus>::attach(&name)?;
    assert!(!peer.is_owner());
    assert_eq!(peer.get().ctr_flag[19], 255.0);
    assert_eq!(peer.get().set_point_pos[3], -12.5);
    assert_eq!(peer.get().name(0), "TURRET_A");
    Ok(())
}

#[test]
fn attach_missing_is_not_found() {
    let err = SharedRegion::<SharedStatus>::attach(&test_name("missing")).unwrap_err();
    assert!(matches!(err, ShmError::NotFound { .. }));
}

#[test]
fn invalid_name_is_rejected() {
    let err = SharedRegion::<SharedStatus>::create("no_slash").unwrap_err();
    assert!(matches!(err, ShmError::InvalidName { .. }));
}

#[test]
fn owner_drop_unlinks_name() -> ShmResult<()> {
    let name = test_name("unlink");
    {
        let _owner = SharedRegion::<SharedStatus>::create(&name)?;
        let _peer = SharedRegion::<SharedStatus>::attach(&name)?;
    }
    let err = SharedRegion::<SharedStatus>::attach(&name).unwrap_err();
    assert!(matches!(err, ShmError::NotFound { .. }));
    Ok(())
}

#[test]
fn create_over_stale_object_rezeroes() -> ShmResult<()> {
    let name = test_name("stale");
    let mut first = SharedRegion::<SharedStatus>::create(&name)?;
    first.get_mut().stat_flag[0] = 0x81;

    let second = SharedRegion::<SharedStatus>::create(&name)?;
    assert_eq!(second.get().stat_flag[0], 0);
    Ok(())
}

#[test]
fn handshake_visible_across_handles() -> ShmResult<()> {
    let name = test_name("handshake");
    let owner = SharedRegion::<SharedStatus>::create(&name)?;
    let peer = SharedRegion::<SharedStatus>::attach(&name)?;

    owner.get().handshake.clear();
    assert!(!peer.get().handshake.is_complete());
    peer.get().handshake.acknowledge();
    assert!(owner.get().handshake.is_complete());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn force_limits_survive_attach(values in prop::array::uniform10(-1.0e4f32..1.0e4)) {
        let name = test_name("prop");
        let mut owner = SharedRegion::<SharedStatus>::create(&name).unwrap();
        owner.get_mut().force_limit = values;

        let peer = SharedRegion::<SharedStatus>::attach(&name).unwrap();
        prop_assert_eq!(peer.get().force_limit, values);
    }
}
