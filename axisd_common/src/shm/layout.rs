//! `SharedStatus` region layout.
//!
//! Mapped read-write by the control unit and the co-resident real-time task.
//! Field order and types are part of the cross-process contract; the total
//! size is pinned below.

use crate::consts::{AXIS_COUNT, AXIS_NAME_CAPACITY, CONTROL_REGISTER_COUNT, POSITION_COUNT};
use static_assertions::const_assert_eq;
use std::sync::atomic::{AtomicU32, Ordering};

/// Marker for types that may live in a shared memory mapping.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]`, contain no pointers or references, and
/// be valid when every byte is zero.
pub unsafe trait ShmLayout: Sized + Send + Sync {}

/// Rendezvous flags between the control unit and the companion task.
#[repr(C)]
#[derive(Debug, Default)]
pub struct HandshakeFlags {
    pub enter: AtomicU32,
    pub exit: AtomicU32,
}

impl HandshakeFlags {
    /// Reset both flags before triggering the companion.
    #[inline]
    pub fn clear(&self) {
        self.enter.store(0, Ordering::Release);
        self.exit.store(0, Ordering::Release);
    }

    /// Set both flags. Called by the companion side.
    #[inline]
    pub fn acknowledge(&self) {
        self.enter.store(1, Ordering::Release);
        self.exit.store(1, Ordering::Release);
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.enter.load(Ordering::Acquire) != 0 && self.exit.load(Ordering::Acquire) != 0
    }
}

/// Axis name as stored in the region: NUL-terminated, 20 bytes.
pub type RawAxisName = [u8; AXIS_NAME_CAPACITY + 1];

/// Cross-process status region.
#[repr(C)]
#[derive(Debug)]
pub struct SharedStatus {
    /// Per-axis status word (`StatusFlags` bits).
    pub stat_flag: [u32; AXIS_COUNT],
    /// Mirror of the control registers.
    pub ctr_flag: [f32; CONTROL_REGISTER_COUNT],
    /// Set-point positions (first `AXIS_COUNT` entries used).
    pub set_point_pos: [f64; POSITION_COUNT],
    /// Axis type codes.
    pub axis_type: [i32; AXIS_COUNT],
    pub axis_name: [RawAxisName; AXIS_COUNT],
    /// Measured positions.
    pub vc_pos: [f32; POSITION_COUNT],
    pub force_limit: [f32; AXIS_COUNT],
    pub net_current: [f32; AXIS_COUNT],
    pub handshake: HandshakeFlags,
}

// SAFETY: repr(C), plain numeric arrays and atomics, all-zero is valid.
unsafe impl ShmLayout for SharedStatus {}

const_assert_eq!(core::mem::size_of::<SharedStatus>(), 928);
const_assert_eq!(core::mem::align_of::<SharedStatus>(), 8);

impl SharedStatus {
    /// Encode `name` into the fixed NUL-terminated slot, truncating at capacity.
    pub fn encode_name(name: &str) -> RawAxisName {
        let mut raw = [0u8; AXIS_NAME_CAPACITY + 1];
        let bytes = name.as_bytes();
        let n = bytes.len().min(AXIS_NAME_CAPACITY);
        raw[..n].copy_from_slice(&bytes[..n]);
        raw
    }

    /// Name stored in slot `axis`, up to the first NUL.
    pub fn name(&self, axis: usize) -> &str {
        let raw = &self.axis_name[axis];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        std::str::from_utf8(&raw[..end]).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeroed() -> Box<SharedStatus> {
        // SAFETY: SharedStatus is ShmLayout, all-zero is valid.
        unsafe { Box::new(core::mem::zeroed()) }
    }

    #[test]
    fn handshake_flags_cycle() {
        let flags = HandshakeFlags::default();
        assert!(!flags.is_complete());
        flags.acknowledge();
        assert!(flags.is_complete());
        flags.clear();
        assert!(!flags.is_complete());
        flags.enter.store(7, Ordering::Release);
        assert!(!flags.is_complete());
    }

    #[test]
    fn name_is_nul_terminated_and_truncated() {
        let mut region = zeroed();
        region.axis_name[0] = SharedStatus::encode_name("Z_PUSHER");
        assert_eq!(region.name(0), "Z_PUSHER");

        region.axis_name[1] = SharedStatus::encode_name("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert_eq!(region.name(1).len(), AXIS_NAME_CAPACITY);
        assert_eq!(region.axis_name[1][AXIS_NAME_CAPACITY], 0);
        assert_eq!(region.name(2), "");
    }

    #[test]
    fn handshake_sits_at_the_end() {
        let offset = core::mem::offset_of!(SharedStatus, handshake);
        assert_eq!(offset, 920);
    }
}
