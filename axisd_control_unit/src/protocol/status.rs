//! Status replies.
//!
//! Every batch of client frames is answered with one reply built from a
//! [`StatusSnapshot`]:
//!
//! ```text
//! SystemCase  (mask u32, state u8)
//! VcPosition  20 × fixed-point
//! StatusFlags 10 × u32
//! NetCurrent  10 × fixed-point
//! CommandFloats 10 × fixed-point   (pending commands)
//! ```
//!
//! In full mode all sections are always sent. Positions and currents come
//! from the shared region; without one they are zero-filled and left out of
//! the mask. In delta mode a section is sent only when it changed since this
//! client's previous reply, a full reply goes out every
//! `refresh_interval` replies, and a reply with nothing new is a lone Ping.

use crate::protocol::codec::{
    Frames, encode_frame, encode_frame_with, from_fixed_point, push_fixed_point, push_u32s, words,
};
use crate::protocol::tag::Tag;
use axisd_common::consts::{AXIS_COUNT, POSITION_COUNT};
use axisd_common::control_unit::state::SystemState;
use axisd_common::control_unit::status::{StatusFlags, StatusSections};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DELTA_REFRESH_INTERVAL: u32 = 200;

/// Reply flavour, fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    #[default]
    Full,
    Delta,
}

/// Everything a reply can carry.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub system: SystemState,
    pub positions: [f32; POSITION_COUNT],
    pub status: [StatusFlags; AXIS_COUNT],
    pub currents: [f32; AXIS_COUNT],
    pub pending: [f32; AXIS_COUNT],
    pub region_present: bool,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            system: SystemState::Idle,
            positions: [0.0; POSITION_COUNT],
            status: [StatusFlags::empty(); AXIS_COUNT],
            currents: [0.0; AXIS_COUNT],
            pending: [0.0; AXIS_COUNT],
            region_present: false,
        }
    }
}

impl StatusSnapshot {
    /// Sections with data in this snapshot.
    fn populated(&self) -> StatusSections {
        let mut sections = StatusSections::STATUS_FLAGS | StatusSections::PENDING;
        if self.region_present {
            sections |= StatusSections::POSITIONS | StatusSections::NET_CURRENT;
        }
        sections
    }

    /// Sections whose values differ from `previous`.
    fn changed_since(&self, previous: &Self) -> StatusSections {
        let mut sections = StatusSections::empty();
        sections.set(
            StatusSections::POSITIONS,
            self.positions != previous.positions,
        );
        sections.set(StatusSections::STATUS_FLAGS, self.status != previous.status);
        sections.set(StatusSections::NET_CURRENT, self.currents != previous.currents);
        sections.set(StatusSections::PENDING, self.pending != previous.pending);
        sections & self.populated()
    }

    fn status_bits(&self) -> [u32; AXIS_COUNT] {
        core::array::from_fn(|axis| self.status[axis].bits())
    }
}

/// Per-connection reply builder.
#[derive(Debug, Clone)]
pub struct StatusPublisher {
    mode: PublishMode,
    refresh_interval: u32,
    previous: Option<StatusSnapshot>,
    since_full: u32,
}

impl StatusPublisher {
    pub fn new(mode: PublishMode, refresh_interval: u32) -> Self {
        Self {
            mode,
            refresh_interval: refresh_interval.max(1),
            previous: None,
            since_full: 0,
        }
    }

    pub fn mode(&self) -> PublishMode {
        self.mode
    }

    /// Append the reply for `snapshot` to `out`.
    pub fn encode(&mut self, snapshot: &StatusSnapshot, out: &mut Vec<u8>) {
        let sections = match (self.mode, self.previous.as_ref()) {
            (PublishMode::Full, _) | (PublishMode::Delta, None) => snapshot.populated(),
            (PublishMode::Delta, Some(_)) if self.since_full + 1 >= self.refresh_interval => {
                snapshot.populated()
            }
            (PublishMode::Delta, Some(previous)) => {
                let changed = snapshot.changed_since(previous);
                if changed.is_empty() && snapshot.system == previous.system {
                    self.since_full += 1;
                    Self::encode_ping(out);
                    return;
                }
                changed
            }
        };

        let full = sections == snapshot.populated();
        if full {
            self.since_full = 0;
        } else {
            self.since_full += 1;
        }

        let mut mask = sections;
        if snapshot.system == SystemState::Ready {
            mask |= StatusSections::READY;
        }
        encode_frame_with(Tag::SystemCase, out, |buf| {
            push_u32s(buf, &[mask.bits()]);
            buf.push(snapshot.system as u8);
        });

        // Full replies keep the fixed shape even for unpopulated sections.
        let include = |section: StatusSections| full || sections.contains(section);
        if include(StatusSections::POSITIONS) {
            let positions = if snapshot.region_present {
                snapshot.positions
            } else {
                [0.0; POSITION_COUNT]
            };
            encode_frame_with(Tag::VcPosition, out, |buf| push_fixed_point(buf, &positions));
        }
        if include(StatusSections::STATUS_FLAGS) {
            encode_frame_with(Tag::StatusFlags, out, |buf| {
                push_u32s(buf, &snapshot.status_bits())
            });
        }
        if include(StatusSections::NET_CURRENT) {
            let currents = if snapshot.region_present {
                snapshot.currents
            } else {
                [0.0; AXIS_COUNT]
            };
            encode_frame_with(Tag::NetCurrent, out, |buf| push_fixed_point(buf, &currents));
        }
        if include(StatusSections::PENDING) {
            encode_frame_with(Tag::CommandFloats, out, |buf| {
                push_fixed_point(buf, &snapshot.pending)
            });
        }

        self.previous = Some(snapshot.clone());
    }

    /// The "nothing to report" reply.
    pub fn encode_ping(out: &mut Vec<u8>) {
        encode_frame(Tag::Ping, &[], out);
    }
}

// ─── Client side ────────────────────────────────────────────────────

/// A reply as seen by a client. Sections absent from the reply are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusReply {
    pub ping: bool,
    pub mask: StatusSections,
    pub system: Option<SystemState>,
    pub positions: Option<Vec<f32>>,
    pub status: Option<Vec<StatusFlags>>,
    pub currents: Option<Vec<f32>>,
    pub pending: Option<Vec<f32>>,
}

impl StatusReply {
    /// Parse every frame of a reply. Malformed sections are skipped.
    pub fn parse(bytes: &[u8]) -> Self {
        let mut reply = Self::default();
        let fixed = |payload: &[u8]| {
            words(payload)
                .ok()
                .map(|w| w.map(from_fixed_point).collect::<Vec<f32>>())
        };

        for frame in Frames::new(bytes) {
            match frame.tag() {
                Some(Tag::Ping) => reply.ping = true,
                Some(Tag::SystemCase) if frame.payload.len() == 5 => {
                    let mut mask = [0u8; 4];
                    mask.copy_from_slice(&frame.payload[..4]);
                    reply.mask = StatusSections::from_bits_truncate(u32::from_le_bytes(mask));
                    reply.system = SystemState::from_u8(frame.payload[4]);
                }
                Some(Tag::VcPosition) => reply.positions = fixed(frame.payload),
                Some(Tag::NetCurrent) => reply.currents = fixed(frame.payload),
                Some(Tag::CommandFloats) => reply.pending = fixed(frame.payload),
                Some(Tag::StatusFlags) => {
                    reply.status = words(frame.payload).ok().map(|w| {
                        w.map(|v| StatusFlags::from_bits_retain(v as u32)).collect()
                    });
                }
                _ => {}
            }
        }
        reply
    }
}
