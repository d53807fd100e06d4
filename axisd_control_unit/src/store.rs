//! Parameter store.
//!
//! Every table a client can write lives here: the command mailbox, the
//! control registers, axis identity and force limits, plus the system
//! lifecycle. Writes are capacity-checked; an oversized write is rejected
//! whole and leaves the table untouched, a shorter one replaces the prefix.

pub mod control;

pub use control::ControlTable;

use crate::protocol::codec::{self, Frame, from_fixed_point};
use crate::protocol::tag::Tag;
use crate::state::system::{SystemEvent, SystemStateMachine, TransitionResult};
use axisd_common::consts::{AXIS_COUNT, AXIS_NAME_CAPACITY, CONTROL_REGISTER_COUNT};
use axisd_common::control_unit::state::{AxisType, SystemRequest, SystemState};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Axis name, at most [`AXIS_NAME_CAPACITY`] bytes.
pub type AxisName = heapless::String<AXIS_NAME_CAPACITY>;

/// Name given to every slot until a client writes one.
pub const UNNAMED_AXIS: &str = "NA";

/// Client-writable tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Commands,
    Controls,
    AxisName,
    AxisTypes,
    ForceLimits,
    SystemRequest,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Commands => "command",
            Self::Controls => "control",
            Self::AxisName => "axis name",
            Self::AxisTypes => "axis type",
            Self::ForceLimits => "force limit",
            Self::SystemRequest => "system request",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{table} table holds {capacity} entries, write carried {requested}")]
    PayloadTooLarge {
        table: Table,
        capacity: usize,
        requested: usize,
    },

    #[error("axis slot {0} out of range")]
    AxisOutOfRange(usize),

    #[error("malformed {table} payload: {reason}")]
    MalformedPayload { table: Table, reason: String },

    #[error("unknown tag 0x{0:02x}")]
    UnknownTag(u8),

    #[error("tag {0:?} cannot be written by clients")]
    NotWritable(Tag),

    #[error("system request rejected: {0}")]
    TransitionRejected(&'static str),
}

fn check_capacity(table: Table, capacity: usize, requested: usize) -> Result<(), StoreError> {
    if requested > capacity {
        return Err(StoreError::PayloadTooLarge {
            table,
            capacity,
            requested,
        });
    }
    Ok(())
}

/// Little-endian words of `payload`, at most `N` of them.
fn payload_words<const N: usize>(
    table: Table,
    payload: &[u8],
) -> Result<heapless::Vec<i32, N>, StoreError> {
    let words = codec::words(payload).map_err(|e| StoreError::MalformedPayload {
        table,
        reason: e.to_string(),
    })?;
    check_capacity(table, N, words.len())?;
    Ok(words.collect())
}

fn fixed_point_values<const N: usize>(
    table: Table,
    payload: &[u8],
) -> Result<heapless::Vec<f32, N>, StoreError> {
    let words = payload_words::<N>(table, payload)?;
    Ok(words.iter().copied().map(from_fixed_point).collect())
}

#[derive(Debug, Clone)]
pub struct ParameterStore {
    commands: [f32; AXIS_COUNT],
    control: ControlTable,
    names: [AxisName; AXIS_COUNT],
    types: [AxisType; AXIS_COUNT],
    force_limits: [f32; AXIS_COUNT],
    system: SystemStateMachine,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        let mut unnamed = AxisName::new();
        // Fits: "NA" is two bytes.
        let _ = unnamed.push_str(UNNAMED_AXIS);

        Self {
            commands: [0.0; AXIS_COUNT],
            control: ControlTable::default(),
            names: core::array::from_fn(|_| unnamed.clone()),
            types: [AxisType::NotApplicable; AXIS_COUNT],
            force_limits: [0.0; AXIS_COUNT],
            system: SystemStateMachine::new(),
        }
    }

    // ─── Setters ────────────────────────────────────────────────────

    pub fn set_command_floats(&mut self, values: &[f32]) -> Result<(), StoreError> {
        check_capacity(Table::Commands, AXIS_COUNT, values.len())?;
        self.commands[..values.len()].copy_from_slice(values);
        Ok(())
    }

    pub fn set_control_floats(&mut self, values: &[f32]) -> Result<(), StoreError> {
        check_capacity(Table::Controls, CONTROL_REGISTER_COUNT, values.len())?;
        self.control.copy_prefix(values);
        Ok(())
    }

    pub fn set_axis_name(&mut self, axis: usize, name: &str) -> Result<(), StoreError> {
        let slot = self
            .names
            .get_mut(axis)
            .ok_or(StoreError::AxisOutOfRange(axis))?;
        check_capacity(Table::AxisName, AXIS_NAME_CAPACITY, name.len())?;

        let mut value = AxisName::new();
        value
            .push_str(name)
            .map_err(|_| StoreError::PayloadTooLarge {
                table: Table::AxisName,
                capacity: AXIS_NAME_CAPACITY,
                requested: name.len(),
            })?;
        *slot = value;
        Ok(())
    }

    /// Unknown codes are stored as `NotApplicable`.
    pub fn set_axis_types(&mut self, codes: &[i32]) -> Result<(), StoreError> {
        check_capacity(Table::AxisTypes, AXIS_COUNT, codes.len())?;
        for (axis, &code) in codes.iter().enumerate() {
            self.types[axis] = AxisType::from_i32(code).unwrap_or_else(|| {
                warn!(axis, code, "unknown axis type code, slot left unused");
                AxisType::NotApplicable
            });
        }
        Ok(())
    }

    pub fn set_force_limits(&mut self, values: &[f32]) -> Result<(), StoreError> {
        check_capacity(Table::ForceLimits, AXIS_COUNT, values.len())?;
        self.force_limits[..values.len()].copy_from_slice(values);
        Ok(())
    }

    /// Client lifecycle request. INIT is honoured only while IDLE, STOP
    /// only while READY.
    pub fn request_system(&mut self, request: SystemRequest) -> Result<SystemState, StoreError> {
        let event = match request {
            SystemRequest::Init => SystemEvent::InitRequested,
            SystemRequest::Stop => SystemEvent::StopRequested,
        };
        match self.system.handle_event(event) {
            TransitionResult::Ok(state) => {
                debug!(?request, ?state, "system request accepted");
                Ok(state)
            }
            TransitionResult::Rejected(reason) => Err(StoreError::TransitionRejected(reason)),
        }
    }

    /// Lifecycle step driven by the control core.
    pub fn advance(&mut self, event: SystemEvent) -> TransitionResult {
        self.system.handle_event(event)
    }

    // ─── Frame routing ──────────────────────────────────────────────

    /// Apply one decoded frame to the table its tag selects.
    pub fn apply_frame(&mut self, frame: &Frame<'_>) -> Result<(), StoreError> {
        let tag = frame.tag().ok_or(StoreError::UnknownTag(frame.tag))?;
        match tag {
            Tag::CommandFloats => {
                let values = fixed_point_values::<AXIS_COUNT>(Table::Commands, frame.payload)?;
                self.set_command_floats(&values)
            }
            Tag::ControlFloats => {
                let values =
                    fixed_point_values::<CONTROL_REGISTER_COUNT>(Table::Controls, frame.payload)?;
                self.set_control_floats(&values)
            }
            Tag::AxisType => {
                let codes = payload_words::<AXIS_COUNT>(Table::AxisTypes, frame.payload)?;
                self.set_axis_types(&codes)
            }
            Tag::ForceLimit => {
                let values = fixed_point_values::<AXIS_COUNT>(Table::ForceLimits, frame.payload)?;
                self.set_force_limits(&values)
            }
            Tag::SystemInit => self.request_system(SystemRequest::Init).map(drop),
            Tag::SystemStop => self.request_system(SystemRequest::Stop).map(drop),
            Tag::SystemRequest => {
                let request = match frame.payload {
                    [code] => SystemRequest::from_u8(*code).ok_or_else(|| {
                        StoreError::MalformedPayload {
                            table: Table::SystemRequest,
                            reason: format!("unknown request code {code}"),
                        }
                    })?,
                    other => {
                        return Err(StoreError::MalformedPayload {
                            table: Table::SystemRequest,
                            reason: format!("expected 1 byte, got {}", other.len()),
                        });
                    }
                };
                self.request_system(request).map(drop)
            }
            Tag::Ping => Ok(()),
            tag if tag.is_outbound_only() => Err(StoreError::NotWritable(tag)),
            tag => {
                let axis = tag.axis_name_index().ok_or(StoreError::NotWritable(tag))?;
                let end = frame
                    .payload
                    .iter()
                    .position(|&b| b == 0)
                    .unwrap_or(frame.payload.len());
                let name = std::str::from_utf8(&frame.payload[..end]).map_err(|e| {
                    StoreError::MalformedPayload {
                        table: Table::AxisName,
                        reason: e.to_string(),
                    }
                })?;
                self.set_axis_name(axis, name)
            }
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    pub fn commands(&self) -> &[f32; AXIS_COUNT] {
        &self.commands
    }

    #[inline]
    pub fn command(&self, axis: usize) -> f32 {
        self.commands[axis]
    }

    /// Mark the mailbox of `axis` consumed.
    #[inline]
    pub fn clear_command(&mut self, axis: usize) {
        self.commands[axis] = 0.0;
    }

    pub fn clear_commands(&mut self) {
        self.commands = [0.0; AXIS_COUNT];
    }

    pub fn control(&self) -> &ControlTable {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut ControlTable {
        &mut self.control
    }

    pub fn name(&self, axis: usize) -> &str {
        self.names[axis].as_str()
    }

    pub fn axis_types(&self) -> &[AxisType; AXIS_COUNT] {
        &self.types
    }

    #[inline]
    pub fn axis_type(&self, axis: usize) -> AxisType {
        self.types[axis]
    }

    pub fn force_limits(&self) -> &[f32; AXIS_COUNT] {
        &self.force_limits
    }

    #[inline]
    pub fn system_state(&self) -> SystemState {
        self.system.state()
    }

    /// READY with the run flag set.
    #[inline]
    pub fn allows_scan(&self) -> bool {
        self.system.allows_scan() && self.control.is_running()
    }
}
