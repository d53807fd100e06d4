//! Control unit shared types.
//!
//! State enums and status bitflags shared between the control unit, the
//! shared status region and the wire protocol.

pub mod state;
pub mod status;
