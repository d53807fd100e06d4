//! Wire protocol of the TCP control channel.
//!
//! - `tag`: closed enum of frame tags
//! - `codec`: frame encode/decode and fixed-point payload helpers
//! - `status`: outbound status frames (full and delta modes)
//! - `session`: per-connection state machine tying decode, dispatch and reply

pub mod codec;
pub mod session;
pub mod status;
pub mod tag;
