//! Shared status region.
//!
//! - `layout`: the `#[repr(C)]` region consumed by the real-time companion.

pub mod layout;
