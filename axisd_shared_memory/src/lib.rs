//! # axisd Shared Memory
//!
//! Lifecycle of the cross-process status region shared with the real-time
//! companion task.
//!
//! The control unit creates a named POSIX object sized to one
//! [`SharedStatus`](axisd_common::shm::layout::SharedStatus), zeroes it at
//! system INIT and unlinks it when dropped. The companion attaches to the
//! same name.
//!
//! ```rust,no_run
//! use axisd_common::shm::layout::SharedStatus;
//! use axisd_shared_memory::SharedRegion;
//!
//! # fn main() -> Result<(), axisd_shared_memory::ShmError> {
//! let mut region = SharedRegion::<SharedStatus>::create("/axisd_status")?;
//! region.get_mut().ctr_flag[19] = 255.0;
//!
//! let peer = SharedRegion::<SharedStatus>::attach("/axisd_status")?;
//! assert_eq!(peer.get().ctr_flag[19], 255.0);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod platform;
pub mod region;

pub use error::{ShmError, ShmResult};
pub use region::SharedRegion;
