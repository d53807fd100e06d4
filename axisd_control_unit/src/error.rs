//! Error module root.
//!
//! Each concern keeps its own error type next to the code that raises it;
//! they are re-exported here. [`CoreError`] is what construction and axis
//! initialisation surface to the binary.
//!
//! | error             | effect                                 |
//! |-------------------|----------------------------------------|
//! | `DecodeError`     | decoding stops, bytes dropped          |
//! | `StoreError`      | one frame rejected, batch continues    |
//! | `TrajectoryError` | one move skipped, logged               |
//! | `BridgeError`     | scan completes, logged                 |
//! | `ServerError`     | listener or one connection closed      |
//! | `CoreError`       | startup fails, or region disabled      |

pub use crate::control::profile::TrajectoryError;
pub use crate::protocol::codec::{DecodeError, PayloadError};
pub use crate::server::ServerError;
pub use crate::shm::bridge::BridgeError;
pub use crate::store::StoreError;

use axisd_common::config::ConfigError;
use axisd_common::hal::driver::HalError;
use axisd_shared_memory::ShmError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("shared region: {0}")]
    Shm(#[from] ShmError),

    #[error("hardware collaborator: {0}")]
    Hal(#[from] HalError),

    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
}
