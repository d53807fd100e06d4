//! TCP transports.
//!
//! Both transports run the same [`Session`] per connection and differ only
//! in how they schedule I/O:
//!
//! - [`ThreadedServer`]: a thread per client and an idle scan thread, all
//!   sharing the core behind one `parking_lot::Mutex`
//! - [`ReactorServer`]: one mio event loop owning the core outright, with a
//!   ticker thread that only wakes the loop
//!
//! `run` returns the core once the stop flag has been observed and every
//! connection is closed, so the caller can shut it down.

pub mod reactor;
pub mod threaded;

pub use reactor::ReactorServer;
pub use threaded::ThreadedServer;

use crate::config::{ServerConfig, Transport};
use crate::cycle::ControlCore;
use crate::protocol::session::Session;
use crate::protocol::status::StatusPublisher;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("control core still shared after all workers stopped")]
    CoreStillShared,
}

/// Fresh session configured for `config`.
pub(crate) fn new_session(config: &ServerConfig) -> Session {
    Session::new(StatusPublisher::new(
        config.status_mode,
        config.delta_refresh_interval,
    ))
}

/// The configured transport.
#[derive(Debug)]
pub enum Server {
    Threaded(ThreadedServer),
    Reactor(ReactorServer),
}

impl Server {
    pub fn bind(config: &ServerConfig, core: ControlCore) -> Result<Self, ServerError> {
        Ok(match config.transport {
            Transport::Threaded => Self::Threaded(ThreadedServer::bind(config, core)?),
            Transport::Reactor => Self::Reactor(ReactorServer::bind(config, core)?),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(match self {
            Self::Threaded(server) => server.local_addr()?,
            Self::Reactor(server) => server.local_addr()?,
        })
    }

    /// Serve until `running` is cleared.
    pub fn run(self, running: Arc<AtomicBool>) -> Result<ControlCore, ServerError> {
        match self {
            Self::Threaded(server) => server.run(running),
            Self::Reactor(server) => server.run(running),
        }
    }
}
