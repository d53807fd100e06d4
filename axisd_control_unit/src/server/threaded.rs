//! Thread-per-connection transport.
//!
//! The listener is polled non-blocking so the stop flag is seen promptly.
//! Each client thread blocks on its socket with the configured read and
//! write timeouts; a timeout only re-checks the stop flag. An idle scan
//! thread keeps the core ticking while no client is sending.

use crate::config::ServerConfig;
use crate::cycle::ControlCore;
use crate::server::{ServerError, new_session};
use parking_lot::Mutex;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause between accept attempts when no connection is pending.
const ACCEPT_POLL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub struct ThreadedServer {
    listener: TcpListener,
    config: ServerConfig,
    core: Arc<Mutex<ControlCore>>,
}

impl ThreadedServer {
    pub fn bind(config: &ServerConfig, core: ControlCore) -> Result<Self, ServerError> {
        let addr = config.address();
        let listener =
            TcpListener::bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
        listener.set_nonblocking(true)?;
        info!(addr = %listener.local_addr()?, "threaded server listening");

        Ok(Self {
            listener,
            config: config.clone(),
            core: Arc::new(Mutex::new(core)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the shared core.
    pub fn core(&self) -> Arc<Mutex<ControlCore>> {
        Arc::clone(&self.core)
    }

    pub fn run(self, running: Arc<AtomicBool>) -> Result<ControlCore, ServerError> {
        let active = Arc::new(AtomicUsize::new(0));
        let mut workers: Vec<JoinHandle<()>> = Vec::new();

        let ticker = {
            let core = Arc::clone(&self.core);
            let running = Arc::clone(&running);
            let period = self.config.idle_tick();
            thread::Builder::new()
                .name("axisd-idle-scan".into())
                .spawn(move || {
                    while running.load(Ordering::Relaxed) {
                        thread::sleep(period);
                        core.lock().tick();
                    }
                })?
        };

        while running.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if active.load(Ordering::Acquire) >= self.config.max_clients {
                        warn!(
                            %peer,
                            max = self.config.max_clients,
                            "client limit reached, refusing"
                        );
                        continue;
                    }
                    active.fetch_add(1, Ordering::AcqRel);

                    let core = Arc::clone(&self.core);
                    let running = Arc::clone(&running);
                    let slot = Arc::clone(&active);
                    let config = self.config.clone();
                    let spawned = thread::Builder::new()
                        .name(format!("axisd-client-{peer}"))
                        .spawn(move || {
                            info!(%peer, "client connected");
                            match serve_client(stream, &core, &config, &running) {
                                Ok(()) => info!(%peer, "client disconnected"),
                                Err(e) => warn!(%peer, "client connection closed: {e}"),
                            }
                            slot.fetch_sub(1, Ordering::AcqRel);
                        });
                    match spawned {
                        Ok(handle) => workers.push(handle),
                        Err(e) => {
                            warn!(%peer, "failed to spawn client thread: {e}");
                            active.fetch_sub(1, Ordering::AcqRel);
                        }
                    }
                    workers.retain(|w| !w.is_finished());
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("accept failed: {e}");
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        info!(clients = workers.len(), "stopping threaded server");
        drop(self.listener);
        for worker in workers {
            if worker.join().is_err() {
                warn!("client thread panicked");
            }
        }
        if ticker.join().is_err() {
            warn!("idle scan thread panicked");
        }

        Arc::try_unwrap(self.core)
            .map(Mutex::into_inner)
            .map_err(|_| ServerError::CoreStillShared)
    }
}

fn serve_client(
    mut stream: TcpStream,
    core: &Mutex<ControlCore>,
    config: &ServerConfig,
    running: &AtomicBool,
) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(config.read_timeout()))?;
    stream.set_write_timeout(Some(config.write_timeout()))?;
    stream.set_nodelay(true)?;

    let mut session = new_session(config);
    let mut buf = vec![0u8; config.recv_buffer_size];
    let mut reply = Vec::with_capacity(512);

    while running.load(Ordering::Relaxed) {
        let n = match stream.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(e) => return Err(e),
        };

        reply.clear();
        let outcome = session.handle(&mut core.lock(), &buf[..n], &mut reply);
        debug!(frames = outcome.frames, rejected = outcome.rejected, "batch handled");
        stream.write_all(&reply)?;
    }
    Ok(())
}
