//! Single-threaded mio transport.
//!
//! The event loop owns the core. Each iteration polls for readiness, feeds
//! readable clients through their sessions and, when no client delivered
//! data, runs one idle tick. A ticker thread wakes the loop every
//! `idle_tick` and touches nothing else.
//!
//! Replies that cannot be written immediately are kept per client and
//! flushed on WRITABLE. A client whose backlog exceeds the cap is dropped.

use crate::config::ServerConfig;
use crate::cycle::ControlCore;
use crate::protocol::session::Session;
use crate::server::{ServerError, new_session};
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{debug, info, trace, warn};

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CLIENT: usize = 2;

const EVENT_CAPACITY: usize = 128;

/// Unsent reply bytes allowed per client before it is disconnected.
const MAX_PENDING_WRITE: usize = 256 * 1024;

struct Client {
    stream: TcpStream,
    peer: SocketAddr,
    session: Session,
    pending: Vec<u8>,
    wants_write: bool,
}

pub struct ReactorServer {
    poll: Poll,
    listener: TcpListener,
    waker: Arc<Waker>,
    config: ServerConfig,
    core: ControlCore,
    clients: HashMap<Token, Client>,
    next_token: usize,
    recv_buf: Vec<u8>,
}

impl ReactorServer {
    pub fn bind(config: &ServerConfig, core: ControlCore) -> Result<Self, ServerError> {
        let addr = config.address();
        let mut listener =
            TcpListener::bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);
        info!(addr = %listener.local_addr()?, "reactor server listening");

        Ok(Self {
            poll,
            listener,
            waker,
            config: config.clone(),
            core,
            clients: HashMap::new(),
            next_token: FIRST_CLIENT,
            recv_buf: vec![0u8; config.recv_buffer_size],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn core(&self) -> &ControlCore {
        &self.core
    }

    pub fn run(mut self, running: Arc<AtomicBool>) -> Result<ControlCore, ServerError> {
        let ticker = {
            let waker = Arc::clone(&self.waker);
            let running = Arc::clone(&running);
            let period = self.config.idle_tick();
            thread::Builder::new()
                .name("axisd-reactor-tick".into())
                .spawn(move || {
                    while running.load(Ordering::Relaxed) {
                        thread::sleep(period);
                        if let Err(e) = waker.wake() {
                            warn!("failed to wake reactor: {e}");
                            break;
                        }
                    }
                })?
        };

        let mut events = Events::with_capacity(EVENT_CAPACITY);
        let timeout = self.config.idle_tick();

        while running.load(Ordering::Relaxed) {
            if let Err(e) = self.poll.poll(&mut events, Some(timeout)) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                warn!("poll failed: {e}");
                continue;
            }

            let mut handled = false;
            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_clients(),
                    WAKER => trace!("tick wakeup"),
                    token => {
                        if event.is_readable() || event.is_read_closed() {
                            handled |= self.read_client(token);
                        }
                        if event.is_writable() {
                            self.flush_client(token);
                        }
                    }
                }
            }

            if !handled {
                self.core.tick();
            }
        }

        info!(clients = self.clients.len(), "stopping reactor server");
        let tokens: Vec<Token> = self.clients.keys().copied().collect();
        for token in tokens {
            self.close_client(token);
        }
        // The ticker sees the cleared flag after at most one period.
        if ticker.join().is_err() {
            warn!("reactor ticker thread panicked");
        }
        Ok(self.core)
    }

    fn accept_clients(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    if self.clients.len() >= self.config.max_clients {
                        warn!(
                            %peer,
                            max = self.config.max_clients,
                            "client limit reached, refusing"
                        );
                        continue;
                    }
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(%peer, "failed to set TCP_NODELAY: {e}");
                    }

                    let token = Token(self.next_token);
                    self.next_token += 1;
                    if let Err(e) =
                        self.poll
                            .registry()
                            .register(&mut stream, token, Interest::READABLE)
                    {
                        warn!(%peer, "failed to register client: {e}");
                        continue;
                    }

                    info!(%peer, ?token, "client connected");
                    self.clients.insert(
                        token,
                        Client {
                            stream,
                            peer,
                            session: new_session(&self.config),
                            pending: Vec::new(),
                            wants_write: false,
                        },
                    );
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("accept failed: {e}");
                    break;
                }
            }
        }
    }

    /// Drain the socket and run the received bytes through the session.
    /// Returns whether a batch was handled.
    fn read_client(&mut self, token: Token) -> bool {
        let Some(client) = self.clients.get_mut(&token) else {
            return false;
        };

        let mut input = Vec::new();
        let mut closed = false;
        loop {
            match client.stream.read(&mut self.recv_buf) {
                Ok(0) => {
                    closed = true;
                    break;
                }
                Ok(n) => input.extend_from_slice(&self.recv_buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(peer = %client.peer, "read failed: {e}");
                    closed = true;
                    break;
                }
            }
        }

        let handled = !input.is_empty();
        if handled {
            let mut reply = Vec::new();
            let outcome = client.session.handle(&mut self.core, &input, &mut reply);
            debug!(
                peer = %client.peer,
                frames = outcome.frames,
                rejected = outcome.rejected,
                "batch handled"
            );

            if client.pending.len() + reply.len() > MAX_PENDING_WRITE {
                warn!(
                    peer = %client.peer,
                    backlog = client.pending.len(),
                    "client not reading replies, dropping"
                );
                closed = true;
            } else {
                client.pending.extend_from_slice(&reply);
            }
        }

        if closed {
            self.close_client(token);
        } else if handled {
            self.flush_client(token);
        }
        handled
    }

    /// Write as much backlog as the socket takes and adjust interest.
    fn flush_client(&mut self, token: Token) {
        let Some(client) = self.clients.get_mut(&token) else {
            return;
        };

        let mut failed = false;
        while !client.pending.is_empty() {
            match client.stream.write(&client.pending) {
                Ok(0) => {
                    failed = true;
                    break;
                }
                Ok(n) => {
                    client.pending.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(peer = %client.peer, "write failed: {e}");
                    failed = true;
                    break;
                }
            }
        }
        if failed {
            self.close_client(token);
            return;
        }

        let wants_write = !client.pending.is_empty();
        if wants_write != client.wants_write {
            let interest = if wants_write {
                Interest::READABLE | Interest::WRITABLE
            } else {
                Interest::READABLE
            };
            match self
                .poll
                .registry()
                .reregister(&mut client.stream, token, interest)
            {
                Ok(()) => client.wants_write = wants_write,
                Err(e) => {
                    warn!(peer = %client.peer, "failed to reregister client: {e}");
                    self.close_client(token);
                }
            }
        }
    }

    fn close_client(&mut self, token: Token) {
        if let Some(mut client) = self.clients.remove(&token) {
            if let Err(e) = self.poll.registry().deregister(&mut client.stream) {
                debug!(peer = %client.peer, "deregister failed: {e}");
            }
            info!(peer = %client.peer, "client disconnected");
        }
    }
}

impl std::fmt::Debug for ReactorServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactorServer")
            .field("listener", &self.listener)
            .field("clients", &self.clients.len())
            .field("core", &self.core)
            .finish()
    }
}
