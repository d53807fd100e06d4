//! Per-connection session.
//!
//! ```text
//! AwaitingFrame ─► DecodingPayload ─► Dispatching ─► Responding ─► AwaitingFrame
//! ```
//!
//! One call to [`Session::handle`] takes a batch of received bytes through
//! the whole cycle: every complete frame is applied in order, the core runs
//! one tick and a single reply reflecting the whole batch is produced. A
//! truncated trailing frame is dropped. A batch without any frame is
//! answered with a Ping.

use crate::cycle::ControlCore;
use crate::protocol::codec::Frames;
use crate::protocol::status::StatusPublisher;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    AwaitingFrame,
    DecodingPayload,
    Dispatching,
    Responding,
}

/// What one batch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// Complete frames decoded.
    pub frames: usize,
    /// Frames the store refused.
    pub rejected: usize,
    /// Input bytes covered by decoded frames.
    pub consumed: usize,
}

#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    publisher: StatusPublisher,
    batches: u64,
}

impl Session {
    pub fn new(publisher: StatusPublisher) -> Self {
        Self {
            state: SessionState::AwaitingFrame,
            publisher,
            batches: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Process one batch and append the reply to `reply`.
    pub fn handle(
        &mut self,
        core: &mut ControlCore,
        input: &[u8],
        reply: &mut Vec<u8>,
    ) -> BatchOutcome {
        self.batches += 1;
        let mut outcome = BatchOutcome::default();

        self.state = SessionState::DecodingPayload;
        let mut frames = Frames::new(input);
        for frame in frames.by_ref() {
            self.state = SessionState::Dispatching;
            outcome.frames += 1;
            if let Err(e) = core.apply_frame(&frame) {
                outcome.rejected += 1;
                warn!(tag = frame.tag, len = frame.payload.len(), "frame rejected: {e}");
            }
            self.state = SessionState::DecodingPayload;
        }
        outcome.consumed = frames.position();
        if outcome.consumed < input.len() {
            trace!(dropped = input.len() - outcome.consumed, "trailing bytes dropped");
        }

        self.state = SessionState::Responding;
        if outcome.frames == 0 {
            debug!(len = input.len(), "no frame in batch, answering ping");
            StatusPublisher::encode_ping(reply);
        } else {
            self.state = SessionState::Dispatching;
            core.tick();
            self.state = SessionState::Responding;
            self.publisher.encode(&core.snapshot(), reply);
        }

        self.state = SessionState::AwaitingFrame;
        outcome
    }
}
