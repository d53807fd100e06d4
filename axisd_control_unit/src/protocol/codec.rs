//! Frame codec.
//!
//! ```text
//! ┌──────────┬─────┬────────────┬─────────────────┐
//! │ "AXF"    │ tag │ len u32 LE │ payload (len)   │
//! └──────────┴─────┴────────────┴─────────────────┘
//! ```
//!
//! Decoding scans for the magic prefix, so garbage between frames is
//! skipped. A length that runs past the end of the buffer means "no frame":
//! the trailing bytes are dropped and the caller stops decoding.

use crate::protocol::tag::Tag;
use axisd_common::consts::FIXED_POINT_SCALE;
use static_assertions::const_assert_eq;
use thiserror::Error;

/// Frame start marker.
pub const FRAME_MAGIC: [u8; 3] = *b"AXF";

/// Magic + tag + length.
pub const HEADER_LEN: usize = 8;

const_assert_eq!(HEADER_LEN, FRAME_MAGIC.len() + 1 + 4);

/// One decoded frame borrowing its payload from the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Raw tag byte; may not be a known [`Tag`].
    pub tag: u8,
    pub payload: &'a [u8],
}

impl Frame<'_> {
    #[inline]
    pub fn tag(&self) -> Option<Tag> {
        Tag::from_u8(self.tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No complete frame between the cursor and the end of the buffer.
    #[error("no complete frame in buffer")]
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("payload length {0} is not a multiple of 4")]
    Misaligned(usize),
}

/// Decode the next frame at or after `*cursor`.
///
/// On success `*cursor` points just past the payload. On `NotFound` the
/// cursor is left untouched.
pub fn decode_next<'a>(buffer: &'a [u8], cursor: &mut usize) -> Result<Frame<'a>, DecodeError> {
    let start = (*cursor).min(buffer.len());
    let offset = buffer[start..]
        .windows(FRAME_MAGIC.len())
        .position(|w| w == FRAME_MAGIC)
        .ok_or(DecodeError::NotFound)?;

    let header = start + offset;
    let body = header + HEADER_LEN;
    if body > buffer.len() {
        return Err(DecodeError::NotFound);
    }

    let tag = buffer[header + FRAME_MAGIC.len()];
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&buffer[header + 4..body]);
    let len = u32::from_le_bytes(len_bytes) as usize;

    if len > buffer.len() - body {
        return Err(DecodeError::NotFound);
    }

    *cursor = body + len;
    Ok(Frame {
        tag,
        payload: &buffer[body..body + len],
    })
}

/// Iterator over every complete frame in a buffer, in order.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> Frames<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        decode_next(self.buffer, &mut self.cursor).ok()
    }
}

/// Append one frame to `out`.
pub fn encode_frame(tag: Tag, payload: &[u8], out: &mut Vec<u8>) {
    encode_frame_with(tag, out, |buf| buf.extend_from_slice(payload));
}

/// Append one frame whose payload is written in place by `fill`.
pub fn encode_frame_with(tag: Tag, out: &mut Vec<u8>, fill: impl FnOnce(&mut Vec<u8>)) {
    let start = out.len();
    out.extend_from_slice(&FRAME_MAGIC);
    out.push(tag as u8);
    out.extend_from_slice(&[0u8; 4]);

    fill(out);

    let len = (out.len() - start - HEADER_LEN) as u32;
    out[start + 4..start + HEADER_LEN].copy_from_slice(&len.to_le_bytes());
}

// ─── Payload helpers ────────────────────────────────────────────────

/// Split a payload into little-endian `i32` words.
pub fn words(payload: &[u8]) -> Result<impl ExactSizeIterator<Item = i32> + '_, PayloadError> {
    if payload.len() % 4 != 0 {
        return Err(PayloadError::Misaligned(payload.len()));
    }
    Ok(payload
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]])))
}

#[inline]
pub fn from_fixed_point(raw: i32) -> f32 {
    raw as f32 / FIXED_POINT_SCALE
}

/// Scale and truncate toward zero; out-of-range values saturate.
#[inline]
pub fn to_fixed_point(value: f32) -> i32 {
    (value * FIXED_POINT_SCALE) as i32
}

pub fn push_fixed_point(out: &mut Vec<u8>, values: &[f32]) {
    for &v in values {
        out.extend_from_slice(&to_fixed_point(v).to_le_bytes());
    }
}

pub fn push_i32s(out: &mut Vec<u8>, values: &[i32]) {
    for &v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

pub fn push_u32s(out: &mut Vec<u8>, values: &[u32]) {
    for &v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}
