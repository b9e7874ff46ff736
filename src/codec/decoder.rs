//! Resynchronizing frame decoder.
//!
//! Scans a [`CircularBuffer`] for `HEADER` candidates. A candidate only
//! becomes a frame once its `FOOTER` sits where `LEN` says it should and
//! the checksum matches. Every failed candidate is skipped without
//! restarting the scan, so one call does at most one pass over the buffer.
//! The scan stops at the first candidate still waiting for bytes: a frame
//! in flight can carry a valid-looking frame inside its escaped payload.

use heapless::Vec;
use tracing::debug;

use super::encoder::{max_escaped_len, EncodedFrame};
use crate::error::{FlexseaError, Result};
use crate::protocol::{CircularBuffer, ESCAPE, FOOTER, HEADER, MAX_ENCODED_LEN, MIN_OVERHEAD};

/// Fixed-capacity buffer holding one unescaped payload.
pub type PayloadBuf = Vec<u8, MAX_ENCODED_LEN>;

/// A frame extracted from the reception buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    encoded: EncodedFrame,
    payload: PayloadBuf,
}

impl DecodedFrame {
    /// Raw frame bytes as they were on the wire, header to footer.
    #[inline]
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Payload with escape bytes removed.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Total frame length on the wire.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        self.encoded.len()
    }
}

/// What a single header candidate turned out to be.
enum Candidate {
    /// Valid frame of `LEN` escaped bytes.
    Frame(usize),
    /// Footer position not buffered yet.
    Incomplete,
    /// Bad length, footer or checksum.
    Spurious,
}

fn check_candidate<const N: usize>(
    buffer: &CircularBuffer<N>,
    offset: usize,
    max_len: usize,
) -> Candidate {
    let Some(len) = buffer.peek(offset + 1).map(usize::from) else {
        return Candidate::Incomplete;
    };
    if len > max_len {
        return Candidate::Spurious;
    }

    let footer_pos = offset + len + MIN_OVERHEAD - 1;
    match buffer.peek(footer_pos) {
        None => return Candidate::Incomplete,
        Some(FOOTER) => {}
        Some(_) => return Candidate::Spurious,
    }

    let checksum = buffer.checksum(offset + 2, footer_pos - 1);
    match (checksum, buffer.peek(footer_pos - 1)) {
        (Ok(computed), Some(received)) if computed == received => Candidate::Frame(len),
        _ => Candidate::Spurious,
    }
}

/// Extract the earliest valid frame from `buffer`.
///
/// On success the bytes before the frame and the frame itself are consumed.
/// Otherwise nothing is consumed.
///
/// Returns `Ok(None)` as soon as a candidate is still waiting for bytes.
/// Later candidates are not looked at until it is decided.
///
/// # Errors
///
/// Returns [`FlexseaError::NoFrame`] when every candidate was rejected.
///
/// # Example
///
/// ```
/// use flexsea_comm::codec::{decode, encode};
/// use flexsea_comm::protocol::CircularBuffer;
///
/// let mut cb: CircularBuffer = CircularBuffer::new();
/// cb.write(&[0x00, 0x42]);
/// cb.write(&encode(b"hi", 200).unwrap());
///
/// let frame = decode(&mut cb, 200).unwrap().unwrap();
/// assert_eq!(frame.payload(), b"hi");
/// assert!(cb.is_empty());
/// ```
pub fn decode<const N: usize>(
    buffer: &mut CircularBuffer<N>,
    max_frame_len: usize,
) -> Result<Option<DecodedFrame>> {
    let max_len = max_escaped_len(max_frame_len);
    let mut start = 0;

    while let Some(offset) = buffer.search(HEADER, start) {
        match check_candidate(buffer, offset, max_len) {
            Candidate::Frame(len) => return extract(buffer, offset, len).map(Some),
            Candidate::Incomplete => return Ok(None),
            Candidate::Spurious => debug!(offset, "Skipping spurious header"),
        }
        start = offset + 1;
    }

    Err(FlexseaError::NoFrame)
}

fn extract<const N: usize>(
    buffer: &mut CircularBuffer<N>,
    offset: usize,
    len: usize,
) -> Result<DecodedFrame> {
    let total = len + MIN_OVERHEAD;
    let mut encoded = EncodedFrame::new();
    encoded
        .resize(total, 0)
        .map_err(|_| FlexseaError::PayloadTooLong {
            encoded_len: len,
            max: MAX_ENCODED_LEN,
        })?;

    if offset > 0 {
        debug!(discarded = offset, "Dropping bytes before frame");
    }
    buffer.discard(offset);
    buffer.read_into(&mut encoded);

    let payload = unescape(&encoded[2..2 + len])?;
    debug!(encoded_len = total, payload_len = payload.len(), "Decoded frame");

    Ok(DecodedFrame { encoded, payload })
}

/// Collapse every `ESCAPE, byte` pair to `byte`.
pub fn unescape(escaped: &[u8]) -> Result<PayloadBuf> {
    let mut out = PayloadBuf::new();
    let mut skip = false;

    for &byte in escaped {
        if byte == ESCAPE && !skip {
            skip = true;
            continue;
        }
        skip = false;
        out.push(byte).map_err(|_| FlexseaError::PayloadTooLong {
            encoded_len: escaped.len(),
            max: MAX_ENCODED_LEN,
        })?;
    }

    Ok(out)
}

/// Drop everything before the first `HEADER`, or everything if there is none.
///
/// Returns the number of bytes discarded.
pub fn cleanup<const N: usize>(buffer: &mut CircularBuffer<N>) -> usize {
    let count = buffer.search(HEADER, 0).unwrap_or(buffer.len());
    buffer.discard(count)
}
