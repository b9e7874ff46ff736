//! Ping-pong staging buffers.
//!
//! Moves bytes from an asynchronous producer (a receive interrupt, a USB
//! callback) into a port's circular buffer. The producer always writes the
//! buffer selected for writes and then flips the selection, so the consumer
//! can drain the other one without racing it.
//!
//! # Design
//!
//! Two fixed arrays plus a selector, the same shape as a round-robin pool of
//! two. Each buffer has a lock flag held only while the producer copies
//! into it; the consumer skips a locked buffer and picks it up on the next
//! pass.

use tracing::warn;

use crate::error::{FlexseaError, Result};
use crate::protocol::CircularBuffer;

/// Default capacity of one staging buffer.
pub const DEFAULT_STAGING_LEN: usize = 64;

/// Number of bytes moved by one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Drained {
    /// Bytes copied into the circular buffer.
    pub moved: usize,
    /// Unread bytes the circular buffer dropped to make room.
    pub overwritten: usize,
}

/// Double staging buffer with per-buffer locks.
pub struct PingPong<const P: usize = DEFAULT_STAGING_LEN> {
    buffers: [[u8; P]; 2],
    lens: [usize; 2],
    locks: [bool; 2],
    /// Index of the buffer accepting the next producer write.
    selected: usize,
}

impl<const P: usize> PingPong<P> {
    /// Create an empty pair; ping (index 0) is selected first.
    pub const fn new() -> Self {
        Self {
            buffers: [[0u8; P]; 2],
            lens: [0; 2],
            locks: [false; 2],
            selected: 0,
        }
    }

    /// Producer side: stage one chunk and flip the selection.
    ///
    /// A chunk landing on a buffer the consumer has not drained yet replaces
    /// it. The lost bytes are logged.
    ///
    /// # Errors
    ///
    /// - [`FlexseaError::StagingOverflow`] if the chunk is larger than `P`
    /// - [`FlexseaError::StagingBusy`] if the selected buffer is locked
    pub fn write(&mut self, chunk: &[u8]) -> Result<()> {
        if chunk.len() > P {
            return Err(FlexseaError::StagingOverflow {
                len: chunk.len(),
                capacity: P,
            });
        }

        let idx = self.selected;
        if self.locks[idx] {
            return Err(FlexseaError::StagingBusy);
        }

        self.locks[idx] = true;
        if self.lens[idx] > 0 {
            warn!(
                buffer = idx,
                dropped = self.lens[idx],
                "Staging buffer overwritten before it was drained"
            );
        }
        self.buffers[idx][..chunk.len()].copy_from_slice(chunk);
        self.lens[idx] = chunk.len();
        self.locks[idx] = false;

        self.selected = 1 - idx;
        Ok(())
    }

    /// Consumer side: move staged bytes into `cb`.
    ///
    /// Unlocked, non-empty buffers are drained. The selected buffer holds
    /// the older chunk when both are full, so it goes first.
    pub fn drain_into<const N: usize>(&mut self, cb: &mut CircularBuffer<N>) -> Drained {
        let mut drained = Drained::default();

        for idx in [self.selected, 1 - self.selected] {
            if self.locks[idx] || self.lens[idx] == 0 {
                continue;
            }
            let len = self.lens[idx];
            drained.overwritten += cb.write(&self.buffers[idx][..len]);
            drained.moved += len;
            self.lens[idx] = 0;
        }

        drained
    }

    /// Bytes waiting in the ping (0) or pong (1) buffer.
    #[inline]
    pub fn staged_len(&self, idx: usize) -> usize {
        self.lens[idx & 1]
    }

    /// Total bytes waiting in both buffers.
    #[inline]
    pub fn pending(&self) -> usize {
        self.lens[0] + self.lens[1]
    }

    /// Index of the buffer accepting the next producer write.
    #[inline]
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Capacity of one staging buffer.
    #[inline]
    pub const fn capacity(&self) -> usize {
        P
    }

    /// Simulate a producer that is mid-copy.
    #[cfg(test)]
    pub(crate) fn set_lock(&mut self, idx: usize, locked: bool) {
        self.locks[idx & 1] = locked;
    }
}

impl<const P: usize> Default for PingPong<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const P: usize> std::fmt::Debug for PingPong<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PingPong")
            .field("capacity", &P)
            .field("lens", &self.lens)
            .field("locks", &self.locks)
            .field("selected", &self.selected)
            .finish()
    }
}
