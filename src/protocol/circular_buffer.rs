//! Fixed-capacity circular byte buffer.
//!
//! Holds the bytes received on a port until the codec extracts frames from
//! them. Storage is an inline array, so a buffer never allocates.
//!
//! All positions taken and returned by [`CircularBuffer::peek`],
//! [`CircularBuffer::search`] and [`CircularBuffer::checksum`] are offsets
//! from the oldest unread byte. Callers never see the physical wraparound.
//!
//! # Example
//!
//! ```
//! use flexsea_comm::protocol::CircularBuffer;
//!
//! let mut cb: CircularBuffer<16> = CircularBuffer::new();
//! cb.write(b"hello");
//!
//! assert_eq!(cb.peek(1), Some(b'e'));
//! assert_eq!(cb.search(b'l', 0), Some(2));
//! assert_eq!(cb.read_byte(), Some(b'h'));
//! assert_eq!(cb.size(), 4);
//! ```

use super::wire_format::CIRC_BUF_SIZE;
use crate::error::{FlexseaError, Result};

/// Result of writing one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum WriteOutcome {
    /// Byte stored, nothing lost.
    Stored,
    /// Buffer was full; the oldest unread byte (carried here) was dropped.
    Overwritten(u8),
}

impl WriteOutcome {
    /// Check if the write dropped an unread byte.
    #[inline]
    pub fn was_full(self) -> bool {
        matches!(self, WriteOutcome::Overwritten(_))
    }
}

/// Ring of `N` bytes with FIFO semantics.
///
/// Invariant: `write_index == (read_index + length) % N`.
#[derive(Clone)]
pub struct CircularBuffer<const N: usize = CIRC_BUF_SIZE> {
    buffer: [u8; N],
    read_index: usize,
    write_index: usize,
    length: usize,
}

impl<const N: usize> CircularBuffer<N> {
    /// Create an empty, zeroed buffer.
    pub const fn new() -> Self {
        assert!(N > 0, "CircularBuffer capacity must be non-zero");
        Self {
            buffer: [0u8; N],
            read_index: 0,
            write_index: 0,
            length: 0,
        }
    }

    /// Zero the storage and reset indices.
    pub fn init(&mut self) {
        self.buffer = [0u8; N];
        self.read_index = 0;
        self.write_index = 0;
        self.length = 0;
    }

    /// Append one byte.
    ///
    /// When the buffer is full the oldest unread byte is overwritten and
    /// returned in [`WriteOutcome::Overwritten`]. Length never exceeds `N`.
    pub fn write_byte(&mut self, value: u8) -> WriteOutcome {
        let outcome = if self.length == N {
            // Oldest byte sits where we are about to write
            let lost = self.buffer[self.read_index];
            self.read_index = (self.read_index + 1) % N;
            self.length -= 1;
            WriteOutcome::Overwritten(lost)
        } else {
            WriteOutcome::Stored
        };

        self.buffer[self.write_index] = value;
        self.write_index = (self.write_index + 1) % N;
        self.length += 1;

        outcome
    }

    /// Append a slice. Returns how many unread bytes were overwritten.
    pub fn write(&mut self, data: &[u8]) -> usize {
        data.iter()
            .filter(|&&byte| self.write_byte(byte).was_full())
            .count()
    }

    /// Remove and return the oldest byte, `None` if empty.
    pub fn read_byte(&mut self) -> Option<u8> {
        if self.length == 0 {
            return None;
        }

        let value = self.buffer[self.read_index];
        self.read_index = (self.read_index + 1) % N;
        self.length -= 1;
        Some(value)
    }

    /// Read up to `out.len()` bytes. Returns the number of bytes copied.
    pub fn read_into(&mut self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.length);

        // Copy in at most two runs: up to the end of storage, then from 0
        let first = count.min(N - self.read_index);
        out[..first].copy_from_slice(&self.buffer[self.read_index..self.read_index + first]);
        out[first..count].copy_from_slice(&self.buffer[..count - first]);

        self.read_index = (self.read_index + count) % N;
        self.length -= count;
        count
    }

    /// Drop up to `count` of the oldest bytes. Returns how many were dropped.
    pub fn discard(&mut self, count: usize) -> usize {
        let count = count.min(self.length);
        self.read_index = (self.read_index + count) % N;
        self.length -= count;
        count
    }

    /// Look at the byte `offset` positions after the oldest one.
    #[inline]
    pub fn peek(&self, offset: usize) -> Option<u8> {
        if offset >= self.length {
            return None;
        }
        Some(self.buffer[self.physical(offset)])
    }

    /// Find the first `value` at or after `start_offset`.
    ///
    /// Returns the offset of the match, measured from the oldest byte.
    /// `None` if `start_offset` is past the buffered data or the value is
    /// not found.
    pub fn search(&self, value: u8, start_offset: usize) -> Option<usize> {
        if start_offset >= self.length {
            return None;
        }

        // Scan to the physical end of storage, then continue from 0
        let start = self.physical(start_offset);
        let remaining = self.length - start_offset;
        let first_run = remaining.min(N - start);

        if let Some(pos) = self.buffer[start..start + first_run]
            .iter()
            .position(|&b| b == value)
        {
            return Some(start_offset + pos);
        }

        self.buffer[..remaining - first_run]
            .iter()
            .position(|&b| b == value)
            .map(|pos| start_offset + first_run + pos)
    }

    /// 8-bit wraparound sum of the bytes in `[start_offset, end_offset)`.
    ///
    /// # Errors
    ///
    /// Returns [`FlexseaError::BufferRange`] if the range is reversed or
    /// reaches past the buffered data.
    pub fn checksum(&self, start_offset: usize, end_offset: usize) -> Result<u8> {
        if start_offset > end_offset || end_offset > self.length {
            return Err(FlexseaError::BufferRange {
                start: start_offset,
                end: end_offset,
                available: self.length,
            });
        }

        let start = self.physical(start_offset);
        let count = end_offset - start_offset;
        let first_run = count.min(N - start);

        let sum = self.buffer[start..start + first_run]
            .iter()
            .chain(&self.buffer[..count - first_run])
            .fold(0u8, |acc, &b| acc.wrapping_add(b));

        Ok(sum)
    }

    /// Number of unread bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.length
    }

    /// Number of unread bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Check if there are no unread bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Check if the next write will overwrite.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.length == N
    }

    /// Total number of bytes the buffer can hold.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Physical position of the oldest byte.
    #[inline]
    pub fn read_index(&self) -> usize {
        self.read_index
    }

    /// Physical position of the next write.
    #[inline]
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    #[inline]
    fn physical(&self, offset: usize) -> usize {
        (self.read_index + offset) % N
    }

    /// Move the read position without touching the data, keeping the buffer full.
    #[cfg(test)]
    fn rotate_full(&mut self, read_index: usize) {
        self.read_index = read_index % N;
        self.write_index = self.read_index;
        self.length = N;
    }
}

impl<const N: usize> Default for CircularBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for CircularBuffer<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircularBuffer")
            .field("capacity", &N)
            .field("read_index", &self.read_index)
            .field("write_index", &self.write_index)
            .field("length", &self.length)
            .finish()
    }
}
