//! Error types for flexsea-comm.
//!
//! Nothing in the stack is fatal. Every operation reports failure through
//! [`FlexseaError`] and the caller decides whether to retry, log or drop.

use thiserror::Error;

use crate::status::Status;

/// Main error type for all flexsea-comm operations.
#[derive(Debug, Error)]
pub enum FlexseaError {
    /// Requested range is not covered by the buffered bytes.
    #[error("Buffer range {start}..{end} exceeds {available} buffered bytes")]
    BufferRange {
        /// First offset of the range.
        start: usize,
        /// One past the last offset of the range.
        end: usize,
        /// Bytes currently buffered.
        available: usize,
    },

    /// Escaped payload does not fit in the maximum frame length.
    #[error("Encoded payload of {encoded_len} bytes exceeds maximum {max}")]
    PayloadTooLong {
        /// Escaped payload length (LEN field) that was required.
        encoded_len: usize,
        /// Largest LEN allowed by the frame limit.
        max: usize,
    },

    /// A frame has started but not all of its bytes have arrived yet.
    #[error("Incomplete frame, waiting for more bytes")]
    IncompleteFrame,

    /// No valid frame could be extracted from the buffered bytes.
    #[error("No valid frame in buffer")]
    NoFrame,

    /// Command code outside of the configured range.
    #[error("Invalid command code: {0}")]
    InvalidCommandCode(u8),

    /// Read/write bits decode to the invalid pattern.
    #[error("Invalid command intent")]
    InvalidIntent,

    /// Decoded payload is shorter than the command header.
    #[error("Command of {len} bytes is shorter than its {min} byte header")]
    CommandTooShort {
        /// Received length.
        len: usize,
        /// Header length for the active variant.
        min: usize,
    },

    /// Command would not fit in a maximum size frame.
    #[error("Command of {len} bytes exceeds maximum {max}")]
    CommandTooLong {
        /// Requested length.
        len: usize,
        /// Largest length allowed.
        max: usize,
    },

    /// Application payload field did not fit the buffer.
    #[error("Payload buffer too short: needed {needed} bytes, {remaining} remaining")]
    PayloadTooShort {
        /// Bytes needed by the field.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// Registered handler reported a failure.
    #[error("Handler for command {code} failed with status {status}")]
    HandlerFailed {
        /// Command code that was dispatched.
        code: u8,
        /// Status returned by the handler.
        status: Status,
    },

    /// Producer tried to stage bytes into a buffer that is being written.
    #[error("Staging buffer busy")]
    StagingBusy,

    /// Chunk is larger than a staging buffer.
    #[error("Chunk of {len} bytes exceeds staging capacity {capacity}")]
    StagingOverflow {
        /// Chunk length.
        len: usize,
        /// Staging buffer capacity.
        capacity: usize,
    },

    /// Byte sink reported a failure.
    #[error("Byte sink failed with status {0}")]
    SinkFailed(Status),

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization error (configuration only).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error on a host stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream closed by the peer.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type alias using FlexseaError.
pub type Result<T> = std::result::Result<T, FlexseaError>;
