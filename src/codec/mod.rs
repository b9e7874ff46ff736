//! Codec module - framing of payloads on the wire.
//!
//! This module turns payloads into self-delimiting frames and back:
//!
//! - [`encode`] / [`encode_into`] - add header, length, escapes, checksum and footer
//! - [`decode`] - extract the earliest valid frame from a [`CircularBuffer`],
//!   skipping noise and corrupted candidates
//! - [`cleanup`] - drop bytes that cannot belong to a frame
//!
//! # Design
//!
//! Frames are built in fixed-capacity `heapless` vectors, so neither side
//! allocates.
//!
//! # Example
//!
//! ```
//! use flexsea_comm::codec::{cleanup, decode, encode};
//! use flexsea_comm::protocol::CircularBuffer;
//!
//! let frame = encode(b"flexsea_v2", 200).unwrap();
//! assert_eq!(frame.len(), 14);
//!
//! let mut cb: CircularBuffer = CircularBuffer::new();
//! cb.write(&frame);
//! let decoded = decode(&mut cb, 200).unwrap().unwrap();
//! assert_eq!(decoded.payload(), b"flexsea_v2");
//! assert_eq!(cleanup(&mut cb), 0);
//! ```
//!
//! [`CircularBuffer`]: crate::protocol::CircularBuffer

mod decoder;
mod encoder;

pub use decoder::{cleanup, decode, unescape, DecodedFrame, PayloadBuf};
pub use encoder::{encode, encode_into, escaped_len, max_escaped_len, EncodedFrame};
