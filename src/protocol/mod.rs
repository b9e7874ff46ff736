//! Protocol module - wire format, reception buffer and command layout.
//!
//! This module implements the byte-level pieces of FlexSEA v2:
//! - Framing markers, limits and command header bit packing
//! - Circular buffer for accumulating received bytes
//! - Command view with typed accessors

pub mod command;

mod circular_buffer;
mod wire_format;

pub use circular_buffer::{CircularBuffer, WriteOutcome};
pub use command::{AckInfo, Command, CommandBuf};
pub use wire_format::{
    bits, is_reserved, Intent, CIRC_BUF_SIZE, CMD_ACK_INDEX, CMD_ACK_OVERHEAD, CMD_CODE_INDEX,
    CMD_PLAIN_OVERHEAD, CMD_TABLE_SIZE, DEFAULT_ACK_CODE, DEFAULT_MAX_FRAME_LEN, ESCAPE, FOOTER,
    HEADER, MAX_CMD_CODE, MAX_ENCODED_LEN, MAX_FRAME_LEN, MAX_PACKET_NUM, MIN_CMD_CODE,
    MIN_OVERHEAD,
};
