//! Wire format constants and bit packing.
//!
//! Frame layout on the wire:
//! ```text
//! ┌────────┬─────┬──────────────────────┬──────────┬────────┐
//! │ HEADER │ LEN │ escaped payload      │ CHECKSUM │ FOOTER │
//! │ 0xED   │ u8  │ LEN bytes            │ u8       │ 0xEE   │
//! └────────┴─────┴──────────────────────┴──────────┴────────┘
//! ```
//!
//! Command layout inside the unescaped payload:
//! ```text
//! ┌────────────────────┬────────────────────────┬────────────┬──────────┐
//! │ CODE<<2 | INTENT   │ ACK<<7 | PKTNUM_MSB    │ PKTNUM_LSB │ app data │
//! │ byte 0             │ byte 1 (acked variant) │ byte 2     │ ...      │
//! └────────────────────┴────────────────────────┴────────────┴──────────┘
//! ```

/// Start of frame marker.
pub const HEADER: u8 = 0xED;

/// End of frame marker.
pub const FOOTER: u8 = 0xEE;

/// Escape marker, precedes any payload byte equal to a reserved value.
pub const ESCAPE: u8 = 0xE9;

/// Header + LEN + checksum + footer.
pub const MIN_OVERHEAD: usize = 4;

/// Largest LEN value (single byte).
pub const MAX_ENCODED_LEN: usize = u8::MAX as usize;

/// Largest possible frame on the wire.
pub const MAX_FRAME_LEN: usize = MAX_ENCODED_LEN + MIN_OVERHEAD;

/// Default frame limit used by ports.
pub const DEFAULT_MAX_FRAME_LEN: usize = 200;

/// Default reception buffer capacity.
pub const CIRC_BUF_SIZE: usize = 1000;

/// Lowest valid command code. Code 0 is how a broken command shows up.
pub const MIN_CMD_CODE: u8 = 1;

/// Highest command code representable in 6 bits.
pub const MAX_CMD_CODE: u8 = 63;

/// Number of dispatch table slots (one per 6-bit code).
pub const CMD_TABLE_SIZE: usize = MAX_CMD_CODE as usize + 1;

/// Highest packet number representable in 15 bits.
pub const MAX_PACKET_NUM: u16 = 0x7FFF;

/// Index of the code/intent byte.
pub const CMD_CODE_INDEX: usize = 0;

/// Index of the ack/packet number MSB byte.
pub const CMD_ACK_INDEX: usize = 1;

/// Command header length without packet numbering.
pub const CMD_PLAIN_OVERHEAD: usize = 1;

/// Command header length with ack bit and packet number.
pub const CMD_ACK_OVERHEAD: usize = 3;

/// Default code used for acknowledgement frames.
pub const DEFAULT_ACK_CODE: u8 = MAX_CMD_CODE;

/// Check if a byte collides with a framing marker.
#[inline]
pub fn is_reserved(byte: u8) -> bool {
    byte == HEADER || byte == FOOTER || byte == ESCAPE
}

/// Read/write intent carried in the two low bits of byte 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Intent {
    /// 0b00, never valid on the wire.
    Invalid = 0b00,
    /// 0b01, peer wants data back.
    Read = 0b01,
    /// 0b10, peer sends data.
    Write = 0b10,
    /// 0b11, peer sends data and wants data back.
    ReadWrite = 0b11,
}

impl Intent {
    /// Decode the two low bits of a byte.
    #[inline]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b01 => Intent::Read,
            0b10 => Intent::Write,
            0b11 => Intent::ReadWrite,
            _ => Intent::Invalid,
        }
    }

    /// Two-bit wire value.
    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// True for `Read` and `ReadWrite`.
    #[inline]
    pub fn includes_read(self) -> bool {
        matches!(self, Intent::Read | Intent::ReadWrite)
    }

    /// True for `Write` and `ReadWrite`.
    #[inline]
    pub fn includes_write(self) -> bool {
        matches!(self, Intent::Write | Intent::ReadWrite)
    }
}

/// Bit packing for command header bytes.
pub mod bits {
    use super::{Intent, MAX_PACKET_NUM};

    /// Ack request bit in byte 1.
    pub const ACK_BIT: u8 = 0b1000_0000;

    /// Pack a 6-bit code and an intent into byte 0.
    #[inline]
    pub fn pack_code_intent(code: u8, intent: Intent) -> u8 {
        ((code & 0x3F) << 2) | intent.bits()
    }

    /// Extract the 6-bit code from byte 0.
    #[inline]
    pub fn code(byte: u8) -> u8 {
        byte >> 2
    }

    /// Extract the intent from byte 0.
    #[inline]
    pub fn intent(byte: u8) -> Intent {
        Intent::from_bits(byte)
    }

    /// Byte 1: ack bit plus the 7 high bits of the packet number.
    #[inline]
    pub fn pack_ack_msb(ack: bool, packet_number: u16) -> u8 {
        let msb = ((packet_number & MAX_PACKET_NUM) >> 8) as u8;
        if ack {
            msb | ACK_BIT
        } else {
            msb
        }
    }

    /// Byte 2: the 8 low bits of the packet number.
    #[inline]
    pub fn pack_packet_num_lsb(packet_number: u16) -> u8 {
        (packet_number & 0xFF) as u8
    }

    /// Ack bit from byte 1.
    #[inline]
    pub fn ack(msb: u8) -> bool {
        msb & ACK_BIT != 0
    }

    /// 15-bit packet number from bytes 1 and 2.
    #[inline]
    pub fn packet_number(msb: u8, lsb: u8) -> u16 {
        (u16::from(msb & !ACK_BIT) << 8) | u16::from(lsb)
    }
}
