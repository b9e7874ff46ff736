//! Command view and command header construction.
//!
//! A command is the unescaped payload of a frame. Byte 0 carries the 6-bit
//! code and the 2-bit intent. With packet numbering enabled, bytes 1 and 2
//! carry the ack-request bit and a 15-bit packet number. Application bytes
//! follow.
//!
//! # Example
//!
//! ```
//! use flexsea_comm::config::CommandConfig;
//! use flexsea_comm::protocol::{command, Intent};
//!
//! let cfg = CommandConfig::default();
//! let buf = command::build(&cfg, 5, Intent::Read, Some((true, 1)), b"abc").unwrap();
//! assert_eq!(&buf[..], &[(5 << 2) | 0b01, 0x80, 0x01, b'a', b'b', b'c']);
//!
//! let cmd = command::parse(&cfg, &buf, true).unwrap();
//! assert_eq!(cmd.code(), 5);
//! assert!(cmd.ack_requested());
//! assert_eq!(cmd.packet_number(), Some(1));
//! assert_eq!(cmd.data(), b"abc");
//! ```

use heapless::Vec;

use super::wire_format::{
    bits, Intent, CMD_ACK_INDEX, CMD_ACK_OVERHEAD, CMD_CODE_INDEX, CMD_PLAIN_OVERHEAD,
    MAX_ENCODED_LEN,
};
use crate::config::CommandConfig;
use crate::error::{FlexseaError, Result};

/// Fixed-capacity buffer holding one serialized command.
pub type CommandBuf = Vec<u8, MAX_ENCODED_LEN>;

/// Parsed view over a command's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    code: u8,
    intent: Intent,
    ack: bool,
    packet_number: Option<u16>,
    header_len: usize,
    bytes: &'a [u8],
}

impl<'a> Command<'a> {
    /// 6-bit command code.
    #[inline]
    pub fn code(&self) -> u8 {
        self.code
    }

    /// Read/write intent.
    #[inline]
    pub fn intent(&self) -> Intent {
        self.intent
    }

    /// Check if the sender asked for an acknowledgement.
    ///
    /// Always false for commands without packet numbering.
    #[inline]
    pub fn ack_requested(&self) -> bool {
        self.ack
    }

    /// Packet number, `None` for commands without packet numbering.
    #[inline]
    pub fn packet_number(&self) -> Option<u16> {
        self.packet_number
    }

    /// Full command bytes, header included.
    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Application bytes after the command header.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        &self.bytes[self.header_len..]
    }

    /// Length of the command header (1 or 3).
    #[inline]
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Decode this command's data as an acknowledgement.
    ///
    /// Returns `None` if the data is too short to hold one.
    pub fn ack_info(&self) -> Option<AckInfo> {
        AckInfo::decode(self.data())
    }
}

/// Contents of an acknowledgement frame: which command, which packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AckInfo {
    /// Code of the acknowledged command.
    pub code: u8,
    /// Packet number of the acknowledged command.
    pub packet_number: u16,
}

impl AckInfo {
    /// Encoded size in bytes.
    pub const SIZE: usize = 3;

    /// Serialize as `[code, pnum_msb, pnum_lsb]`.
    #[inline]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        [
            self.code,
            bits::pack_ack_msb(false, self.packet_number),
            bits::pack_packet_num_lsb(self.packet_number),
        ]
    }

    /// Deserialize from the first three bytes of `data`.
    #[inline]
    pub fn decode(data: &[u8]) -> Option<Self> {
        match data {
            [code, msb, lsb, ..] => Some(Self {
                code: *code,
                packet_number: bits::packet_number(*msb, *lsb),
            }),
            _ => None,
        }
    }
}

/// Header length for a command variant.
#[inline]
pub fn header_len(with_ack: bool) -> usize {
    if with_ack {
        CMD_ACK_OVERHEAD
    } else {
        CMD_PLAIN_OVERHEAD
    }
}

/// Check code range and intent against `config`.
pub fn validate(config: &CommandConfig, code: u8, intent: Intent) -> Result<()> {
    if !config.accepts(code) {
        return Err(FlexseaError::InvalidCommandCode(code));
    }
    if intent == Intent::Invalid {
        return Err(FlexseaError::InvalidIntent);
    }
    Ok(())
}

/// Serialize a command.
///
/// `ack` selects the variant: `None` for the 1-byte header, `Some((ack_request,
/// packet_number))` for the 3-byte header. Nothing is returned on failure.
///
/// # Errors
///
/// - [`FlexseaError::InvalidCommandCode`] if `code` is outside the configured range
/// - [`FlexseaError::InvalidIntent`] for [`Intent::Invalid`]
/// - [`FlexseaError::CommandTooLong`] if header plus payload exceed 255 bytes
pub fn build(
    config: &CommandConfig,
    code: u8,
    intent: Intent,
    ack: Option<(bool, u16)>,
    payload: &[u8],
) -> Result<CommandBuf> {
    validate(config, code, intent)?;

    let len = header_len(ack.is_some()) + payload.len();
    if len > MAX_ENCODED_LEN {
        return Err(FlexseaError::CommandTooLong {
            len,
            max: MAX_ENCODED_LEN,
        });
    }

    let mut buf = CommandBuf::new();
    let too_long = |_| FlexseaError::CommandTooLong {
        len,
        max: MAX_ENCODED_LEN,
    };

    buf.push(bits::pack_code_intent(code, intent))
        .map_err(too_long)?;
    if let Some((ack_request, packet_number)) = ack {
        buf.push(bits::pack_ack_msb(ack_request, packet_number))
            .map_err(too_long)?;
        buf.push(bits::pack_packet_num_lsb(packet_number))
            .map_err(too_long)?;
    }
    buf.extend_from_slice(payload).map_err(|_| FlexseaError::CommandTooLong {
        len,
        max: MAX_ENCODED_LEN,
    })?;

    Ok(buf)
}

/// Parse a command from decoded frame bytes.
///
/// # Errors
///
/// - [`FlexseaError::CommandTooShort`] if `bytes` is shorter than the header
/// - [`FlexseaError::InvalidIntent`] if the intent bits are `0b00`
/// - [`FlexseaError::InvalidCommandCode`] if the code is outside the configured range
pub fn parse<'a>(config: &CommandConfig, bytes: &'a [u8], with_ack: bool) -> Result<Command<'a>> {
    let min = header_len(with_ack);
    if bytes.len() < min {
        return Err(FlexseaError::CommandTooShort {
            len: bytes.len(),
            min,
        });
    }

    let first = bytes[CMD_CODE_INDEX];
    let code = bits::code(first);
    let intent = bits::intent(first);
    validate(config, code, intent)?;

    let (ack, packet_number) = if with_ack {
        let msb = bytes[CMD_ACK_INDEX];
        let lsb = bytes[CMD_ACK_INDEX + 1];
        (bits::ack(msb), Some(bits::packet_number(msb, lsb)))
    } else {
        (false, None)
    };

    Ok(Command {
        code,
        intent,
        ack,
        packet_number,
        header_len: min,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MAX_PACKET_NUM;

    #[test]
    fn test_build_plain() {
        let cfg = CommandConfig::default();
        let buf = build(&cfg, 10, Intent::Write, None, &[1, 2, 3]).unwrap();
        assert_eq!(&buf[..], &[(10 << 2) | 0b10, 1, 2, 3]);

        let cmd = parse(&cfg, &buf, false).unwrap();
        assert_eq!(cmd.code(), 10);
        assert_eq!(cmd.intent(), Intent::Write);
        assert!(!cmd.ack_requested());
        assert_eq!(cmd.packet_number(), None);
        assert_eq!(cmd.data(), &[1, 2, 3]);
        assert_eq!(cmd.bytes().len(), 4);
    }

    #[test]
    fn test_build_with_ack_header() {
        let cfg = CommandConfig::default();
        let buf = build(&cfg, 1, Intent::ReadWrite, Some((false, 0x0102)), &[]).unwrap();
        assert_eq!(&buf[..], &[(1 << 2) | 0b11, 0x01, 0x02]);

        let cmd = parse(&cfg, &buf, true).unwrap();
        assert_eq!(cmd.header_len(), 3);
        assert!(!cmd.ack_requested());
        assert_eq!(cmd.packet_number(), Some(0x0102));
        assert!(cmd.data().is_empty());
    }

    #[test]
    fn test_build_rejects_invalid() {
        let cfg = CommandConfig::default();

        assert!(matches!(
            build(&cfg, 0, Intent::Read, None, &[]),
            Err(FlexseaError::InvalidCommandCode(0))
        ));
        assert!(matches!(
            build(&cfg, 64, Intent::Read, None, &[]),
            Err(FlexseaError::InvalidCommandCode(64))
        ));
        assert!(matches!(
            build(&cfg, 5, Intent::Invalid, None, &[]),
            Err(FlexseaError::InvalidIntent)
        ));
    }

    #[test]
    fn test_build_too_long() {
        let cfg = CommandConfig::default();
        let payload = [0u8; MAX_ENCODED_LEN];

        let result = build(&cfg, 5, Intent::Write, Some((false, 1)), &payload);
        assert!(matches!(
            result,
            Err(FlexseaError::CommandTooLong { len: 258, max: 255 })
        ));

        // Exactly at the limit
        let result = build(&cfg, 5, Intent::Write, None, &payload[..MAX_ENCODED_LEN - 1]);
        assert_eq!(result.unwrap().len(), MAX_ENCODED_LEN);
    }

    #[test]
    fn test_parse_errors() {
        let cfg = CommandConfig::default();

        assert!(matches!(
            parse(&cfg, &[], false),
            Err(FlexseaError::CommandTooShort { len: 0, min: 1 })
        ));
        assert!(matches!(
            parse(&cfg, &[(5 << 2) | 1, 0], true),
            Err(FlexseaError::CommandTooShort { len: 2, min: 3 })
        ));
        // Intent bits 0b00
        assert!(matches!(
            parse(&cfg, &[5 << 2], false),
            Err(FlexseaError::InvalidIntent)
        ));
        // Code 0 with a valid intent
        assert!(matches!(
            parse(&cfg, &[0b01], false),
            Err(FlexseaError::InvalidCommandCode(0))
        ));
    }

    #[test]
    fn test_parse_respects_configured_range() {
        let cfg = CommandConfig {
            min_code: 10,
            max_code: 20,
            ack_code: 20,
            ..CommandConfig::default()
        };

        assert!(parse(&cfg, &[(10 << 2) | 1], false).is_ok());
        assert!(parse(&cfg, &[(20 << 2) | 1], false).is_ok());
        assert!(matches!(
            parse(&cfg, &[(21 << 2) | 1], false),
            Err(FlexseaError::InvalidCommandCode(21))
        ));
    }

    #[test]
    fn test_ack_info() {
        let info = AckInfo {
            code: 12,
            packet_number: MAX_PACKET_NUM,
        };
        let encoded = info.encode();
        assert_eq!(encoded, [12, 0x7F, 0xFF]);
        assert_eq!(AckInfo::decode(&encoded), Some(info));
        assert_eq!(AckInfo::decode(&encoded[..2]), None);

        let cfg = CommandConfig::default();
        let buf = build(&cfg, 63, Intent::Write, Some((false, 7)), &encoded).unwrap();
        let cmd = parse(&cfg, &buf, true).unwrap();
        assert_eq!(cmd.ack_info(), Some(info));
    }
}
