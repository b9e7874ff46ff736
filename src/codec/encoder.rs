//! Frame encoder.
//!
//! Wraps a payload as `[HEADER][LEN][escaped payload][CHECKSUM][FOOTER]`.

use heapless::Vec;

use crate::error::{FlexseaError, Result};
use crate::protocol::{
    is_reserved, ESCAPE, FOOTER, HEADER, MAX_ENCODED_LEN, MAX_FRAME_LEN, MIN_OVERHEAD,
};

/// Fixed-capacity buffer holding one encoded frame.
pub type EncodedFrame = Vec<u8, MAX_FRAME_LEN>;

/// Length of `payload` once escaped (the LEN field).
#[inline]
pub fn escaped_len(payload: &[u8]) -> usize {
    payload.len() + payload.iter().filter(|&&b| is_reserved(b)).count()
}

/// Largest LEN allowed in a frame of at most `max_frame_len` bytes.
#[inline]
pub fn max_escaped_len(max_frame_len: usize) -> usize {
    max_frame_len.saturating_sub(MIN_OVERHEAD).min(MAX_ENCODED_LEN)
}

/// Encode `payload` into `out`, using at most `out.len()` bytes.
///
/// Returns the frame length (escaped length + 4). `out` is left untouched
/// on failure.
///
/// # Errors
///
/// Returns [`FlexseaError::PayloadTooLong`] if the escaped payload is longer
/// than `out.len() - 4` or 255.
///
/// # Example
///
/// ```
/// use flexsea_comm::codec::encode_into;
///
/// let mut out = [0u8; 16];
/// let n = encode_into(&[1, 0xED, 2], &mut out).unwrap();
/// assert_eq!(&out[..n], &[0xED, 4, 1, 0xE9, 0xED, 2, 0xD9, 0xEE]);
/// ```
pub fn encode_into(payload: &[u8], out: &mut [u8]) -> Result<usize> {
    let len = escaped_len(payload);
    let max = max_escaped_len(out.len());
    if len > max || out.len() < MIN_OVERHEAD {
        return Err(FlexseaError::PayloadTooLong {
            encoded_len: len,
            max,
        });
    }

    out[0] = HEADER;
    out[1] = len as u8;

    let mut idx = 2;
    let mut checksum = 0u8;
    for &byte in payload {
        if is_reserved(byte) {
            out[idx] = ESCAPE;
            checksum = checksum.wrapping_add(ESCAPE);
            idx += 1;
        }
        out[idx] = byte;
        checksum = checksum.wrapping_add(byte);
        idx += 1;
    }

    out[idx] = checksum;
    out[idx + 1] = FOOTER;

    Ok(len + MIN_OVERHEAD)
}

/// Encode `payload` into a new frame of at most `max_frame_len` bytes.
///
/// # Errors
///
/// Returns [`FlexseaError::PayloadTooLong`] if the escaped payload does not fit.
pub fn encode(payload: &[u8], max_frame_len: usize) -> Result<EncodedFrame> {
    let mut frame = EncodedFrame::new();
    let limit = max_frame_len.min(MAX_FRAME_LEN);
    frame
        .resize(limit, 0)
        .map_err(|_| FlexseaError::PayloadTooLong {
            encoded_len: escaped_len(payload),
            max: max_escaped_len(limit),
        })?;

    let n = encode_into(payload, &mut frame)?;
    frame.truncate(n);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::DEFAULT_MAX_FRAME_LEN;

    #[test]
    fn test_encode_flexsea_v2() {
        let payload = b"flexsea_v2";
        let frame = encode(payload, DEFAULT_MAX_FRAME_LEN).unwrap();

        let checksum = payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        assert_eq!(frame.len(), 14);
        assert_eq!(frame[0], HEADER);
        assert_eq!(frame[1], 10);
        assert_eq!(&frame[2..12], payload);
        assert_eq!(frame[12], checksum);
        assert_eq!(frame[13], FOOTER);
    }

    #[test]
    fn test_encode_escapes_header_byte() {
        let mut payload = [0u8; 36];
        for (i, b) in payload.iter_mut().enumerate() {
            *b = i as u8;
        }
        payload[10] = HEADER;

        let frame = encode(&payload, DEFAULT_MAX_FRAME_LEN).unwrap();
        assert_eq!(frame[1], 37);
        assert_eq!(frame.len(), 37 + MIN_OVERHEAD);
        assert_eq!(frame[12], ESCAPE);
        assert_eq!(frame[13], HEADER);

        // Checksum includes the escape byte
        let expected = frame[2..39].iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        assert_eq!(frame[39], expected);
        assert_eq!(frame[40], FOOTER);
    }

    #[test]
    fn test_encode_all_reserved() {
        let payload = [HEADER, FOOTER, ESCAPE];
        let frame = encode(&payload, DEFAULT_MAX_FRAME_LEN).unwrap();
        assert_eq!(frame[1], 6);
        assert_eq!(
            &frame[2..8],
            &[ESCAPE, HEADER, ESCAPE, FOOTER, ESCAPE, ESCAPE]
        );
    }

    #[test]
    fn test_encode_empty_payload() {
        let frame = encode(&[], DEFAULT_MAX_FRAME_LEN).unwrap();
        assert_eq!(&frame[..], &[HEADER, 0, 0, FOOTER]);
    }

    #[test]
    fn test_encode_too_long() {
        let payload = [0x55u8; 197];
        let result = encode(&payload, DEFAULT_MAX_FRAME_LEN);
        assert!(matches!(
            result,
            Err(FlexseaError::PayloadTooLong { encoded_len: 197, max: 196 })
        ));

        // Fits exactly
        assert_eq!(encode(&payload[..196], DEFAULT_MAX_FRAME_LEN).unwrap().len(), 200);

        // Escaping pushes it over the limit
        let mut payload = [0x55u8; 196];
        payload[0] = ESCAPE;
        assert!(encode(&payload, DEFAULT_MAX_FRAME_LEN).is_err());
    }

    #[test]
    fn test_encode_into_leaves_output_on_failure() {
        let mut out = [0xAAu8; 8];
        let result = encode_into(&[1, 2, 3, 4, 5], &mut out);
        assert!(result.is_err());
        assert_eq!(out, [0xAA; 8]);

        // Output too small for even the overhead
        let mut tiny = [0u8; 3];
        assert!(encode_into(&[], &mut tiny).is_err());
    }

    #[test]
    fn test_encode_single_byte_len_limit() {
        let payload = [1u8; MAX_ENCODED_LEN];
        let frame = encode(&payload, MAX_FRAME_LEN).unwrap();
        assert_eq!(frame.len(), MAX_FRAME_LEN);
        assert_eq!(frame[1], 255);

        let payload = [1u8; MAX_ENCODED_LEN + 1];
        assert!(encode(&payload, 1024).is_err());
    }
}
