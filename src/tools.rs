//! Little-endian field packing for application payloads.
//!
//! Handlers and reply builders map their structs to bytes by hand. These
//! helpers keep the byte order explicit and turn a short buffer into an
//! error instead of a panic.
//!
//! # Example
//!
//! ```
//! use flexsea_comm::tools::{PayloadReader, PayloadWriter};
//!
//! let mut buf = [0u8; 8];
//! let mut w = PayloadWriter::new(&mut buf);
//! w.put_u16(0xBEEF).unwrap();
//! w.put_i32(-42).unwrap();
//! assert_eq!(w.written(), 6);
//!
//! let mut r = PayloadReader::new(&buf);
//! assert_eq!(r.get_u16().unwrap(), 0xBEEF);
//! assert_eq!(r.get_i32().unwrap(), -42);
//! ```

use bytes::{Buf, BufMut};

use crate::error::{FlexseaError, Result};

/// Writes fields into a fixed slice.
#[derive(Debug)]
pub struct PayloadWriter<'a> {
    buf: &'a mut [u8],
    written: usize,
}

impl<'a> PayloadWriter<'a> {
    /// Start writing at the beginning of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, written: 0 }
    }

    /// Bytes written so far.
    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Bytes still available.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.written
    }

    fn reserve(&mut self, needed: usize) -> Result<&mut [u8]> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(FlexseaError::PayloadTooShort { needed, remaining });
        }
        let start = self.written;
        self.written += needed;
        Ok(&mut self.buf[start..start + needed])
    }

    /// Append raw bytes.
    pub fn put_slice(&mut self, src: &[u8]) -> Result<()> {
        self.reserve(src.len())?.put_slice(src);
        Ok(())
    }

    /// Append a `u8`.
    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.reserve(1)?.put_u8(value);
        Ok(())
    }

    /// Append an `i8`.
    pub fn put_i8(&mut self, value: i8) -> Result<()> {
        self.reserve(1)?.put_i8(value);
        Ok(())
    }

    /// Append a little-endian `u16`.
    pub fn put_u16(&mut self, value: u16) -> Result<()> {
        self.reserve(2)?.put_u16_le(value);
        Ok(())
    }

    /// Append a little-endian `i16`.
    pub fn put_i16(&mut self, value: i16) -> Result<()> {
        self.reserve(2)?.put_i16_le(value);
        Ok(())
    }

    /// Append a little-endian `u32`.
    pub fn put_u32(&mut self, value: u32) -> Result<()> {
        self.reserve(4)?.put_u32_le(value);
        Ok(())
    }

    /// Append a little-endian `i32`.
    pub fn put_i32(&mut self, value: i32) -> Result<()> {
        self.reserve(4)?.put_i32_le(value);
        Ok(())
    }

    /// Append a little-endian IEEE 754 `f32`.
    pub fn put_f32(&mut self, value: f32) -> Result<()> {
        self.reserve(4)?.put_f32_le(value);
        Ok(())
    }
}

/// Reads fields from a slice.
#[derive(Debug, Clone)]
pub struct PayloadReader<'a> {
    buf: &'a [u8],
}

impl<'a> PayloadReader<'a> {
    /// Start reading at the beginning of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes not read yet.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let remaining = self.buf.remaining();
        if needed > remaining {
            return Err(FlexseaError::PayloadTooShort { needed, remaining });
        }
        Ok(())
    }

    /// Skip `count` bytes.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.buf.advance(count);
        Ok(())
    }

    /// Read `count` raw bytes.
    pub fn get_slice(&mut self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        let (head, tail) = self.buf.split_at(count);
        self.buf = tail;
        Ok(head)
    }

    /// Read a `u8`.
    pub fn get_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    /// Read an `i8`.
    pub fn get_i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    /// Read a little-endian `u16`.
    pub fn get_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    /// Read a little-endian `i16`.
    pub fn get_i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.buf.get_i16_le())
    }

    /// Read a little-endian `u32`.
    pub fn get_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    /// Read a little-endian `i32`.
    pub fn get_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32_le())
    }

    /// Read a little-endian IEEE 754 `f32`.
    pub fn get_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.buf.get_f32_le())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_order() {
        let mut buf = [0u8; 10];
        let mut w = PayloadWriter::new(&mut buf);
        w.put_u16(0x1234).unwrap();
        w.put_u32(0xAABBCCDD).unwrap();
        w.put_i16(-2).unwrap();
        w.put_u8(7).unwrap();
        w.put_i8(-1).unwrap();
        assert_eq!(w.remaining(), 0);

        assert_eq!(buf, [0x34, 0x12, 0xDD, 0xCC, 0xBB, 0xAA, 0xFE, 0xFF, 7, 0xFF]);
    }

    #[test]
    fn test_struct_like_payload() {
        let mut buf = [0u8; 32];
        let mut w = PayloadWriter::new(&mut buf);
        w.put_u8(1).unwrap();
        w.put_i32(-100_000).unwrap();
        w.put_f32(3.5).unwrap();
        w.put_slice(b"id").unwrap();
        let len = w.written();
        assert_eq!(len, 11);

        let mut r = PayloadReader::new(&buf[..len]);
        assert_eq!(r.get_u8().unwrap(), 1);
        assert_eq!(r.get_i32().unwrap(), -100_000);
        assert_eq!(r.get_f32().unwrap(), 3.5);
        assert_eq!(r.get_slice(2).unwrap(), b"id");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_writer_out_of_room() {
        let mut buf = [0u8; 3];
        let mut w = PayloadWriter::new(&mut buf);
        w.put_u16(1).unwrap();

        let result = w.put_u16(2);
        assert!(matches!(
            result,
            Err(FlexseaError::PayloadTooShort { needed: 2, remaining: 1 })
        ));
        // Failed write does not move the cursor
        assert_eq!(w.written(), 2);
        assert!(w.put_u8(3).is_ok());
    }

    #[test]
    fn test_reader_out_of_data() {
        let data = [1u8, 2, 3];
        let mut r = PayloadReader::new(&data);
        assert!(matches!(
            r.get_u32(),
            Err(FlexseaError::PayloadTooShort { needed: 4, remaining: 3 })
        ));
        r.skip(1).unwrap();
        assert_eq!(r.get_u16().unwrap(), 0x0302);
        assert!(r.get_u8().is_err());
    }
}
