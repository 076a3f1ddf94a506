//! Buffer utilities for reading and writing MariaDB protocol data.
//!
//! All multi-byte integers on the wire are little-endian.

use crate::error::{Error, Result};
use crate::protocol::constants::*;
use bytes::{BufMut, Bytes, BytesMut};

/// A cursor over one packet payload.
pub struct ReadBuffer {
    data: Bytes,
    pos: usize,
}

impl ReadBuffer {
    /// Create a new read buffer from bytes.
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a read buffer over a copy of `data`.
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Get the current position in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get the remaining bytes in the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if the buffer has at least `n` bytes remaining.
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    #[track_caller]
    fn ensure(&self, n: usize) -> Result<()> {
        if !self.has_remaining(n) {
            return Err(Error::BufferTooSmall {
                needed: n,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    /// Skip `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Peek at the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.data[self.pos])
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    /// Read a signed byte.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a little-endian u16.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    /// Read a little-endian i16.
    pub fn read_i16_le(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.take()?))
    }

    /// Read a little-endian 3-byte unsigned integer.
    pub fn read_u24_le(&mut self) -> Result<u32> {
        let [b0, b1, b2] = self.take::<3>()?;
        Ok(u32::from_le_bytes([b0, b1, b2, 0]))
    }

    /// Read a little-endian 3-byte signed integer.
    pub fn read_i24_le(&mut self) -> Result<i32> {
        let v = self.read_u24_le()?;
        Ok(((v << 8) as i32) >> 8)
    }

    /// Read a little-endian u32.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    /// Read a little-endian i32.
    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    /// Read a little-endian u64.
    pub fn read_u64_le(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    /// Read a little-endian i64.
    pub fn read_i64_le(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    /// Read a little-endian IEEE-754 float.
    pub fn read_f32_le(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    /// Read a little-endian IEEE-754 double.
    pub fn read_f64_le(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    /// Read raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        self.ensure(n)?;
        let bytes = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(bytes)
    }

    /// Read raw bytes into an owned vector.
    pub fn read_vec(&mut self, n: usize) -> Result<Vec<u8>> {
        self.ensure(n)?;
        let v = self.data[self.pos..self.pos + n].to_vec();
        self.pos += n;
        Ok(v)
    }

    /// Read `n` bytes as a UTF-8 string (lossy).
    pub fn read_string(&mut self, n: usize) -> Result<String> {
        self.ensure(n)?;
        let s = String::from_utf8_lossy(&self.data[self.pos..self.pos + n]).into_owned();
        self.pos += n;
        Ok(s)
    }

    /// Read `n` bytes of ASCII text.
    pub fn read_ascii(&mut self, n: usize) -> Result<String> {
        self.read_string(n)
    }

    /// Read everything left in the buffer.
    pub fn read_remaining(&mut self) -> Bytes {
        let bytes = self.data.slice(self.pos..);
        self.pos = self.data.len();
        bytes
    }

    /// Read a NUL-terminated byte run (terminator consumed, not returned).
    ///
    /// A missing terminator consumes the rest of the buffer.
    pub fn read_null_terminated(&mut self) -> Bytes {
        let rest = &self.data[self.pos..];
        match rest.iter().position(|&b| b == 0) {
            Some(end) => {
                let bytes = self.data.slice(self.pos..self.pos + end);
                self.pos += end + 1;
                bytes
            }
            None => self.read_remaining(),
        }
    }

    /// Read a length-encoded integer. Returns `None` for the NULL marker.
    pub fn read_length_encoded(&mut self) -> Result<Option<u64>> {
        let first = self.read_u8()?;
        match first {
            LENENC_NULL => Ok(None),
            LENENC_U16 => Ok(Some(self.read_u16_le()? as u64)),
            LENENC_U24 => Ok(Some(self.read_u24_le()? as u64)),
            LENENC_U64 => Ok(Some(self.read_u64_le()?)),
            v => Ok(Some(v as u64)),
        }
    }

    /// Read bytes with a length-encoded prefix.
    pub fn read_lenenc_bytes(&mut self) -> Result<Option<Bytes>> {
        match self.read_length_encoded()? {
            Some(len) => Ok(Some(self.read_bytes(len as usize)?)),
            None => Ok(None),
        }
    }

    /// Read a string with a length-encoded prefix.
    pub fn read_lenenc_string(&mut self) -> Result<Option<String>> {
        Ok(self
            .read_lenenc_bytes()?
            .map(|b| String::from_utf8_lossy(&b).into_owned()))
    }
}

/// A sink for building packet payloads.
pub struct WriteBuffer {
    data: BytesMut,
}

impl WriteBuffer {
    /// Create a new write buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new write buffer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
        }
    }

    /// Get the current length of the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the buffer contents as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Freeze the buffer into immutable bytes.
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, val: u8) {
        self.data.put_u8(val);
    }

    /// Write a little-endian u16.
    pub fn write_u16_le(&mut self, val: u16) {
        self.data.put_u16_le(val);
    }

    /// Write a little-endian 3-byte integer.
    pub fn write_u24_le(&mut self, val: u32) {
        self.data.extend_from_slice(&val.to_le_bytes()[..3]);
    }

    /// Write a little-endian u32.
    pub fn write_u32_le(&mut self, val: u32) {
        self.data.put_u32_le(val);
    }

    /// Write a little-endian u64.
    pub fn write_u64_le(&mut self, val: u64) {
        self.data.put_u64_le(val);
    }

    /// Write a little-endian f32.
    pub fn write_f32_le(&mut self, val: f32) {
        self.data.put_f32_le(val);
    }

    /// Write a little-endian f64.
    pub fn write_f64_le(&mut self, val: f64) {
        self.data.put_f64_le(val);
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Write ASCII text without any escaping.
    pub fn write_ascii(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Write a length-encoded integer.
    pub fn write_length(&mut self, len: u64) {
        if len < LENENC_NULL as u64 {
            self.write_u8(len as u8);
        } else if len < 0x1_0000 {
            self.write_u8(LENENC_U16);
            self.write_u16_le(len as u16);
        } else if len < 0x100_0000 {
            self.write_u8(LENENC_U24);
            self.write_u24_le(len as u32);
        } else {
            self.write_u8(LENENC_U64);
            self.write_u64_le(len);
        }
    }

    /// Write bytes with a length-encoded prefix.
    pub fn write_lenenc_bytes(&mut self, bytes: &[u8]) {
        self.write_length(bytes.len() as u64);
        self.write_bytes(bytes);
    }

    /// Write bytes followed by a NUL terminator.
    pub fn write_null_terminated(&mut self, bytes: &[u8]) {
        self.write_bytes(bytes);
        self.write_u8(0);
    }

    /// Write bytes for use inside a single-quoted SQL literal.
    ///
    /// With `no_backslash_escapes` only quotes are doubled; otherwise quote,
    /// double quote, backslash and NUL are backslash-escaped.
    pub fn write_bytes_escaped(&mut self, bytes: &[u8], no_backslash_escapes: bool) {
        self.data.reserve(bytes.len() + bytes.len() / 8);
        if no_backslash_escapes {
            for &b in bytes {
                if b == b'\'' {
                    self.write_u8(b'\'');
                }
                self.write_u8(b);
            }
        } else {
            for &b in bytes {
                match b {
                    0 => self.write_bytes(b"\\0"),
                    b'\'' | b'"' | b'\\' => {
                        self.write_u8(b'\\');
                        self.write_u8(b);
                    }
                    _ => self.write_u8(b),
                }
            }
        }
    }

    /// Write a string for use inside a single-quoted SQL literal.
    pub fn write_string_escaped(&mut self, s: &str, no_backslash_escapes: bool) {
        self.write_bytes_escaped(s.as_bytes(), no_backslash_escapes);
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}
