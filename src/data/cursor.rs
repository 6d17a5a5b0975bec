//! Bounds-checked big-endian reader/writer over an in-memory byte buffer.
//!
//! All positions are absolute byte offsets from the start of the buffer.
//! `seek` and `skip` never validate; a position past the end of the buffer
//! surfaces as [`DlpError::TruncatedInput`] on the next read or write.

use winnow::Parser;
use winnow::binary::{be_f32, be_i16, be_i32, be_u8};

use crate::data::parser_utils::{WResult, decode_c_string, encode_c_string};
use crate::error::{DlpError, DlpResult, Section};

#[derive(Debug, Default, Clone)]
pub struct BinaryCursor {
    buf: Vec<u8>,
    pos: usize,
}

impl BinaryCursor {
    /// An empty cursor for encoding.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    /// A cursor positioned at the start of `bytes`.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            buf: bytes.into(),
            pos: 0,
        }
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, offset: usize) -> usize {
        self.pos = offset;
        self.pos
    }

    pub fn skip(&mut self, count: usize) -> usize {
        self.pos = self.pos.saturating_add(count);
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes left between the position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn truncated(&self, needed: usize) -> DlpError {
        DlpError::TruncatedInput {
            section: Section::Record,
            offset: self.pos,
            needed,
            available: self.remaining(),
        }
    }

    /// Run a winnow parser over exactly `width` bytes at the current position.
    fn parse_exact<O>(
        &mut self,
        width: usize,
        mut parser: impl FnMut(&mut &[u8]) -> WResult<O>,
    ) -> DlpResult<O> {
        if self.remaining() < width {
            return Err(self.truncated(width));
        }
        let input = &mut &self.buf[self.pos..self.pos + width];
        let value = parser(input).map_err(|_| self.truncated(width))?;
        self.pos += width;
        Ok(value)
    }

    /// Take `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> DlpResult<&[u8]> {
        if self.remaining() < len {
            return Err(self.truncated(len));
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    pub fn read_u8(&mut self) -> DlpResult<u8> {
        self.parse_exact(1, |input| be_u8.parse_next(input))
    }

    pub fn read_i16(&mut self) -> DlpResult<i16> {
        self.parse_exact(2, |input| be_i16.parse_next(input))
    }

    pub fn read_i32(&mut self) -> DlpResult<i32> {
        self.parse_exact(4, |input| be_i32.parse_next(input))
    }

    pub fn read_f32(&mut self) -> DlpResult<f32> {
        self.parse_exact(4, |input| be_f32.parse_next(input))
    }

    /// Read an `i32` element count, rejecting negative values.
    pub fn read_count(&mut self) -> DlpResult<usize> {
        let count = self.read_i32()?;
        usize::try_from(count).map_err(|_| DlpError::InvalidCount {
            section: Section::Record,
            count,
        })
    }

    /// Read an `n`-byte field and return the text before its first NUL.
    pub fn read_fixed_string(&mut self, n: usize) -> DlpResult<String> {
        Ok(decode_c_string(self.read_bytes(n)?))
    }

    /// Read an `i32` length followed by that many bytes, verbatim.
    pub fn read_length_prefixed(&mut self) -> DlpResult<Vec<u8>> {
        let len = self.read_count()?;
        Ok(self.read_bytes(len)?.to_vec())
    }

    pub fn read_array<T>(
        &mut self,
        count: usize,
        mut element: impl FnMut(&mut Self) -> DlpResult<T>,
    ) -> DlpResult<Vec<T>> {
        // The count comes from the file; don't trust it for the allocation.
        let mut values = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            values.push(element(self)?);
        }
        Ok(values)
    }

    /// Write `bytes` at the current position, overwriting or appending.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> DlpResult<()> {
        if self.pos > self.buf.len() {
            return Err(self.truncated(bytes.len()));
        }
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> DlpResult<()> {
        self.write_bytes(&[value])
    }

    pub fn write_i16(&mut self, value: i16) -> DlpResult<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_i32(&mut self, value: i32) -> DlpResult<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_f32(&mut self, value: f32) -> DlpResult<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Write an element count as `i32`.
    pub fn write_count(&mut self, field: &'static str, count: usize) -> DlpResult<()> {
        let count = i32::try_from(count).map_err(|_| DlpError::FieldTooLong {
            field,
            len: count,
            capacity: i32::MAX as usize,
        })?;
        self.write_i32(count)
    }

    /// Write `value` into an `n`-byte NUL-padded field, one byte per
    /// character. There must be room for at least one terminating NUL.
    pub fn write_fixed_string(
        &mut self,
        field: &'static str,
        value: &str,
        n: usize,
    ) -> DlpResult<()> {
        let bytes = encode_c_string(field, value)?;
        if bytes.len() >= n {
            return Err(DlpError::FieldTooLong {
                field,
                len: bytes.len(),
                capacity: n,
            });
        }
        let mut padded = vec![0u8; n];
        padded[..bytes.len()].copy_from_slice(&bytes);
        self.write_bytes(&padded)
    }

    pub fn write_length_prefixed(&mut self, field: &'static str, value: &[u8]) -> DlpResult<()> {
        self.write_count(field, value.len())?;
        self.write_bytes(value)
    }

    pub fn write_array<T>(
        &mut self,
        values: &[T],
        mut element: impl FnMut(&mut Self, &T) -> DlpResult<()>,
    ) -> DlpResult<()> {
        for value in values {
            element(self, value)?;
        }
        Ok(())
    }
}
