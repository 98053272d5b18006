//! Forward-only byte cursor over a module's raw bytes.
//!
//! Provides LEB128 integer decoding, little-endian float decoding, length
//! prefixed names and vectors, and a viewport mechanism that restricts the
//! visible length while a nested structure (a section, a function body) is
//! being decoded.

use byteorder::{ByteOrder, LittleEndian};

use super::DecodeError;
use crate::config::DEFAULT_MAX_NESTING_DEPTH;

pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    /// Current boundary; nothing at or past this position can be read
    limit: usize,
    /// Deepest block nesting accepted inside one expression
    max_nesting: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Reader<'a> {
        Reader {
            bytes,
            pos: 0,
            limit: bytes.len(),
            max_nesting: DEFAULT_MAX_NESTING_DEPTH,
        }
    }

    pub fn with_max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth;
        self
    }

    pub fn max_nesting(&self) -> usize {
        self.max_nesting
    }
}

impl<'a> Reader<'a> {
    // Basic operations --------------------------------------------------------
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.pos
    }

    /// True once the cursor has reached the current boundary
    pub fn is_empty(&self) -> bool {
        self.pos >= self.limit
    }

    /// The error for a read that would cross the current boundary. Crossing
    /// the end of the input is truncation, crossing a viewport is an overrun.
    fn out_of_bounds(&self) -> DecodeError {
        if self.limit == self.bytes.len() {
            DecodeError::TruncatedInput(self.pos)
        } else {
            DecodeError::SectionOverrun { boundary: self.limit }
        }
    }

    /// Returns the next byte without advancing.
    pub fn peek(&self) -> Result<u8, DecodeError> {
        if self.pos < self.limit {
            Ok(self.bytes[self.pos])
        } else {
            Err(self.out_of_bounds())
        }
    }

    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    /// Advances by exactly `len` bytes and returns them.
    pub fn read(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(self.out_of_bounds());
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Runs `body` with the visible input restricted to the next `len`
    /// bytes, then restores the previous boundary and moves the cursor to
    /// the end of the viewport. Reading short is tolerated; reading past
    /// `len` fails inside `body` with [`DecodeError::SectionOverrun`].
    pub fn viewport<T, F>(&mut self, len: usize, body: F) -> Result<T, DecodeError>
    where
        F: FnOnce(&mut Self) -> Result<T, DecodeError>,
    {
        if len > self.remaining() {
            return Err(self.out_of_bounds());
        }
        let saved = self.limit;
        let boundary = self.pos + len;
        self.limit = boundary;
        let result = body(self);
        self.limit = saved;
        if result.is_ok() {
            self.pos = boundary;
        }
        result
    }

    // Read and interpret types ------------------------------------------------

    pub fn read_vu32(&mut self) -> Result<u32, DecodeError> {
        self.read_vu(32).map(|v| v as u32)
    }

    pub fn read_vu64(&mut self) -> Result<u64, DecodeError> {
        self.read_vu(64)
    }

    pub fn read_vs32(&mut self) -> Result<i32, DecodeError> {
        self.read_vs(32).map(|v| v as i32)
    }

    /// Signed 33-bit integer, the encoding of a block type index
    pub fn read_vs33(&mut self) -> Result<i64, DecodeError> {
        self.read_vs(33)
    }

    pub fn read_vs64(&mut self) -> Result<i64, DecodeError> {
        self.read_vs(64)
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(LittleEndian::read_f32(self.read(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(LittleEndian::read_f64(self.read(8)?))
    }

    /// A vec(byte) payload
    pub fn read_u8vec(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_vu32()? as usize;
        Ok(self.read(len)?.to_vec())
    }

    /// A length-prefixed UTF-8 name
    pub fn read_name(&mut self) -> Result<String, DecodeError> {
        let bytes = self.read_u8vec()?;
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
    }

    /// Reads an unsigned count followed by exactly that many elements.
    pub fn read_vec<T, F>(&mut self, mut read_one: F) -> Result<Vec<T>, DecodeError>
    where
        F: FnMut(&mut Self) -> Result<T, DecodeError>,
    {
        let count = self.read_vu32()?;
        // Every element occupies at least one byte.
        let mut items = Vec::with_capacity((count as usize).min(self.remaining()));
        for _ in 0..count {
            items.push(read_one(self)?);
        }
        Ok(items)
    }

    fn read_vu(&mut self, size: u32) -> Result<u64, DecodeError> {
        let max_bytes = (size + 6) / 7;
        let mut result: u64 = 0;
        let mut shift = 0;

        for i in 0..max_bytes {
            let b = self.read_byte()?;
            let payload = (b & 0x7f) as u64;
            if i == max_bytes - 1 {
                let spare_bits = size - shift;
                if spare_bits < 7 && (payload >> spare_bits) != 0 {
                    return Err(DecodeError::IntegerTooLong);
                }
            }
            result |= payload << shift;
            shift += 7;
            if (b & 0x80) == 0 {
                return Ok(result);
            }
        }

        Err(DecodeError::IntegerTooLong)
    }

    fn read_vs(&mut self, size: u32) -> Result<i64, DecodeError> {
        let max_bytes = (size + 6) / 7;
        let mut result: i64 = 0;
        let mut shift = 0;

        for _ in 0..max_bytes {
            let b = self.read_byte()?;
            result |= ((b & 0x7f) as i64) << shift;
            shift += 7;
            if (b & 0x80) == 0 {
                // sign-extend from the number of groups consumed
                if shift < 64 && (b & 0x40) != 0 {
                    result |= -1i64 << shift;
                }
                if size < 64 {
                    let min = -(1i64 << (size - 1));
                    let max = (1i64 << (size - 1)) - 1;
                    if result < min || result > max {
                        return Err(DecodeError::IntegerTooLong);
                    }
                }
                return Ok(result);
            }
        }

        Err(DecodeError::IntegerTooLong)
    }
}
