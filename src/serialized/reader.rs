//! Cursor-based reader over a serialized record buffer.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::asset::{FormatVersion, PPtr};
use crate::util::{Error, Result};

/// Alignment applied after strings, byte arrays and aligned flags.
pub const FIELD_ALIGNMENT: usize = 4;

/// Bounds-checked reader with absolute positioning.
///
/// Every read fails with [`Error::UnexpectedEof`] instead of panicking when
/// the buffer is too short.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    big_endian: bool,
}

impl<'a> ByteReader<'a> {
    /// Little-endian reader at position 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, big_endian: false }
    }

    /// Reader with explicit byte order.
    pub fn with_byte_order(data: &'a [u8], big_endian: bool) -> Self {
        Self { data, pos: 0, big_endian }
    }

    /// Current position.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move to an absolute position (may equal the length).
    pub fn set_position(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::UnexpectedEof { pos, wanted: 0 });
        }
        self.pos = pos;
        Ok(())
    }

    /// Total buffer length.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for an empty buffer.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Borrow the next `len` bytes and advance.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::UnexpectedEof { pos: self.pos, wanted: len })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Skip `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    /// Advance to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let rem = self.pos % alignment;
        if rem != 0 {
            let target = self.pos + alignment - rem;
            // A record may legitimately end on an unaligned byte.
            self.pos = target.min(self.data.len());
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(if self.big_endian { BigEndian::read_u16(b) } else { LittleEndian::read_u16(b) })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(if self.big_endian { BigEndian::read_u32(b) } else { LittleEndian::read_u32(b) })
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let b = self.take(4)?;
        Ok(if self.big_endian { BigEndian::read_i32(b) } else { LittleEndian::read_i32(b) })
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let b = self.take(8)?;
        Ok(if self.big_endian { BigEndian::read_i64(b) } else { LittleEndian::read_i64(b) })
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let b = self.take(4)?;
        Ok(if self.big_endian { BigEndian::read_f32(b) } else { LittleEndian::read_f32(b) })
    }

    /// Read an element count, rejecting negative values and counts that
    /// could not possibly fit in the rest of the buffer.
    pub fn read_count(&mut self, min_element_size: usize) -> Result<usize> {
        let pos = self.pos;
        let count = self.read_i32()?;
        if count < 0 {
            return Err(Error::invalid(format!("negative array length {} at {}", count, pos)));
        }
        let count = count as usize;
        if count.saturating_mul(min_element_size.max(1)) > self.remaining() && min_element_size > 0 {
            return Err(Error::UnexpectedEof { pos: self.pos, wanted: count * min_element_size });
        }
        Ok(count)
    }

    /// Length-prefixed UTF-8 string, realigned afterwards.
    pub fn read_aligned_string(&mut self) -> Result<String> {
        let len = self.read_count(1)?;
        let bytes = self.take(len)?;
        let s = String::from_utf8(bytes.to_vec())?;
        self.align(FIELD_ALIGNMENT)?;
        Ok(s)
    }

    /// Length-prefixed byte array, realigned afterwards.
    pub fn read_byte_array(&mut self) -> Result<Vec<u8>> {
        let len = self.read_count(1)?;
        let bytes = self.take(len)?.to_vec();
        self.align(FIELD_ALIGNMENT)?;
        Ok(bytes)
    }

    /// Fixed-size, NUL-padded string field.
    pub fn read_fixed_string(&mut self, size: usize) -> Result<String> {
        let bytes = self.take(size)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(size);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Object reference; path id width depends on the format version.
    pub fn read_pptr(&mut self, version: &FormatVersion) -> Result<PPtr> {
        let file_id = self.read_i32()?;
        let path_id = if version.wide_path_ids() {
            self.read_i64()?
        } else {
            self.read_i32()? as i64
        };
        Ok(PPtr { file_id, path_id })
    }

    /// Two consecutive floats.
    pub fn read_vec2(&mut self) -> Result<glam::Vec2> {
        Ok(glam::Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    /// u32 at an absolute offset, without moving the cursor.
    pub fn u32_at(&self, pos: usize) -> Result<u32> {
        let mut r = self.clone();
        r.set_position(pos)?;
        r.read_u32()
    }
}
