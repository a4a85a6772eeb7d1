//! Record buffer writer.
//!
//! The inverse of [`ByteReader`](super::ByteReader): produces buffers in the
//! layout the structural decoder expects. Used to build object graphs for
//! dumps and tests.

use byteorder::{ByteOrder, LittleEndian};

use super::reader::FIELD_ALIGNMENT;
use crate::asset::{FormatVersion, PPtr};

/// Little-endian record writer.
#[derive(Clone, Debug)]
pub struct RecordWriter {
    buf: Vec<u8>,
    version: FormatVersion,
}

impl RecordWriter {
    /// Create a writer for objects of the given version.
    pub fn new(version: FormatVersion) -> Self {
        Self { buf: Vec::new(), version }
    }

    /// Current write position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.buf.len()
    }

    /// Version used for versioned fields.
    #[inline]
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Finish and return the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Write raw bytes.
    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    /// Pad with zeros to the field alignment.
    pub fn align(&mut self) -> &mut Self {
        while self.buf.len() % FIELD_ALIGNMENT != 0 {
            self.buf.push(0);
        }
        self
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    /// Boolean followed by realignment.
    pub fn aligned_bool(&mut self, value: bool) -> &mut Self {
        self.buf.push(value as u8);
        self.align()
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        let mut b = [0u8; 2];
        LittleEndian::write_u16(&mut b, value);
        self.bytes(&b)
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        let mut b = [0u8; 4];
        LittleEndian::write_i32(&mut b, value);
        self.bytes(&b)
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, value);
        self.bytes(&b)
    }

    pub fn i64(&mut self, value: i64) -> &mut Self {
        let mut b = [0u8; 8];
        LittleEndian::write_i64(&mut b, value);
        self.bytes(&b)
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        let mut b = [0u8; 4];
        LittleEndian::write_f32(&mut b, value);
        self.bytes(&b)
    }

    pub fn vec2(&mut self, x: f32, y: f32) -> &mut Self {
        self.f32(x).f32(y)
    }

    /// Length-prefixed string followed by realignment.
    pub fn string(&mut self, value: &str) -> &mut Self {
        self.i32(value.len() as i32).bytes(value.as_bytes()).align()
    }

    /// Length-prefixed byte array followed by realignment.
    pub fn byte_array(&mut self, data: &[u8]) -> &mut Self {
        self.i32(data.len() as i32).bytes(data).align()
    }

    /// Array length prefix.
    pub fn count(&mut self, len: usize) -> &mut Self {
        self.i32(len as i32)
    }

    /// Object reference in the version's width.
    pub fn pptr(&mut self, ptr: PPtr) -> &mut Self {
        self.i32(ptr.file_id);
        if self.version.wide_path_ids() {
            self.i64(ptr.path_id)
        } else {
            self.i32(ptr.path_id as i32)
        }
    }

    /// Common scripted-record header.
    pub fn script_header(&mut self, game_object: PPtr, script: PPtr, name: &str) -> &mut Self {
        self.pptr(game_object).aligned_bool(true).pptr(script).string(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialized::ByteReader;

    #[test]
    fn test_string_alignment() {
        let mut w = RecordWriter::new(FormatVersion::default());
        w.string("abcde").i32(3);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 4 + 8 + 4);

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_aligned_string().unwrap(), "abcde");
        assert_eq!(r.read_i32().unwrap(), 3);
    }

    #[test]
    fn test_header_size_by_version() {
        let mut wide = RecordWriter::new(FormatVersion::new(22, 2019, 4));
        wide.script_header(PPtr::local(1), PPtr::local(2), "");
        // 12 + 4 + 12 + 4
        assert_eq!(wide.pos(), 32);

        let mut narrow = RecordWriter::new(FormatVersion::new(9, 5, 0));
        narrow.script_header(PPtr::local(1), PPtr::local(2), "");
        assert_eq!(narrow.pos(), 24);
    }
}
