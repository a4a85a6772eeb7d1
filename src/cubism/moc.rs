//! Moc3 blob inspection.
//!
//! The moc blob is exported verbatim; we only peek into it for the model's
//! parameter and part ID tables and a few canvas statistics.
//!
//! Layout (all offsets absolute):
//! - `0x00` magic `MOC3`, `0x04` format version, `0x05` big-endian flag
//! - `0x40` section offset table; entries used here are the count info,
//!   canvas info, part ID and parameter ID sections
//! - ID tables are arrays of 64-byte NUL-padded strings

use crate::serialized::ByteReader;
use crate::util::{Error, Result};

pub const MOC3_MAGIC: &[u8; 4] = b"MOC3";
pub const ID_SIZE: usize = 64;

pub const VERSION_OFFSET: usize = 0x04;
pub const ENDIAN_OFFSET: usize = 0x05;
pub const COUNT_INFO_PTR: usize = 0x40;
pub const CANVAS_INFO_PTR: usize = 0x44;
pub const PART_IDS_PTR: usize = 0x4C;
pub const PARAMETER_IDS_PTR: usize = 0x108;

/// Parameter count position inside the count info section.
pub const COUNT_INFO_PARAMETERS: usize = 0x14;

/// Canvas description stored in the blob.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasInfo {
    pub pixels_per_unit: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub width: f32,
    pub height: f32,
}

/// What the extractor needs from a moc blob.
#[derive(Clone, Debug, PartialEq)]
pub struct MocInfo {
    pub version: u8,
    pub big_endian: bool,
    pub canvas: CanvasInfo,
    pub part_ids: Vec<String>,
    pub parameter_ids: Vec<String>,
}

impl MocInfo {
    /// Parse the header and ID tables of a moc3 blob.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PARAMETER_IDS_PTR + 4 || &bytes[..4] != MOC3_MAGIC {
            return Err(Error::invalid("not a moc3 blob"));
        }
        let version = bytes[VERSION_OFFSET];
        if version == 0 {
            return Err(Error::UnsupportedVersion("moc3 version 0".into()));
        }
        let big_endian = bytes[ENDIAN_OFFSET] != 0;
        let reader = ByteReader::with_byte_order(bytes, big_endian);

        let count_info = reader.u32_at(COUNT_INFO_PTR)? as usize;
        let part_count = reader.u32_at(count_info)? as usize;
        let parameter_count = reader.u32_at(count_info + COUNT_INFO_PARAMETERS)? as usize;

        let canvas = read_canvas(&reader, reader.u32_at(CANVAS_INFO_PTR)? as usize)?;
        let part_ids = read_ids(&reader, reader.u32_at(PART_IDS_PTR)? as usize, part_count)?;
        let parameter_ids = read_ids(&reader, reader.u32_at(PARAMETER_IDS_PTR)? as usize, parameter_count)?;

        Ok(Self { version, big_endian, canvas, part_ids, parameter_ids })
    }

    /// SDK release range that writes this format version.
    pub fn version_description(&self) -> &'static str {
        match self.version {
            1 => "SDK 3.0.00 - 3.2.07",
            2 => "SDK 3.3.00 - 3.3.03",
            3 => "SDK 4.0.00 - 4.1.05",
            4 => "SDK 4.2.00 - 4.2.04",
            5 => "SDK 5.0.00",
            _ => "Unknown",
        }
    }
}

fn read_canvas(reader: &ByteReader<'_>, offset: usize) -> Result<CanvasInfo> {
    let mut r = reader.clone();
    r.set_position(offset)?;
    Ok(CanvasInfo {
        pixels_per_unit: r.read_f32()?,
        origin_x: r.read_f32()?,
        origin_y: r.read_f32()?,
        width: r.read_f32()?,
        height: r.read_f32()?,
    })
}

fn read_ids(reader: &ByteReader<'_>, offset: usize, count: usize) -> Result<Vec<String>> {
    let mut r = reader.clone();
    r.set_position(offset)?;
    if count.saturating_mul(ID_SIZE) > r.remaining() {
        return Err(Error::UnexpectedEof { pos: offset, wanted: count * ID_SIZE });
    }
    (0..count).map(|_| r.read_fixed_string(ID_SIZE)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::moc_blob;

    #[test]
    fn test_parse_ids() {
        let blob = moc_blob(3, &["ParamAngleX", "ParamEyeLOpen"], &["PartCore"]);
        let info = MocInfo::parse(&blob).unwrap();
        assert_eq!(info.parameter_ids, vec!["ParamAngleX", "ParamEyeLOpen"]);
        assert_eq!(info.part_ids, vec!["PartCore"]);
        assert_eq!(info.canvas.pixels_per_unit, 100.0);
        assert_eq!(info.canvas.width, 1024.0);
        assert_eq!(info.version_description(), "SDK 4.0.00 - 4.1.05");
        assert!(!info.big_endian);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(MocInfo::parse(b"not a moc").is_err());
        let mut blob = moc_blob(1, &["A"], &[]);
        blob[0] = b'X';
        assert!(MocInfo::parse(&blob).is_err());
    }

    #[test]
    fn test_truncated_id_table() {
        let mut blob = moc_blob(1, &["ParamA", "ParamB"], &[]);
        blob.truncate(blob.len() - 10);
        assert!(MocInfo::parse(&blob).is_err());
    }
}
