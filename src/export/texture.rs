//! Texture decoding and PNG output.
//!
//! Texture buffers are stored bottom-up; rows are flipped before encoding.
//! Names are reserved in load order so collision suffixes are stable, then
//! images are encoded (optionally in parallel).

use std::collections::HashSet;
use std::path::Path;

use image::{ImageFormat, RgbaImage};
use rayon::prelude::*;
use tracing::{debug, warn};

use super::names::NameTable;
use crate::asset::{AssetObject, AssetProvider, ObjectId};
use crate::serialized::{Record, RecordKind, StructuralDecoder};
use crate::util::{Error, Result};

/// Directory (relative to the model directory) holding textures.
pub const TEXTURE_DIR: &str = "textures";

/// Pixel layouts we can decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Alpha8,
    Rgb24,
    Rgba32,
    Argb32,
    Bgra32,
}

impl PixelFormat {
    pub fn from_raw(raw: i32) -> Result<Self> {
        match raw {
            1 => Ok(Self::Alpha8),
            3 => Ok(Self::Rgb24),
            4 => Ok(Self::Rgba32),
            5 => Ok(Self::Argb32),
            14 => Ok(Self::Bgra32),
            other => Err(Error::Image(format!("unsupported texture format {}", other))),
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Alpha8 => 1,
            Self::Rgb24 => 3,
            Self::Rgba32 | Self::Argb32 | Self::Bgra32 => 4,
        }
    }

    fn to_rgba(self, px: &[u8]) -> [u8; 4] {
        match self {
            Self::Alpha8 => [255, 255, 255, px[0]],
            Self::Rgb24 => [px[0], px[1], px[2], 255],
            Self::Rgba32 => [px[0], px[1], px[2], px[3]],
            Self::Argb32 => [px[1], px[2], px[3], px[0]],
            Self::Bgra32 => [px[2], px[1], px[0], px[3]],
        }
    }
}

/// Decode a `Texture2D` record into an upright RGBA image.
pub fn decode_image(record: &Record) -> Result<RgbaImage> {
    let name = record.str("m_Name").unwrap_or_default();
    let width = u32::try_from(record.i32("m_Width").unwrap_or(0)).unwrap_or(0);
    let height = u32::try_from(record.i32("m_Height").unwrap_or(0)).unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(Error::Image(format!("texture '{}' has no size", name)));
    }
    let format = PixelFormat::from_raw(record.i32("m_TextureFormat").unwrap_or(-1))?;
    let data = record.bytes("image data").unwrap_or_default();
    if data.is_empty() {
        return Err(Error::Image(format!("texture '{}' has no inline pixel data", name)));
    }

    let bpp = format.bytes_per_pixel();
    let row = width as usize * bpp;
    let needed = row * height as usize;
    if data.len() < needed {
        return Err(Error::Image(format!(
            "texture '{}' holds {} bytes, {}x{} needs {}",
            name,
            data.len(),
            width,
            height,
            needed
        )));
    }

    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    for src in data[..needed].chunks_exact(row).rev() {
        for px in src.chunks_exact(bpp) {
            rgba.extend_from_slice(&format.to_rgba(px));
        }
    }
    RgbaImage::from_raw(width, height, rgba).ok_or_else(|| Error::Image(format!("texture '{}': bad buffer", name)))
}

struct Job {
    record: Record,
    file: String,
}

/// Write each distinct texture as `textures/<name>.png` under `dir`.
///
/// Returns the relative paths actually written, sorted. Textures that fail
/// to decode or collide twice are skipped with a diagnostic.
pub fn export_textures<P: AssetProvider + ?Sized>(
    dec: StructuralDecoder<'_, P>,
    textures: &[&AssetObject],
    dir: &Path,
    parallel: bool,
) -> Result<Vec<String>> {
    let names = NameTable::new();
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut jobs = Vec::with_capacity(textures.len());
    for tex in textures {
        if !seen.insert(tex.id) {
            continue;
        }
        let record = match dec.try_decode(tex, RecordKind::Texture2D) {
            Ok(r) => r,
            Err(e) => {
                warn!("texture {} not decoded: {}", tex.id, e);
                continue;
            }
        };
        let name = record.str("m_Name").unwrap_or_default().to_string();
        if let Some(file) = names.reserve("texture", &name, tex.id.path_id) {
            jobs.push(Job { record, file: format!("{}/{}.png", TEXTURE_DIR, file) });
        }
    }
    if jobs.is_empty() {
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(dir.join(TEXTURE_DIR))?;

    let write = |job: &Job| -> Option<String> {
        let result = decode_image(&job.record).and_then(|img| {
            img.save_with_format(dir.join(&job.file), ImageFormat::Png)
                .map_err(|e| Error::Image(e.to_string()))
        });
        match result {
            Ok(()) => {
                debug!("wrote {}", job.file);
                Some(job.file.clone())
            }
            Err(e) => {
                warn!("{} not written: {}", job.file, e);
                None
            }
        }
    };
    let mut written: Vec<String> = if parallel {
        jobs.par_iter().filter_map(write).collect()
    } else {
        jobs.iter().filter_map(write).collect()
    };
    written.sort();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialized::Value;

    fn texture(format: i32, w: i32, h: i32, data: Vec<u8>) -> Record {
        let mut r = Record::new();
        r.push("m_Name", Value::String("tex".into()));
        r.push("m_Width", Value::Int32(w));
        r.push("m_Height", Value::Int32(h));
        r.push("m_TextureFormat", Value::Int32(format));
        r.push("image data", Value::Bytes(data));
        r
    }

    #[test]
    fn test_rows_are_flipped() {
        // bottom row red, top row blue
        let data = vec![255, 0, 0, 255, 0, 0, 255, 255];
        let img = decode_image(&texture(4, 1, 2, data)).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_channel_orders() {
        let img = decode_image(&texture(5, 1, 1, vec![9, 1, 2, 3])).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3, 9]);
        let img = decode_image(&texture(14, 1, 1, vec![3, 2, 1, 9])).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3, 9]);
    }

    #[test]
    fn test_rejects_short_and_unknown() {
        assert!(decode_image(&texture(4, 2, 2, vec![0; 8])).is_err());
        assert!(decode_image(&texture(47, 1, 1, vec![0; 4])).is_err());
        assert!(decode_image(&texture(4, 1, 1, vec![])).is_err());
    }
}
