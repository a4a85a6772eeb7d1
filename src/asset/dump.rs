//! On-disk object dumps.
//!
//! A dump directory holds `index.json` (source files and object table) and
//! `objects.bin` (all object buffers back to back). The blob is memory
//! mapped when possible and copied into a [`MemoryProvider`].

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{AssetProvider, FormatVersion, MemoryProvider, ObjectKind};
use crate::util::{Error, Result};

pub const INDEX_FILE: &str = "index.json";
pub const BLOB_FILE: &str = "objects.bin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub serialized: u32,
    pub engine: (u16, u16),
    #[serde(default)]
    pub externals: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub file: u32,
    pub path_id: i64,
    pub kind: String,
    pub offset: u64,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DumpIndex {
    pub files: Vec<FileEntry>,
    pub objects: Vec<ObjectEntry>,
}

enum Blob {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Blob {
    fn open(path: &Path, use_mmap: bool) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        let size = file.metadata()?.len();
        if use_mmap && size > 0 {
            // Safety: read-only mapping; the dump is not modified while loading
            match unsafe { Mmap::map(&file) } {
                Ok(map) => return Ok(Self::Mmap(map)),
                Err(e) => warn!("mmap of {} failed ({}), reading instead", path.display(), e),
            }
        }
        Ok(Self::Owned(std::fs::read(path)?))
    }

    fn bytes(&self) -> &[u8] {
        match self {
            Self::Mmap(map) => &map[..],
            Self::Owned(v) => v.as_slice(),
        }
    }
}

/// Load a dump directory.
pub fn load(dir: impl AsRef<Path>) -> Result<MemoryProvider> {
    load_opts(dir, true)
}

/// Load a dump directory, optionally without memory mapping.
///
/// Objects outside the blob or with an unknown file index are skipped.
pub fn load_opts(dir: impl AsRef<Path>, use_mmap: bool) -> Result<MemoryProvider> {
    let dir = dir.as_ref();
    let index_path = dir.join(INDEX_FILE);
    if !index_path.exists() {
        return Err(Error::FileNotFound(index_path));
    }
    let index: DumpIndex = serde_json::from_slice(&std::fs::read(&index_path)?)?;
    let blob = Blob::open(&dir.join(BLOB_FILE), use_mmap)?;
    let bytes = blob.bytes();

    let mut provider = MemoryProvider::new();
    for f in &index.files {
        provider.add_file(f.name.as_str(), FormatVersion::new(f.serialized, f.engine.0, f.engine.1));
    }
    for (i, f) in index.files.iter().enumerate() {
        for &target in &f.externals {
            provider.add_external(i as u32, target);
        }
    }

    let mut skipped = 0usize;
    for entry in &index.objects {
        let range = usize::try_from(entry.offset)
            .ok()
            .zip(usize::try_from(entry.size).ok())
            .and_then(|(start, len)| Some(start..start.checked_add(len)?))
            .filter(|r| r.end <= bytes.len());
        let (Some(range), true) = (range, (entry.file as usize) < index.files.len()) else {
            debug!("object {}:{} out of range, skipped", entry.file, entry.path_id);
            skipped += 1;
            continue;
        };
        let id = provider.add_object(entry.file, entry.path_id, ObjectKind::from_name(&entry.kind), bytes[range].to_vec());
        if let Some(container) = &entry.container {
            provider.set_container(id, container.as_str());
        }
    }
    if skipped > 0 {
        warn!("{} object(s) in {} could not be loaded", skipped, dir.display());
    }
    info!("loaded {} object(s) from {} file(s)", provider.len(), index.files.len());
    Ok(provider)
}

fn kind_name(kind: ObjectKind) -> String {
    match kind {
        ObjectKind::Unknown(id) => format!("Unknown{}", id),
        other => format!("{:?}", other),
    }
}

/// Write `provider` as a dump directory (created if needed).
pub fn save(provider: &MemoryProvider, dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let mut index = DumpIndex::default();
    for f in provider.files() {
        index.files.push(FileEntry {
            name: f.name.clone(),
            serialized: f.version.serialized,
            engine: f.version.engine,
            externals: f.externals.clone(),
        });
    }
    let mut blob = Vec::new();
    for obj in provider.objects() {
        index.objects.push(ObjectEntry {
            file: obj.id.file,
            path_id: obj.id.path_id,
            kind: kind_name(obj.kind),
            offset: blob.len() as u64,
            size: obj.data().len() as u64,
            container: obj.container.clone(),
        });
        blob.extend_from_slice(obj.data());
    }
    std::fs::write(dir.join(BLOB_FILE), blob)?;
    std::fs::write(dir.join(INDEX_FILE), serde_json::to_vec_pretty(&index)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{ObjectId, PPtr};

    fn sample() -> MemoryProvider {
        let mut p = MemoryProvider::new();
        let a = p.add_file("a.bundle", FormatVersion::new(17, 2019, 4));
        let b = p.add_file("b.bundle", FormatVersion::new(9, 5, 4));
        p.add_external(a, b);
        let tex = p.add_object(a, 3, ObjectKind::Texture2D, vec![1, 2, 3]);
        p.set_container(tex, "assets/hiyori/tex.png");
        p.add_object(b, 7, ObjectKind::MonoBehaviour, vec![9; 10]);
        p
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        save(&sample(), dir.path()).unwrap();
        for use_mmap in [true, false] {
            let p = load_opts(dir.path(), use_mmap).unwrap();
            assert_eq!(p.len(), 2);
            let tex = p.get(ObjectId::new(0, 3)).unwrap();
            assert_eq!(tex.data(), &[1, 2, 3]);
            assert_eq!(tex.container(), Some("assets/hiyori/tex.png"));
            assert_eq!(tex.version, FormatVersion::new(17, 2019, 4));
            let mb = p.resolve(tex, PPtr::new(1, 7)).unwrap();
            assert_eq!(mb.kind, ObjectKind::MonoBehaviour);
            assert_eq!(mb.version.engine, (5, 4));
        }
    }

    #[test]
    fn test_out_of_range_objects_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let index = DumpIndex {
            files: vec![FileEntry { name: "a".into(), serialized: 22, engine: (2019, 4), externals: vec![] }],
            objects: vec![
                ObjectEntry { file: 0, path_id: 1, kind: "Texture2D".into(), offset: 0, size: 4, container: None },
                ObjectEntry { file: 0, path_id: 2, kind: "Texture2D".into(), offset: 2, size: 40, container: None },
                ObjectEntry { file: 5, path_id: 3, kind: "Texture2D".into(), offset: 0, size: 1, container: None },
            ],
        };
        std::fs::write(dir.path().join(INDEX_FILE), serde_json::to_vec(&index).unwrap()).unwrap();
        std::fs::write(dir.path().join(BLOB_FILE), [0u8; 4]).unwrap();
        let p = load(dir.path()).unwrap();
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load(dir.path()), Err(Error::FileNotFound(_))));
    }
}
