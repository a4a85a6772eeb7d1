//! In-memory object graph.

use std::collections::HashMap;

use super::{AssetObject, AssetProvider, FormatVersion, ObjectId, ObjectKind, PPtr};

/// One loaded source file (bundle or serialized file).
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub name: String,
    pub version: FormatVersion,
    /// External table: file index for each `file_id - 1`.
    pub externals: Vec<u32>,
}

/// Provider backed by owned buffers.
///
/// Used by the dump loader and by tests to assemble object graphs directly.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    files: Vec<SourceFile>,
    objects: Vec<AssetObject>,
    index: HashMap<ObjectId, usize>,
}

impl MemoryProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source file and return its index.
    pub fn add_file(&mut self, name: impl Into<String>, version: FormatVersion) -> u32 {
        self.files.push(SourceFile {
            name: name.into(),
            version,
            externals: Vec::new(),
        });
        (self.files.len() - 1) as u32
    }

    /// Append `target` to `file`'s external table, returning the `file_id`
    /// that references it from inside `file`.
    pub fn add_external(&mut self, file: u32, target: u32) -> i32 {
        match self.files.get_mut(file as usize) {
            Some(f) => {
                f.externals.push(target);
                f.externals.len() as i32
            }
            None => 0,
        }
    }

    /// Add an object; it inherits the file's format version.
    ///
    /// Adding the same identity twice replaces the earlier buffer.
    pub fn add_object(&mut self, file: u32, path_id: i64, kind: ObjectKind, data: Vec<u8>) -> ObjectId {
        let id = ObjectId::new(file, path_id);
        let version = self
            .files
            .get(file as usize)
            .map(|f| f.version)
            .unwrap_or_default();
        let obj = AssetObject::new(id, kind, version, data);
        match self.index.get(&id) {
            Some(&slot) => self.objects[slot] = obj,
            None => {
                self.index.insert(id, self.objects.len());
                self.objects.push(obj);
            }
        }
        id
    }

    /// Attach a container path to an object.
    pub fn set_container(&mut self, id: ObjectId, container: impl Into<String>) {
        if let Some(&slot) = self.index.get(&id) {
            self.objects[slot].container = Some(container.into());
        }
    }

    /// Loaded source files.
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Number of loaded objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True if nothing was loaded.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl AssetProvider for MemoryProvider {
    fn objects(&self) -> &[AssetObject] {
        &self.objects
    }

    fn get(&self, id: ObjectId) -> Option<&AssetObject> {
        self.index.get(&id).map(|&slot| &self.objects[slot])
    }

    fn resolve(&self, owner: &AssetObject, ptr: PPtr) -> Option<&AssetObject> {
        if ptr.is_null() || ptr.file_id < 0 {
            return None;
        }
        let file = if ptr.file_id == 0 {
            owner.id.file
        } else {
            let source = self.files.get(owner.id.file as usize)?;
            *source.externals.get(ptr.file_id as usize - 1)?
        };
        self.get(ObjectId::new(file, ptr.path_id))
    }

    fn source_name(&self, file: u32) -> Option<&str> {
        self.files.get(file as usize).map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_local_and_external() {
        let mut p = MemoryProvider::new();
        let a = p.add_file("a.bundle", FormatVersion::default());
        let b = p.add_file("b.bundle", FormatVersion::default());
        let ext = p.add_external(a, b);
        let owner = p.add_object(a, 1, ObjectKind::MonoBehaviour, vec![]);
        p.add_object(a, 2, ObjectKind::GameObject, vec![]);
        p.add_object(b, 2, ObjectKind::Texture2D, vec![]);

        let owner = p.get(owner).unwrap();
        assert_eq!(p.resolve(owner, PPtr::local(2)).unwrap().kind, ObjectKind::GameObject);
        assert_eq!(p.resolve(owner, PPtr::new(ext, 2)).unwrap().kind, ObjectKind::Texture2D);
        assert!(p.resolve(owner, PPtr::NULL).is_none());
        assert!(p.resolve(owner, PPtr::new(7, 2)).is_none());
        assert!(p.resolve(owner, PPtr::local(99)).is_none());
    }

    #[test]
    fn test_container_and_replace() {
        let mut p = MemoryProvider::new();
        let f = p.add_file("a", FormatVersion::default());
        let id = p.add_object(f, 3, ObjectKind::Texture2D, vec![1]);
        p.set_container(id, "assets/x/tex.png");
        p.add_object(f, 3, ObjectKind::Texture2D, vec![2]);
        assert_eq!(p.len(), 1);
        assert_eq!(p.get(id).unwrap().data(), &[2]);
        assert_eq!(p.source_name(f), Some("a"));
    }
}
