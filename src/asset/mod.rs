//! Object-graph provider interface.
//!
//! The upstream extraction layer hands us a flat list of [`AssetObject`]s,
//! each a raw serialized buffer plus a kind tag, a format version and an
//! optional container path. Cross-references between objects are stored
//! inside the buffers as [`PPtr`]s and are always resolved through the
//! [`AssetProvider`]; nothing in the extractor keeps object pointers around.

mod memory;
pub mod dump;

pub use memory::*;

use std::fmt;

use crate::serialized::ByteReader;

/// Serialized cross-reference to another object.
///
/// `file_id == 0` points into the owner's own source file, `n > 0` indexes
/// the owner file's external table (1-based). `path_id == 0` is null.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PPtr {
    pub file_id: i32,
    pub path_id: i64,
}

impl PPtr {
    /// Null reference.
    pub const NULL: Self = Self { file_id: 0, path_id: 0 };

    /// Create a reference.
    pub const fn new(file_id: i32, path_id: i64) -> Self {
        Self { file_id, path_id }
    }

    /// Reference into the owner's own file.
    pub const fn local(path_id: i64) -> Self {
        Self { file_id: 0, path_id }
    }

    /// Check for the null reference.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.path_id == 0
    }
}

/// Unique object identity: source file index plus path id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    pub file: u32,
    pub path_id: i64,
}

impl ObjectId {
    pub const fn new(file: u32, path_id: i64) -> Self {
        Self { file, path_id }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.path_id)
    }
}

/// Object type tag assigned by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    GameObject,
    Transform,
    MonoBehaviour,
    MonoScript,
    Texture2D,
    AnimationClip,
    AssetBundle,
    ResourceManager,
    PreloadData,
    Animator,
    TextAsset,
    Unknown(i32),
}

impl ObjectKind {
    /// Class id as used by the engine's serialized files.
    pub const fn class_id(self) -> i32 {
        match self {
            Self::GameObject => 1,
            Self::Transform => 4,
            Self::Texture2D => 28,
            Self::TextAsset => 49,
            Self::AnimationClip => 74,
            Self::Animator => 95,
            Self::MonoBehaviour => 114,
            Self::MonoScript => 115,
            Self::PreloadData => 150,
            Self::AssetBundle => 142,
            Self::ResourceManager => 147,
            Self::Unknown(id) => id,
        }
    }

    /// Map an engine class id to a kind.
    pub const fn from_class_id(id: i32) -> Self {
        match id {
            1 => Self::GameObject,
            4 => Self::Transform,
            28 => Self::Texture2D,
            49 => Self::TextAsset,
            74 => Self::AnimationClip,
            95 => Self::Animator,
            114 => Self::MonoBehaviour,
            115 => Self::MonoScript,
            142 => Self::AssetBundle,
            147 => Self::ResourceManager,
            150 => Self::PreloadData,
            other => Self::Unknown(other),
        }
    }

    /// Parse a kind from its name (as written in dump indexes).
    pub fn from_name(name: &str) -> Self {
        match name {
            "GameObject" => Self::GameObject,
            "Transform" => Self::Transform,
            "MonoBehaviour" => Self::MonoBehaviour,
            "MonoScript" => Self::MonoScript,
            "Texture2D" => Self::Texture2D,
            "AnimationClip" => Self::AnimationClip,
            "AssetBundle" => Self::AssetBundle,
            "ResourceManager" => Self::ResourceManager,
            "PreloadData" => Self::PreloadData,
            "Animator" => Self::Animator,
            "TextAsset" => Self::TextAsset,
            _ => Self::Unknown(-1),
        }
    }
}

/// Version information carried by every object.
///
/// `serialized` is the container format revision (it changes the width of
/// [`PPtr`] path ids); `engine` is the (major, minor) engine release that
/// wrote the object (it changes a few record layouts).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FormatVersion {
    pub serialized: u32,
    pub engine: (u16, u16),
}

impl FormatVersion {
    pub const fn new(serialized: u32, major: u16, minor: u16) -> Self {
        Self { serialized, engine: (major, minor) }
    }

    /// Path ids are 64-bit from format 14 on.
    #[inline]
    pub fn wide_path_ids(&self) -> bool {
        self.serialized >= 14
    }

    /// True if the engine release is at least `major.minor`.
    #[inline]
    pub fn engine_at_least(&self, major: u16, minor: u16) -> bool {
        self.engine >= (major, minor)
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::new(22, 2019, 4)
    }
}

/// One serialized object owned by the provider.
#[derive(Clone, Debug)]
pub struct AssetObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub version: FormatVersion,
    /// Best-effort container path attached by the provider.
    pub container: Option<String>,
    data: Vec<u8>,
}

impl AssetObject {
    pub fn new(id: ObjectId, kind: ObjectKind, version: FormatVersion, data: Vec<u8>) -> Self {
        Self { id, kind, version, container: None, data }
    }

    /// Raw serialized bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Fresh reader positioned at the start of the buffer.
    #[inline]
    pub fn reader(&self) -> ByteReader<'_> {
        ByteReader::new(&self.data)
    }

    /// Container path, if the provider attached one.
    #[inline]
    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }
}

/// Source of decoded objects and reference resolution.
///
/// Implementations must be shareable across threads: clusters are exported
/// in parallel against one provider.
pub trait AssetProvider: Sync {
    /// All objects in load order.
    fn objects(&self) -> &[AssetObject];

    /// Look up an object by identity.
    fn get(&self, id: ObjectId) -> Option<&AssetObject>;

    /// Resolve a reference stored inside `owner`'s buffer.
    fn resolve(&self, owner: &AssetObject, ptr: PPtr) -> Option<&AssetObject>;

    /// Display name of a source file.
    fn source_name(&self, file: u32) -> Option<&str>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_class_ids() {
        for kind in [ObjectKind::GameObject, ObjectKind::MonoBehaviour, ObjectKind::Texture2D] {
            assert_eq!(ObjectKind::from_class_id(kind.class_id()), kind);
        }
        assert_eq!(ObjectKind::from_class_id(9999), ObjectKind::Unknown(9999));
    }

    #[test]
    fn test_version_rules() {
        let old = FormatVersion::new(9, 5, 2);
        assert!(!old.wide_path_ids());
        assert!(!old.engine_at_least(5, 3));
        let new = FormatVersion::new(22, 2020, 3);
        assert!(new.wide_path_ids());
        assert!(new.engine_at_least(2018, 0));
    }

    #[test]
    fn test_pptr_null() {
        assert!(PPtr::NULL.is_null());
        assert!(!PPtr::local(5).is_null());
    }
}
