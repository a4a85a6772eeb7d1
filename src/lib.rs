//! # live2d-extractor
//!
//! Rebuilds Live2D Cubism model packages (`model3.json` plus moc, textures,
//! motions, physics, pose, expressions and display info) from the flat
//! object graph of decoded Unity asset bundles.
//!
//! ## Modules
//!
//! - [`util`] - Errors and container path helpers
//! - [`asset`] - Object-graph provider interface and on-disk dumps
//! - [`serialized`] - Schema-driven structural decoding of object buffers
//! - [`cubism`] - Moc inspection, entity hierarchy, bound models
//! - [`physics`] - Physics rig decoding and `physics3.json`
//! - [`motion`] - Curve tracks, segment encoding and `motion3.json`
//! - [`correlate`] - Grouping objects into per-model clusters
//! - [`export`] - Per-model assembly and batch export
//!
//! ## Example
//!
//! ```ignore
//! use live2d_extractor::asset::dump;
//! use live2d_extractor::export::{export_all, ExportConfig};
//!
//! let provider = dump::load("bundle_dump")?;
//! let summary = export_all(&provider, "out".as_ref(), &ExportConfig::default())?;
//! println!("{} model(s) exported", summary.exported());
//! ```

pub mod util;
pub mod asset;
pub mod serialized;
pub mod cubism;
pub mod physics;
pub mod motion;
pub mod correlate;
pub mod export;

#[doc(hidden)]
pub mod testing;

// Re-export commonly used types
pub use util::{Error, Result};

/// Commonly used types.
pub mod prelude {
    pub use crate::asset::{AssetObject, AssetProvider, MemoryProvider, ObjectId, ObjectKind, PPtr};
    pub use crate::correlate::{Correlation, ModelCluster};
    pub use crate::export::{export_all, ExportConfig, GroupOutputBy, MotionMode};
    pub use crate::serialized::{Record, RecordKind, ScriptClass, StructuralDecoder};
    pub use crate::util::{Error, Result};
}
