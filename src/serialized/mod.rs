//! Structural decoding of serialized records.
//!
//! - [`ByteReader`] / [`RecordWriter`] - cursor-based buffer access
//! - [`schema`] - static `(kind, version) -> fields` tables
//! - [`StructuralDecoder`] - generic schema interpreter producing [`Record`]s

mod reader;
mod writer;
mod value;
pub mod schema;
mod decoder;

pub use reader::*;
pub use writer::*;
pub use value::*;
pub use schema::{Field, FieldType, Layout, RecordKind, ScriptClass};
pub use decoder::*;
