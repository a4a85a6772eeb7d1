//! Model package output.
//!
//! - [`config`] - export options ([`ExportConfig`])
//! - [`assembler`] - one cluster to one model directory
//! - [`batch`] - every model of a provider, in parallel
//! - [`model3`], [`physics`](crate::physics), [`expression`], [`pose`],
//!   [`cdi`] - JSON documents
//! - [`texture`] - PNG output
//!
//! Output layout per model:
//!
//! ```text
//! <name>.moc3
//! <name>.model3.json
//! <name>.physics3.json    (optional)
//! <name>.pose3.json       (optional)
//! <name>.cdi3.json        (optional)
//! textures/<tex>.png
//! motions/<motion>.motion3.json
//! expressions/<expr>.exp3.json
//! ```

pub mod config;
pub mod names;
pub mod model3;
pub mod expression;
pub mod pose;
pub mod cdi;
pub mod texture;
pub mod assembler;
pub mod batch;

pub use config::{ExportConfig, GroupOutputBy, MotionMode};
pub use names::NameTable;
pub use assembler::{Assembler, ModelSummary};
pub use batch::{export_all, BatchSummary};
