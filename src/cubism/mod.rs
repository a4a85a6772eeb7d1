//! Cubism-specific object interpretation.
//!
//! - [`moc`] - moc3 blob header and ID tables
//! - [`hierarchy`] - entity graph navigation
//! - [`model`] - model instances and their directly bound components

pub mod moc;
pub mod hierarchy;
pub mod model;

pub use moc::MocInfo;
pub use hierarchy::Hierarchy;
pub use model::{discover_models, owning_moc, BoundModel};
