//! Physics rig decoding and `physics3.json` output.

pub mod rig;
pub mod physics3;

pub use rig::{ComponentType, Normalization, Particle, PhysicsInput, PhysicsOutput, PhysicsRig, SubRig, Tuplet};
pub use physics3::Physics3Json;
