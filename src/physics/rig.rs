//! Physics rig decoding.
//!
//! The controller body is a fixed binary layout read after the script
//! header:
//!
//! ```text
//! i32 sub_rig_count
//! sub_rig[n] { inputs[], outputs[], particles[], normalization }
//! vec2 gravity, vec2 wind
//! ```
//!
//! Normalization tuplets are stored as (maximum, minimum, default).

use std::collections::HashSet;

use glam::Vec2;
use tracing::warn;

use crate::asset::{AssetObject, AssetProvider};
use crate::serialized::{ByteReader, ScriptClass, StructuralDecoder, FIELD_ALIGNMENT};
use crate::util::{Error, Result};

/// Which component of a source/destination value drives the link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentType {
    X,
    Y,
    Angle,
}

impl ComponentType {
    pub fn from_raw(raw: i32) -> Result<Self> {
        match raw {
            0 => Ok(Self::X),
            1 => Ok(Self::Y),
            2 => Ok(Self::Angle),
            other => Err(Error::invalid(format!("physics component type {}", other))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Angle => "Angle",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsInput {
    pub source: String,
    pub scale_of_translation: Vec2,
    pub angle_scale: f32,
    pub weight: f32,
    pub component: ComponentType,
    pub inverted: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsOutput {
    pub destination: String,
    pub particle_index: i32,
    pub translation_scale: Vec2,
    pub angle_scale: f32,
    pub weight: f32,
    pub component: ComponentType,
    pub inverted: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub initial_position: Vec2,
    pub mobility: f32,
    pub delay: f32,
    pub acceleration: f32,
    pub radius: f32,
}

/// Range triple, copied verbatim (no ordering check).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tuplet {
    pub minimum: f32,
    pub default: f32,
    pub maximum: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Normalization {
    pub position: Tuplet,
    pub angle: Tuplet,
}

/// One simulation group.
#[derive(Clone, Debug, PartialEq)]
pub struct SubRig {
    pub inputs: Vec<PhysicsInput>,
    pub outputs: Vec<PhysicsOutput>,
    pub particles: Vec<Particle>,
    pub normalization: Normalization,
}

/// Decoded physics rig.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsRig {
    pub sub_rigs: Vec<SubRig>,
    pub gravity: Vec2,
    pub wind: Vec2,
}

impl PhysicsRig {
    /// Read the rig body of a `CubismPhysicsController`.
    pub fn decode<P: AssetProvider + ?Sized>(dec: StructuralDecoder<'_, P>, obj: &AssetObject) -> Result<Self> {
        let (_, mut reader) = dec.body_reader(obj, ScriptClass::CubismPhysicsController)?;
        Self::read(&mut reader)
    }

    /// Read a rig body from a positioned reader.
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        let count = r.read_count(16)?;
        let mut sub_rigs = Vec::with_capacity(count);
        for _ in 0..count {
            sub_rigs.push(read_sub_rig(r)?);
        }
        let gravity = r.read_vec2()?;
        let wind = r.read_vec2()?;
        Ok(Self { sub_rigs, gravity, wind })
    }

    /// Keep only sub-rigs whose inputs and outputs all name a known parameter
    /// or part. Empty name sets disable the check.
    ///
    /// Returns the number of dropped sub-rigs.
    pub fn retain_resolved(&mut self, parameters: &HashSet<String>, parts: &HashSet<String>) -> usize {
        if parameters.is_empty() && parts.is_empty() {
            return 0;
        }
        let known = |name: &str| parameters.contains(name) || parts.contains(name);
        let before = self.sub_rigs.len();
        let mut index = 0;
        self.sub_rigs.retain(|rig| {
            index += 1;
            let missing = rig
                .inputs
                .iter()
                .map(|i| i.source.as_str())
                .chain(rig.outputs.iter().map(|o| o.destination.as_str()))
                .find(|name| !known(name));
            match missing {
                Some(name) => {
                    warn!("physics setting {}: unresolved id '{}', setting skipped", index, name);
                    false
                }
                None => true,
            }
        });
        before - self.sub_rigs.len()
    }

    pub fn input_count(&self) -> usize {
        self.sub_rigs.iter().map(|s| s.inputs.len()).sum()
    }

    pub fn output_count(&self) -> usize {
        self.sub_rigs.iter().map(|s| s.outputs.len()).sum()
    }

    pub fn particle_count(&self) -> usize {
        self.sub_rigs.iter().map(|s| s.particles.len()).sum()
    }
}

fn read_sub_rig(r: &mut ByteReader<'_>) -> Result<SubRig> {
    let inputs = read_array(r, 28, read_input)?;
    let outputs = read_array(r, 32, read_output)?;
    let particles = read_array(r, 24, read_particle)?;
    let position = read_tuplet(r)?;
    let angle = read_tuplet(r)?;
    Ok(SubRig {
        inputs,
        outputs,
        particles,
        normalization: Normalization { position, angle },
    })
}

fn read_array<T>(
    r: &mut ByteReader<'_>,
    min_size: usize,
    item: fn(&mut ByteReader<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    let count = r.read_count(min_size)?;
    (0..count).map(|_| item(r)).collect()
}

fn read_flag(r: &mut ByteReader<'_>) -> Result<bool> {
    let v = r.read_bool()?;
    r.align(FIELD_ALIGNMENT)?;
    Ok(v)
}

fn read_input(r: &mut ByteReader<'_>) -> Result<PhysicsInput> {
    Ok(PhysicsInput {
        source: r.read_aligned_string()?,
        scale_of_translation: r.read_vec2()?,
        angle_scale: r.read_f32()?,
        weight: r.read_f32()?,
        component: ComponentType::from_raw(r.read_i32()?)?,
        inverted: read_flag(r)?,
    })
}

fn read_output(r: &mut ByteReader<'_>) -> Result<PhysicsOutput> {
    Ok(PhysicsOutput {
        destination: r.read_aligned_string()?,
        particle_index: r.read_i32()?,
        translation_scale: r.read_vec2()?,
        angle_scale: r.read_f32()?,
        weight: r.read_f32()?,
        component: ComponentType::from_raw(r.read_i32()?)?,
        inverted: read_flag(r)?,
    })
}

fn read_particle(r: &mut ByteReader<'_>) -> Result<Particle> {
    Ok(Particle {
        initial_position: r.read_vec2()?,
        mobility: r.read_f32()?,
        delay: r.read_f32()?,
        acceleration: r.read_f32()?,
        radius: r.read_f32()?,
    })
}

fn read_tuplet(r: &mut ByteReader<'_>) -> Result<Tuplet> {
    let maximum = r.read_f32()?;
    let minimum = r.read_f32()?;
    let default = r.read_f32()?;
    Ok(Tuplet { minimum, default, maximum })
}
