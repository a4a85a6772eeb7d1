//! `physics3.json` document.

use serde::Serialize;

use super::rig::{PhysicsRig, Tuplet};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Physics3Json {
    pub version: u32,
    pub meta: Meta,
    pub physics_settings: Vec<Setting>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Meta {
    pub physics_setting_count: usize,
    pub total_input_count: usize,
    pub total_output_count: usize,
    pub vertex_count: usize,
    pub effective_forces: EffectiveForces,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
    pub physics_dictionary: Vec<DictionaryEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EffectiveForces {
    pub gravity: Vector,
    pub wind: Vector,
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vector {
    pub x: f32,
    pub y: f32,
}

impl From<glam::Vec2> for Vector {
    fn from(v: glam::Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DictionaryEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Setting {
    pub id: String,
    pub input: Vec<Input>,
    pub output: Vec<Output>,
    pub vertices: Vec<Vertex>,
    pub normalization: Normalization,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Target {
    pub target: &'static str,
    pub id: String,
}

impl Target {
    fn parameter(id: &str) -> Self {
        Self { target: "Parameter", id: id.to_string() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Input {
    pub source: Target,
    pub weight: f32,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    pub reflect: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub destination: Target,
    pub vertex_index: i32,
    pub scale: f32,
    pub weight: f32,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    pub reflect: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vertex {
    pub position: Vector,
    pub mobility: f32,
    pub delay: f32,
    pub acceleration: f32,
    pub radius: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Normalization {
    pub position: Range,
    pub angle: Range,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Range {
    pub minimum: f32,
    pub default: f32,
    pub maximum: f32,
}

impl From<Tuplet> for Range {
    fn from(t: Tuplet) -> Self {
        Self { minimum: t.minimum, default: t.default, maximum: t.maximum }
    }
}

impl Physics3Json {
    /// Build the document; `fps` is written only when positive.
    pub fn from_rig(rig: &PhysicsRig, fps: f32) -> Self {
        let physics_settings: Vec<Setting> = rig
            .sub_rigs
            .iter()
            .enumerate()
            .map(|(i, sub)| Setting {
                id: format!("PhysicsSetting{}", i + 1),
                input: sub
                    .inputs
                    .iter()
                    .map(|input| Input {
                        source: Target::parameter(&input.source),
                        weight: input.weight,
                        kind: input.component.as_str(),
                        reflect: input.inverted,
                    })
                    .collect(),
                output: sub
                    .outputs
                    .iter()
                    .map(|output| Output {
                        destination: Target::parameter(&output.destination),
                        vertex_index: output.particle_index,
                        scale: output.angle_scale,
                        weight: output.weight,
                        kind: output.component.as_str(),
                        reflect: output.inverted,
                    })
                    .collect(),
                vertices: sub
                    .particles
                    .iter()
                    .map(|p| Vertex {
                        position: p.initial_position.into(),
                        mobility: p.mobility,
                        delay: p.delay,
                        acceleration: p.acceleration,
                        radius: p.radius,
                    })
                    .collect(),
                normalization: Normalization {
                    position: sub.normalization.position.into(),
                    angle: sub.normalization.angle.into(),
                },
            })
            .collect();

        let physics_dictionary = (1..=physics_settings.len())
            .map(|n| DictionaryEntry {
                id: format!("PhysicsSetting{}", n),
                name: format!("Dummy{}", n),
            })
            .collect();

        Self {
            version: 3,
            meta: Meta {
                physics_setting_count: physics_settings.len(),
                total_input_count: rig.input_count(),
                total_output_count: rig.output_count(),
                vertex_count: rig.particle_count(),
                effective_forces: EffectiveForces {
                    gravity: rig.gravity.into(),
                    wind: rig.wind.into(),
                },
                fps: (fps > 0.0).then_some(fps),
                physics_dictionary,
            },
            physics_settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::FormatVersion;
    use crate::testing::write_rig;
    use crate::serialized::{ByteReader, RecordWriter};

    fn rig() -> PhysicsRig {
        let mut w = RecordWriter::new(FormatVersion::default());
        write_rig(&mut w, &[("ParamAngleX", "ParamHairFront"), ("ParamAngleY", "ParamHairBack")]);
        let bytes = w.into_bytes();
        PhysicsRig::read(&mut ByteReader::new(&bytes)).unwrap()
    }

    #[test]
    fn test_physics_json_shape() {
        let json = serde_json::to_value(Physics3Json::from_rig(&rig(), 30.0)).unwrap();
        assert_eq!(json["Version"], 3);
        assert_eq!(json["Meta"]["PhysicsSettingCount"], 2);
        assert_eq!(json["Meta"]["TotalInputCount"], 2);
        assert_eq!(json["Meta"]["VertexCount"], 4);
        assert_eq!(json["Meta"]["Fps"], 30.0);
        assert_eq!(json["Meta"]["EffectiveForces"]["Gravity"]["Y"], -1.0);
        assert_eq!(json["Meta"]["PhysicsDictionary"][1]["Name"], "Dummy2");
        let setting = &json["PhysicsSettings"][0];
        assert_eq!(setting["Id"], "PhysicsSetting1");
        assert_eq!(setting["Input"][0]["Source"]["Target"], "Parameter");
        assert_eq!(setting["Input"][0]["Type"], "X");
        assert_eq!(setting["Output"][0]["Destination"]["Id"], "ParamHairFront");
        assert_eq!(setting["Output"][0]["Scale"], 1.5);
        assert_eq!(setting["Output"][0]["Reflect"], true);
        assert_eq!(setting["Normalization"]["Position"]["Minimum"], -10.0);
    }

    #[test]
    fn test_fps_omitted_when_unknown() {
        let json = serde_json::to_value(Physics3Json::from_rig(&rig(), 0.0)).unwrap();
        assert!(json["Meta"].get("Fps").is_none());
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert!(keys.contains(&"PhysicsSettings".to_string()));
    }
}
