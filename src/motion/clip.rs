//! Motions from animation clips.

use std::collections::HashSet;

use tracing::debug;

use super::motion3::{Motion, MotionEvent};
use super::track::{keyframes, CurveTrack, Target};
use crate::asset::{AssetObject, AssetProvider};
use crate::cubism::Hierarchy;
use crate::serialized::{Record, ScriptClass};
use crate::util::path::last_segment;
use crate::util::{Error, Result};

/// Maps a clip binding path to the animated id.
pub trait TrackBinder {
    fn bind(&self, path: &str) -> Option<(Target, String)>;
}

/// Binds by the last path segment against the model's name sets.
pub struct NameBinder<'a> {
    pub parameters: &'a HashSet<String>,
    pub parts: &'a HashSet<String>,
}

impl TrackBinder for NameBinder<'_> {
    fn bind(&self, path: &str) -> Option<(Target, String)> {
        let id = last_segment(path);
        if id.is_empty() {
            return None;
        }
        let target = if self.parameters.contains(id) {
            Target::Parameter
        } else if self.parts.contains(id) || path.contains("Parts") {
            Target::PartOpacity
        } else {
            Target::Parameter
        };
        Some((target, id.to_string()))
    }
}

/// Binds by walking the path through the model's entity hierarchy; the
/// component found on the target entity decides the kind.
pub struct HierarchyBinder<'h, 'p, P: AssetProvider + ?Sized> {
    pub hierarchy: &'h Hierarchy<'p, P>,
    pub root: &'p AssetObject,
}

impl<P: AssetProvider + ?Sized> TrackBinder for HierarchyBinder<'_, '_, P> {
    fn bind(&self, path: &str) -> Option<(Target, String)> {
        let entity = self.hierarchy.find_path(self.root, path)?;
        let target = if self.hierarchy.component(entity, ScriptClass::CubismParameter).is_some() {
            Target::Parameter
        } else if self.hierarchy.component(entity, ScriptClass::CubismPart).is_some() {
            Target::PartOpacity
        } else {
            return None;
        };
        Some((target, self.hierarchy.name(entity)?))
    }
}

/// Build a motion from a decoded `AnimationClip` record.
///
/// Curves that do not bind or have no keys are skipped; the result may
/// have no tracks.
pub fn clip_motion(record: &Record, binder: &dyn TrackBinder) -> Result<Motion> {
    let name = record.str("m_Name").unwrap_or_default().to_string();
    let curves = record
        .records("m_FloatCurves")
        .ok_or_else(|| Error::invalid(format!("clip '{}' without float curves", name)))?;

    let mut tracks = Vec::with_capacity(curves.len());
    for curve in curves {
        let path = curve.str("path").unwrap_or_default();
        let Some((target, id)) = binder.bind(path) else {
            debug!("clip '{}': unbound path '{}'", name, path);
            continue;
        };
        let Some(keys) = curve.record("curve").and_then(keyframes) else {
            continue;
        };
        match CurveTrack::new(target, id, keys) {
            Ok(track) => tracks.push(track),
            Err(e) => debug!("clip '{}': {}", name, e),
        }
    }

    let events: Vec<MotionEvent> = record
        .records("m_Events")
        .unwrap_or_default()
        .into_iter()
        .filter_map(|e| {
            Some(MotionEvent {
                time: e.f32("time")?,
                value: e.str("data")?.to_string(),
            })
        })
        .collect();

    let duration = tracks
        .iter()
        .map(CurveTrack::end_time)
        .chain(events.iter().map(|e| e.time))
        .fold(0.0f32, f32::max);

    Ok(Motion {
        name,
        duration,
        fps: record.f32("m_SampleRate").unwrap_or(0.0),
        fade_in: None,
        fade_out: None,
        tracks,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::FormatVersion;
    use crate::serialized::{RecordKind, StructuralDecoder};
    use crate::testing::{Key, SceneBuilder};

    const KEYS: &[Key] = &[(0.0, 0.0, 0.0, 0.0), (0.5, 1.0, 0.0, 0.0)];

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clip_by_name() {
        let mut scene = SceneBuilder::new();
        let clip = scene.clip(
            "tap_body",
            60.0,
            &[
                ("Parameters/ParamAngleX", "m_Value", KEYS),
                ("Parts/PartArmA", "m_Opacity", KEYS),
                ("Parts/Unknown", "m_Opacity", KEYS),
            ],
            &[(0.25, "voice_01")],
        );
        let p = scene.build();
        let dec = StructuralDecoder::new(&p);
        let record = dec.decode(p.get(clip).unwrap(), RecordKind::AnimationClip).unwrap();

        let params = set(&["ParamAngleX"]);
        let parts = set(&["PartArmA"]);
        let motion = clip_motion(&record, &NameBinder { parameters: &params, parts: &parts }).unwrap();
        assert_eq!(motion.name, "tap_body");
        assert_eq!(motion.fps, 60.0);
        assert_eq!(motion.duration, 0.5);
        let bound: Vec<_> = motion.tracks.iter().map(|t| (t.target, t.id.as_str())).collect();
        assert_eq!(
            bound,
            vec![
                (Target::Parameter, "ParamAngleX"),
                (Target::PartOpacity, "PartArmA"),
                (Target::PartOpacity, "Unknown"),
            ]
        );
        assert_eq!(motion.events, vec![MotionEvent { time: 0.25, value: "voice_01".into() }]);
    }

    #[test]
    fn test_clip_by_hierarchy_old_layout() {
        // pre-2018 keyframes, pre-5.5 component pairs, narrow references
        let mut scene = SceneBuilder::with_version(FormatVersion::new(9, 5, 4));
        let root = scene.entity("Koharu", None);
        let params = scene.entity("Parameters", Some(root));
        scene.parameter("ParamEyeLOpen", Some(params));
        let parts = scene.entity("Parts", Some(root));
        scene.part("PartHead", Some(parts));
        let clip = scene.clip(
            "blink",
            30.0,
            &[
                ("Parameters/ParamEyeLOpen", "m_Value", KEYS),
                ("Parts/PartHead", "m_Opacity", KEYS),
                ("Parts/Missing", "m_Opacity", KEYS),
            ],
            &[],
        );
        let p = scene.build();
        let dec = StructuralDecoder::new(&p);
        let hierarchy = Hierarchy::new(dec);
        let root = p.get(root).unwrap();
        let record = dec.decode(p.get(clip).unwrap(), RecordKind::AnimationClip).unwrap();

        let motion = clip_motion(&record, &HierarchyBinder { hierarchy: &hierarchy, root }).unwrap();
        let bound: Vec<_> = motion.tracks.iter().map(|t| (t.target, t.id.as_str())).collect();
        assert_eq!(bound, vec![(Target::Parameter, "ParamEyeLOpen"), (Target::PartOpacity, "PartHead")]);
    }
}
