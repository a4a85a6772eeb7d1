//! Motions from pre-baked fade motion data.

use std::collections::HashSet;

use tracing::debug;

use super::motion3::Motion;
use super::track::{keyframe_lists, CurveTrack, Target};
use crate::serialized::Record;
use crate::util::path::file_stem;
use crate::util::{Error, Result};

/// Playback rate reported for fade motions.
pub const FADE_FPS: f32 = 30.0;

/// Build a motion from a decoded `CubismFadeMotionData` record.
///
/// Returns `Ok(None)` for motions without parameter curves. Curves with no
/// usable keys are skipped individually.
pub fn fade_motion(record: &Record, parameters: &HashSet<String>, parts: &HashSet<String>) -> Result<Option<Motion>> {
    let ids = record
        .strings("ParameterIds")
        .ok_or_else(|| Error::invalid("fade motion without ParameterIds"))?;
    if ids.is_empty() {
        return Ok(None);
    }
    let curves = record
        .array("ParameterCurves")
        .and_then(keyframe_lists)
        .ok_or_else(|| Error::invalid("fade motion without ParameterCurves"))?;
    let fade_ins = record.floats("ParameterFadeInTimes").unwrap_or_default();
    let fade_outs = record.floats("ParameterFadeOutTimes").unwrap_or_default();

    let mut tracks = Vec::with_capacity(ids.len());
    for (i, (id, keys)) in ids.iter().zip(curves).enumerate() {
        let target = Target::classify(id, parameters, parts);
        match CurveTrack::new(target, id.as_str(), keys) {
            Ok(track) => tracks.push(track.with_fades(
                fade_ins.get(i).copied().unwrap_or(-1.0),
                fade_outs.get(i).copied().unwrap_or(-1.0),
            )),
            Err(e) => debug!("fade curve skipped: {}", e),
        }
    }

    let name = record.str("m_Name").unwrap_or_default();
    let name = if name.is_empty() { record.str("MotionName").unwrap_or_default() } else { name };
    let non_negative = |v: Option<f32>| v.filter(|v| *v >= 0.0);

    Ok(Some(Motion {
        name: file_stem(name).to_string(),
        duration: record.f32("MotionLength").unwrap_or(0.0),
        fps: FADE_FPS,
        fade_in: non_negative(record.f32("FadeInTime")),
        fade_out: non_negative(record.f32("FadeOutTime")),
        tracks,
        events: Vec::new(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::asset::AssetProvider;
    use super::*;
    use crate::serialized::{RecordKind, ScriptClass, StructuralDecoder};
    use crate::testing::{Key, SceneBuilder};

    #[test]
    fn test_fade_motion_from_record() {
        let mut scene = SceneBuilder::new();
        let flat: &[Key] = &[(0.0, 0.0, 0.0, 0.0), (1.0, 1.0, 0.0, 0.0)];
        let empty: &[Key] = &[];
        let id = scene.fade_motion(
            "idle_01.fade",
            2.5,
            &[("ParamAngleX", flat), ("PartArmA", flat), ("ParamEmpty", empty)],
        );
        let p = scene.build();
        let dec = StructuralDecoder::new(&p);
        let record = dec
            .decode(p.get(id).unwrap(), RecordKind::Script(ScriptClass::CubismFadeMotionData))
            .unwrap();

        let params: HashSet<String> = ["ParamAngleX".to_string()].into();
        let motion = fade_motion(&record, &params, &HashSet::new()).unwrap().unwrap();
        assert_eq!(motion.name, "idle_01");
        assert_eq!(motion.fps, 30.0);
        assert_eq!(motion.duration, 2.5);
        assert_eq!(motion.fade_in, Some(1.0));
        assert_eq!(motion.tracks.len(), 2);
        assert_eq!(motion.tracks[0].target, Target::Parameter);
        assert_eq!(motion.tracks[1].target, Target::PartOpacity);
        assert_eq!(motion.tracks[0].fade_in, None);
    }

    #[test]
    fn test_empty_fade_motion() {
        let mut scene = SceneBuilder::new();
        let id = scene.fade_motion("nothing", 1.0, &[]);
        let p = scene.build();
        let dec = StructuralDecoder::new(&p);
        let record = dec
            .decode(p.get(id).unwrap(), RecordKind::Script(ScriptClass::CubismFadeMotionData))
            .unwrap();
        assert!(fade_motion(&record, &HashSet::new(), &HashSet::new()).unwrap().is_none());
    }
}
