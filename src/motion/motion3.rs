//! `motion3.json` document.

use serde::Serialize;

use super::segment::convert;
use super::track::CurveTrack;

/// Timed event carried as user data.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionEvent {
    pub time: f32,
    pub value: String,
}

/// Source-independent motion: tracks plus timing.
#[derive(Clone, Debug, PartialEq)]
pub struct Motion {
    pub name: String,
    pub duration: f32,
    pub fps: f32,
    pub fade_in: Option<f32>,
    pub fade_out: Option<f32>,
    pub tracks: Vec<CurveTrack>,
    pub events: Vec<MotionEvent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Motion3Json {
    pub version: u32,
    pub meta: Meta,
    pub curves: Vec<Curve>,
    pub user_data: Vec<UserData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Meta {
    pub duration: f32,
    pub fps: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fade_in_time: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fade_out_time: Option<f32>,
    #[serde(rename = "Loop")]
    pub looping: bool,
    pub are_beziers_restricted: bool,
    pub curve_count: usize,
    pub total_segment_count: usize,
    pub total_point_count: usize,
    pub user_data_count: usize,
    pub total_user_data_size: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Curve {
    pub target: &'static str,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fade_in_time: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fade_out_time: Option<f32>,
    pub segments: Vec<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserData {
    pub time: f32,
    pub value: String,
}

impl Motion3Json {
    /// Encode every track; meta totals are the exact emitted counts.
    pub fn from_motion(motion: &Motion, force_bezier: bool) -> Self {
        let mut total_segments = 0;
        let mut total_points = 0;
        let curves: Vec<Curve> = motion
            .tracks
            .iter()
            .map(|track| {
                let encoded = convert(track.keys(), force_bezier);
                total_segments += encoded.segment_count();
                total_points += encoded.point_count();
                Curve {
                    target: track.target.as_str(),
                    id: track.id.clone(),
                    fade_in_time: track.fade_in,
                    fade_out_time: track.fade_out,
                    segments: encoded.to_flat(),
                }
            })
            .collect();

        let user_data: Vec<UserData> = motion
            .events
            .iter()
            .map(|e| UserData { time: e.time, value: e.value.clone() })
            .collect();

        Self {
            version: 3,
            meta: Meta {
                duration: motion.duration,
                fps: motion.fps,
                fade_in_time: motion.fade_in,
                fade_out_time: motion.fade_out,
                looping: true,
                are_beziers_restricted: true,
                curve_count: curves.len(),
                total_segment_count: total_segments,
                total_point_count: total_points,
                user_data_count: user_data.len(),
                total_user_data_size: user_data.iter().map(|u| u.value.len()).sum(),
            },
            curves,
            user_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::track::{Keyframe, Target};

    fn motion() -> Motion {
        let blink = CurveTrack::new(
            Target::Parameter,
            "ParamEyeLOpen",
            vec![
                Keyframe::new(0.0, 1.0, 0.0, 0.0),
                Keyframe::new(0.5, 0.0, 0.0, 2.0),
                Keyframe::new(1.0, 1.0, f32::INFINITY, 0.0),
            ],
        )
        .unwrap();
        let part = CurveTrack::new(Target::PartOpacity, "PartArmA", vec![Keyframe::new(0.0, 1.0, 0.0, 0.0)])
            .unwrap()
            .with_fades(0.2, -1.0);
        Motion {
            name: "idle".into(),
            duration: 1.0,
            fps: 30.0,
            fade_in: Some(0.5),
            fade_out: None,
            tracks: vec![blink, part],
            events: vec![MotionEvent { time: 0.5, value: "blink".into() }],
        }
    }

    #[test]
    fn test_meta_totals() {
        let json = Motion3Json::from_motion(&motion(), false);
        assert_eq!(json.meta.curve_count, 2);
        // blink: linear + stepped; part: none
        assert_eq!(json.meta.total_segment_count, 2);
        // 1 + 1 + 1 for blink, 1 for part
        assert_eq!(json.meta.total_point_count, 4);
        assert_eq!(json.meta.user_data_count, 1);
        assert_eq!(json.meta.total_user_data_size, 5);
        let flat_points: usize = json.curves.iter().map(|c| (c.segments.len() - json_tags(c)) / 2).sum();
        assert_eq!(flat_points, json.meta.total_point_count);
    }

    fn json_tags(curve: &Curve) -> usize {
        let mut i = 2;
        let mut tags = 0;
        while i < curve.segments.len() {
            tags += 1;
            i += if curve.segments[i] == 1.0 { 7 } else { 3 };
        }
        tags
    }

    #[test]
    fn test_json_layout() {
        let value = serde_json::to_value(Motion3Json::from_motion(&motion(), false)).unwrap();
        assert_eq!(value["Version"], 3);
        assert_eq!(value["Meta"]["Loop"], true);
        assert_eq!(value["Meta"]["AreBeziersRestricted"], true);
        assert_eq!(value["Meta"]["FadeInTime"], 0.5);
        assert!(value["Meta"].get("FadeOutTime").is_none());
        assert_eq!(value["Curves"][1]["Target"], "PartOpacity");
        let fade_in = value["Curves"][1]["FadeInTime"].as_f64().unwrap();
        assert!((fade_in - 0.2).abs() < 1e-6);
        assert!(value["Curves"][0].get("FadeInTime").is_none());
        assert_eq!(value["UserData"][0]["Value"], "blink");
    }

    #[test]
    fn test_idempotent() {
        let a = serde_json::to_string(&Motion3Json::from_motion(&motion(), false)).unwrap();
        let b = serde_json::to_string(&Motion3Json::from_motion(&motion(), false)).unwrap();
        assert_eq!(a, b);
    }
}
