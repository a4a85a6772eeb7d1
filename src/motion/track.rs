//! Keyframed curve tracks.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use crate::serialized::{Record, Value};
use crate::util::{Error, Result};

/// One sampled key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    pub in_slope: f32,
    pub out_slope: f32,
}

impl Keyframe {
    pub const fn new(time: f32, value: f32, in_slope: f32, out_slope: f32) -> Self {
        Self { time, value, in_slope, out_slope }
    }

    fn from_record(r: &Record) -> Option<Self> {
        Some(Self {
            time: r.f32("time")?,
            value: r.f32("value")?,
            in_slope: r.f32("inSlope")?,
            out_slope: r.f32("outSlope")?,
        })
    }
}

/// Keys of a decoded `AnimationCurve` record.
pub fn keyframes(curve: &Record) -> Option<Vec<Keyframe>> {
    curve
        .array("m_Curve")?
        .iter()
        .map(|v| v.as_record().and_then(Keyframe::from_record))
        .collect()
}

/// Keys of every `AnimationCurve` in an array field.
pub fn keyframe_lists(values: &[Value]) -> Option<Vec<Vec<Keyframe>>> {
    values.iter().map(|v| v.as_record().and_then(keyframes)).collect()
}

/// What a track animates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Parameter,
    PartOpacity,
}

impl Target {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parameter => "Parameter",
            Self::PartOpacity => "PartOpacity",
        }
    }

    /// Classify an id against the model's name sets.
    ///
    /// Known parameters win over known parts; unknown ids starting with
    /// `Part` are treated as part opacities.
    pub fn classify(id: &str, parameters: &HashSet<String>, parts: &HashSet<String>) -> Self {
        if parameters.contains(id) {
            Self::Parameter
        } else if parts.contains(id) || id.starts_with("Part") {
            Self::PartOpacity
        } else {
            Self::Parameter
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys for one animated id.
///
/// Always non-empty with strictly increasing times.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveTrack {
    pub target: Target,
    pub id: String,
    pub fade_in: Option<f32>,
    pub fade_out: Option<f32>,
    keys: Vec<Keyframe>,
}

impl CurveTrack {
    pub fn new(target: Target, id: impl Into<String>, keys: Vec<Keyframe>) -> Result<Self> {
        let id = id.into();
        if keys.is_empty() {
            return Err(Error::invalid(format!("track '{}' has no keys", id)));
        }
        if let Some(w) = keys.windows(2).find(|w| w[1].time.partial_cmp(&w[0].time) != Some(Ordering::Greater)) {
            return Err(Error::invalid(format!(
                "track '{}': key times not increasing ({} then {})",
                id, w[0].time, w[1].time
            )));
        }
        Ok(Self { target, id, fade_in: None, fade_out: None, keys })
    }

    /// Per-curve fade times; negative values mean "use the motion's".
    pub fn with_fades(mut self, fade_in: f32, fade_out: f32) -> Self {
        self.fade_in = (fade_in >= 0.0).then_some(fade_in);
        self.fade_out = (fade_out >= 0.0).then_some(fade_out);
        self
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Time of the last key.
    pub fn end_time(&self) -> f32 {
        self.keys.last().map_or(0.0, |k| k.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_track_invariants() {
        assert!(CurveTrack::new(Target::Parameter, "A", vec![]).is_err());
        let keys = vec![Keyframe::new(1.0, 0.0, 0.0, 0.0), Keyframe::new(1.0, 1.0, 0.0, 0.0)];
        assert!(CurveTrack::new(Target::Parameter, "A", keys).is_err());
        let ok = CurveTrack::new(Target::Parameter, "A", vec![Keyframe::new(0.0, 1.0, 0.0, 0.0)]).unwrap();
        assert_eq!(ok.end_time(), 0.0);
    }

    #[test]
    fn test_fades() {
        let t = CurveTrack::new(Target::Parameter, "A", vec![Keyframe::new(0.0, 1.0, 0.0, 0.0)])
            .unwrap()
            .with_fades(-1.0, 0.5);
        assert_eq!(t.fade_in, None);
        assert_eq!(t.fade_out, Some(0.5));
    }

    #[test]
    fn test_classify() {
        let params = names(&["ParamAngleX", "PartLikeParam"]);
        let parts = names(&["PartArm"]);
        assert_eq!(Target::classify("ParamAngleX", &params, &parts), Target::Parameter);
        assert_eq!(Target::classify("PartLikeParam", &params, &parts), Target::Parameter);
        assert_eq!(Target::classify("PartArm", &params, &parts), Target::PartOpacity);
        assert_eq!(Target::classify("PartUnknown", &params, &parts), Target::PartOpacity);
        assert_eq!(Target::classify("ParamUnknown", &params, &parts), Target::Parameter);
    }
}
