//! Keyframe to segment conversion.
//!
//! A segment curve starts with a bare `(time, value)` point, followed by
//! tagged segments whose end point is always a key time:
//!
//! | tag | kind           | points |
//! |-----|----------------|--------|
//! | 0   | Linear         | 1      |
//! | 1   | Bezier         | 3      |
//! | 2   | Stepped        | 1      |
//! | 3   | InverseStepped | 1      |
//!
//! Each adjacent key pair is classified in priority order
//! InverseStepped > Stepped > Linear > Bezier.

use smallvec::SmallVec;

use super::track::Keyframe;

/// Duration of the step an inverse-stepped pair is written with.
pub const INVERSE_STEP: f32 = 0.01;
/// Tolerance for the step length and for "flat" slopes.
pub const EPSILON: f32 = 0.0001;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub time: f32,
    pub value: f32,
}

impl Point {
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

impl From<&Keyframe> for Point {
    fn from(k: &Keyframe) -> Self {
        Self::new(k.time, k.value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    Linear(Point),
    Bezier([Point; 3]),
    Stepped(Point),
    InverseStepped(Point),
}

impl Segment {
    /// Wire tag.
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Linear(_) => 0,
            Self::Bezier(_) => 1,
            Self::Stepped(_) => 2,
            Self::InverseStepped(_) => 3,
        }
    }

    /// Control points carried by this segment.
    pub fn points(&self) -> &[Point] {
        match self {
            Self::Linear(p) | Self::Stepped(p) | Self::InverseStepped(p) => std::slice::from_ref(p),
            Self::Bezier(ps) => ps,
        }
    }
}

/// Segment-encoded curve.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentCurve {
    pub start: Point,
    pub segments: SmallVec<[Segment; 8]>,
}

impl SegmentCurve {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Points written for this curve, including the start point.
    pub fn point_count(&self) -> usize {
        1 + self.segments.iter().map(|s| s.points().len()).sum::<usize>()
    }

    /// Flat wire form: start point, then `tag, points...` per segment.
    pub fn to_flat(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(2 + self.segments.len() * 7);
        out.push(self.start.time);
        out.push(self.start.value);
        for segment in &self.segments {
            out.push(segment.tag() as f32);
            for p in segment.points() {
                out.push(p.time);
                out.push(p.value);
            }
        }
        out
    }
}

fn finite_or_flat(slope: f32) -> f32 {
    if slope.is_finite() {
        slope
    } else {
        0.0
    }
}

/// Convert keys (non-empty, increasing times) into a segment curve.
///
/// With `force_bezier`, stepped and inverse-stepped classification is
/// disabled; flat pairs still become linear segments.
pub fn convert(keys: &[Keyframe], force_bezier: bool) -> SegmentCurve {
    let start = keys.first().map(Point::from).unwrap_or(Point::new(0.0, 0.0));
    let mut segments = SmallVec::new();

    let mut j = 1;
    while j < keys.len() {
        let prev = &keys[j - 1];
        let cur = &keys[j];

        if !force_bezier && ((cur.time - prev.time) - INVERSE_STEP).abs() < EPSILON {
            if let Some(next) = keys.get(j + 1) {
                if next.value == cur.value {
                    segments.push(Segment::InverseStepped(next.into()));
                    j += 2;
                    continue;
                }
            }
        }

        let segment = if !force_bezier && cur.in_slope == f32::INFINITY {
            Segment::Stepped(cur.into())
        } else if prev.out_slope == 0.0 && cur.in_slope.abs() < EPSILON {
            Segment::Linear(cur.into())
        } else {
            let tangent = (cur.time - prev.time) / 3.0;
            let out_slope = finite_or_flat(prev.out_slope);
            let in_slope = finite_or_flat(cur.in_slope);
            Segment::Bezier([
                Point::new(prev.time + tangent, prev.value + out_slope * tangent),
                Point::new(cur.time - tangent, cur.value - in_slope * tangent),
                cur.into(),
            ])
        };
        segments.push(segment);
        j += 1;
    }

    SegmentCurve { start, segments }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(time: f32, value: f32, in_slope: f32, out_slope: f32) -> Keyframe {
        Keyframe::new(time, value, in_slope, out_slope)
    }

    #[test]
    fn test_stepped_on_infinite_in_slope() {
        let curve = convert(&[k(0.0, 0.0, 0.0, 0.0), k(1.0, 0.0, 0.0, f32::INFINITY)], false);
        // in_slope is what matters; this pair is flat -> linear
        assert_eq!(curve.segments[0], Segment::Linear(Point::new(1.0, 0.0)));

        let curve = convert(&[k(0.0, 0.0, 0.0, 0.0), k(1.0, 0.0, f32::INFINITY, 0.0)], false);
        assert_eq!(curve.segments.as_slice(), &[Segment::Stepped(Point::new(1.0, 0.0))]);
        assert_eq!(curve.to_flat(), vec![0.0, 0.0, 2.0, 1.0, 0.0]);
        assert_eq!(curve.point_count(), 2);
    }

    #[test]
    fn test_linear_requires_flat_neighbours() {
        let curve = convert(&[k(0.0, 0.0, 0.0, 0.0), k(1.0, 1.0, 0.00005, 0.0)], false);
        assert_eq!(curve.segments[0].tag(), 0);
        let curve = convert(&[k(0.0, 0.0, 0.0, 0.5), k(1.0, 1.0, 0.0, 0.0)], false);
        assert_eq!(curve.segments[0].tag(), 1);
    }

    #[test]
    fn test_bezier_control_points() {
        let curve = convert(&[k(0.0, 0.0, 0.0, 3.0), k(3.0, 6.0, 1.5, 0.0)], false);
        let Segment::Bezier(ps) = curve.segments[0] else { panic!("expected bezier") };
        assert_eq!(ps[0], Point::new(1.0, 3.0));
        assert_eq!(ps[1], Point::new(2.0, 4.5));
        assert_eq!(ps[2], Point::new(3.0, 6.0));
        assert_eq!(curve.point_count(), 4);
        assert_eq!(curve.to_flat().len(), 2 + 7);
    }

    #[test]
    fn test_inverse_stepped_consumes_two_keys() {
        let keys = [
            k(0.0, 0.0, 0.0, 1.0),
            k(0.01, 1.0, 1.0, 0.0),
            k(1.0, 1.0, 0.0, 0.0),
            k(2.0, 1.0, 0.0, 0.0),
        ];
        let curve = convert(&keys, false);
        assert_eq!(curve.segments[0], Segment::InverseStepped(Point::new(1.0, 1.0)));
        assert_eq!(curve.segments[1], Segment::Linear(Point::new(2.0, 1.0)));
        assert_eq!(curve.segment_count(), 2);
        assert_eq!(curve.point_count(), 3);
    }

    #[test]
    fn test_inverse_step_without_successor_falls_through() {
        let curve = convert(&[k(0.0, 0.0, 0.0, 0.0), k(0.01, 0.0, 0.0, 0.0)], false);
        assert_eq!(curve.segments[0].tag(), 0);
    }

    #[test]
    fn test_force_bezier() {
        let keys = [k(0.0, 0.0, 0.0, 0.0), k(1.0, 1.0, f32::INFINITY, 0.0)];
        let curve = convert(&keys, true);
        let Segment::Bezier(ps) = curve.segments[0] else { panic!("expected bezier") };
        // non-finite slope treated as flat
        assert!((ps[1].time - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(ps[1].value, 1.0);
        assert!(curve.to_flat().iter().all(|v| v.is_finite()));

        let flat = convert(&[k(0.0, 0.0, 0.0, 0.0), k(1.0, 0.0, 0.0, 0.0)], true);
        assert_eq!(flat.segments[0].tag(), 0);
    }

    #[test]
    fn test_single_key() {
        let curve = convert(&[k(0.5, 2.0, 0.0, 0.0)], false);
        assert!(curve.segments.is_empty());
        assert_eq!(curve.to_flat(), vec![0.5, 2.0]);
        assert_eq!(curve.point_count(), 1);
    }

    #[test]
    fn test_deterministic() {
        let keys = [k(0.0, 0.0, 0.0, 2.0), k(0.5, 1.0, 2.0, -1.0), k(0.51, 0.7, 0.0, 0.0), k(1.0, 0.7, 0.0, 0.0)];
        assert_eq!(convert(&keys, false), convert(&keys, false));
        assert_eq!(convert(&keys, false).segments[1].tag(), 3);
    }
}
