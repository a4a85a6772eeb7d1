//! Motion reconstruction.
//!
//! Two structurally different sources feed one [`Motion`] shape:
//! - [`fade`] - pre-baked `CubismFadeMotionData` records
//! - [`clip`] - `AnimationClip` float curves, bound by name or by hierarchy
//!
//! [`segment`] turns each track's keys into the segment encoding written by
//! [`motion3`].

pub mod track;
pub mod segment;
pub mod motion3;
pub mod fade;
pub mod clip;

pub use track::{CurveTrack, Keyframe, Target};
pub use segment::{convert, Point, Segment, SegmentCurve};
pub use motion3::{Motion, Motion3Json, MotionEvent};
pub use fade::{fade_motion, FADE_FPS};
pub use clip::{clip_motion, HierarchyBinder, NameBinder, TrackBinder};
