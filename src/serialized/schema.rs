//! Static field schemas for known record kinds.
//!
//! Each record kind owns an ordered list of `(name, type)` descriptors. A few
//! kinds (and nested layouts) have alternate lists selected by the object's
//! [`FormatVersion`]; the table entries are ordered oldest first and the
//! newest entry whose `since` release is not after the object's engine wins.

use crate::asset::{FormatVersion, ObjectKind};
use crate::util::{Error, Result};

/// Type of one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// One byte, no realignment.
    Bool,
    /// One byte, realigned afterwards.
    AlignedBool,
    UInt8,
    UInt16,
    Int32,
    Int64,
    Float,
    /// Length-prefixed UTF-8, realigned afterwards.
    String,
    /// Length-prefixed byte blob, realigned afterwards.
    Bytes,
    /// Cross-reference; width depends on the format version.
    PPtr,
    /// Count-prefixed homogeneous sequence.
    Array(&'static FieldType),
    /// Nested record with its own (possibly versioned) layout.
    Nested(Layout),
}

impl FieldType {
    /// Element types stored one byte wide force realignment after an array.
    pub const fn is_byte_sized(self) -> bool {
        matches!(self, Self::Bool | Self::AlignedBool | Self::UInt8)
    }

    /// Lower bound of the encoded size, used to reject absurd array counts.
    pub const fn min_size(self) -> usize {
        match self {
            Self::Bool | Self::AlignedBool | Self::UInt8 => 1,
            Self::UInt16 => 2,
            Self::Int32 | Self::Float | Self::String | Self::Bytes | Self::Array(_) => 4,
            Self::Int64 | Self::PPtr => 8,
            Self::Nested(_) => 0,
        }
    }
}

/// One schema entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn field(name: &'static str, ty: FieldType) -> Field {
    Field { name, ty }
}

/// Nested layouts shared between record kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layout {
    ScriptHeader,
    ComponentPair,
    Vector3,
    Quaternion,
    Keyframe,
    AnimationCurve,
    FloatCurve,
    AnimationEvent,
    ExpressionParameter,
}

/// Script classes the extractor knows how to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptClass {
    CubismModel,
    CubismMoc,
    CubismPhysicsController,
    CubismFadeController,
    CubismFadeMotionList,
    CubismFadeMotionData,
    CubismExpressionController,
    CubismExpressionList,
    CubismExpressionData,
    CubismDisplayInfoParameterName,
    CubismDisplayInfoPartName,
    CubismPosePart,
    CubismRenderer,
    CubismParameter,
    CubismPart,
    CubismEyeBlinkParameter,
    CubismMouthParameter,
}

impl ScriptClass {
    pub const ALL: [ScriptClass; 17] = [
        Self::CubismModel,
        Self::CubismMoc,
        Self::CubismPhysicsController,
        Self::CubismFadeController,
        Self::CubismFadeMotionList,
        Self::CubismFadeMotionData,
        Self::CubismExpressionController,
        Self::CubismExpressionList,
        Self::CubismExpressionData,
        Self::CubismDisplayInfoParameterName,
        Self::CubismDisplayInfoPartName,
        Self::CubismPosePart,
        Self::CubismRenderer,
        Self::CubismParameter,
        Self::CubismPart,
        Self::CubismEyeBlinkParameter,
        Self::CubismMouthParameter,
    ];

    /// Class name as stored in the MonoScript.
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::CubismModel => "CubismModel",
            Self::CubismMoc => "CubismMoc",
            Self::CubismPhysicsController => "CubismPhysicsController",
            Self::CubismFadeController => "CubismFadeController",
            Self::CubismFadeMotionList => "CubismFadeMotionList",
            Self::CubismFadeMotionData => "CubismFadeMotionData",
            Self::CubismExpressionController => "CubismExpressionController",
            Self::CubismExpressionList => "CubismExpressionList",
            Self::CubismExpressionData => "CubismExpressionData",
            Self::CubismDisplayInfoParameterName => "CubismDisplayInfoParameterName",
            Self::CubismDisplayInfoPartName => "CubismDisplayInfoPartName",
            Self::CubismPosePart => "CubismPosePart",
            Self::CubismRenderer => "CubismRenderer",
            Self::CubismParameter => "CubismParameter",
            Self::CubismPart => "CubismPart",
            Self::CubismEyeBlinkParameter => "CubismEyeBlinkParameter",
            Self::CubismMouthParameter => "CubismMouthParameter",
        }
    }

    /// Parse a MonoScript class name.
    pub fn from_class_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.class_name() == name)
    }
}

/// Record kinds with a known schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    GameObject,
    Transform,
    MonoScript,
    Texture2D,
    AnimationClip,
    Script(ScriptClass),
}

impl RecordKind {
    /// Provider kind tag the object must carry.
    pub const fn object_kind(self) -> ObjectKind {
        match self {
            Self::GameObject => ObjectKind::GameObject,
            Self::Transform => ObjectKind::Transform,
            Self::MonoScript => ObjectKind::MonoScript,
            Self::Texture2D => ObjectKind::Texture2D,
            Self::AnimationClip => ObjectKind::AnimationClip,
            Self::Script(_) => ObjectKind::MonoBehaviour,
        }
    }

    /// Human-readable name for diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::GameObject => "GameObject",
            Self::Transform => "Transform",
            Self::MonoScript => "MonoScript",
            Self::Texture2D => "Texture2D",
            Self::AnimationClip => "AnimationClip",
            Self::Script(class) => class.class_name(),
        }
    }
}

/// Oldest engine release with a known layout.
pub const MIN_ENGINE: (u16, u16) = (5, 0);

type Since = (u16, u16);

use FieldType::*;

// ---------------------------------------------------------------------------
// Nested layouts
// ---------------------------------------------------------------------------

const SCRIPT_HEADER: &[Field] = &[
    field("m_GameObject", PPtr),
    field("m_Enabled", AlignedBool),
    field("m_Script", PPtr),
    field("m_Name", String),
];

const COMPONENT_PAIR_OLD: &[Field] = &[field("first", Int32), field("component", PPtr)];
const COMPONENT_PAIR: &[Field] = &[field("component", PPtr)];

const VECTOR3: &[Field] = &[field("x", Float), field("y", Float), field("z", Float)];
const QUATERNION: &[Field] = &[
    field("x", Float),
    field("y", Float),
    field("z", Float),
    field("w", Float),
];

const KEYFRAME: &[Field] = &[
    field("time", Float),
    field("value", Float),
    field("inSlope", Float),
    field("outSlope", Float),
];
const KEYFRAME_WEIGHTED: &[Field] = &[
    field("time", Float),
    field("value", Float),
    field("inSlope", Float),
    field("outSlope", Float),
    field("weightedMode", Int32),
    field("inWeight", Float),
    field("outWeight", Float),
];

const ANIMATION_CURVE: &[Field] = &[
    field("m_Curve", Array(&Nested(Layout::Keyframe))),
    field("m_PreInfinity", Int32),
    field("m_PostInfinity", Int32),
];
const ANIMATION_CURVE_ROTATION: &[Field] = &[
    field("m_Curve", Array(&Nested(Layout::Keyframe))),
    field("m_PreInfinity", Int32),
    field("m_PostInfinity", Int32),
    field("m_RotationOrder", Int32),
];

const FLOAT_CURVE: &[Field] = &[
    field("curve", Nested(Layout::AnimationCurve)),
    field("attribute", String),
    field("path", String),
    field("classID", Int32),
    field("script", PPtr),
];

const ANIMATION_EVENT: &[Field] = &[
    field("time", Float),
    field("functionName", String),
    field("data", String),
    field("objectReferenceParameter", PPtr),
    field("floatParameter", Float),
    field("intParameter", Int32),
    field("messageOptions", Int32),
];

const EXPRESSION_PARAMETER: &[Field] = &[
    field("Id", String),
    field("Value", Float),
    field("Blend", Int32),
];

static LAYOUT_SCHEMAS: &[(Layout, Since, &[Field])] = &[
    (Layout::ScriptHeader, MIN_ENGINE, SCRIPT_HEADER),
    (Layout::ComponentPair, MIN_ENGINE, COMPONENT_PAIR_OLD),
    (Layout::ComponentPair, (5, 5), COMPONENT_PAIR),
    (Layout::Vector3, MIN_ENGINE, VECTOR3),
    (Layout::Quaternion, MIN_ENGINE, QUATERNION),
    (Layout::Keyframe, MIN_ENGINE, KEYFRAME),
    (Layout::Keyframe, (2018, 0), KEYFRAME_WEIGHTED),
    (Layout::AnimationCurve, MIN_ENGINE, ANIMATION_CURVE),
    (Layout::AnimationCurve, (5, 3), ANIMATION_CURVE_ROTATION),
    (Layout::FloatCurve, MIN_ENGINE, FLOAT_CURVE),
    (Layout::AnimationEvent, MIN_ENGINE, ANIMATION_EVENT),
    (Layout::ExpressionParameter, MIN_ENGINE, EXPRESSION_PARAMETER),
];

// ---------------------------------------------------------------------------
// Record kinds
// ---------------------------------------------------------------------------

const GAME_OBJECT: &[Field] = &[
    field("m_Component", Array(&Nested(Layout::ComponentPair))),
    field("m_Layer", Int32),
    field("m_Name", String),
    field("m_Tag", UInt16),
    field("m_IsActive", AlignedBool),
];

const TRANSFORM: &[Field] = &[
    field("m_GameObject", PPtr),
    field("m_LocalRotation", Nested(Layout::Quaternion)),
    field("m_LocalPosition", Nested(Layout::Vector3)),
    field("m_LocalScale", Nested(Layout::Vector3)),
    field("m_Children", Array(&PPtr)),
    field("m_Father", PPtr),
];

const MONO_SCRIPT: &[Field] = &[
    field("m_Name", String),
    field("m_ExecutionOrder", Int32),
    field("m_ClassName", String),
    field("m_Namespace", String),
    field("m_AssemblyName", String),
];

const TEXTURE_2D_OLD: &[Field] = &[
    field("m_Name", String),
    field("m_Width", Int32),
    field("m_Height", Int32),
    field("m_CompleteImageSize", Int32),
    field("m_TextureFormat", Int32),
    field("image data", Bytes),
];
const TEXTURE_2D: &[Field] = &[
    field("m_Name", String),
    field("m_ForcedFallbackFormat", Int32),
    field("m_DownscaleFallback", AlignedBool),
    field("m_Width", Int32),
    field("m_Height", Int32),
    field("m_CompleteImageSize", Int32),
    field("m_TextureFormat", Int32),
    field("image data", Bytes),
];

const ANIMATION_CLIP: &[Field] = &[
    field("m_Name", String),
    field("m_Legacy", Bool),
    field("m_Compressed", Bool),
    field("m_UseHighQualityCurve", AlignedBool),
    field("m_SampleRate", Float),
    field("m_WrapMode", Int32),
    field("m_FloatCurves", Array(&Nested(Layout::FloatCurve))),
    field("m_Events", Array(&Nested(Layout::AnimationEvent))),
];

const CUBISM_MODEL: &[Field] = &[field("_moc", PPtr)];
const CUBISM_MOC: &[Field] = &[field("_bytes", Bytes)];
/// The physics rig body is read with a fixed layout, not a schema.
const CUBISM_PHYSICS_CONTROLLER: &[Field] = &[];
const CUBISM_FADE_CONTROLLER: &[Field] = &[field("CubismFadeMotionList", PPtr)];
const CUBISM_FADE_MOTION_LIST: &[Field] = &[
    field("MotionInstanceIds", Array(&Int32)),
    field("CubismFadeMotionObjects", Array(&PPtr)),
];
const CUBISM_FADE_MOTION_DATA: &[Field] = &[
    field("MotionName", String),
    field("FadeInTime", Float),
    field("FadeOutTime", Float),
    field("ParameterIds", Array(&String)),
    field("ParameterCurves", Array(&Nested(Layout::AnimationCurve))),
    field("ParameterFadeInTimes", Array(&Float)),
    field("ParameterFadeOutTimes", Array(&Float)),
    field("MotionLength", Float),
];
const CUBISM_EXPRESSION_CONTROLLER: &[Field] = &[
    field("ExpressionsList", PPtr),
    field("CurrentExpressionIndex", Int32),
];
const CUBISM_EXPRESSION_LIST: &[Field] = &[field("CubismExpressionObjects", Array(&PPtr))];
const CUBISM_EXPRESSION_DATA: &[Field] = &[
    field("Type", String),
    field("FadeInTime", Float),
    field("FadeOutTime", Float),
    field("Parameters", Array(&Nested(Layout::ExpressionParameter))),
];
const CUBISM_DISPLAY_INFO: &[Field] = &[field("Name", String), field("DisplayName", String)];
const CUBISM_POSE_PART: &[Field] = &[
    field("GroupIndex", Int32),
    field("PartIndex", Int32),
    field("Link", Array(&String)),
];
const CUBISM_RENDERER: &[Field] = &[field("_localOrder", Int32), field("_mainTexture", PPtr)];
const MARKER: &[Field] = &[];

static RECORD_SCHEMAS: &[(RecordKind, Since, &[Field])] = &[
    (RecordKind::GameObject, MIN_ENGINE, GAME_OBJECT),
    (RecordKind::Transform, MIN_ENGINE, TRANSFORM),
    (RecordKind::MonoScript, MIN_ENGINE, MONO_SCRIPT),
    (RecordKind::Texture2D, MIN_ENGINE, TEXTURE_2D_OLD),
    (RecordKind::Texture2D, (2017, 3), TEXTURE_2D),
    (RecordKind::AnimationClip, MIN_ENGINE, ANIMATION_CLIP),
    (RecordKind::Script(ScriptClass::CubismModel), MIN_ENGINE, CUBISM_MODEL),
    (RecordKind::Script(ScriptClass::CubismMoc), MIN_ENGINE, CUBISM_MOC),
    (RecordKind::Script(ScriptClass::CubismPhysicsController), MIN_ENGINE, CUBISM_PHYSICS_CONTROLLER),
    (RecordKind::Script(ScriptClass::CubismFadeController), MIN_ENGINE, CUBISM_FADE_CONTROLLER),
    (RecordKind::Script(ScriptClass::CubismFadeMotionList), MIN_ENGINE, CUBISM_FADE_MOTION_LIST),
    (RecordKind::Script(ScriptClass::CubismFadeMotionData), MIN_ENGINE, CUBISM_FADE_MOTION_DATA),
    (RecordKind::Script(ScriptClass::CubismExpressionController), MIN_ENGINE, CUBISM_EXPRESSION_CONTROLLER),
    (RecordKind::Script(ScriptClass::CubismExpressionList), MIN_ENGINE, CUBISM_EXPRESSION_LIST),
    (RecordKind::Script(ScriptClass::CubismExpressionData), MIN_ENGINE, CUBISM_EXPRESSION_DATA),
    (RecordKind::Script(ScriptClass::CubismDisplayInfoParameterName), MIN_ENGINE, CUBISM_DISPLAY_INFO),
    (RecordKind::Script(ScriptClass::CubismDisplayInfoPartName), MIN_ENGINE, CUBISM_DISPLAY_INFO),
    (RecordKind::Script(ScriptClass::CubismPosePart), MIN_ENGINE, CUBISM_POSE_PART),
    (RecordKind::Script(ScriptClass::CubismRenderer), MIN_ENGINE, CUBISM_RENDERER),
    (RecordKind::Script(ScriptClass::CubismParameter), MIN_ENGINE, MARKER),
    (RecordKind::Script(ScriptClass::CubismPart), MIN_ENGINE, MARKER),
    (RecordKind::Script(ScriptClass::CubismEyeBlinkParameter), MIN_ENGINE, MARKER),
    (RecordKind::Script(ScriptClass::CubismMouthParameter), MIN_ENGINE, MARKER),
];

fn select<K: PartialEq + Copy>(
    table: &'static [(K, Since, &'static [Field])],
    key: K,
    version: &FormatVersion,
) -> Option<&'static [Field]> {
    table
        .iter()
        .filter(|(k, since, _)| *k == key && version.engine >= *since)
        .last()
        .map(|(_, _, fields)| *fields)
}

/// Fields of a nested layout for the given version.
pub fn layout_fields(layout: Layout, version: &FormatVersion) -> Result<&'static [Field]> {
    select(LAYOUT_SCHEMAS, layout, version).ok_or_else(|| {
        Error::UnsupportedVersion(format!("{:?} for engine {}.{}", layout, version.engine.0, version.engine.1))
    })
}

/// Body fields of a record kind for the given version.
///
/// Scripted kinds exclude the common header, which is read separately.
pub fn record_fields(kind: RecordKind, version: &FormatVersion) -> Result<&'static [Field]> {
    select(RECORD_SCHEMAS, kind, version).ok_or_else(|| {
        Error::UnsupportedVersion(format!("{} for engine {}.{}", kind.name(), version.engine.0, version.engine.1))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_schema() {
        let v = FormatVersion::default();
        for class in ScriptClass::ALL {
            assert!(record_fields(RecordKind::Script(class), &v).is_ok(), "{:?}", class);
        }
        for kind in [RecordKind::GameObject, RecordKind::Transform, RecordKind::MonoScript,
                     RecordKind::Texture2D, RecordKind::AnimationClip] {
            assert!(record_fields(kind, &v).is_ok());
        }
    }

    #[test]
    fn test_version_selection() {
        let old = FormatVersion::new(15, 5, 6);
        let new = FormatVersion::new(22, 2019, 4);
        assert_eq!(layout_fields(Layout::Keyframe, &old).unwrap().len(), 4);
        assert_eq!(layout_fields(Layout::Keyframe, &new).unwrap().len(), 7);
        assert_eq!(layout_fields(Layout::AnimationCurve, &old).unwrap().len(), 4);
        assert_eq!(layout_fields(Layout::ComponentPair, &FormatVersion::new(15, 5, 4)).unwrap().len(), 2);
        assert_eq!(record_fields(RecordKind::Texture2D, &old).unwrap()[1].name, "m_Width");
    }

    #[test]
    fn test_too_old_is_unsupported() {
        let ancient = FormatVersion::new(9, 4, 7);
        assert!(matches!(
            record_fields(RecordKind::Script(ScriptClass::CubismMoc), &ancient),
            Err(Error::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_class_names_round_trip() {
        for class in ScriptClass::ALL {
            assert_eq!(ScriptClass::from_class_name(class.class_name()), Some(class));
        }
        assert_eq!(ScriptClass::from_class_name("Animator"), None);
    }
}
