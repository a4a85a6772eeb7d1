//! Bound-model discovery.
//!
//! A `CubismModel` component marks the root entity of an instantiated model
//! and points at its moc. Components found below that root are "directly
//! bound" to the model and take precedence over loosely correlated objects.

use std::collections::HashMap;

use tracing::debug;

use super::hierarchy::Hierarchy;
use crate::asset::{AssetObject, AssetProvider, ObjectId, ObjectKind};
use crate::serialized::{RecordKind, ScriptClass, StructuralDecoder};

/// Components bound to one model through its entity hierarchy.
#[derive(Clone, Debug)]
pub struct BoundModel<'p> {
    /// Root entity name.
    pub name: String,
    /// Root entity carrying the `CubismModel` marker.
    pub root: &'p AssetObject,
    pub moc: &'p AssetObject,
    pub physics: Option<&'p AssetObject>,
    pub fade_controller: Option<&'p AssetObject>,
    pub expression_controller: Option<&'p AssetObject>,
    pub renderers: Vec<&'p AssetObject>,
    pub parameter_display_infos: Vec<&'p AssetObject>,
    pub part_display_infos: Vec<&'p AssetObject>,
    pub pose_parts: Vec<&'p AssetObject>,
}

/// Moc referenced by a `CubismModel` component.
pub fn moc_of<'p, P: AssetProvider + ?Sized>(
    dec: StructuralDecoder<'p, P>,
    model: &'p AssetObject,
) -> Option<&'p AssetObject> {
    let record = dec.decode(model, RecordKind::Script(ScriptClass::CubismModel))?;
    let moc = dec.provider().resolve(model, record.pptr("_moc")?)?;
    (dec.script_class(moc) == Some(ScriptClass::CubismMoc)).then_some(moc)
}

/// Find every model instance and collect its bound components, keyed by moc.
///
/// When several instances share one moc, the first in load order wins.
pub fn discover_models<'p, P: AssetProvider + ?Sized>(dec: StructuralDecoder<'p, P>) -> HashMap<ObjectId, BoundModel<'p>> {
    let hier = Hierarchy::new(dec);
    let mut models = HashMap::new();

    for obj in dec.provider().objects() {
        if obj.kind != ObjectKind::MonoBehaviour || dec.script_class(obj) != Some(ScriptClass::CubismModel) {
            continue;
        }
        let Some(moc) = moc_of(dec, obj) else {
            debug!("CubismModel {} has no readable moc", obj.id);
            continue;
        };
        let Some(root) = hier.owner_of(obj) else {
            debug!("CubismModel {} is not attached to an entity", obj.id);
            continue;
        };
        if models.contains_key(&moc.id) {
            continue;
        }
        let bound = collect_bound(&hier, dec, root, moc);
        debug!(
            "bound model '{}': {} renderers, {} pose parts, physics: {}",
            bound.name,
            bound.renderers.len(),
            bound.pose_parts.len(),
            bound.physics.is_some()
        );
        models.insert(moc.id, bound);
    }
    models
}

fn collect_bound<'p, P: AssetProvider + ?Sized>(
    hier: &Hierarchy<'p, P>,
    dec: StructuralDecoder<'p, P>,
    root: &'p AssetObject,
    moc: &'p AssetObject,
) -> BoundModel<'p> {
    let mut bound = BoundModel {
        name: hier.name(root).unwrap_or_default(),
        root,
        moc,
        physics: None,
        fade_controller: None,
        expression_controller: None,
        renderers: Vec::new(),
        parameter_display_infos: Vec::new(),
        part_display_infos: Vec::new(),
        pose_parts: Vec::new(),
    };

    for entity in hier.descendants(root) {
        for component in hier.components(entity) {
            if component.kind != ObjectKind::MonoBehaviour {
                continue;
            }
            match dec.script_class(component) {
                Some(ScriptClass::CubismPhysicsController) => {
                    bound.physics.get_or_insert(component);
                }
                Some(ScriptClass::CubismFadeController) => {
                    bound.fade_controller.get_or_insert(component);
                }
                Some(ScriptClass::CubismExpressionController) => {
                    bound.expression_controller.get_or_insert(component);
                }
                Some(ScriptClass::CubismRenderer) => bound.renderers.push(component),
                Some(ScriptClass::CubismDisplayInfoParameterName) => bound.parameter_display_infos.push(component),
                Some(ScriptClass::CubismDisplayInfoPartName) => bound.part_display_infos.push(component),
                Some(ScriptClass::CubismPosePart) => bound.pose_parts.push(component),
                _ => {}
            }
        }
    }
    bound
}

/// Moc of the model instance owning `obj`, found by walking its entity upward.
///
/// Works for scripted components and transforms. `None` when the walk
/// reaches the root without meeting a `CubismModel`.
pub fn owning_moc<'p, P: AssetProvider + ?Sized>(
    dec: StructuralDecoder<'p, P>,
    obj: &'p AssetObject,
) -> Option<&'p AssetObject> {
    let hier = Hierarchy::new(dec);
    let entity = match obj.kind {
        ObjectKind::GameObject => obj,
        _ => hier.owner_of(obj)?,
    };
    let model = hier.find_ancestor_component(entity, ScriptClass::CubismModel)?;
    moc_of(dec, model)
}
