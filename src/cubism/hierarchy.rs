//! Entity hierarchy navigation (GameObject / Transform graph).

use std::collections::HashSet;

use crate::asset::{AssetObject, AssetProvider, ObjectId, ObjectKind};
use crate::serialized::{RecordKind, ScriptClass, StructuralDecoder, Value};

/// Upper bound on hierarchy depth; deeper chains are treated as cycles.
const MAX_DEPTH: usize = 256;

/// Read-only view over entities, resolved through the provider.
pub struct Hierarchy<'p, P: AssetProvider + ?Sized> {
    dec: StructuralDecoder<'p, P>,
}

impl<'p, P: AssetProvider + ?Sized> Hierarchy<'p, P> {
    pub fn new(dec: StructuralDecoder<'p, P>) -> Self {
        Self { dec }
    }

    /// Entity owning a component (`m_GameObject` of a script or transform).
    pub fn owner_of(&self, component: &AssetObject) -> Option<&'p AssetObject> {
        let ptr = match component.kind {
            ObjectKind::MonoBehaviour => self.dec.header(component).ok()?.pptr("m_GameObject")?,
            ObjectKind::Transform => self.dec.decode(component, RecordKind::Transform)?.pptr("m_GameObject")?,
            _ => return None,
        };
        self.dec
            .provider()
            .resolve(component, ptr)
            .filter(|o| o.kind == ObjectKind::GameObject)
    }

    /// Entity name.
    pub fn name(&self, entity: &AssetObject) -> Option<String> {
        self.dec
            .decode(entity, RecordKind::GameObject)?
            .str("m_Name")
            .map(str::to_string)
    }

    /// Name of the entity owning a component.
    pub fn owner_name(&self, component: &AssetObject) -> Option<String> {
        self.owner_of(component).and_then(|go| self.name(go))
    }

    /// All resolvable components of an entity, in declaration order.
    pub fn components(&self, entity: &AssetObject) -> Vec<&'p AssetObject> {
        let Some(record) = self.dec.decode(entity, RecordKind::GameObject) else {
            return Vec::new();
        };
        let provider = self.dec.provider();
        record
            .array("m_Component")
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_record)
            .filter_map(|pair| pair.pptr("component"))
            .filter_map(|ptr| provider.resolve(entity, ptr))
            .collect()
    }

    /// First component running the given script.
    pub fn component(&self, entity: &AssetObject, class: ScriptClass) -> Option<&'p AssetObject> {
        self.components(entity)
            .into_iter()
            .filter(|c| c.kind == ObjectKind::MonoBehaviour)
            .find(|c| self.dec.script_class(c) == Some(class))
    }

    fn transform(&self, entity: &AssetObject) -> Option<&'p AssetObject> {
        self.components(entity)
            .into_iter()
            .find(|c| c.kind == ObjectKind::Transform)
    }

    /// Parent entity, or `None` at the root.
    pub fn parent(&self, entity: &AssetObject) -> Option<&'p AssetObject> {
        let transform = self.transform(entity)?;
        let father = self.dec.decode(transform, RecordKind::Transform)?.pptr("m_Father")?;
        let parent_transform = self.dec.provider().resolve(transform, father)?;
        self.owner_of(parent_transform)
    }

    /// Child entities in transform order.
    pub fn children(&self, entity: &AssetObject) -> Vec<&'p AssetObject> {
        let Some(transform) = self.transform(entity) else {
            return Vec::new();
        };
        let Some(record) = self.dec.decode(transform, RecordKind::Transform) else {
            return Vec::new();
        };
        let provider = self.dec.provider();
        record
            .pptrs("m_Children")
            .unwrap_or_default()
            .into_iter()
            .filter_map(|ptr| provider.resolve(transform, ptr))
            .filter_map(|child| self.owner_of(child))
            .collect()
    }

    /// Walk from `entity` upward (inclusive) to the first entity carrying `marker`.
    ///
    /// Returns the marker component. Reaching the root without a match, or a
    /// broken link, is a normal `None`.
    pub fn find_ancestor_component(&self, entity: &'p AssetObject, marker: ScriptClass) -> Option<&'p AssetObject> {
        let mut current = Some(entity);
        let mut seen = HashSet::new();
        while let Some(go) = current {
            if !seen.insert(go.id) || seen.len() > MAX_DEPTH {
                return None;
            }
            if let Some(found) = self.component(go, marker) {
                return Some(found);
            }
            current = self.parent(go);
        }
        None
    }

    /// All entities below `root` (inclusive), breadth first.
    pub fn descendants(&self, root: &'p AssetObject) -> Vec<&'p AssetObject> {
        let mut out = vec![root];
        let mut seen: HashSet<ObjectId> = HashSet::from([root.id]);
        let mut i = 0;
        while i < out.len() && out.len() < MAX_DEPTH * MAX_DEPTH {
            for child in self.children(out[i]) {
                if seen.insert(child.id) {
                    out.push(child);
                }
            }
            i += 1;
        }
        out
    }

    /// Follow a `/`-separated entity name path from `root`.
    pub fn find_path(&self, root: &'p AssetObject, path: &str) -> Option<&'p AssetObject> {
        let mut current = root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self
                .children(current)
                .into_iter()
                .find(|child| self.name(child).as_deref() == Some(segment))?;
        }
        Some(current)
    }
}
