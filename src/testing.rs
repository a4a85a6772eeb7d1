//! Object-graph fixtures.
//!
//! [`SceneBuilder`] writes real serialized buffers with [`RecordWriter`] and
//! collects them in a [`MemoryProvider`]. Entities are finalized on
//! [`SceneBuilder::build`], once their component and child lists are known.

use std::collections::HashMap;

use crate::asset::{FormatVersion, MemoryProvider, ObjectId, ObjectKind, PPtr};
use crate::cubism::moc::{ID_SIZE, MOC3_MAGIC};
use crate::serialized::{RecordWriter, ScriptClass};

/// Texture format tag for 8-bit RGBA.
pub const RGBA32: i32 = 4;

/// One keyframe: `(time, value, in_slope, out_slope)`.
pub type Key = (f32, f32, f32, f32);

/// Minimal little-endian moc3 blob with the given ID tables.
pub fn moc_blob(version: u8, parameters: &[&str], parts: &[&str]) -> Vec<u8> {
    use crate::cubism::moc::{
        CANVAS_INFO_PTR, COUNT_INFO_PARAMETERS, COUNT_INFO_PTR, PARAMETER_IDS_PTR, PART_IDS_PTR, VERSION_OFFSET,
    };
    let count_info = 0x200usize;
    let canvas = 0x240usize;
    let part_ids = 0x280usize;
    let param_ids = part_ids + parts.len() * ID_SIZE;
    let mut b = vec![0u8; param_ids + parameters.len() * ID_SIZE];
    b[..4].copy_from_slice(MOC3_MAGIC);
    b[VERSION_OFFSET] = version;
    let put = |b: &mut Vec<u8>, at: usize, v: u32| b[at..at + 4].copy_from_slice(&v.to_le_bytes());
    put(&mut b, COUNT_INFO_PTR, count_info as u32);
    put(&mut b, CANVAS_INFO_PTR, canvas as u32);
    put(&mut b, PART_IDS_PTR, part_ids as u32);
    put(&mut b, PARAMETER_IDS_PTR, param_ids as u32);
    put(&mut b, count_info, parts.len() as u32);
    put(&mut b, count_info + COUNT_INFO_PARAMETERS, parameters.len() as u32);
    b[canvas..canvas + 4].copy_from_slice(&100.0f32.to_le_bytes());
    b[canvas + 12..canvas + 16].copy_from_slice(&1024.0f32.to_le_bytes());
    b[canvas + 16..canvas + 20].copy_from_slice(&2048.0f32.to_le_bytes());
    for (i, id) in parts.iter().enumerate() {
        let at = part_ids + i * ID_SIZE;
        b[at..at + id.len()].copy_from_slice(id.as_bytes());
    }
    for (i, id) in parameters.iter().enumerate() {
        let at = param_ids + i * ID_SIZE;
        b[at..at + id.len()].copy_from_slice(id.as_bytes());
    }
    b
}

/// Write an `AnimationCurve` in the writer's version layout.
pub fn write_curve(w: &mut RecordWriter, keys: &[Key]) {
    let version = w.version();
    w.count(keys.len());
    for &(time, value, in_slope, out_slope) in keys {
        w.f32(time).f32(value).f32(in_slope).f32(out_slope);
        if version.engine_at_least(2018, 0) {
            w.i32(0).f32(1.0 / 3.0).f32(1.0 / 3.0);
        }
    }
    w.i32(2).i32(2);
    if version.engine_at_least(5, 3) {
        w.i32(4);
    }
}

/// Physics rig body with one sub-rig per `(input, output)` pair.
pub fn write_rig(w: &mut RecordWriter, links: &[(&str, &str)]) {
    w.count(links.len());
    for (input, output) in links {
        w.count(1).string(input).vec2(0.0, 0.0).f32(1.0).f32(60.0).i32(0).aligned_bool(false);
        w.count(1).string(output).i32(1).vec2(0.0, 0.0).f32(1.5).f32(100.0).i32(2).aligned_bool(true);
        w.count(2);
        w.vec2(0.0, 0.0).f32(1.0).f32(1.0).f32(1.0).f32(0.0);
        w.vec2(0.0, 3.0).f32(0.95).f32(0.9).f32(1.5).f32(3.0);
        // position (max, min, default), then angle
        w.f32(10.0).f32(-10.0).f32(0.0);
        w.f32(-10.0).f32(10.0).f32(0.0);
    }
    w.vec2(0.0, -1.0).vec2(0.0, 0.0);
}

#[derive(Debug)]
struct EntityDraft {
    name: String,
    transform: i64,
    father: Option<i64>,
    components: Vec<i64>,
    children: Vec<i64>,
}

/// Builder for scenes of entities, scripts and assets.
#[derive(Debug)]
pub struct SceneBuilder {
    provider: MemoryProvider,
    file: u32,
    version: FormatVersion,
    next_id: i64,
    scripts: HashMap<(u32, String), i64>,
    entities: HashMap<ObjectId, EntityDraft>,
    entity_order: Vec<ObjectId>,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneBuilder {
    /// Scene with one source file in the default format version.
    pub fn new() -> Self {
        Self::with_version(FormatVersion::default())
    }

    pub fn with_version(version: FormatVersion) -> Self {
        let mut provider = MemoryProvider::new();
        let file = provider.add_file("scene.bundle", version);
        Self {
            provider,
            file,
            version,
            next_id: 1,
            scripts: HashMap::new(),
            entities: HashMap::new(),
            entity_order: Vec::new(),
        }
    }

    /// Start a new source file; later objects go there.
    pub fn source_file(&mut self, name: &str) -> u32 {
        self.file = self.provider.add_file(name, self.version);
        self.file
    }

    fn alloc(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn writer(&self) -> RecordWriter {
        RecordWriter::new(self.version)
    }

    /// Add a raw object to the current file.
    pub fn object(&mut self, kind: ObjectKind, data: Vec<u8>) -> ObjectId {
        let path_id = self.alloc();
        self.provider.add_object(self.file, path_id, kind, data)
    }

    /// Attach a container path.
    pub fn container(&mut self, id: ObjectId, path: &str) -> &mut Self {
        self.provider.set_container(id, path);
        self
    }

    /// MonoScript for `class_name` in the current file (created once).
    pub fn script(&mut self, class_name: &str) -> PPtr {
        let key = (self.file, class_name.to_string());
        if let Some(&id) = self.scripts.get(&key) {
            return PPtr::local(id);
        }
        let mut w = self.writer();
        w.string(class_name).i32(0).string(class_name).string("Live2D.Cubism.Core").string("Assembly-CSharp");
        let id = self.object(ObjectKind::MonoScript, w.into_bytes());
        self.scripts.insert(key, id.path_id);
        PPtr::local(id.path_id)
    }

    /// Entity with a transform, optionally parented.
    pub fn entity(&mut self, name: &str, parent: Option<ObjectId>) -> ObjectId {
        let go = ObjectId::new(self.file, self.alloc());
        let transform = self.alloc();
        let father = parent.and_then(|p| self.entities.get(&p)).map(|d| d.transform);
        if let Some(p) = parent.and_then(|p| self.entities.get_mut(&p)) {
            p.children.push(transform);
        }
        self.entities.insert(
            go,
            EntityDraft {
                name: name.to_string(),
                transform,
                father,
                components: vec![transform],
                children: Vec::new(),
            },
        );
        self.entity_order.push(go);
        go
    }

    /// Scripted object with a custom body, optionally attached to an entity.
    pub fn scripted(
        &mut self,
        entity: Option<ObjectId>,
        class_name: &str,
        name: &str,
        body: impl FnOnce(&mut RecordWriter),
    ) -> ObjectId {
        let script = self.script(class_name);
        let go = entity.map(|e| PPtr::local(e.path_id)).unwrap_or(PPtr::NULL);
        let mut w = self.writer();
        w.script_header(go, script, name);
        body(&mut w);
        let id = self.object(ObjectKind::MonoBehaviour, w.into_bytes());
        if let Some(draft) = entity.and_then(|e| self.entities.get_mut(&e)) {
            draft.components.push(id.path_id);
        }
        id
    }

    /// Body-less component of a known script.
    pub fn component(&mut self, entity: ObjectId, class: ScriptClass, name: &str) -> ObjectId {
        self.scripted(Some(entity), class.class_name(), name, |_| {})
    }

    /// Entity carrying a `CubismParameter` component.
    pub fn parameter(&mut self, name: &str, parent: Option<ObjectId>) -> ObjectId {
        let e = self.entity(name, parent);
        self.component(e, ScriptClass::CubismParameter, "")
    }

    /// Entity carrying a `CubismPart` component.
    pub fn part(&mut self, name: &str, parent: Option<ObjectId>) -> ObjectId {
        let e = self.entity(name, parent);
        self.component(e, ScriptClass::CubismPart, "")
    }

    /// Standalone `CubismMoc` asset.
    pub fn moc(&mut self, name: &str, parameters: &[&str], parts: &[&str]) -> ObjectId {
        let blob = moc_blob(3, parameters, parts);
        self.scripted(None, "CubismMoc", name, |w| {
            w.byte_array(&blob);
        })
    }

    /// `CubismModel` root marker pointing at `moc`.
    pub fn model(&mut self, entity: ObjectId, moc: ObjectId) -> ObjectId {
        self.scripted(Some(entity), "CubismModel", "", |w| {
            w.pptr(PPtr::local(moc.path_id));
        })
    }

    /// `CubismRenderer` with an optional main texture.
    pub fn renderer(&mut self, entity: ObjectId, texture: Option<ObjectId>) -> ObjectId {
        let tex = texture.map(|t| PPtr::local(t.path_id)).unwrap_or(PPtr::NULL);
        self.scripted(Some(entity), "CubismRenderer", "", |w| {
            w.i32(0).pptr(tex);
        })
    }

    /// RGBA32 texture; `pixels` must hold `width * height * 4` bytes.
    pub fn texture(&mut self, name: &str, width: i32, height: i32, pixels: &[u8]) -> ObjectId {
        let mut w = self.writer();
        w.string(name);
        if self.version.engine_at_least(2017, 3) {
            w.i32(0).aligned_bool(false);
        }
        w.i32(width).i32(height).i32(pixels.len() as i32).i32(RGBA32).byte_array(pixels);
        self.object(ObjectKind::Texture2D, w.into_bytes())
    }

    /// Animation clip with float curves `(path, attribute, keys)` and events `(time, data)`.
    pub fn clip(
        &mut self,
        name: &str,
        sample_rate: f32,
        curves: &[(&str, &str, &[Key])],
        events: &[(f32, &str)],
    ) -> ObjectId {
        let mut w = self.writer();
        w.string(name).u8(0).u8(0).aligned_bool(false).f32(sample_rate).i32(0);
        w.count(curves.len());
        for (path, attribute, keys) in curves {
            write_curve(&mut w, keys);
            w.string(attribute).string(path).i32(114).pptr(PPtr::NULL);
        }
        w.count(events.len());
        for (time, data) in events {
            w.f32(*time).string("").string(data).pptr(PPtr::NULL).f32(0.0).i32(0).i32(0);
        }
        self.object(ObjectKind::AnimationClip, w.into_bytes())
    }

    /// `CubismFadeMotionData` asset with one curve per parameter id.
    pub fn fade_motion(&mut self, name: &str, length: f32, curves: &[(&str, &[Key])]) -> ObjectId {
        self.scripted(None, "CubismFadeMotionData", name, |w| {
            w.string(name).f32(1.0).f32(1.0);
            w.count(curves.len());
            for (id, _) in curves {
                w.string(id);
            }
            w.count(curves.len());
            for (_, keys) in curves {
                write_curve(w, keys);
            }
            w.count(curves.len());
            for _ in curves {
                w.f32(-1.0);
            }
            w.count(curves.len());
            for _ in curves {
                w.f32(-1.0);
            }
            w.f32(length);
        })
    }

    /// `CubismFadeMotionList` asset over the given fade motions.
    pub fn fade_list(&mut self, name: &str, motions: &[ObjectId]) -> ObjectId {
        self.scripted(None, "CubismFadeMotionList", name, |w| {
            w.count(motions.len());
            for m in motions {
                w.i32(m.path_id as i32);
            }
            w.count(motions.len());
            for m in motions {
                w.pptr(PPtr::local(m.path_id));
            }
        })
    }

    /// `CubismFadeController` on `entity` pointing at `list`.
    pub fn fade_controller(&mut self, entity: ObjectId, list: ObjectId) -> ObjectId {
        self.scripted(Some(entity), "CubismFadeController", "", |w| {
            w.pptr(PPtr::local(list.path_id));
        })
    }

    /// `CubismExpressionData` asset with `(id, value, blend)` parameters.
    pub fn expression(&mut self, name: &str, parameters: &[(&str, f32, i32)]) -> ObjectId {
        self.scripted(None, "CubismExpressionData", name, |w| {
            w.string("Live2D Expression").f32(1.0).f32(1.0);
            w.count(parameters.len());
            for (id, value, blend) in parameters {
                w.string(id).f32(*value).i32(*blend);
            }
        })
    }

    /// `CubismExpressionList` asset plus a controller on `entity` using it.
    pub fn expression_controller(&mut self, entity: ObjectId, expressions: &[ObjectId]) -> ObjectId {
        let list = self.scripted(None, "CubismExpressionList", "", |w| {
            w.count(expressions.len());
            for e in expressions {
                w.pptr(PPtr::local(e.path_id));
            }
        });
        self.scripted(Some(entity), "CubismExpressionController", "", |w| {
            w.pptr(PPtr::local(list.path_id)).i32(0);
        })
    }

    /// `CubismPhysicsController` on `entity` with one sub-rig per link.
    pub fn physics(&mut self, entity: ObjectId, links: &[(&str, &str)]) -> ObjectId {
        self.scripted(Some(entity), "CubismPhysicsController", "", |w| write_rig(w, links))
    }

    /// `CubismPosePart` on `entity`.
    pub fn pose_part(&mut self, entity: ObjectId, group: i32, links: &[&str]) -> ObjectId {
        self.scripted(Some(entity), "CubismPosePart", "", |w| {
            w.i32(group).i32(0).count(links.len());
            for link in links {
                w.string(link);
            }
        })
    }

    /// Display-name component (`CubismDisplayInfoParameterName` or
    /// `CubismDisplayInfoPartName`) on `entity`.
    pub fn display_info(&mut self, entity: ObjectId, class: ScriptClass, name: &str, display: &str) -> ObjectId {
        self.scripted(Some(entity), class.class_name(), "", |w| {
            w.string(name).string(display);
        })
    }

    /// Finalize entities and return the provider.
    pub fn build(mut self) -> MemoryProvider {
        let component_pair_id = !self.version.engine_at_least(5, 5);
        for go in std::mem::take(&mut self.entity_order) {
            let Some(draft) = self.entities.remove(&go) else { continue };

            let mut w = self.writer();
            w.count(draft.components.len());
            for &c in &draft.components {
                if component_pair_id {
                    w.i32(if c == draft.transform { 4 } else { 114 });
                }
                w.pptr(PPtr::local(c));
            }
            w.i32(0).string(&draft.name).u16(0).aligned_bool(true);
            self.provider.add_object(go.file, go.path_id, ObjectKind::GameObject, w.into_bytes());

            let mut t = self.writer();
            t.pptr(PPtr::local(go.path_id));
            t.f32(0.0).f32(0.0).f32(0.0).f32(1.0);
            t.f32(0.0).f32(0.0).f32(0.0);
            t.f32(1.0).f32(1.0).f32(1.0);
            t.count(draft.children.len());
            for &child in &draft.children {
                t.pptr(PPtr::local(child));
            }
            t.pptr(draft.father.map(PPtr::local).unwrap_or(PPtr::NULL));
            self.provider.add_object(go.file, draft.transform, ObjectKind::Transform, t.into_bytes());
        }
        self.provider
    }
}
