//! Per-model export.
//!
//! The assembler takes one [`ModelCluster`] and writes the fixed output set
//! under a model directory. Only the moc and the manifest are mandatory;
//! every other document is skipped with a warning when its sources fail to
//! decode. I/O failures are fatal to the model.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use super::cdi::{display_name, CdiBuilder};
use super::config::{ExportConfig, MotionMode};
use super::expression::{expression_name, Exp3Json};
use super::model3::{parameter_groups, ExpressionRef, FileReferences, Model3Json, MotionRef};
use super::names::NameTable;
use super::pose::PoseBuilder;
use super::texture::export_textures;
use crate::asset::{AssetObject, AssetProvider, ObjectId, ObjectKind};
use crate::correlate::ModelCluster;
use crate::cubism::{BoundModel, Hierarchy, MocInfo};
use crate::motion::{clip_motion, fade_motion, HierarchyBinder, Motion, Motion3Json, NameBinder, TrackBinder};
use crate::physics::{Physics3Json, PhysicsRig};
use crate::serialized::{RecordKind, ScriptClass, StructuralDecoder};
use crate::util::{Error, Result};

pub const MOTION_DIR: &str = "motions";
pub const EXPRESSION_DIR: &str = "expressions";

/// What was written for one model.
#[derive(Debug, Clone, Default)]
pub struct ModelSummary {
    pub name: String,
    pub dir: PathBuf,
    pub textures: usize,
    pub motions: usize,
    pub expressions: usize,
    pub physics: bool,
    pub pose: bool,
    pub display_info: bool,
}

/// Cluster objects sorted by role.
#[derive(Default)]
struct Sources<'p> {
    parameters: Vec<&'p AssetObject>,
    parts: Vec<&'p AssetObject>,
    eye_blink: Vec<&'p AssetObject>,
    lip_sync: Vec<&'p AssetObject>,
    physics: Option<&'p AssetObject>,
    fade_lists: Vec<&'p AssetObject>,
    fade_motions: Vec<&'p AssetObject>,
    expression_lists: Vec<&'p AssetObject>,
    expressions: Vec<&'p AssetObject>,
    pose_parts: Vec<&'p AssetObject>,
    parameter_infos: Vec<&'p AssetObject>,
    part_infos: Vec<&'p AssetObject>,
    renderers: Vec<&'p AssetObject>,
    clips: Vec<&'p AssetObject>,
    textures: Vec<&'p AssetObject>,
}

/// Writes model directories for clusters of one provider.
pub struct Assembler<'a, 'p, P: AssetProvider + ?Sized> {
    dec: StructuralDecoder<'p, P>,
    hierarchy: Hierarchy<'p, P>,
    config: &'a ExportConfig,
    bound: &'a HashMap<ObjectId, BoundModel<'p>>,
}

/// Demote decode and resolution failures of an optional document to a warning.
fn skippable<T>(model: &str, what: &str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(Error::Io(e)) => Err(Error::Io(e)),
        Err(e) => {
            warn!("{}: {} not exported: {}", model, what, e);
            Ok(None)
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(value)?)?;
    Ok(())
}

impl<'a, 'p, P: AssetProvider + ?Sized> Assembler<'a, 'p, P> {
    pub fn new(
        dec: StructuralDecoder<'p, P>,
        config: &'a ExportConfig,
        bound: &'a HashMap<ObjectId, BoundModel<'p>>,
    ) -> Self {
        Self { dec, hierarchy: Hierarchy::new(dec), config, bound }
    }

    /// Export `cluster` into `dir` (created if needed).
    pub fn export(&self, cluster: &ModelCluster<'p>, dir: &Path) -> Result<ModelSummary> {
        let span = info_span!("model", name = %cluster.name);
        let _enter = span.enter();

        let name = cluster.name.as_str();
        let bound = self.bound.get(&cluster.moc.id);
        let mut summary = ModelSummary { name: name.to_string(), dir: dir.to_path_buf(), ..Default::default() };
        fs::create_dir_all(dir)?;

        let moc = self.dec.try_decode(cluster.moc, RecordKind::Script(ScriptClass::CubismMoc))?;
        let blob = moc.bytes("_bytes").ok_or_else(|| Error::invalid("moc without _bytes"))?;
        let moc_file = format!("{}.moc3", name);
        fs::write(dir.join(&moc_file), blob)?;

        let sources = self.sort_sources(cluster);
        let (parameters, parts) = self.name_sets(blob, &sources);

        let mut refs = FileReferences { moc: moc_file, ..Default::default() };

        refs.textures = export_textures(self.dec, &self.texture_sources(bound, &sources), dir, self.config.parallel_textures)?;
        if refs.textures.is_empty() {
            warn!("No textures found for model '{}'", name);
        }
        summary.textures = refs.textures.len();

        let (motions, fps) = self.motions(bound, &sources, &parameters, &parts);
        refs.motions = self.write_motions(dir, &motions)?;
        summary.motions = refs.motions.len();

        let physics = bound.and_then(|b| b.physics).or(sources.physics);
        if let Some(obj) = physics {
            let rig = skippable(name, "physics", PhysicsRig::decode(self.dec, obj))?;
            if let Some(mut rig) = rig {
                rig.retain_resolved(&parameters, &parts);
                let file = format!("{}.physics3.json", name);
                write_json(&dir.join(&file), &Physics3Json::from_rig(&rig, fps))?;
                refs.physics = Some(file);
                summary.physics = true;
            }
        }

        refs.expressions = self.write_expressions(name, dir, bound, &sources)?;
        summary.expressions = refs.expressions.len();

        let pose_parts = match bound {
            Some(b) if !b.pose_parts.is_empty() => &b.pose_parts,
            _ => &sources.pose_parts,
        };
        if let Some(pose) = self.pose(pose_parts) {
            let file = format!("{}.pose3.json", name);
            write_json(&dir.join(&file), &pose)?;
            refs.pose = Some(file);
            summary.pose = true;
        }

        if let Some(cdi) = self.display_info(bound, &sources) {
            let file = format!("{}.cdi3.json", name);
            write_json(&dir.join(&file), &cdi)?;
            refs.display_info = Some(file);
            summary.display_info = true;
        }

        let eye_blink = self.owner_names(&sources.eye_blink);
        let lip_sync = self.owner_names(&sources.lip_sync);
        let manifest = Model3Json {
            version: 3,
            name: name.to_string(),
            file_references: refs,
            groups: parameter_groups(&eye_blink, &lip_sync, &parameters),
        };
        write_json(&dir.join(format!("{}.model3.json", name)), &manifest)?;

        info!(
            "exported '{}': {} texture(s), {} motion(s), {} expression(s)",
            name, summary.textures, summary.motions, summary.expressions
        );
        Ok(summary)
    }

    fn sort_sources(&self, cluster: &ModelCluster<'p>) -> Sources<'p> {
        let mut s = Sources::default();
        for &obj in &cluster.objects {
            match obj.kind {
                ObjectKind::Texture2D => s.textures.push(obj),
                ObjectKind::AnimationClip => s.clips.push(obj),
                ObjectKind::MonoBehaviour => match self.dec.script_class(obj) {
                    Some(ScriptClass::CubismParameter) => s.parameters.push(obj),
                    Some(ScriptClass::CubismPart) => s.parts.push(obj),
                    Some(ScriptClass::CubismEyeBlinkParameter) => s.eye_blink.push(obj),
                    Some(ScriptClass::CubismMouthParameter) => s.lip_sync.push(obj),
                    Some(ScriptClass::CubismPhysicsController) => {
                        s.physics.get_or_insert(obj);
                    }
                    Some(ScriptClass::CubismFadeMotionList) => s.fade_lists.push(obj),
                    Some(ScriptClass::CubismFadeMotionData) => s.fade_motions.push(obj),
                    Some(ScriptClass::CubismExpressionList) => s.expression_lists.push(obj),
                    Some(ScriptClass::CubismExpressionData) => s.expressions.push(obj),
                    Some(ScriptClass::CubismPosePart) => s.pose_parts.push(obj),
                    Some(ScriptClass::CubismDisplayInfoParameterName) => s.parameter_infos.push(obj),
                    Some(ScriptClass::CubismDisplayInfoPartName) => s.part_infos.push(obj),
                    Some(ScriptClass::CubismRenderer) => s.renderers.push(obj),
                    _ => {}
                },
                _ => {}
            }
        }
        s
    }

    /// Parameter and part ids: the moc's own tables when readable, else
    /// the names of entities carrying parameter/part components.
    fn name_sets(&self, blob: &[u8], sources: &Sources<'p>) -> (HashSet<String>, HashSet<String>) {
        match MocInfo::parse(blob) {
            Ok(info) if info.version > 0 => {
                debug!(
                    "moc v{} ({}), {} parameters, {} parts, canvas {}x{}",
                    info.version,
                    info.version_description(),
                    info.parameter_ids.len(),
                    info.part_ids.len(),
                    info.canvas.width,
                    info.canvas.height
                );
                (info.parameter_ids.into_iter().collect(), info.part_ids.into_iter().collect())
            }
            Ok(_) => (self.owner_names(&sources.parameters), self.owner_names(&sources.parts)),
            Err(e) => {
                debug!("moc not inspected: {}", e);
                (self.owner_names(&sources.parameters), self.owner_names(&sources.parts))
            }
        }
    }

    fn owner_names(&self, components: &[&'p AssetObject]) -> HashSet<String> {
        components.iter().filter_map(|c| self.hierarchy.owner_name(c)).collect()
    }

    /// Renderer textures when any resolve, else the cluster's textures.
    fn texture_sources(&self, bound: Option<&BoundModel<'p>>, sources: &Sources<'p>) -> Vec<&'p AssetObject> {
        let renderers = match bound {
            Some(b) if !b.renderers.is_empty() => &b.renderers,
            _ => &sources.renderers,
        };
        let provider = self.dec.provider();
        let mut rendered = Vec::new();
        for &renderer in renderers {
            let texture = self
                .dec
                .decode(renderer, RecordKind::Script(ScriptClass::CubismRenderer))
                .and_then(|r| r.pptr("_mainTexture"))
                .and_then(|ptr| provider.resolve(renderer, ptr))
                .filter(|t| t.kind == ObjectKind::Texture2D);
            match texture {
                Some(t) => rendered.push(t),
                None => {
                    debug!("renderer {} has no resolvable texture, renderer scan stopped", renderer.id);
                    break;
                }
            }
        }
        if rendered.is_empty() {
            sources.textures.clone()
        } else {
            rendered
        }
    }

    /// Objects listed by `field` of the list records, resolved and deduplicated.
    fn listed(&self, lists: &[&'p AssetObject], class: ScriptClass, field: &str) -> Vec<&'p AssetObject> {
        let provider = self.dec.provider();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for &list in lists {
            let Some(record) = self.dec.decode(list, RecordKind::Script(class)) else {
                warn!("{} {} not decoded", class.class_name(), list.id);
                continue;
            };
            for ptr in record.pptrs(field).unwrap_or_default() {
                match provider.resolve(list, ptr) {
                    Some(obj) if seen.insert(obj.id) => out.push(obj),
                    Some(_) => {}
                    None => debug!("{} {}: unresolved entry {:?}", class.class_name(), list.id, ptr),
                }
            }
        }
        out
    }

    /// The list referenced by a controller component.
    fn controller_list(&self, controller: &'p AssetObject, class: ScriptClass, field: &str) -> Option<&'p AssetObject> {
        let record = self.dec.decode(controller, RecordKind::Script(class))?;
        self.dec.provider().resolve(controller, record.pptr(field)?)
    }

    /// Motions in the configured mode, plus the shared playback rate.
    fn motions(
        &self,
        bound: Option<&BoundModel<'p>>,
        sources: &Sources<'p>,
        parameters: &HashSet<String>,
        parts: &HashSet<String>,
    ) -> (Vec<(ObjectId, Motion)>, f32) {
        let mut mode = self.config.motion_mode;
        if mode == MotionMode::FadeList {
            let motions = self.fade_motions(bound, sources, parameters, parts);
            if !motions.is_empty() {
                let fps = motions.iter().map(|(_, m)| m.fps).next().unwrap_or(0.0);
                return (motions, fps);
            }
            if !sources.clips.is_empty() {
                info!("no fade motions found, exporting clips by name");
            }
            mode = MotionMode::ClipV2;
        }

        let name_binder = NameBinder { parameters, parts };
        let hierarchy_binder = bound.map(|b| HierarchyBinder { hierarchy: &self.hierarchy, root: b.root });
        let binder: &dyn TrackBinder = match (mode, &hierarchy_binder) {
            (MotionMode::ClipV1, Some(b)) => b,
            (MotionMode::ClipV1, None) => {
                debug!("no bound model, clips are bound by name");
                &name_binder
            }
            _ => &name_binder,
        };

        let mut motions = Vec::new();
        for &clip in &sources.clips {
            let Some(record) = self.dec.decode(clip, RecordKind::AnimationClip) else {
                warn!("clip {} not decoded", clip.id);
                continue;
            };
            match clip_motion(&record, binder) {
                Ok(m) if m.tracks.is_empty() => warn!("motion '{}' is empty, skipped", m.name),
                Ok(m) => motions.push((clip.id, m)),
                Err(e) => warn!("clip {} skipped: {}", clip.id, e),
            }
        }
        let fps = motions.iter().map(|(_, m)| m.fps).next().unwrap_or(0.0);
        (motions, fps)
    }

    fn fade_motions(
        &self,
        bound: Option<&BoundModel<'p>>,
        sources: &Sources<'p>,
        parameters: &HashSet<String>,
        parts: &HashSet<String>,
    ) -> Vec<(ObjectId, Motion)> {
        let bound_list = bound
            .and_then(|b| b.fade_controller)
            .and_then(|c| self.controller_list(c, ScriptClass::CubismFadeController, "CubismFadeMotionList"));
        let lists: Vec<&'p AssetObject> = match bound_list {
            Some(list) => vec![list],
            None => sources.fade_lists.clone(),
        };
        let mut data = self.listed(&lists, ScriptClass::CubismFadeMotionList, "CubismFadeMotionObjects");
        if data.is_empty() {
            data = sources.fade_motions.clone();
        }

        let mut motions = Vec::new();
        for obj in data {
            let Some(record) = self.dec.decode(obj, RecordKind::Script(ScriptClass::CubismFadeMotionData)) else {
                warn!("fade motion {} not decoded", obj.id);
                continue;
            };
            match fade_motion(&record, parameters, parts) {
                Ok(Some(m)) if !m.tracks.is_empty() => motions.push((obj.id, m)),
                Ok(Some(m)) => warn!("motion '{}' is empty, skipped", m.name),
                Ok(None) => warn!("fade motion {} has no curves, skipped", obj.id),
                Err(e) => warn!("fade motion {} skipped: {}", obj.id, e),
            }
        }
        motions
    }

    fn write_motions(
        &self,
        dir: &Path,
        motions: &[(ObjectId, Motion)],
    ) -> Result<BTreeMap<String, Vec<MotionRef>>> {
        let names = NameTable::new();
        let mut refs = BTreeMap::new();
        for (id, motion) in motions {
            let Some(name) = names.reserve("motion", &motion.name, id.path_id) else {
                continue;
            };
            let file = format!("{}/{}.motion3.json", MOTION_DIR, name);
            write_json(&dir.join(&file), &Motion3Json::from_motion(motion, self.config.force_bezier))?;
            refs.insert(name, vec![MotionRef { file }]);
        }
        Ok(refs)
    }

    fn write_expressions(
        &self,
        model: &str,
        dir: &Path,
        bound: Option<&BoundModel<'p>>,
        sources: &Sources<'p>,
    ) -> Result<Vec<ExpressionRef>> {
        let bound_list = bound.and_then(|b| b.expression_controller).and_then(|c| {
            self.controller_list(c, ScriptClass::CubismExpressionController, "ExpressionsList")
        });
        let lists: Vec<&'p AssetObject> = match bound_list {
            Some(list) => vec![list],
            None => sources.expression_lists.clone(),
        };
        let mut data = self.listed(&lists, ScriptClass::CubismExpressionList, "CubismExpressionObjects");
        if data.is_empty() {
            data = sources.expressions.clone();
        }

        let names = NameTable::new();
        let mut refs = Vec::new();
        for obj in data {
            let decoded = self
                .dec
                .try_decode(obj, RecordKind::Script(ScriptClass::CubismExpressionData))
                .and_then(|r| Exp3Json::from_record(&r).map(|exp| (expression_name(&r), exp)));
            let Some((name, exp)) = skippable(model, &format!("expression {}", obj.id), decoded)? else {
                continue;
            };
            let Some(name) = names.reserve("expression", &name, obj.id.path_id) else {
                continue;
            };
            let file = format!("{}/{}.exp3.json", EXPRESSION_DIR, name);
            write_json(&dir.join(&file), &exp)?;
            refs.push(ExpressionRef { name, file });
        }
        Ok(refs)
    }

    fn pose(&self, parts: &[&'p AssetObject]) -> Option<super::pose::Pose3Json> {
        let mut pose = PoseBuilder::new();
        for &part in parts {
            let Some(record) = self.dec.decode(part, RecordKind::Script(ScriptClass::CubismPosePart)) else {
                warn!("pose part {} not decoded", part.id);
                continue;
            };
            let Some(id) = self.hierarchy.owner_name(part) else {
                debug!("pose part {} has no owning entity, skipped", part.id);
                continue;
            };
            pose.add(record.i32("GroupIndex").unwrap_or(0), id, record.strings("Link").unwrap_or_default());
        }
        pose.build()
    }

    fn display_info(&self, bound: Option<&BoundModel<'p>>, sources: &Sources<'p>) -> Option<super::cdi::Cdi3Json> {
        let (params, parts) = match bound {
            Some(b) if !b.parameter_display_infos.is_empty() || !b.part_display_infos.is_empty() => {
                (&b.parameter_display_infos, &b.part_display_infos)
            }
            _ => (&sources.parameter_infos, &sources.part_infos),
        };
        let mut cdi = CdiBuilder::new();
        let mut collect = |objs: &[&'p AssetObject], class: ScriptClass, parameter: bool| {
            for &obj in objs {
                let Some(record) = self.dec.decode(obj, RecordKind::Script(class)) else {
                    warn!("display info {} not decoded", obj.id);
                    continue;
                };
                let Some(id) = self.hierarchy.owner_name(obj) else {
                    debug!("display info {} has no owning entity, skipped", obj.id);
                    continue;
                };
                if parameter {
                    cdi.parameter(id, display_name(&record));
                } else {
                    cdi.part(id, display_name(&record));
                }
            }
        };
        collect(params.as_slice(), ScriptClass::CubismDisplayInfoParameterName, true);
        collect(parts.as_slice(), ScriptClass::CubismDisplayInfoPartName, false);
        cdi.build()
    }
}
