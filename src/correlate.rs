//! Grouping objects into per-model clusters.
//!
//! Primary strategy: container-path prefixes. Each moc's container minus its
//! last segment is the model's base path; an object belongs to the first
//! base that it contains as a substring *and* whose last segment it contains
//! as a whole path segment. If mocs share base paths, every moc uses its full
//! container path instead.
//!
//! Secondary binding: objects left over (typically components without a
//! container) are bound by walking their entity upward to a `CubismModel`.
//!
//! Filename strategy: clusters are keyed by source file; hierarchy binding
//! first, then unbound assets attach to the file's only model, if it has
//! exactly one.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::asset::{AssetObject, AssetProvider, ObjectId, ObjectKind};
use crate::cubism::{owning_moc, BoundModel};
use crate::serialized::{ScriptClass, StructuralDecoder};
use crate::util::path::{base_path, file_stem, has_segment, last_segment};
use crate::util::{Error, Result};

/// All fragments attributed to one moc.
#[derive(Clone, Debug)]
pub struct ModelCluster<'p> {
    pub moc: &'p AssetObject,
    /// Model name used for output file names.
    pub name: String,
    /// Grouping key when grouped by container (base or full path).
    pub container: Option<String>,
    /// Source file the moc was loaded from.
    pub source: String,
    pub objects: Vec<&'p AssetObject>,
}

/// Result of a correlation run.
#[derive(Clone, Debug, Default)]
pub struct Correlation<'p> {
    pub clusters: Vec<ModelCluster<'p>>,
    /// Full container paths were used because base paths collided.
    pub full_paths: bool,
    /// Candidate objects that matched no model.
    pub dropped: usize,
}

/// Every `CubismMoc` in load order.
pub fn find_mocs<'p, P: AssetProvider + ?Sized>(dec: StructuralDecoder<'p, P>) -> Vec<&'p AssetObject> {
    dec.provider()
        .objects()
        .iter()
        .filter(|o| o.kind == ObjectKind::MonoBehaviour && dec.script_class(o) == Some(ScriptClass::CubismMoc))
        .collect()
}

/// Kinds the assembler consumes.
fn is_candidate(obj: &AssetObject) -> bool {
    matches!(obj.kind, ObjectKind::MonoBehaviour | ObjectKind::AnimationClip | ObjectKind::Texture2D)
}

fn source_of<P: AssetProvider + ?Sized>(provider: &P, obj: &AssetObject) -> String {
    provider.source_name(obj.id.file).unwrap_or_default().to_string()
}

fn moc_name<P: AssetProvider + ?Sized>(dec: StructuralDecoder<'_, P>, moc: &AssetObject) -> String {
    dec.header(moc)
        .ok()
        .and_then(|h| h.str("m_Name").map(str::to_string))
        .unwrap_or_default()
}

/// Container-prefix correlation followed by hierarchy binding of leftovers.
///
/// Fails with [`Error::Correlation`] when no moc has a container path.
pub fn correlate_by_container<'p, P: AssetProvider + ?Sized>(
    dec: StructuralDecoder<'p, P>,
    mocs: &[&'p AssetObject],
) -> Result<Correlation<'p>> {
    if mocs.iter().all(|m| m.container().is_none()) {
        return Err(Error::Correlation("no moc has a container path".into()));
    }

    let mut full_paths = false;
    if mocs.len() > 1 {
        let bases: HashSet<Option<&str>> = mocs.iter().map(|m| m.container().map(base_path)).collect();
        if bases.len() != mocs.len() {
            full_paths = true;
            warn!("mocs share base paths, grouping by full container path");
        }
    }

    let provider = dec.provider();
    let mut clusters: Vec<ModelCluster<'p>> = Vec::new();
    let mut keys: Vec<String> = Vec::new();
    for moc in mocs {
        let Some(container) = moc.container() else {
            warn!("moc {} has no container path, skipped", moc.id);
            continue;
        };
        let key = if full_paths { container } else { base_path(container) };
        if keys.iter().any(|k| k == key) {
            continue;
        }
        let name = if full_paths { file_stem(container) } else { last_segment(key) };
        keys.push(key.to_string());
        clusters.push(ModelCluster {
            moc,
            name: name.to_string(),
            container: Some(key.to_string()),
            source: source_of(provider, moc),
            objects: Vec::new(),
        });
    }

    let moc_ids: HashSet<ObjectId> = mocs.iter().map(|m| m.id).collect();
    let cluster_of_moc: HashMap<ObjectId, usize> =
        clusters.iter().enumerate().map(|(i, c)| (c.moc.id, i)).collect();
    let mut dropped = 0;
    let mut leftovers = Vec::new();

    for obj in provider.objects() {
        if !is_candidate(obj) || moc_ids.contains(&obj.id) {
            continue;
        }
        let Some(container) = obj.container() else {
            leftovers.push(obj);
            continue;
        };
        match match_key(container, &keys) {
            Some(i) => clusters[i].objects.push(obj),
            None => {
                debug!("{} ({}) matches no model", container, obj.id);
                dropped += 1;
            }
        }
    }

    for obj in leftovers {
        if obj.kind != ObjectKind::MonoBehaviour {
            continue;
        }
        if let Some(&i) = owning_moc(dec, obj).and_then(|m| cluster_of_moc.get(&m.id)) {
            clusters[i].objects.push(obj);
        }
    }

    if dropped > 0 {
        debug!("{} object(s) matched no model", dropped);
    }
    Ok(Correlation { clusters, full_paths, dropped })
}

/// Index of the first key `container` belongs to.
pub fn match_key(container: &str, keys: &[String]) -> Option<usize> {
    keys.iter()
        .position(|key| container.contains(key.as_str()) && has_segment(container, last_segment(key)))
}

/// Group by source file, binding through the entity hierarchy.
pub fn correlate_by_source_file<'p, P: AssetProvider + ?Sized>(
    dec: StructuralDecoder<'p, P>,
    mocs: &[&'p AssetObject],
    bound: &HashMap<ObjectId, BoundModel<'p>>,
) -> Correlation<'p> {
    let provider = dec.provider();
    let mut clusters: Vec<ModelCluster<'p>> = mocs
        .iter()
        .map(|&moc| {
            let source = source_of(provider, moc);
            let name = bound
                .get(&moc.id)
                .map(|b| b.name.clone())
                .filter(|n| !n.is_empty())
                .or_else(|| Some(moc_name(dec, moc)).filter(|n| !n.is_empty()))
                .unwrap_or_else(|| file_stem(&source).to_string());
            ModelCluster { moc, name, container: None, source, objects: Vec::new() }
        })
        .collect();

    let cluster_of_moc: HashMap<ObjectId, usize> =
        clusters.iter().enumerate().map(|(i, c)| (c.moc.id, i)).collect();
    let mut per_file: HashMap<u32, Vec<usize>> = HashMap::new();
    for (i, c) in clusters.iter().enumerate() {
        per_file.entry(c.moc.id.file).or_default().push(i);
    }

    let mut dropped = 0;
    for obj in provider.objects() {
        if !is_candidate(obj) || cluster_of_moc.contains_key(&obj.id) {
            continue;
        }
        let by_hierarchy = match obj.kind {
            ObjectKind::MonoBehaviour => owning_moc(dec, obj).and_then(|m| cluster_of_moc.get(&m.id)).copied(),
            _ => None,
        };
        let target = by_hierarchy.or_else(|| match per_file.get(&obj.id.file).map(Vec::as_slice) {
            Some(&[only]) => Some(only),
            _ => None,
        });
        match target {
            Some(i) => clusters[i].objects.push(obj),
            None => dropped += 1,
        }
    }

    info!("grouped {} model(s) by source file", clusters.len());
    Correlation { clusters, full_paths: false, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_match_requires_whole_segment() {
        let k = keys(&["live2d/hiyori", "live2d/hiyori_pro"]);
        assert_eq!(match_key("live2d/hiyori/tex.png", &k), Some(0));
        // "live2d/hiyori" is a substring but "hiyori" is not a segment
        assert_eq!(match_key("live2d/hiyori_pro/tex.png", &k), Some(1));
        assert_eq!(match_key("other/tex.png", &k), None);
    }

    #[test]
    fn test_first_match_wins() {
        let k = keys(&["a/b", "x/a/b"]);
        assert_eq!(match_key("x/a/b/tex.png", &k), Some(0));
    }
}
