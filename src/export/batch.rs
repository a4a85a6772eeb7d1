//! Whole-provider export.
//!
//! Discovers models, correlates objects into clusters, plans one output
//! directory per cluster and exports clusters in parallel. A failing model
//! is logged and the batch continues.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{error, info, warn};

use super::assembler::{Assembler, ModelSummary};
use super::config::{ExportConfig, GroupOutputBy};
use super::names::NameTable;
use crate::asset::{AssetProvider, ObjectId};
use crate::correlate::{correlate_by_container, correlate_by_source_file, find_mocs, Correlation, ModelCluster};
use crate::cubism::{discover_models, BoundModel};
use crate::serialized::StructuralDecoder;
use crate::util::path::{last_segment, strip_extension};
use crate::util::{Error, Result};

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub models: Vec<ModelSummary>,
    pub failed: usize,
    /// Objects that matched no model.
    pub uncorrelated: usize,
}

impl BatchSummary {
    pub fn exported(&self) -> usize {
        self.models.len()
    }
}

/// Relative path built from `/`-separated labels, dropping empty, `.` and
/// `..` components.
fn relative_dir(label: &str) -> PathBuf {
    label
        .split(['/', '\\'])
        .filter(|c| !c.is_empty() && *c != "." && *c != "..")
        .map(|c| c.replace(':', "_"))
        .collect()
}

/// Output directory of one cluster, relative to the output root.
pub fn output_dir(cluster: &ModelCluster<'_>, group_by: GroupOutputBy) -> PathBuf {
    match (group_by, &cluster.container) {
        (GroupOutputBy::ContainerPath, Some(container)) => relative_dir(strip_extension(container)),
        (GroupOutputBy::ModelName, _) => relative_dir(&cluster.name),
        _ => relative_dir(last_segment(&cluster.source)).join(relative_dir(&cluster.name)),
    }
}

/// Correlate per configuration; container grouping falls back to source files.
pub fn correlate<'p, P: AssetProvider + ?Sized>(
    dec: StructuralDecoder<'p, P>,
    bound: &HashMap<ObjectId, BoundModel<'p>>,
    config: &ExportConfig,
) -> Correlation<'p> {
    let mocs = find_mocs(dec);
    if config.search_by_filename {
        return correlate_by_source_file(dec, &mocs, bound);
    }
    match correlate_by_container(dec, &mocs) {
        Ok(c) => c,
        Err(e) => {
            warn!("{}, grouping by source file", e);
            correlate_by_source_file(dec, &mocs, bound)
        }
    }
}

/// Export every model found in `provider` under `out`.
///
/// Fails only when the provider holds no objects at all.
pub fn export_all<P: AssetProvider + ?Sized>(provider: &P, out: &Path, config: &ExportConfig) -> Result<BatchSummary> {
    if provider.objects().is_empty() {
        return Err(Error::other("no objects loaded"));
    }
    let dec = StructuralDecoder::new(provider);
    let bound = discover_models(dec);
    let correlation = correlate(dec, &bound, config);
    if correlation.clusters.is_empty() {
        warn!("no Live2D models found");
        return Ok(BatchSummary::default());
    }
    info!(
        "found {} model(s){}",
        correlation.clusters.len(),
        if correlation.full_paths { " (grouped by full container path)" } else { "" }
    );

    // directories are planned up front so collisions resolve in load order
    let dirs = NameTable::new();
    let jobs: Vec<(&ModelCluster<'_>, PathBuf)> = correlation
        .clusters
        .iter()
        .filter_map(|cluster| {
            let rel = output_dir(cluster, config.group_output_by);
            let label = rel.to_string_lossy().into_owned();
            dirs.reserve("output directory", &label, cluster.moc.id.path_id)
                .map(|dir| (cluster, out.join(dir)))
        })
        .collect();

    let assembler = Assembler::new(dec, config, &bound);
    let results: Vec<(String, Result<ModelSummary>)> = jobs
        .par_iter()
        .map(|(cluster, dir)| (cluster.name.clone(), assembler.export(cluster, dir)))
        .collect();

    let mut summary = BatchSummary { uncorrelated: correlation.dropped, ..Default::default() };
    for (name, result) in results {
        match result {
            Ok(model) => summary.models.push(model),
            Err(e) => {
                error!("model '{}' failed: {}", name, e);
                summary.failed += 1;
            }
        }
    }
    info!(
        "exported {} of {} model(s) to {}",
        summary.exported(),
        correlation.clusters.len(),
        out.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_dir_is_contained() {
        assert_eq!(relative_dir("assets/live2d/hiyori"), PathBuf::from("assets/live2d/hiyori"));
        assert_eq!(relative_dir("/abs/../x//y"), PathBuf::from("abs/x/y"));
        assert_eq!(relative_dir("c:\\models\\a"), PathBuf::from("c_/models/a"));
    }
}
