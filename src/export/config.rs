//! Export options.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::util::{Error, Result};

/// Where motions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MotionMode {
    /// Clip curves bound through the model's entity hierarchy.
    #[serde(alias = "clip-based-v1")]
    ClipV1,
    /// Clip curves bound by the last path segment.
    #[serde(alias = "clip-based-v2")]
    ClipV2,
    /// Pre-baked fade motions, falling back to clips when there are none.
    #[default]
    #[serde(alias = "fade-list-based")]
    FadeList,
}

impl FromStr for MotionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "clip_v1" | "clip-based-v1" | "v1" => Ok(Self::ClipV1),
            "clip_v2" | "clip-based-v2" | "v2" => Ok(Self::ClipV2),
            "fade_list" | "fade-list-based" | "fade" => Ok(Self::FadeList),
            other => Err(Error::other(format!("unknown motion mode '{}'", other))),
        }
    }
}

/// Layout of the output tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupOutputBy {
    /// `<out>/<container key without extension>/`
    #[default]
    #[serde(alias = "container-path")]
    ContainerPath,
    /// `<out>/<source file>/<model>/`
    #[serde(alias = "source-filename")]
    SourceFilename,
    /// `<out>/<model>/`
    #[serde(alias = "model-name")]
    ModelName,
}

impl FromStr for GroupOutputBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "container_path" | "container-path" | "container" => Ok(Self::ContainerPath),
            "source_filename" | "source-filename" | "source" => Ok(Self::SourceFilename),
            "model_name" | "model-name" | "model" => Ok(Self::ModelName),
            other => Err(Error::other(format!("unknown grouping '{}'", other))),
        }
    }
}

/// Options for one export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub motion_mode: MotionMode,
    /// Encode every non-flat segment as Bezier.
    pub force_bezier: bool,
    pub group_output_by: GroupOutputBy,
    /// Correlate by source file and entity hierarchy instead of containers.
    pub search_by_filename: bool,
    /// Encode a model's textures in parallel.
    pub parallel_textures: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            motion_mode: MotionMode::FadeList,
            force_bezier: false,
            group_output_by: GroupOutputBy::ContainerPath,
            search_by_filename: false,
            parallel_textures: true,
        }
    }
}

impl ExportConfig {
    /// Default config file location.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("live2d-extractor");
            p.push("config.json");
            p
        })
    }

    /// Read a config file; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Explicit file if given, else the default location, else defaults.
    ///
    /// An unreadable explicit file is an error; an unreadable default file
    /// is ignored.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => Ok(Self::path()
                .filter(|p| p.exists())
                .and_then(|p| Self::from_file(&p).ok())
                .unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: ExportConfig = serde_json::from_str(r#"{"motion_mode": "clip-based-v2", "force_bezier": true}"#).unwrap();
        assert_eq!(cfg.motion_mode, MotionMode::ClipV2);
        assert!(cfg.force_bezier);
        assert_eq!(cfg.group_output_by, GroupOutputBy::ContainerPath);
        assert!(cfg.parallel_textures);
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!("fade-list-based".parse::<MotionMode>().unwrap(), MotionMode::FadeList);
        assert_eq!("clip_v1".parse::<MotionMode>().unwrap(), MotionMode::ClipV1);
        assert_eq!("model-name".parse::<GroupOutputBy>().unwrap(), GroupOutputBy::ModelName);
        assert!("sideways".parse::<GroupOutputBy>().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"group_output_by": "source_filename"}"#).unwrap();
        let cfg = ExportConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.group_output_by, GroupOutputBy::SourceFilename);
        assert!(ExportConfig::load(Some(&dir.path().join("missing.json"))).is_err());
    }
}
