//! `pose3.json` part groups.

use std::collections::BTreeMap;

use serde::Serialize;

const POSE_TYPE: &str = "Live2D Pose";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Pose3Json {
    #[serde(rename = "Type")]
    pub kind: &'static str,
    pub groups: Vec<Vec<PosePart>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PosePart {
    pub id: String,
    pub link: Vec<String>,
}

/// Collects pose parts and emits groups in ascending group index.
#[derive(Debug, Default)]
pub struct PoseBuilder {
    groups: BTreeMap<i32, Vec<PosePart>>,
}

impl PoseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part to its group; insertion order is kept inside a group.
    pub fn add(&mut self, group_index: i32, id: impl Into<String>, link: Vec<String>) {
        self.groups.entry(group_index).or_default().push(PosePart { id: id.into(), link });
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// `None` when no part was added.
    pub fn build(self) -> Option<Pose3Json> {
        if self.groups.is_empty() {
            return None;
        }
        Some(Pose3Json {
            kind: POSE_TYPE,
            groups: self.groups.into_values().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_in_index_order() {
        let mut pose = PoseBuilder::new();
        pose.add(2, "PartArmB", vec![]);
        pose.add(0, "PartArmA1", vec!["PartArmA2".into()]);
        pose.add(2, "PartArmC", vec![]);
        pose.add(0, "PartArmA2", vec![]);
        let json = serde_json::to_value(pose.build().unwrap()).unwrap();
        assert_eq!(json["Type"], "Live2D Pose");
        let groups = json["Groups"].as_array().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0][0]["Id"], "PartArmA1");
        assert_eq!(groups[0][0]["Link"][0], "PartArmA2");
        assert_eq!(groups[1][1]["Id"], "PartArmC");
    }

    #[test]
    fn test_empty_pose_is_none() {
        assert!(PoseBuilder::new().build().is_none());
    }
}
