//! `model3.json`, the package manifest.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Model3Json {
    pub version: u32,
    pub name: String,
    pub file_references: FileReferences,
    pub groups: Vec<Group>,
}

/// Field order and omission rules are part of the file format.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileReferences {
    pub moc: String,
    pub textures: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_info: Option<String>,
    pub motions: BTreeMap<String, Vec<MotionRef>>,
    pub expressions: Vec<ExpressionRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MotionRef {
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpressionRef {
    pub name: String,
    pub file: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Group {
    pub target: &'static str,
    pub name: &'static str,
    pub ids: Vec<String>,
}

/// Parameter ids that look like eye-open controls (`eye` + `open` + `l`/`r`).
pub fn infer_eye_blink<'a>(parameters: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    infer(parameters, |lower| {
        lower.contains("eye") && lower.contains("open") && (lower.contains('l') || lower.contains('r'))
    })
}

/// Parameter ids that look like mouth-open controls (`mouth` + `open` + `y`).
pub fn infer_lip_sync<'a>(parameters: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    infer(parameters, |lower| lower.contains("mouth") && lower.contains("open") && lower.contains('y'))
}

fn infer<'a>(parameters: impl IntoIterator<Item = &'a String>, pred: impl Fn(&str) -> bool) -> Vec<String> {
    parameters
        .into_iter()
        .filter(|p| pred(&p.to_lowercase()))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// EyeBlink and LipSync groups: explicit tags win, else inferred from names.
pub fn parameter_groups(
    tagged_eye_blink: &HashSet<String>,
    tagged_lip_sync: &HashSet<String>,
    parameters: &HashSet<String>,
) -> Vec<Group> {
    let sorted = |set: &HashSet<String>| set.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
    let eye_blink = if tagged_eye_blink.is_empty() { infer_eye_blink(parameters) } else { sorted(tagged_eye_blink) };
    let lip_sync = if tagged_lip_sync.is_empty() { infer_lip_sync(parameters) } else { sorted(tagged_lip_sync) };
    vec![
        Group { target: "Parameter", name: "EyeBlink", ids: eye_blink },
        Group { target: "Parameter", name: "LipSync", ids: lip_sync },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_heuristics() {
        let params = set(&["ParamEyeLOpen", "ParamEyeROpen", "ParamEyeBallX", "ParamMouthOpenY", "ParamMouthForm"]);
        let groups = parameter_groups(&HashSet::new(), &HashSet::new(), &params);
        assert_eq!(groups[0].name, "EyeBlink");
        assert_eq!(groups[0].ids, vec!["ParamEyeLOpen", "ParamEyeROpen"]);
        assert_eq!(groups[1].ids, vec!["ParamMouthOpenY"]);
    }

    #[test]
    fn test_tagged_parameters_win() {
        let params = set(&["ParamEyeLOpen", "ParamMouthOpenY"]);
        let groups = parameter_groups(&set(&["Blink"]), &HashSet::new(), &params);
        assert_eq!(groups[0].ids, vec!["Blink"]);
        assert_eq!(groups[1].ids, vec!["ParamMouthOpenY"]);
    }

    #[test]
    fn test_field_order_and_omission() {
        let manifest = Model3Json {
            version: 3,
            name: "hiyori".into(),
            file_references: FileReferences {
                moc: "hiyori.moc3".into(),
                physics: Some("hiyori.physics3.json".into()),
                ..Default::default()
            },
            groups: parameter_groups(&HashSet::new(), &HashSet::new(), &HashSet::new()),
        };
        let text = serde_json::to_string(&manifest).unwrap();
        let order = ["\"Version\"", "\"Name\"", "\"FileReferences\"", "\"Moc\"", "\"Textures\"", "\"Physics\"", "\"Motions\"", "\"Expressions\"", "\"Groups\""];
        let positions: Vec<usize> = order.iter().map(|k| text.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", text);
        assert!(!text.contains("\"Pose\""));
        assert!(!text.contains("\"DisplayInfo\""));
    }
}
