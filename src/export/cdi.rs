//! `cdi3.json` display names.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::serialized::Record;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Cdi3Json {
    pub version: u32,
    pub parameters: Vec<ParameterName>,
    pub parameter_groups: Vec<ParameterName>,
    pub parts: Vec<PartName>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterName {
    pub id: String,
    pub group_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PartName {
    pub id: String,
    pub name: String,
}

/// `DisplayName` when set, else `Name`.
pub fn display_name(record: &Record) -> String {
    record
        .str("DisplayName")
        .filter(|n| !n.is_empty())
        .or_else(|| record.str("Name"))
        .unwrap_or_default()
        .to_string()
}

/// Display names keyed by id; the first entry for an id wins.
#[derive(Debug, Default)]
pub struct CdiBuilder {
    parameters: BTreeMap<String, String>,
    parts: BTreeMap<String, String>,
}

impl CdiBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameter(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.parameters.entry(id.into()).or_insert_with(|| name.into());
    }

    pub fn part(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.parts.entry(id.into()).or_insert_with(|| name.into());
    }

    /// `None` when nothing was collected.
    pub fn build(self) -> Option<Cdi3Json> {
        if self.parameters.is_empty() && self.parts.is_empty() {
            return None;
        }
        Some(Cdi3Json {
            version: 3,
            parameters: self
                .parameters
                .into_iter()
                .map(|(id, name)| ParameterName { id, group_id: String::new(), name })
                .collect(),
            parameter_groups: Vec::new(),
            parts: self.parts.into_iter().map(|(id, name)| PartName { id, name }).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialized::Value;

    #[test]
    fn test_display_name_override() {
        let mut r = Record::new();
        r.push("Name", Value::String("Angle X".into()));
        r.push("DisplayName", Value::String(String::new()));
        assert_eq!(display_name(&r), "Angle X");

        let mut r = Record::new();
        r.push("Name", Value::String("Angle X".into()));
        r.push("DisplayName", Value::String("角度 X".into()));
        assert_eq!(display_name(&r), "角度 X");
    }

    #[test]
    fn test_sorted_and_deduplicated() {
        let mut cdi = CdiBuilder::new();
        cdi.parameter("ParamB", "B");
        cdi.parameter("ParamA", "A");
        cdi.parameter("ParamA", "A again");
        cdi.part("PartCore", "Core");
        let json = serde_json::to_value(cdi.build().unwrap()).unwrap();
        assert_eq!(json["Version"], 3);
        assert_eq!(json["Parameters"][0]["Id"], "ParamA");
        assert_eq!(json["Parameters"][0]["Name"], "A");
        assert_eq!(json["Parameters"][0]["GroupId"], "");
        assert_eq!(json["Parameters"].as_array().unwrap().len(), 2);
        assert_eq!(json["ParameterGroups"].as_array().unwrap().len(), 0);
        assert_eq!(json["Parts"][0]["Name"], "Core");
    }

    #[test]
    fn test_empty_is_none() {
        assert!(CdiBuilder::new().build().is_none());
    }
}
