//! `exp3.json` expressions.

use serde::Serialize;

use crate::serialized::Record;
use crate::util::path::last_segment;
use crate::util::{Error, Result};

const EXPRESSION_TYPE: &str = "Live2D Expression";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Exp3Json {
    #[serde(rename = "Type")]
    pub kind: String,
    pub fade_in_time: f32,
    pub fade_out_time: f32,
    pub parameters: Vec<ExpressionParameter>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpressionParameter {
    pub id: String,
    pub value: f32,
    pub blend: &'static str,
}

fn blend_name(raw: i32) -> Result<&'static str> {
    match raw {
        0 => Ok("Add"),
        1 => Ok("Multiply"),
        2 => Ok("Overwrite"),
        other => Err(Error::invalid(format!("unknown expression blend mode {}", other))),
    }
}

/// Expression name: the record name without any `.exp3` suffix.
pub fn expression_name(record: &Record) -> String {
    let name = last_segment(record.str("m_Name").unwrap_or_default());
    name.strip_suffix(".exp3").unwrap_or(name).to_string()
}

impl Exp3Json {
    /// Build from a decoded `CubismExpressionData` record.
    pub fn from_record(record: &Record) -> Result<Self> {
        let params = record
            .records("Parameters")
            .ok_or_else(|| Error::invalid("expression without parameters"))?;
        let parameters = params
            .into_iter()
            .map(|p| {
                Ok(ExpressionParameter {
                    id: p.str("Id").unwrap_or_default().to_string(),
                    value: p.f32("Value").unwrap_or(0.0),
                    blend: blend_name(p.i32("Blend").unwrap_or(0))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let kind = record.str("Type").filter(|t| !t.is_empty()).unwrap_or(EXPRESSION_TYPE);
        Ok(Self {
            kind: kind.to_string(),
            fade_in_time: record.f32("FadeInTime").unwrap_or(0.0),
            fade_out_time: record.f32("FadeOutTime").unwrap_or(0.0),
            parameters,
        })
    }
}
