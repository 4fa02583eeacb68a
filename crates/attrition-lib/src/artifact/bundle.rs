//! Versioned JSON model bundles

use serde::Deserialize;

use super::{ArtifactError, SymbolRegistry};
use crate::models::RawLabel;
use crate::predictor::Pipeline;

/// Value of the `format` tag every bundle carries
pub const BUNDLE_FORMAT: &str = "attrition-bundle";

pub const MIN_SCHEMA_VERSION: u32 = 1;
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Deserialize)]
struct RawBundle {
    format: String,
    schema_version: u32,
    #[serde(default)]
    classes: Option<Vec<RawLabel>>,
    pipeline: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(rename = "type")]
    type_id: String,
    #[serde(default)]
    params: serde_json::Value,
}

/// Deserialize a bundle and resolve its steps through `registry`
pub fn load_bundle(bytes: &[u8], registry: &SymbolRegistry) -> Result<Pipeline, ArtifactError> {
    let raw: RawBundle = serde_json::from_slice(bytes)?;

    if raw.format != BUNDLE_FORMAT {
        return Err(ArtifactError::UnsupportedFormat(raw.format));
    }
    if !(MIN_SCHEMA_VERSION..=CURRENT_SCHEMA_VERSION).contains(&raw.schema_version) {
        return Err(ArtifactError::UnsupportedVersion {
            found: raw.schema_version,
            min: MIN_SCHEMA_VERSION,
            max: CURRENT_SCHEMA_VERSION,
        });
    }

    let classes = match (raw.schema_version, raw.classes) {
        (_, Some(classes)) => classes,
        // Version 1 bundles predate explicit classes and always used 0/1
        (1, None) => vec![RawLabel::Int(0), RawLabel::Int(1)],
        (version, None) => {
            return Err(ArtifactError::InvalidClasses(format!(
                "schema_version {} requires 'classes'",
                version
            )))
        }
    };
    let classes: [RawLabel; 2] = classes.try_into().map_err(|c: Vec<RawLabel>| {
        ArtifactError::InvalidClasses(format!("expected 2 classes, found {}", c.len()))
    })?;
    if classes[0] == classes[1] {
        return Err(ArtifactError::InvalidClasses(format!(
            "both classes are '{}'",
            classes[0]
        )));
    }

    let steps = raw
        .pipeline
        .iter()
        .map(|step| registry.build(&step.type_id, &step.params))
        .collect::<Result<Vec<_>, _>>()?;

    Pipeline::from_steps(steps, classes).map_err(ArtifactError::InvalidPipeline)
}
