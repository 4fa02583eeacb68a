//! Core data models for attrition prediction

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::artifact::ArtifactFormat;

/// Label as emitted by the underlying classifier.
///
/// Training pipelines encode the target either as `0`/`1` or as `"No"`/`"Yes"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLabel {
    Int(i64),
    Text(String),
}

impl RawLabel {
    /// True for the positive ("leave") class in either encoding
    pub fn is_leave(&self) -> bool {
        match self {
            RawLabel::Int(v) => *v == 1,
            RawLabel::Text(v) => v == "Yes",
        }
    }
}

impl fmt::Display for RawLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawLabel::Int(v) => write!(f, "{}", v),
            RawLabel::Text(v) => f.write_str(v),
        }
    }
}

/// Normalized decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttritionClass {
    Stay,
    Leave,
}

impl AttritionClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttritionClass::Stay => "stay",
            AttritionClass::Leave => "leave",
        }
    }
}

impl From<&RawLabel> for AttritionClass {
    fn from(label: &RawLabel) -> Self {
        if label.is_leave() {
            AttritionClass::Leave
        } else {
            AttritionClass::Stay
        }
    }
}

/// Result of a single prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub class: AttritionClass,
    /// Probability mass on the positive ("leave") class
    pub leave_probability: f64,
    pub raw_label: RawLabel,
}

/// Provenance of the loaded model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub path: PathBuf,
    pub format: ArtifactFormat,
    /// SHA-256 of the artifact bytes, hex encoded
    pub checksum: String,
    pub size_bytes: usize,
    /// Type identifiers that were stood in for by placeholders
    pub placeholders: Vec<String>,
    pub loaded_at: i64,
}

impl ModelInfo {
    /// Short version string used in logs and metrics
    pub fn version(&self) -> &str {
        self.checksum.get(..12).unwrap_or(&self.checksum)
    }

    pub fn is_shimmed(&self) -> bool {
        !self.placeholders.is_empty()
    }
}
