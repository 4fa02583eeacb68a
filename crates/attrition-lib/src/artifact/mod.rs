//! Model artifact discovery and loading
//!
//! This module provides:
//! - The ordered candidate list of artifact files
//! - Bundle (versioned JSON) and ONNX (legacy graph) deserialization
//! - An explicit symbol registry with legacy aliases and shim placeholders
//! - The startup resolver that picks, loads and fingerprints the model

mod bundle;
mod registry;
mod resolver;

pub use bundle::{load_bundle, BUNDLE_FORMAT, CURRENT_SCHEMA_VERSION, MIN_SCHEMA_VERSION};
pub use registry::{split_symbol, StepFactory, SymbolRegistry};
pub use resolver::{ArtifactLoader, DefaultLoader, LoadedModel, ModelResolver, ResolveError};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Serialization format of an artifact file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// Versioned JSON bundle resolved through the symbol registry
    Bundle,
    /// Legacy raw ONNX graph
    Onnx,
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactFormat::Bundle => f.write_str("bundle"),
            ArtifactFormat::Onnx => f.write_str("onnx"),
        }
    }
}

/// One entry of the candidate list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub file: String,
    pub format: ArtifactFormat,
}

impl Candidate {
    pub fn new(file: impl Into<String>, format: ArtifactFormat) -> Self {
        Self {
            file: file.into(),
            format,
        }
    }
}

/// Default candidates, preferred first
pub fn default_candidates() -> Vec<Candidate> {
    vec![
        Candidate::new("attrition_model.bundle.json", ArtifactFormat::Bundle),
        Candidate::new("employee-attrition.bundle.json", ArtifactFormat::Bundle),
        Candidate::new("attrition_model.onnx", ArtifactFormat::Onnx),
        Candidate::new("employee-attrition.onnx", ArtifactFormat::Onnx),
    ]
}

/// Failure to turn artifact bytes into a classifier
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model bundle: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported bundle format '{0}'")]
    UnsupportedFormat(String),

    #[error("Unsupported bundle schema_version {found} (supported {min}..={max})")]
    UnsupportedVersion { found: u32, min: u32, max: u32 },

    /// The artifact names a type the running code does not provide
    #[error("Can't get attribute '{attribute}' on module '{module}'")]
    MissingSymbol { module: String, attribute: String },

    #[error("Invalid parameters for {symbol}: {reason}")]
    InvalidParams { symbol: String, reason: String },

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error("Invalid classes: {0}")]
    InvalidClasses(String),

    #[error("Failed to load ONNX graph: {0}")]
    Onnx(String),
}

impl ArtifactError {
    /// Fully qualified identifier of a missing symbol
    pub fn missing_symbol(&self) -> Option<String> {
        match self {
            ArtifactError::MissingSymbol { module, attribute } if module.is_empty() => {
                Some(attribute.clone())
            }
            ArtifactError::MissingSymbol { module, attribute } => {
                Some(format!("{}.{}", module, attribute))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_candidates_prefer_bundles() {
        let candidates = default_candidates();
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0].format, ArtifactFormat::Bundle);
        assert_eq!(candidates[3].format, ArtifactFormat::Onnx);
        let first_onnx = candidates
            .iter()
            .position(|c| c.format == ArtifactFormat::Onnx)
            .unwrap();
        assert!(candidates[..first_onnx]
            .iter()
            .all(|c| c.format == ArtifactFormat::Bundle));
    }

    #[test]
    fn test_missing_symbol_message() {
        let err = ArtifactError::MissingSymbol {
            module: "attrition.helpers".into(),
            attribute: "OutlierClipper".into(),
        };
        assert_eq!(
            err.to_string(),
            "Can't get attribute 'OutlierClipper' on module 'attrition.helpers'"
        );
        assert_eq!(err.missing_symbol().as_deref(), Some("attrition.helpers.OutlierClipper"));
        assert!(ArtifactError::InvalidPipeline("x".into()).missing_symbol().is_none());
    }

    #[test]
    fn test_candidate_deserializes_from_config() {
        let candidate: Candidate =
            serde_json::from_str(r#"{"file": "model.onnx", "format": "onnx"}"#).unwrap();
        assert_eq!(candidate, Candidate::new("model.onnx", ArtifactFormat::Onnx));
    }
}
