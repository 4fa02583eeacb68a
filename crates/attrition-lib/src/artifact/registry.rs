//! Symbol registry for bundle pipeline steps
//!
//! Bundles name every step by a fully qualified type identifier. The registry
//! maps identifiers to step factories, renames legacy identifiers through an
//! alias table, and records placeholders registered by the compatibility shim.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::debug;

use super::ArtifactError;
use crate::predictor::{
    ColumnEncoder, FeatureClipper, LogisticRegression, Placeholder, StandardScaler, Step,
};

/// Builds a step from its bundle parameters
pub type StepFactory = fn(&serde_json::Value) -> Result<Step, ArtifactError>;

pub const COLUMN_ENCODER: &str = "attrition.preprocessing.ColumnEncoder";
pub const STANDARD_SCALER: &str = "sklearn.preprocessing.StandardScaler";
pub const FEATURE_CLIPPER: &str = "attrition.helpers.FeatureClipper";
pub const LOGISTIC_REGRESSION: &str = "sklearn.linear_model.LogisticRegression";

/// Legacy identifier → current identifier
const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("attrition.transformers.ColumnEncoder", COLUMN_ENCODER),
    ("attrition.preprocessing._encoders.ColumnEncoder", COLUMN_ENCODER),
    ("sklearn.preprocessing._data.StandardScaler", STANDARD_SCALER),
    ("attrition.helpers._clip.FeatureClipper", FEATURE_CLIPPER),
    ("sklearn.linear_model._logistic.LogisticRegression", LOGISTIC_REGRESSION),
];

#[derive(Debug, Clone, Copy)]
enum Entry {
    Factory(StepFactory),
    Placeholder,
}

/// Explicit type registry consulted while resolving bundle steps
#[derive(Debug, Clone)]
pub struct SymbolRegistry {
    entries: HashMap<String, Entry>,
    aliases: HashMap<String, String>,
    placeholders: Vec<String>,
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl SymbolRegistry {
    /// Registry with no symbols at all
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            aliases: HashMap::new(),
            placeholders: Vec::new(),
        }
    }

    /// Registry with the built-in steps and legacy aliases
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(COLUMN_ENCODER, build_column_encoder);
        registry.register(STANDARD_SCALER, build_standard_scaler);
        registry.register(FEATURE_CLIPPER, build_feature_clipper);
        registry.register(LOGISTIC_REGRESSION, build_logistic_regression);
        for (legacy, current) in LEGACY_ALIASES {
            registry.alias(legacy, current);
        }
        registry
    }

    pub fn register(&mut self, symbol: &str, factory: StepFactory) {
        self.entries.insert(symbol.to_string(), Entry::Factory(factory));
    }

    pub fn alias(&mut self, legacy: &str, current: &str) {
        self.aliases.insert(legacy.to_string(), current.to_string());
    }

    /// Register a behaviourless stand-in for a missing symbol.
    ///
    /// Returns false when the symbol is already known.
    pub fn register_placeholder(&mut self, symbol: &str) -> bool {
        if self.contains(symbol) {
            return false;
        }
        self.entries.insert(symbol.to_string(), Entry::Placeholder);
        self.placeholders.push(symbol.to_string());
        true
    }

    /// Symbols registered through [`register_placeholder`](Self::register_placeholder)
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(self.canonical(symbol))
    }

    fn canonical<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.aliases.get(symbol).map(String::as_str).unwrap_or(symbol)
    }

    /// Build a step for `symbol` from its parameters
    pub fn build(&self, symbol: &str, params: &serde_json::Value) -> Result<Step, ArtifactError> {
        let canonical = self.canonical(symbol);
        if canonical != symbol {
            debug!(legacy = %symbol, current = %canonical, "Resolved legacy symbol");
        }

        match self.entries.get(canonical) {
            Some(Entry::Factory(factory)) => factory(params),
            Some(Entry::Placeholder) => Ok(Step::Transform(Box::new(Placeholder::new(canonical)))),
            None => {
                let (module, attribute) = split_symbol(symbol);
                Err(ArtifactError::MissingSymbol {
                    module: module.to_string(),
                    attribute: attribute.to_string(),
                })
            }
        }
    }
}

/// Split `module.path.Attribute` into module path and attribute name
pub fn split_symbol(symbol: &str) -> (&str, &str) {
    symbol.rsplit_once('.').unwrap_or(("", symbol))
}

fn params<T: DeserializeOwned>(symbol: &str, value: &serde_json::Value) -> Result<T, ArtifactError> {
    serde_json::from_value(value.clone()).map_err(|e| ArtifactError::InvalidParams {
        symbol: symbol.to_string(),
        reason: e.to_string(),
    })
}

fn build_column_encoder(value: &serde_json::Value) -> Result<Step, ArtifactError> {
    let encoder: ColumnEncoder = params(COLUMN_ENCODER, value)?;
    Ok(Step::Encoder(Box::new(encoder)))
}

fn build_standard_scaler(value: &serde_json::Value) -> Result<Step, ArtifactError> {
    let scaler: StandardScaler = params(STANDARD_SCALER, value)?;
    scaler.validate().map_err(|reason| ArtifactError::InvalidParams {
        symbol: STANDARD_SCALER.to_string(),
        reason,
    })?;
    Ok(Step::Transform(Box::new(scaler)))
}

fn build_feature_clipper(value: &serde_json::Value) -> Result<Step, ArtifactError> {
    let clipper: FeatureClipper = params(FEATURE_CLIPPER, value)?;
    clipper.validate().map_err(|reason| ArtifactError::InvalidParams {
        symbol: FEATURE_CLIPPER.to_string(),
        reason,
    })?;
    Ok(Step::Transform(Box::new(clipper)))
}

fn build_logistic_regression(value: &serde_json::Value) -> Result<Step, ArtifactError> {
    let model: LogisticRegression = params(LOGISTIC_REGRESSION, value)?;
    Ok(Step::Estimator(Box::new(model)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtins_registered() {
        let registry = SymbolRegistry::with_builtins();
        assert!(registry.contains(COLUMN_ENCODER));
        assert!(registry.contains(LOGISTIC_REGRESSION));
        assert!(registry.placeholders().is_empty());
    }

    #[test]
    fn test_legacy_alias_resolves() {
        let registry = SymbolRegistry::with_builtins();
        let step = registry
            .build(
                "sklearn.linear_model._logistic.LogisticRegression",
                &json!({ "coef": [0.5], "intercept": 0.1 }),
            )
            .unwrap();
        assert!(matches!(step, Step::Estimator(_)));
    }

    #[test]
    fn test_unknown_symbol_is_missing() {
        let registry = SymbolRegistry::with_builtins();
        let err = registry
            .build("attrition.helpers.OutlierClipper", &json!({}))
            .unwrap_err();
        match err {
            ArtifactError::MissingSymbol { module, attribute } => {
                assert_eq!(module, "attrition.helpers");
                assert_eq!(attribute, "OutlierClipper");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_placeholder_registration() {
        let mut registry = SymbolRegistry::with_builtins();
        assert!(registry.register_placeholder("attrition.helpers.OutlierClipper"));
        assert!(!registry.register_placeholder("attrition.helpers.OutlierClipper"));
        assert!(!registry.register_placeholder(COLUMN_ENCODER));
        assert_eq!(registry.placeholders(), &["attrition.helpers.OutlierClipper".to_string()]);

        let step = registry
            .build("attrition.helpers.OutlierClipper", &json!({ "anything": 1 }))
            .unwrap();
        match step {
            Step::Transform(t) => assert!(t.is_placeholder()),
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_params() {
        let registry = SymbolRegistry::with_builtins();
        let err = registry
            .build(STANDARD_SCALER, &json!({ "mean": [1.0, 2.0], "scale": [1.0] }))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidParams { .. }));

        let err = registry.build(LOGISTIC_REGRESSION, &json!({ "coef": "x" })).unwrap_err();
        assert!(err.to_string().contains(LOGISTIC_REGRESSION));
    }

    #[test]
    fn test_split_symbol() {
        assert_eq!(split_symbol("a.b.C"), ("a.b", "C"));
        assert_eq!(split_symbol("Bare"), ("", "Bare"));
    }
}
