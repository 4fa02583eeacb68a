//! Startup model resolution
//!
//! Picks the first existing candidate, loads it with the format's loader and,
//! when a bundle names a type the registry does not know, registers a single
//! placeholder and retries once.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{load_bundle, ArtifactError, ArtifactFormat, Candidate, SymbolRegistry};
use crate::models::{ModelInfo, Prediction};
use crate::predictor::{self, Classifier, OnnxClassifier, PredictionError};
use crate::record::EmployeeRecord;

/// Fatal model resolution failure
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(
        "No trained model found in {}. Expected one of: {}",
        .dir.display(),
        .expected.join(", ")
    )]
    NotFound { dir: PathBuf, expected: Vec<String> },

    #[error("Failed to load model from {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },

    #[error(
        "Failed to load model from {} after registering a placeholder for '{symbol}': {source}",
        .path.display()
    )]
    ShimRetryFailed {
        path: PathBuf,
        symbol: String,
        #[source]
        source: ArtifactError,
    },
}

/// Deserializes artifact bytes for a given format
pub trait ArtifactLoader: Send + Sync {
    fn load(
        &self,
        format: ArtifactFormat,
        bytes: &[u8],
        registry: &SymbolRegistry,
    ) -> Result<Box<dyn Classifier>, ArtifactError>;
}

/// Loader for the built-in bundle and ONNX formats
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLoader;

impl ArtifactLoader for DefaultLoader {
    fn load(
        &self,
        format: ArtifactFormat,
        bytes: &[u8],
        registry: &SymbolRegistry,
    ) -> Result<Box<dyn Classifier>, ArtifactError> {
        match format {
            ArtifactFormat::Bundle => Ok(Box::new(load_bundle(bytes, registry)?)),
            ArtifactFormat::Onnx => OnnxClassifier::from_bytes(bytes)
                .map(|c| Box::new(c) as Box<dyn Classifier>)
                .map_err(|e| ArtifactError::Onnx(format!("{:#}", e))),
        }
    }
}

/// The model the process serves for its whole lifetime
pub struct LoadedModel {
    classifier: Box<dyn Classifier>,
    info: ModelInfo,
}

impl LoadedModel {
    pub fn new(classifier: Box<dyn Classifier>, info: ModelInfo) -> Self {
        Self { classifier, info }
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Run one prediction against the loaded classifier
    pub fn predict(&self, record: &EmployeeRecord) -> Result<Prediction, PredictionError> {
        predictor::predict(self.classifier.as_ref(), record)
    }
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("classifier", &self.classifier.describe())
            .field("info", &self.info)
            .finish()
    }
}

/// Resolves the candidate list into a loaded model
pub struct ModelResolver<L = DefaultLoader> {
    base_dir: PathBuf,
    candidates: Vec<Candidate>,
    loader: L,
    registry: SymbolRegistry,
}

impl ModelResolver<DefaultLoader> {
    pub fn new(base_dir: impl Into<PathBuf>, candidates: Vec<Candidate>) -> Self {
        Self {
            base_dir: base_dir.into(),
            candidates,
            loader: DefaultLoader,
            registry: SymbolRegistry::with_builtins(),
        }
    }
}

impl<L: ArtifactLoader> ModelResolver<L> {
    /// Swap the loader, keeping directory, candidates and registry
    pub fn with_loader<M: ArtifactLoader>(self, loader: M) -> ModelResolver<M> {
        ModelResolver {
            base_dir: self.base_dir,
            candidates: self.candidates,
            loader,
            registry: self.registry,
        }
    }

    pub fn with_registry(mut self, registry: SymbolRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// First candidate, in declared order, whose file exists
    pub fn select(&self) -> Result<(Candidate, PathBuf), ResolveError> {
        for candidate in &self.candidates {
            let path = self.base_dir.join(&candidate.file);
            if path.is_file() {
                return Ok((candidate.clone(), path));
            }
            debug!(path = %path.display(), "Model candidate not present");
        }

        Err(ResolveError::NotFound {
            dir: self.base_dir.clone(),
            expected: self.candidates.iter().map(|c| c.file.clone()).collect(),
        })
    }

    /// Select, load and fingerprint the model
    pub fn resolve(&mut self) -> Result<LoadedModel, ResolveError> {
        let (candidate, path) = self.select()?;
        info!(path = %path.display(), format = %candidate.format, "Selected model artifact");

        let bytes = std::fs::read(&path).map_err(|source| ResolveError::Load {
            path: path.clone(),
            source: ArtifactError::Io {
                path: path.clone(),
                source,
            },
        })?;

        let classifier = match self.loader.load(candidate.format, &bytes, &self.registry) {
            Ok(classifier) => classifier,
            Err(err) => match err.missing_symbol() {
                Some(symbol) => self.retry_with_placeholder(&candidate, &path, &bytes, symbol, err)?,
                None => return Err(ResolveError::Load { path, source: err }),
            },
        };

        let info = ModelInfo {
            checksum: compute_checksum(&bytes),
            size_bytes: bytes.len(),
            format: candidate.format,
            placeholders: self.registry.placeholders().to_vec(),
            loaded_at: chrono::Utc::now().timestamp(),
            path,
        };

        info!(
            classifier = %classifier.describe(),
            checksum = %info.checksum,
            "Model loaded"
        );

        Ok(LoadedModel::new(classifier, info))
    }

    fn retry_with_placeholder(
        &mut self,
        candidate: &Candidate,
        path: &Path,
        bytes: &[u8],
        symbol: String,
        cause: ArtifactError,
    ) -> Result<Box<dyn Classifier>, ResolveError> {
        warn!(
            symbol = %symbol,
            cause = %cause,
            "Artifact references a missing symbol, registering placeholder and retrying once"
        );
        self.registry.register_placeholder(&symbol);

        self.loader
            .load(candidate.format, bytes, &self.registry)
            .map_err(|source| ResolveError::ShimRetryFailed {
                path: path.to_path_buf(),
                symbol,
                source,
            })
    }
}

/// SHA256 of artifact bytes, hex encoded
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttritionClass, RawLabel};
    use crate::predictor::test_support::StubClassifier;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &[u8]) {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }

    fn candidates(names: &[&str]) -> Vec<Candidate> {
        names
            .iter()
            .map(|n| Candidate::new(*n, ArtifactFormat::Bundle))
            .collect()
    }

    fn valid_bundle(helper: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "format": "attrition-bundle",
            "schema_version": 2,
            "classes": ["No", "Yes"],
            "pipeline": [
                {
                    "type": "attrition.preprocessing.ColumnEncoder",
                    "params": { "categorical": [{ "column": "OverTime", "categories": ["No", "Yes"] }] }
                },
                { "type": helper, "params": { "lower": -5.0, "upper": 5.0 } },
                {
                    "type": "sklearn.linear_model.LogisticRegression",
                    "params": { "coef": [-1.0, 1.0], "intercept": 0.0 }
                }
            ]
        }))
        .unwrap()
    }

    /// Loader that records which bytes it saw and returns a stub
    struct RecordingLoader {
        seen: Arc<std::sync::Mutex<Vec<Vec<u8>>>>,
    }

    impl ArtifactLoader for RecordingLoader {
        fn load(
            &self,
            _format: ArtifactFormat,
            bytes: &[u8],
            _registry: &SymbolRegistry,
        ) -> Result<Box<dyn Classifier>, ArtifactError> {
            self.seen.lock().unwrap().push(bytes.to_vec());
            Ok(Box::new(StubClassifier::new(RawLabel::Int(0), &[0.9, 0.1])))
        }
    }

    /// Loader that always reports the same missing symbol
    struct AlwaysMissing {
        calls: Arc<AtomicUsize>,
    }

    impl ArtifactLoader for AlwaysMissing {
        fn load(
            &self,
            _format: ArtifactFormat,
            _bytes: &[u8],
            _registry: &SymbolRegistry,
        ) -> Result<Box<dyn Classifier>, ArtifactError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ArtifactError::MissingSymbol {
                module: "attrition.helpers".into(),
                attribute: "OutlierClipper".into(),
            })
        }
    }

    #[test]
    fn test_select_prefers_declared_order() {
        let dir = TempDir::new().unwrap();
        // Create the lower-priority file first
        write(&dir, "c.bundle.json", b"{}");
        write(&dir, "b.bundle.json", b"{}");

        let resolver = ModelResolver::new(
            dir.path(),
            candidates(&["a.bundle.json", "b.bundle.json", "c.bundle.json"]),
        );
        let (candidate, path) = resolver.select().unwrap();
        assert_eq!(candidate.file, "b.bundle.json");
        assert_eq!(path, dir.path().join("b.bundle.json"));
    }

    #[test]
    fn test_not_found_lists_every_candidate() {
        let dir = TempDir::new().unwrap();
        let resolver = ModelResolver::new(
            dir.path(),
            vec![
                Candidate::new("attrition_model.bundle.json", ArtifactFormat::Bundle),
                Candidate::new("attrition_model.onnx", ArtifactFormat::Onnx),
            ],
        );

        let err = resolver.select().unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("No trained model found"));
        assert!(message.contains("attrition_model.bundle.json"));
        assert!(message.contains("attrition_model.onnx"));
        match err {
            ResolveError::NotFound { expected, .. } => assert_eq!(expected.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_directories_are_not_candidates() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("a.bundle.json")).unwrap();
        let resolver = ModelResolver::new(dir.path(), candidates(&["a.bundle.json"]));
        assert!(matches!(resolver.select(), Err(ResolveError::NotFound { .. })));
    }

    #[test]
    fn test_resolve_skips_missing_and_loads_present() {
        let dir = TempDir::new().unwrap();
        write(&dir, "B.bundle.json", b"second");
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut resolver = ModelResolver::new(dir.path(), candidates(&["A.bundle.json", "B.bundle.json"]))
            .with_loader(RecordingLoader { seen: seen.clone() });
        let model = resolver.resolve().unwrap();

        assert_eq!(model.info().path, dir.path().join("B.bundle.json"));
        assert_eq!(seen.lock().unwrap().as_slice(), &[b"second".to_vec()]);
        assert_eq!(model.info().size_bytes, 6);
        assert_eq!(model.info().checksum, compute_checksum(b"second"));
        assert!(model.info().placeholders.is_empty());
    }

    #[test]
    fn test_resolve_real_bundle() {
        let dir = TempDir::new().unwrap();
        write(&dir, "attrition_model.bundle.json", &valid_bundle("attrition.helpers.FeatureClipper"));

        let mut resolver = ModelResolver::new(dir.path(), super::super::default_candidates());
        let model = resolver.resolve().unwrap();
        assert_eq!(model.info().format, ArtifactFormat::Bundle);

        let record = EmployeeRecord::from_inputs([("OverTime", "Yes")]).unwrap();
        let prediction = model.predict(&record).unwrap();
        assert_eq!(prediction.class, AttritionClass::Leave);
    }

    #[test]
    fn test_shim_registers_placeholder_and_retries() {
        let dir = TempDir::new().unwrap();
        write(&dir, "attrition_model.bundle.json", &valid_bundle("attrition.helpers.OutlierClipper"));

        let mut resolver = ModelResolver::new(dir.path(), super::super::default_candidates());
        let model = resolver.resolve().unwrap();

        assert_eq!(
            model.info().placeholders,
            vec!["attrition.helpers.OutlierClipper".to_string()]
        );
        assert!(model.info().is_shimmed());
        let prediction = model.predict(&EmployeeRecord::defaults()).unwrap();
        assert_eq!(prediction.raw_label, RawLabel::Text("Yes".into()));
    }

    #[test]
    fn test_shim_retries_exactly_once() {
        let dir = TempDir::new().unwrap();
        write(&dir, "model.bundle.json", b"{}");
        let calls = Arc::new(AtomicUsize::new(0));

        let mut resolver = ModelResolver::new(dir.path(), candidates(&["model.bundle.json"]))
            .with_loader(AlwaysMissing { calls: calls.clone() });
        let err = resolver.resolve().unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.registry().placeholders().len(), 1);
        match err {
            ResolveError::ShimRetryFailed { symbol, source, .. } => {
                assert_eq!(symbol, "attrition.helpers.OutlierClipper");
                assert!(matches!(source, ArtifactError::MissingSymbol { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_second_missing_symbol_is_fatal() {
        let dir = TempDir::new().unwrap();
        let bytes = serde_json::to_vec(&json!({
            "format": "attrition-bundle",
            "schema_version": 2,
            "classes": [0, 1],
            "pipeline": [
                { "type": "attrition.preprocessing.ColumnEncoder", "params": { "numeric": ["Age"] } },
                { "type": "attrition.helpers.First", "params": {} },
                { "type": "attrition.helpers.Second", "params": {} },
                { "type": "sklearn.linear_model.LogisticRegression", "params": { "coef": [0.1] } }
            ]
        }))
        .unwrap();
        write(&dir, "attrition_model.bundle.json", &bytes);

        let mut resolver = ModelResolver::new(dir.path(), super::super::default_candidates());
        let err = resolver.resolve().unwrap_err();
        assert!(matches!(err, ResolveError::ShimRetryFailed { .. }));
        assert!(err.to_string().contains("Second"));
        assert_eq!(resolver.registry().placeholders(), &["attrition.helpers.First".to_string()]);
    }

    #[test]
    fn test_other_errors_are_not_shimmed() {
        let dir = TempDir::new().unwrap();
        write(&dir, "attrition_model.bundle.json", b"{ broken");

        let mut resolver = ModelResolver::new(dir.path(), super::super::default_candidates());
        let err = resolver.resolve().unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Load {
                source: ArtifactError::Parse(_),
                ..
            }
        ));
        assert!(resolver.registry().placeholders().is_empty());
    }

    #[test]
    fn test_corrupt_onnx_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir, "attrition_model.onnx", b"not a graph");

        let mut resolver = ModelResolver::new(dir.path(), super::super::default_candidates());
        let err = resolver.resolve().unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Load {
                source: ArtifactError::Onnx(_),
                ..
            }
        ));
    }

    #[test]
    fn test_compute_checksum() {
        assert_eq!(
            compute_checksum(b"test data"),
            "916f0027a575074ce72a331777c3478d6513f786a591bd892da1a577bf2335f9"
        );
    }
}
