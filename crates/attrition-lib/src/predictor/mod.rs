//! Classifier boundary and prediction adapter

mod onnx;
mod output;
mod pipeline;
mod steps;

pub use onnx::OnnxClassifier;
pub use output::{PredictionFormatter, Severity, PROBABILITY_DECIMALS};
pub use pipeline::{Pipeline, Step};
pub use steps::{
    CategoricalColumn, ColumnEncoder, Estimator, FeatureClipper, HandleUnknown,
    LogisticRegression, Placeholder, RecordEncoder, StandardScaler, VectorTransform,
};

use crate::models::{AttritionClass, Prediction, RawLabel};
use crate::record::EmployeeRecord;
use thiserror::Error;

/// Per-request prediction failure. Never fatal to the process.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Found unknown category '{value}' in column '{column}' during transform")]
    UnknownCategory { column: String, value: String },

    #[error("Column '{0}' is not part of the employee record")]
    MissingColumn(String),

    #[error("Column '{column}' holds '{value}', which is not numeric")]
    NonNumeric { column: String, value: String },

    #[error("{step} expects {expected} features, got {actual}")]
    DimensionMismatch {
        step: String,
        expected: usize,
        actual: usize,
    },

    #[error("predict_proba returned {0} columns, expected 2")]
    ProbabilityShape(usize),

    #[error("predict_proba returned invalid probability {0}")]
    InvalidProbability(f64),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// External classifier contract.
///
/// Both methods take a single-row record; `predict_proba` returns
/// `[p(class 0), p(class 1)]`.
pub trait Classifier: Send + Sync {
    fn predict(&self, record: &EmployeeRecord) -> Result<RawLabel, PredictionError>;

    fn predict_proba(&self, record: &EmployeeRecord) -> Result<Vec<f64>, PredictionError>;

    /// Short human-readable description for logs
    fn describe(&self) -> String {
        "classifier".to_string()
    }
}

/// Run one prediction and normalize the result.
///
/// The label decides the class; the second probability column is reported
/// as the leave probability regardless of which label encoding is in use.
pub fn predict(
    classifier: &dyn Classifier,
    record: &EmployeeRecord,
) -> Result<Prediction, PredictionError> {
    let raw_label = classifier.predict(record)?;
    let proba = classifier.predict_proba(record)?;

    if proba.len() != 2 {
        return Err(PredictionError::ProbabilityShape(proba.len()));
    }
    let leave_probability = proba[1];
    if !leave_probability.is_finite() || !(0.0..=1.0).contains(&leave_probability) {
        return Err(PredictionError::InvalidProbability(leave_probability));
    }

    Ok(Prediction {
        class: AttritionClass::from(&raw_label),
        leave_probability,
        raw_label,
    })
}
