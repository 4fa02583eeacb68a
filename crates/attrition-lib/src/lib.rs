//! Employee attrition prediction library
//!
//! This crate provides the core functionality for:
//! - The 34-field employee record and its input schema
//! - Model artifact resolution with a single compatibility retry
//! - Bundle pipelines and legacy ONNX inference
//! - Prediction normalization and display formatting
//! - Health checks and observability

pub mod artifact;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod record;

pub use artifact::{
    default_candidates, ArtifactError, ArtifactFormat, Candidate, LoadedModel, ModelResolver,
    ResolveError,
};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AttritionMetrics, StructuredLogger};
pub use predictor::{Classifier, PredictionError, PredictionFormatter, Severity};
pub use record::{EmployeeRecord, FieldValue};
