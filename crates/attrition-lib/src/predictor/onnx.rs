//! Legacy ONNX artifacts run through tract
//!
//! Graphs take the built-in dense encoding of a record as a single
//! `f32[1, DENSE_WIDTH]` input and emit either `[p_stay, p_leave]` or a
//! single `p_leave`.

use super::{Classifier, PredictionError};
use crate::models::RawLabel;
use crate::record::{EmployeeRecord, DENSE_WIDTH};
use anyhow::{Context, Result};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
const MAX_INFERENCE_MS: u128 = 50;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based classifier using tract for lightweight inference
pub struct OnnxClassifier {
    model: TractModel,
}

impl OnnxClassifier {
    /// Parse and optimize an ONNX graph from bytes
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, DENSE_WIDTH]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(Self { model })
    }

    fn record_to_tensor(record: &EmployeeRecord) -> Result<Tensor, PredictionError> {
        let data = record.to_dense();
        let array = tract_ndarray::Array2::from_shape_vec((1, DENSE_WIDTH), data)
            .map_err(|e| PredictionError::Inference(e.to_string()))?;
        Ok(array.into())
    }

    fn leave_probability(&self, record: &EmployeeRecord) -> Result<f64, PredictionError> {
        let start = Instant::now();
        let input = Self::record_to_tensor(record)?;

        let result = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| PredictionError::Inference(format!("{:#}", e)))?;
        let output = result
            .first()
            .ok_or_else(|| PredictionError::Inference("No output from model".to_string()))?;
        let values: Vec<f32> = output
            .to_array_view::<f32>()
            .map_err(|e| PredictionError::Inference(format!("{:#}", e)))?
            .iter()
            .copied()
            .collect();

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        probability_from_output(&values)
    }
}

/// Interpret a raw output tensor as the positive-class probability
fn probability_from_output(values: &[f32]) -> Result<f64, PredictionError> {
    match values {
        [p_leave] => Ok(f64::from(*p_leave)),
        [_, p_leave] => Ok(f64::from(*p_leave)),
        other => Err(PredictionError::ProbabilityShape(other.len())),
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, record: &EmployeeRecord) -> Result<RawLabel, PredictionError> {
        let p = self.leave_probability(record)?;
        Ok(RawLabel::Int(i64::from(p >= 0.5)))
    }

    fn predict_proba(&self, record: &EmployeeRecord) -> Result<Vec<f64>, PredictionError> {
        let p = self.leave_probability(record)?;
        Ok(vec![1.0 - p, p])
    }

    fn describe(&self) -> String {
        format!("onnx[{} inputs]", DENSE_WIDTH)
    }
}
