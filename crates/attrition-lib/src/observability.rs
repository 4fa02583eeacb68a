//! Observability infrastructure for the prediction service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcome counters, loaded model info)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

use crate::models::{ModelInfo, Prediction};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AttritionMetricsInner> = OnceLock::new();

struct AttritionMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    prediction_errors: IntCounter,
    placeholders_registered: IntCounter,
    model_info: GaugeVec,
}

impl AttritionMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "attrition_prediction_latency_seconds",
                "Time spent running a single prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "attrition_predictions_total",
                "Predictions served, by predicted class",
                &["class"]
            )
            .expect("Failed to register predictions_total"),

            prediction_errors: register_int_counter!(
                "attrition_prediction_errors_total",
                "Prediction requests that failed"
            )
            .expect("Failed to register prediction_errors"),

            placeholders_registered: register_int_counter!(
                "attrition_compatibility_placeholders_total",
                "Placeholders registered while loading the model"
            )
            .expect("Failed to register placeholders_registered"),

            model_info: register_gauge_vec!(
                "attrition_model_info",
                "Information about the currently loaded model",
                &["format", "version"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Handle to the process-wide Prometheus metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct AttritionMetrics {
    _private: (),
}

impl Default for AttritionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AttritionMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AttritionMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AttritionMetricsInner {
        GLOBAL_METRICS.get_or_init(AttritionMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, class: &str) {
        self.inner().predictions_total.with_label_values(&[class]).inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    /// Publish the loaded model, replacing any previous series
    pub fn set_model(&self, info: &ModelInfo) {
        let inner = self.inner();
        let format = info.format.to_string();
        inner.model_info.reset();
        inner
            .model_info
            .with_label_values(&[format.as_str(), info.version()])
            .set(1.0);
        inner
            .placeholders_registered
            .inc_by(info.placeholders.len() as u64);
    }
}

/// Structured logger for service events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, bind: &str, model: &ModelInfo) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            bind = %bind,
            model_version = %model.version(),
            "Attrition predictor started"
        );
    }

    pub fn log_model_resolved(&self, model: &ModelInfo) {
        info!(
            event = "model_resolved",
            service = %self.service,
            path = %model.path.display(),
            format = %model.format,
            checksum = %model.checksum,
            size_bytes = model.size_bytes,
            "Model resolved"
        );
    }

    /// One line per placeholder the loader needed
    pub fn log_compatibility_shim(&self, model: &ModelInfo) {
        for symbol in &model.placeholders {
            warn!(
                event = "compatibility_shim_applied",
                service = %self.service,
                path = %model.path.display(),
                symbol = %symbol,
                "Model loaded with a placeholder for a missing type"
            );
        }
    }

    pub fn log_prediction(&self, prediction: &Prediction, model_version: &str, latency_ms: f64) {
        info!(
            event = "prediction_completed",
            service = %self.service,
            class = %prediction.class.as_str(),
            raw_label = %prediction.raw_label,
            leave_probability = prediction.leave_probability,
            model_version = %model_version,
            latency_ms = latency_ms,
            "Prediction completed"
        );
    }

    pub fn log_prediction_failure(&self, reason: &str) {
        warn!(
            event = "prediction_failed",
            service = %self.service,
            reason = %reason,
            "Prediction failed"
        );
    }

    pub fn log_fatal(&self, reason: &str) {
        error!(
            event = "service_failed",
            service = %self.service,
            reason = %reason,
            "Attrition predictor cannot start"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Attrition predictor shutting down"
        );
    }
}
