//! HTTP routes: prediction form, JSON API, health checks and Prometheus metrics

use anyhow::Context;
use attrition_lib::{
    health::{ComponentStatus, HealthRegistry},
    observability::{AttritionMetrics, StructuredLogger},
    predictor::{PredictionFormatter, Severity},
    record::FIELDS,
    AttritionClass, EmployeeRecord, LoadedModel, Prediction, PredictionError, RawLabel,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::page::{Banner, FormPage, FormValues};

/// Shared application state
pub struct AppState {
    pub model: Arc<LoadedModel>,
    pub health_registry: HealthRegistry,
    pub metrics: AttritionMetrics,
    pub logger: StructuredLogger,
    pub formatter: PredictionFormatter,
    pub page_title: String,
}

impl AppState {
    pub fn new(
        model: Arc<LoadedModel>,
        health_registry: HealthRegistry,
        metrics: AttritionMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            model,
            health_registry,
            metrics,
            logger,
            formatter: PredictionFormatter::new(),
            page_title: "Employee Attrition Prediction".to_string(),
        }
    }

    pub fn with_page_title(mut self, title: impl Into<String>) -> Self {
        self.page_title = title.into();
        self
    }

    /// Run one prediction and record its latency and outcome
    pub fn predict(&self, record: &EmployeeRecord) -> Result<Prediction, PredictionError> {
        let start = Instant::now();
        let prediction = self.model.predict(record)?;
        let elapsed = start.elapsed();

        self.metrics.observe_prediction_latency(elapsed.as_secs_f64());
        self.metrics.inc_predictions(prediction.class.as_str());
        self.logger.log_prediction(
            &prediction,
            self.model.info().version(),
            elapsed.as_secs_f64() * 1000.0,
        );
        Ok(prediction)
    }

    /// Count and log a failed request, returning the message shown to the user
    pub fn report_failure(&self, reason: &str) -> String {
        self.metrics.inc_prediction_errors();
        self.logger.log_prediction_failure(reason);
        self.formatter.failure(reason)
    }

    fn evaluate(
        &self,
        record: Result<EmployeeRecord, impl std::fmt::Display>,
    ) -> Result<(EmployeeRecord, Prediction), String> {
        let record = record.map_err(|e| e.to_string())?;
        let prediction = self.predict(&record).map_err(|e| e.to_string())?;
        Ok((record, prediction))
    }
}

/// JSON body returned by `POST /api/v1/predict`
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub decision: AttritionClass,
    pub leave_probability: f64,
    /// Leave probability rendered with two decimals
    pub probability: String,
    pub message: String,
    pub severity: &'static str,
    pub raw_label: RawLabel,
    pub model_version: String,
    pub record: EmployeeRecord,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Form page with every widget at its default
async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(FormPage::blank(&state.page_title, state.model.info()).render())
}

/// Form submission: re-render with the submitted values and the result
async fn submit_form(
    State(state): State<Arc<AppState>>,
    Form(submitted): Form<HashMap<String, String>>,
) -> Html<String> {
    let outcome = state.evaluate(EmployeeRecord::from_inputs(
        submitted.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    ));

    let mut page = FormPage::blank(&state.page_title, state.model.info());
    page.values = FormValues::from_submission(&submitted);

    match &outcome {
        Ok((record, prediction)) => {
            page.banner = Some(Banner::new(
                state.formatter.severity(prediction),
                state.formatter.message(prediction),
            ));
            page.echo = Some(record);
        }
        Err(reason) => {
            page.banner = Some(Banner::new(Severity::Error, state.report_failure(reason)));
        }
    }

    Html(page.render())
}

async fn predict_json(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Map<String, serde_json::Value>>,
) -> Response {
    match state.evaluate(EmployeeRecord::from_json(&body)) {
        Ok((record, prediction)) => {
            let response = PredictResponse {
                decision: prediction.class,
                leave_probability: prediction.leave_probability,
                probability: state
                    .formatter
                    .format_probability(prediction.leave_probability),
                message: state.formatter.message(&prediction),
                severity: state.formatter.severity(&prediction).css_class(),
                raw_label: prediction.raw_label,
                model_version: state.model.info().version().to_string(),
                record,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(reason) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: state.report_failure(&reason),
            }),
        )
            .into_response(),
    }
}

async fn schema() -> impl IntoResponse {
    Json(FIELDS.as_slice())
}

async fn model_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.model.info().clone())
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still serving
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            e.to_string().into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(submit_form))
        .route("/api/v1/predict", post(predict_json))
        .route("/api/v1/schema", get(schema))
        .route("/api/v1/model", get(model_info))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the HTTP server
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
