//! Employee attrition predictor
//!
//! Resolves the trained model once at startup, then serves the prediction
//! form until interrupted.

use anyhow::Result;
use attrition_lib::{
    health::HealthRegistry,
    observability::{AttritionMetrics, StructuredLogger},
    ModelResolver,
};
use attrition_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_NAME: &str = "attrition-server";
const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting {}", SERVICE_NAME);

    let config = ServerConfig::load()?;
    info!(
        model_dir = %config.model_dir.display(),
        candidates = config.candidates.len(),
        "Server configured"
    );

    let logger = StructuredLogger::new(SERVICE_NAME);
    let health_registry = HealthRegistry::new();

    // The model is resolved before anything listens; failure is fatal
    let mut resolver = ModelResolver::new(config.model_dir.clone(), config.candidates.clone());
    let model = match resolver.resolve() {
        Ok(model) => Arc::new(model),
        Err(e) => {
            logger.log_fatal(&e.to_string());
            return Err(e.into());
        }
    };

    logger.log_model_resolved(model.info());
    logger.log_compatibility_shim(model.info());
    health_registry.record_model(model.info()).await;

    let metrics = AttritionMetrics::new();
    metrics.set_model(model.info());

    let bind = config.bind_addr();
    let app_state = Arc::new(
        api::AppState::new(model.clone(), health_registry.clone(), metrics, logger.clone())
            .with_page_title(&config.page_title),
    );

    health_registry.set_ready(true).await;
    logger.log_startup(SERVICE_VERSION, &bind, model.info());

    tokio::select! {
        result = api::serve(&bind, app_state) => {
            result?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
