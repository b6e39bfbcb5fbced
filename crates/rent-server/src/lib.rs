//! Rent prediction HTTP service
//!
//! Loads the model artifact once at startup and serves predictions,
//! the form schema, health probes and metrics.

pub mod api;
pub mod config;

use anyhow::{Context, Result};
use rent_lib::{
    health::{Component, HealthRegistry},
    ModelArtifact, RentMetrics, RentPipeline, StructuredLogger,
};
use std::sync::Arc;

pub const SERVICE_NAME: &str = "rent-server";

/// Load the artifact and build the shared application state.
///
/// Fails when the artifact cannot be loaded, so the caller never binds a
/// port without a usable model.
pub async fn build_state(config: &config::ServerConfig) -> Result<Arc<api::AppState>> {
    let logger = StructuredLogger::new(SERVICE_NAME);
    let health_registry = HealthRegistry::new();
    health_registry.set_healthy(Component::Pipeline).await;

    let model_path = config.model_path.display().to_string();
    let artifact = match ModelArtifact::load(&config.model_path, &config.artifact_options()) {
        Ok(artifact) => artifact,
        Err(e) => {
            logger.log_artifact_failure(&model_path, &e.to_string());
            return Err(e).with_context(|| format!("Cannot start without model artifact {}", model_path));
        }
    };

    logger.log_artifact_loaded(&artifact.name, &artifact.version, artifact.backend(), &model_path);
    RentMetrics::new().set_model_info(&artifact.name, &artifact.version, artifact.backend());
    health_registry.set_model_loaded(artifact.version.clone()).await;

    let pipeline = RentPipeline::new(Arc::new(artifact));
    Ok(Arc::new(api::AppState::new(pipeline, health_registry, logger)))
}
