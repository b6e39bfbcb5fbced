//! HTTP API for predictions, form schema, health checks and Prometheus metrics

use rent_lib::{
    health::{ComponentStatus, HealthRegistry},
    predictor::{feature_names, feature_spec, FeatureKind, SCHEMA_VERSION},
    FeatureAssembler, FeatureRecord, PipelineError, RentInputs, RentPipeline, StructuredLogger,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: RentPipeline,
    pub health_registry: HealthRegistry,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(pipeline: RentPipeline, health_registry: HealthRegistry, logger: StructuredLogger) -> Self {
        Self {
            pipeline,
            health_registry,
            logger,
        }
    }
}

/// Pipeline error mapped onto an HTTP response
pub struct ApiError(PipelineError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            PipelineError::InvalidInput { field, reason } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": format!("Invalid value for '{}': {}", field, reason), "field": field })),
            )
                .into_response(),
            PipelineError::SchemaMismatch { missing, unexpected } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "Form fields do not match the expected schema",
                    "missing": missing,
                    "unexpected": unexpected,
                })),
            )
                .into_response(),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": other.user_message() })),
            )
                .into_response(),
        }
    }
}

/// Successful prediction
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub annual_rent: f64,
    pub currency: String,
    pub display: String,
    pub model_version: String,
}

/// Run the pipeline on a submitted form
async fn predict(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Json<PredictResponse>, ApiError> {
    let start = Instant::now();
    match state.pipeline.predict_fields(&fields) {
        Ok(estimate) => {
            state.logger.log_prediction(
                estimate.annual_rent,
                &estimate.model_version,
                start.elapsed().as_micros() as u64,
            );
            state.health_registry.record_success().await;
            Ok(Json(PredictResponse {
                annual_rent: estimate.annual_rent,
                currency: estimate.currency,
                display: estimate.display,
                model_version: estimate.model_version,
            }))
        }
        Err(e) => {
            // both answer 422: the form, not the pipeline, is at fault
            let rejected = matches!(
                e,
                PipelineError::InvalidInput { .. } | PipelineError::SchemaMismatch { .. }
            );
            let reason = e.to_string();
            state.logger.log_prediction_failure(&reason, rejected);
            if !rejected {
                state.health_registry.record_failure(&reason).await;
            }
            Err(ApiError(e))
        }
    }
}

/// One form field as presented to clients
#[derive(Debug, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<&'static [&'static str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u8>,
    pub default: Value,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub schema_version: u32,
    pub model_version: String,
    pub fields: Vec<FieldDescriptor>,
    /// Features computed by the server, never submitted
    pub derived: Vec<&'static str>,
}

/// Describe the form: every input field with its domain and default
async fn schema(State(state): State<Arc<AppState>>) -> Result<Json<SchemaResponse>, ApiError> {
    let defaults = serde_json::to_value(RentInputs::default())
        .map_err(|e| ApiError(PipelineError::Inference(e.to_string())))?;

    let fields = RentInputs::FIELD_NAMES
        .iter()
        .filter_map(|name| feature_spec(name))
        .map(|spec| {
            let (kind, labels, max) = match spec.kind {
                FeatureKind::Continuous => ("number", None, None),
                FeatureKind::Discrete { max } => ("integer", None, Some(max)),
                FeatureKind::Categorical { labels } => ("category", Some(labels), None),
                FeatureKind::Binary => ("boolean", None, None),
                FeatureKind::Derived { .. } => ("derived", None, None),
            };
            FieldDescriptor {
                name: spec.name,
                kind,
                labels,
                max,
                default: defaults.get(spec.name).cloned().unwrap_or(Value::Null),
            }
        })
        .collect();

    let derived = feature_names()
        .filter(|name| matches!(feature_spec(name).map(|s| s.kind), Some(FeatureKind::Derived { .. })))
        .collect();

    Ok(Json(SchemaResponse {
        schema_version: SCHEMA_VERSION,
        model_version: state.pipeline.model_version().to_string(),
        fields,
        derived,
    }))
}

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub inputs: RentInputs,
    pub features: FeatureRecord,
}

/// The default form and the feature record it assembles to
async fn sample() -> Result<Json<SampleResponse>, ApiError> {
    let inputs = RentInputs::default();
    let features = FeatureAssembler::assemble(&inputs).map_err(ApiError)?;
    Ok(Json(SampleResponse { inputs, features }))
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 once the model is loaded
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
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/predict", post(predict))
        .route("/api/v1/schema", get(schema))
        .route("/api/v1/sample", get(sample))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
