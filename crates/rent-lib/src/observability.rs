//! Observability infrastructure for the rent predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcomes, loaded model)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, GaugeVec, Histogram, IntCounter,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<RentMetricsInner> = OnceLock::new();

struct RentMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_generated: IntCounter,
    prediction_errors: IntCounter,
    rejected_inputs: IntCounter,
    model_info: GaugeVec,
}

impl RentMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "rent_predictor_prediction_latency_seconds",
                "Time spent assembling features and running the model",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_generated: register_int_counter!(
                "rent_predictor_predictions_total",
                "Total number of rent estimates produced"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors: register_int_counter!(
                "rent_predictor_prediction_errors_total",
                "Total number of predictions that failed inside the pipeline"
            )
            .expect("Failed to register prediction_errors_total"),

            rejected_inputs: register_int_counter!(
                "rent_predictor_rejected_inputs_total",
                "Total number of form submissions rejected for out-of-domain values"
            )
            .expect("Failed to register rejected_inputs_total"),

            model_info: register_gauge_vec!(
                "rent_predictor_model_info",
                "Information about the loaded model artifact",
                &["name", "version", "backend"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Handle to the process-wide prediction metrics
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct RentMetrics {
    _private: (),
}

impl Default for RentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RentMetrics {
    /// Create a new metrics handle (registers global metrics on first call)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(RentMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &RentMetricsInner {
        GLOBAL_METRICS.get_or_init(RentMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions_generated(&self) {
        self.inner().predictions_generated.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    pub fn inc_rejected_inputs(&self) {
        self.inner().rejected_inputs.inc();
    }

    /// Publish the loaded artifact, replacing any previous label set
    pub fn set_model_info(&self, name: &str, version: &str, backend: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[name, version, backend])
            .set(1.0);
    }

    pub fn predictions_generated(&self) -> u64 {
        self.inner().predictions_generated.get()
    }
}

/// Structured logger for service lifecycle events
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

    pub fn log_startup(&self, version: &str, bind_addr: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            service_version = %version,
            bind_addr = %bind_addr,
            "Rent predictor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Rent predictor shutting down"
        );
    }

    pub fn log_artifact_loaded(&self, name: &str, version: &str, backend: &str, path: &str) {
        info!(
            event = "artifact_loaded",
            service = %self.service,
            artifact = %name,
            model_version = %version,
            backend = %backend,
            path = %path,
            "Model artifact ready"
        );
    }

    /// Startup cannot continue without a model
    pub fn log_artifact_failure(&self, path: &str, reason: &str) {
        error!(
            event = "artifact_load_failed",
            service = %self.service,
            path = %path,
            reason = %reason,
            "Model artifact could not be loaded; refusing to serve predictions"
        );
    }

    pub fn log_prediction(&self, annual_rent: f64, model_version: &str, duration_us: u64) {
        info!(
            event = "prediction_generated",
            service = %self.service,
            annual_rent = annual_rent,
            model_version = %model_version,
            duration_us = duration_us,
            "Generated rent prediction"
        );
    }

    pub fn log_prediction_failure(&self, reason: &str, user_error: bool) {
        if user_error {
            info!(
                event = "prediction_rejected",
                service = %self.service,
                reason = %reason,
                "Prediction input rejected"
            );
        } else {
            warn!(
                event = "prediction_failed",
                service = %self.service,
                reason = %reason,
                "Prediction failed"
            );
        }
    }
}
