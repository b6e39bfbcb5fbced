//! Assemble → invoke → format, one request at a time
//!
//! The pipeline holds the artifact loaded at startup and never reloads it.
//! Each call runs to completion synchronously; nothing is queued and no
//! partial result is observable.

use super::features::{FeatureAssembler, FeatureRecord};
use super::output::{OutputFormatter, RentEstimate};
use crate::artifact::ModelArtifact;
use crate::error::{PipelineError, Result};
use crate::models::RentInputs;
use crate::observability::RentMetrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Prediction pipeline bound to one loaded artifact
#[derive(Clone)]
pub struct RentPipeline {
    artifact: Arc<ModelArtifact>,
    formatter: Arc<OutputFormatter>,
    metrics: RentMetrics,
}

impl RentPipeline {
    pub fn new(artifact: Arc<ModelArtifact>) -> Self {
        let formatter = OutputFormatter::new(artifact.transform);
        Self {
            artifact,
            formatter: Arc::new(formatter),
            metrics: RentMetrics::new(),
        }
    }

    pub fn model_version(&self) -> &str {
        &self.artifact.version
    }

    /// Predict the annual rent for one form submission
    pub fn predict(&self, inputs: &RentInputs) -> Result<RentEstimate> {
        let start = Instant::now();
        let result = FeatureAssembler::assemble(inputs).and_then(|record| self.invoke(&record));
        self.finish(start, result, false)
    }

    /// Predict from a loosely-typed field map, e.g. a raw JSON form body
    pub fn predict_fields(
        &self,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<RentEstimate> {
        let start = Instant::now();
        let inputs = match RentInputs::from_fields(fields) {
            Ok(inputs) => inputs,
            Err(e) => return self.finish(start, Err(e), true),
        };
        let result = FeatureAssembler::assemble(&inputs).and_then(|record| self.invoke(&record));
        self.finish(start, result, false)
    }

    fn invoke(&self, record: &FeatureRecord) -> Result<RentEstimate> {
        let raw_score = self.artifact.predictor().predict(record)?;
        debug!(raw_score, "Model scored record");
        self.formatter.format(raw_score, &self.artifact.version)
    }

    /// Record metrics and logs for one call. `from_form` marks errors raised
    /// while reading the submitted fields, before any feature is assembled.
    fn finish(
        &self,
        start: Instant,
        result: Result<RentEstimate>,
        from_form: bool,
    ) -> Result<RentEstimate> {
        self.metrics
            .observe_prediction_latency(start.elapsed().as_secs_f64());

        match &result {
            Ok(estimate) => {
                self.metrics.inc_predictions_generated();
                debug!(
                    annual_rent = estimate.annual_rent,
                    model_version = %estimate.model_version,
                    "Prediction completed"
                );
            }
            Err(e) if is_rejection(e, from_form) => {
                self.metrics.inc_rejected_inputs();
                warn!(error = %e, "Prediction input rejected");
            }
            Err(e @ PipelineError::SchemaMismatch { .. }) => {
                self.metrics.inc_prediction_errors();
                error!(error = %e, "Feature record does not match the model schema");
            }
            Err(e) => {
                self.metrics.inc_prediction_errors();
                error!(error = %e, model_version = %self.artifact.version, "Prediction failed");
            }
        }

        result
    }
}

/// Whether an error is the submitter's to fix rather than a pipeline fault.
///
/// A schema mismatch in the submitted form is a bad request; the same
/// mismatch between assembled features and the model is an internal fault.
fn is_rejection(err: &PipelineError, from_form: bool) -> bool {
    match err {
        PipelineError::InvalidInput { .. } => true,
        PipelineError::SchemaMismatch { .. } => from_form,
        _ => false,
    }
}
