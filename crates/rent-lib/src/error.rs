//! Error taxonomy for the rent prediction pipeline

use thiserror::Error;

/// Message shown to users when a prediction cannot be produced
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Prediction failed. Please check your inputs and try again.";

/// Errors raised while assembling features, loading the artifact or running inference
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Feature names do not match the trained model's schema
    #[error("Schema mismatch: missing [{}], unexpected [{}]", .missing.join(", "), .unexpected.join(", "))]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// A field value lies outside its allowed domain
    #[error("Invalid value for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// The model artifact is missing, corrupt or incompatible
    #[error("Artifact load failed: {0}")]
    ArtifactLoad(String),

    /// The model raised while scoring a record
    #[error("Inference failed: {0}")]
    Inference(String),
}

impl PipelineError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Text safe to show to an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput { .. } => self.to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
