//! Hostel rent prediction library
//!
//! This crate provides the core functionality for:
//! - Typed form inputs with the exact labels the model was trained on
//! - Feature assembly, including the derived log features
//! - Model artifact loading with a startup schema check
//! - Inference and the inverse target transform
//! - Health checks and observability

pub mod artifact;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

pub use artifact::{ArtifactManifest, ArtifactOptions, ModelArtifact, ModelSpec};
pub use error::{PipelineError, GENERIC_FAILURE_MESSAGE};
pub use health::{
    Component, ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse,
    ReadinessResponse,
};
pub use models::*;
pub use observability::{RentMetrics, StructuredLogger};
pub use predictor::{FeatureAssembler, FeatureRecord, Predictor, RentEstimate, RentPipeline};
