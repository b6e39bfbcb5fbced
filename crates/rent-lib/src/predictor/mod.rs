//! ML prediction engine

mod features;
mod inference;
mod output;
mod pipeline;

pub use features::{
    check_feature_names, feature_names, feature_spec, FeatureAssembler, FeatureKind,
    FeatureRecord, FeatureSpec, FeatureValue, ENCODED_WIDTH, FEATURE_COUNT, FEATURE_SCHEMA,
    SCHEMA_VERSION,
};
pub use inference::{LinearPredictor, LinearWeights, OnnxPredictor};
pub use output::{
    OutputFormatter, RentEstimate, TargetTransform, DEFAULT_CURRENCY, DISPLAY_DECIMALS,
};
pub use pipeline::RentPipeline;

use crate::error::Result;

/// A loaded, read-only regression model
pub trait Predictor: Send + Sync {
    /// Score one feature record, in the model's trained output space
    fn predict(&self, record: &FeatureRecord) -> Result<f64>;

    /// Version string of the loaded model
    fn model_version(&self) -> &str;

    /// Short backend name for metrics and logs
    fn backend(&self) -> &'static str;
}
