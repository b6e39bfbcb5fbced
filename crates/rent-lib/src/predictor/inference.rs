//! Model backends
//!
//! `OnnxPredictor` runs an exported graph through tract; `LinearPredictor`
//! scores a JSON-declared linear model. Both are immutable once built.

use super::features::{feature_spec, FeatureKind, FeatureRecord, FeatureValue, ENCODED_WIDTH};
use super::Predictor;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 50;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based predictor using tract for lightweight inference
pub struct OnnxPredictor {
    model: TractModel,
    model_version: String,
}

impl OnnxPredictor {
    /// Create a new predictor from model bytes
    pub fn new(model_bytes: &[u8], model_version: impl Into<String>) -> Result<Self> {
        let model = Self::load_model(model_bytes)
            .map_err(|e| PipelineError::ArtifactLoad(format!("{:#}", e)))?;
        Ok(Self {
            model,
            model_version: model_version.into(),
        })
    }

    /// Load and optimize an ONNX model from bytes
    fn load_model(model_bytes: &[u8]) -> anyhow::Result<TractModel> {
        use anyhow::Context;

        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, ENCODED_WIDTH]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    /// Convert a feature record to the graph's input tensor
    fn record_to_tensor(&self, record: &FeatureRecord) -> Result<Tensor> {
        let data = record.encode()?;
        let array = tract_ndarray::Array2::from_shape_vec((1, ENCODED_WIDTH), data)
            .map_err(|e| PipelineError::Inference(format!("Failed to shape input: {}", e)))?;
        Ok(array.into())
    }
}

impl Predictor for OnnxPredictor {
    fn predict(&self, record: &FeatureRecord) -> Result<f64> {
        let start = Instant::now();
        let input = self.record_to_tensor(record)?;

        let result = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| PipelineError::Inference(format!("{:#}", e)))?;
        let output = result
            .first()
            .ok_or_else(|| PipelineError::Inference("No output from model".to_string()))?;
        let score = output
            .to_array_view::<f32>()
            .map_err(|e| PipelineError::Inference(format!("{:#}", e)))?
            .iter()
            .next()
            .copied()
            .ok_or_else(|| PipelineError::Inference("Model output is empty".to_string()))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(f64::from(score))
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }

    fn backend(&self) -> &'static str {
        "onnx"
    }
}

/// Weights of a linear model over the feature contract
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearWeights {
    #[serde(default)]
    pub intercept: f64,
    /// Coefficient per numeric or binary feature
    #[serde(default)]
    pub coefficients: BTreeMap<String, f64>,
    /// Weight per label of each categorical feature; absent labels weigh zero
    #[serde(default)]
    pub levels: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Linear model scored directly from named features
#[derive(Debug, Clone)]
pub struct LinearPredictor {
    weights: LinearWeights,
    model_version: String,
}

impl LinearPredictor {
    /// Build a predictor, rejecting weights for names outside the feature contract
    pub fn new(weights: LinearWeights, model_version: impl Into<String>) -> Result<Self> {
        let mut unexpected = Vec::new();

        for name in weights.coefficients.keys() {
            match feature_spec(name) {
                Some(spec) if !spec.kind.is_categorical() => {}
                _ => unexpected.push(name.clone()),
            }
        }
        for (name, levels) in &weights.levels {
            match feature_spec(name).map(|s| s.kind) {
                Some(FeatureKind::Categorical { labels }) => {
                    for label in levels.keys() {
                        if !labels.contains(&label.as_str()) {
                            unexpected.push(format!("{}={}", name, label));
                        }
                    }
                }
                _ => unexpected.push(name.clone()),
            }
        }

        if !unexpected.is_empty() {
            return Err(PipelineError::SchemaMismatch {
                missing: Vec::new(),
                unexpected,
            });
        }

        Ok(Self {
            weights,
            model_version: model_version.into(),
        })
    }
}

impl Predictor for LinearPredictor {
    fn predict(&self, record: &FeatureRecord) -> Result<f64> {
        let mut score = self.weights.intercept;

        for (name, coefficient) in &self.weights.coefficients {
            let value = record
                .number(name)
                .ok_or_else(|| PipelineError::Inference(format!("Feature '{}' is not numeric or absent", name)))?;
            score += coefficient * value;
        }

        for (name, levels) in &self.weights.levels {
            match record.get(name) {
                Some(FeatureValue::Category(label)) => {
                    score += levels.get(label).copied().unwrap_or(0.0);
                }
                _ => {
                    return Err(PipelineError::Inference(format!(
                        "Feature '{}' is not categorical or absent",
                        name
                    )))
                }
            }
        }

        Ok(score)
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }

    fn backend(&self) -> &'static str {
        "linear"
    }
}
