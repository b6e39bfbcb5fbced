//! Prediction output formatting and post-processing
//!
//! Maps raw model scores back to currency units and renders the result line.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Currency the training target was recorded in
pub const DEFAULT_CURRENCY: &str = "GHS";

/// Decimal places shown to users
pub const DISPLAY_DECIMALS: usize = 2;

/// Transform applied to the training target before fitting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetTransform {
    /// Target was fit on `ln(1 + rent)`; inverted with `expm1`
    #[default]
    Log1p,
    /// Target was fit on rent directly
    Identity,
}

impl TargetTransform {
    /// Map a raw score back into currency units
    pub fn inverse(&self, raw: f64) -> f64 {
        match self {
            TargetTransform::Log1p => raw.exp_m1(),
            TargetTransform::Identity => raw,
        }
    }
}

/// A rent estimate ready for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentEstimate {
    /// Annual rent in currency units, at display precision
    pub annual_rent: f64,
    /// Score as returned by the model
    pub raw_score: f64,
    pub currency: String,
    pub display: String,
    pub model_version: String,
    pub generated_at: i64,
}

/// Formats raw model outputs into a `RentEstimate`
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter {
    transform: TargetTransform,
}

impl OutputFormatter {
    pub fn new(transform: TargetTransform) -> Self {
        Self { transform }
    }

    /// Convert a raw score into a non-negative estimate.
    ///
    /// The value is rounded once, by the fixed-precision formatter, so
    /// `annual_rent` always equals the number shown in `display`.
    pub fn format(&self, raw_score: f64, model_version: &str) -> Result<RentEstimate> {
        if !raw_score.is_finite() {
            return Err(PipelineError::Inference(format!(
                "model returned a non-finite score ({})",
                raw_score
            )));
        }

        let rent = self.transform.inverse(raw_score);
        if !rent.is_finite() {
            return Err(PipelineError::Inference(format!(
                "score {} overflows the {:?} inverse",
                raw_score, self.transform
            )));
        }
        // also maps -0.0 to 0.0
        let rent = if rent > 0.0 { rent } else { 0.0 };

        let amount = format!("{:.*}", DISPLAY_DECIMALS, rent);
        let annual_rent: f64 = amount
            .parse()
            .map_err(|e| PipelineError::Inference(format!("unreadable amount '{}': {}", amount, e)))?;

        Ok(RentEstimate {
            annual_rent,
            raw_score,
            currency: DEFAULT_CURRENCY.to_string(),
            display: format!("Predicted Annual Rent: {} {}", DEFAULT_CURRENCY, amount),
            model_version: model_version.to_string(),
            generated_at: chrono::Utc::now().timestamp(),
        })
    }
}
