//! Model artifact loading
//!
//! An artifact is a JSON manifest describing the trained model: its version,
//! the feature names it was fit on, the target transform, and the model
//! payload (inline linear weights or a path to an ONNX graph). Loading checks
//! the feature names against the contract so a mismatch stops the process at
//! startup instead of failing the first prediction.

use crate::error::{PipelineError, Result};
use crate::predictor::{
    check_feature_names, LinearPredictor, LinearWeights, OnnxPredictor, Predictor,
    TargetTransform, SCHEMA_VERSION,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Default limit on ONNX payload size (64 MiB)
pub const DEFAULT_MAX_MODEL_BYTES: usize = 64 * 1024 * 1024;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Manifest file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactManifest {
    pub name: String,
    pub version: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub target_transform: TargetTransform,
    /// Feature names the model was trained on
    pub features: Vec<String>,
    pub model: ModelSpec,
}

/// Model payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelSpec {
    /// ONNX graph on disk, resolved relative to the manifest
    Onnx {
        path: PathBuf,
        #[serde(default)]
        sha256: Option<String>,
    },
    /// Linear weights inline in the manifest
    Linear(LinearWeights),
}

/// Options applied while loading an artifact
#[derive(Debug, Clone)]
pub struct ArtifactOptions {
    /// Largest ONNX payload accepted
    pub max_model_bytes: usize,
}

impl Default for ArtifactOptions {
    fn default() -> Self {
        Self {
            max_model_bytes: DEFAULT_MAX_MODEL_BYTES,
        }
    }
}

/// A loaded model plus the metadata needed to interpret its output
#[derive(Clone)]
pub struct ModelArtifact {
    pub name: String,
    pub version: String,
    pub transform: TargetTransform,
    predictor: Arc<dyn Predictor>,
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("transform", &self.transform)
            .field("backend", &self.predictor.backend())
            .finish()
    }
}

impl ModelArtifact {
    /// Load and validate the artifact described by the manifest at `path`
    pub fn load(path: impl AsRef<Path>, options: &ArtifactOptions) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::ArtifactLoad(format!("Failed to read manifest {:?}: {}", path, e))
        })?;
        let manifest: ArtifactManifest = serde_json::from_str(&content).map_err(|e| {
            PipelineError::ArtifactLoad(format!("Failed to parse manifest {:?}: {}", path, e))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_manifest(manifest, base_dir, options)
    }

    /// Build an artifact from an already-parsed manifest
    pub fn from_manifest(
        manifest: ArtifactManifest,
        base_dir: &Path,
        options: &ArtifactOptions,
    ) -> Result<Self> {
        if manifest.schema_version != SCHEMA_VERSION {
            return Err(PipelineError::ArtifactLoad(format!(
                "Artifact schema version {} is not supported (expected {})",
                manifest.schema_version, SCHEMA_VERSION
            )));
        }
        check_feature_names(&manifest.features)?;

        let predictor: Arc<dyn Predictor> = match manifest.model {
            ModelSpec::Linear(weights) => {
                Arc::new(LinearPredictor::new(weights, manifest.version.clone())?)
            }
            ModelSpec::Onnx { path, sha256 } => {
                let model_path = base_dir.join(path);
                let bytes = read_model_bytes(&model_path, sha256.as_deref(), options)?;
                Arc::new(OnnxPredictor::new(&bytes, manifest.version.clone())?)
            }
        };

        info!(
            name = %manifest.name,
            version = %manifest.version,
            backend = predictor.backend(),
            transform = ?manifest.target_transform,
            "Model artifact loaded"
        );

        Ok(Self {
            name: manifest.name,
            version: manifest.version,
            transform: manifest.target_transform,
            predictor,
        })
    }

    /// Wrap an in-memory predictor, bypassing manifest loading
    pub fn from_predictor(
        name: impl Into<String>,
        transform: TargetTransform,
        predictor: Arc<dyn Predictor>,
    ) -> Self {
        Self {
            name: name.into(),
            version: predictor.model_version().to_string(),
            transform,
            predictor,
        }
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }

    pub fn backend(&self) -> &'static str {
        self.predictor.backend()
    }
}

fn read_model_bytes(
    path: &Path,
    expected_checksum: Option<&str>,
    options: &ArtifactOptions,
) -> Result<Vec<u8>> {
    let size = fs::metadata(path)
        .map_err(|e| PipelineError::ArtifactLoad(format!("Model file {:?}: {}", path, e)))?
        .len();
    if size > options.max_model_bytes as u64 {
        return Err(PipelineError::ArtifactLoad(format!(
            "Model size {} exceeds maximum {}",
            size, options.max_model_bytes
        )));
    }

    let bytes = fs::read(path)
        .map_err(|e| PipelineError::ArtifactLoad(format!("Failed to read model file {:?}: {}", path, e)))?;

    if let Some(expected) = expected_checksum {
        let computed = compute_checksum(&bytes);
        if !computed.eq_ignore_ascii_case(expected) {
            return Err(PipelineError::ArtifactLoad(format!(
                "Checksum mismatch: expected {}, got {}",
                expected, computed
            )));
        }
        debug!(checksum = %computed, "Model checksum validated");
    }

    Ok(bytes)
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
