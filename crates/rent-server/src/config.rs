//! Server configuration

use anyhow::{Context, Result};
use rent_lib::artifact::{ArtifactOptions, DEFAULT_MAX_MODEL_BYTES};
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP port for predictions, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Path to the model artifact manifest
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Largest ONNX payload accepted at startup
    #[serde(default = "default_max_model_bytes")]
    pub max_model_bytes: usize,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

/// Deployed location of the trained export. The bundled
/// `model/demo_rent_predictor.json` is selected with `RENT_MODEL_PATH`.
fn default_model_path() -> PathBuf {
    PathBuf::from("model/ucc_hostel_rent_predictor.json")
}

fn default_max_model_bytes() -> usize {
    DEFAULT_MAX_MODEL_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_port: default_api_port(),
            model_path: default_model_path(),
            max_model_bytes: default_max_model_bytes(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `rent-server` file and `RENT_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("rent-server").required(false))
            .add_source(config::Environment::with_prefix("RENT").try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.api_port)
    }

    pub fn artifact_options(&self) -> ArtifactOptions {
        ArtifactOptions {
            max_model_bytes: self.max_model_bytes,
        }
    }
}
