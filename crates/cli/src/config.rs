//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server used when neither flag, environment nor config file names one
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API endpoint URL
    pub api_url: Option<String>,
    /// Model artifact used for local predictions
    pub model_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file, or defaults when none exists
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Resolve the server URL: command line, then config file, then default
    pub fn api_url(&self, cli_value: Option<&str>) -> String {
        cli_value
            .map(str::to_string)
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Resolve the local model path: command line, then config file
    pub fn model_path(&self, cli_value: Option<PathBuf>) -> Option<PathBuf> {
        cli_value.or_else(|| self.model_path.clone())
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|dir| dir.join("rent").join("config.json"))
    }
}
