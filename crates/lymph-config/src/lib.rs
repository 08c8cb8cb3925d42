//! Lymph configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the model setup and the sampler settings
//! - Config resolution (explicit path → env → XDG → defaults)
//! - Semantic validation

pub mod model;
pub mod resolve;
pub mod sampler;
pub mod validate;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use model::{GraphEntry, ModalityEntry, ModelConfig, TimePriorConfig};
pub use resolve::{resolve_config, ConfigSource, ResolvedConfig};
pub use sampler::{MoveWeights, SamplerConfig};
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Complete configuration file: one model and how to sample it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LymphConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub sampler: SamplerConfig,
}

impl LymphConfig {
    /// Load from a `.toml` or `.json` file, chosen by extension.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn from_toml_str(content: &str) -> ValidationResult<Self> {
        toml::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    pub fn from_json_str(content: &str) -> ValidationResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Resolve, load and validate. Falls back to defaults if nothing is found.
    pub fn load(cli_path: Option<&Path>) -> ValidationResult<(Self, ConfigSource)> {
        let resolved = resolve_config(cli_path);
        let config = match &resolved.path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        validate::validate_config(&config)?;
        Ok((config, resolved.source))
    }
}
