//! Configuration validation errors and semantic validation.

use std::collections::HashSet;

use thiserror::Error;

use crate::model::ModelConfig;
use crate::sampler::SamplerConfig;
use crate::LymphConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate a complete configuration file.
pub fn validate_config(config: &LymphConfig) -> ValidationResult<()> {
    validate_model(&config.model)?;
    validate_sampler(&config.sampler)
}

/// Validate the model setup.
///
/// An empty graph is accepted here (it is the built-in default); building a
/// model from it fails later.
pub fn validate_model(model: &ModelConfig) -> ValidationResult<()> {
    if model.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: model.schema_version.clone(),
        });
    }

    let mut seen = HashSet::new();
    for entry in &model.graph {
        if !seen.insert(entry.name.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "node '{}' is declared twice",
                entry.name
            )));
        }
    }
    for entry in &model.graph {
        for target in &entry.targets {
            if !seen.contains(target.as_str()) {
                return Err(ValidationError::SemanticError(format!(
                    "edge {} -> {} points to an undeclared node",
                    entry.name, target
                )));
            }
        }
    }

    let mut modality_names = HashSet::new();
    for modality in &model.modalities {
        if !modality_names.insert(modality.name.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "modality '{}' is declared twice",
                modality.name
            )));
        }
        validate_probability(
            &format!("modalities.{}.specificity", modality.name),
            modality.specificity,
        )?;
        validate_probability(
            &format!("modalities.{}.sensitivity", modality.name),
            modality.sensitivity,
        )?;
    }

    if model.t_stages.is_empty() {
        return Err(ValidationError::MissingField("t_stages".to_string()));
    }
    if model.time_prior.t_max == 0 {
        return Err(ValidationError::InvalidValue {
            field: "time_prior.t_max".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }
    validate_probability("time_prior.first_p", model.time_prior.first_p)
}

/// Validate sampler settings.
pub fn validate_sampler(sampler: &SamplerConfig) -> ValidationResult<()> {
    if sampler.walkers_per_dim < 2 {
        return Err(ValidationError::InvalidValue {
            field: "sampler.walkers_per_dim".to_string(),
            message: format!("Must be at least 2, got {}", sampler.walkers_per_dim),
        });
    }
    if sampler.check_interval == 0 {
        return Err(ValidationError::InvalidValue {
            field: "sampler.check_interval".to_string(),
            message: "Must be positive".to_string(),
        });
    }
    validate_positive("sampler.trust_threshold", sampler.trust_threshold)?;
    validate_positive("sampler.rel_acor_threshold", sampler.rel_acor_threshold)?;

    let weights = sampler.moves;
    for (field, value) in [
        ("sampler.moves.differential_evolution", weights.differential_evolution),
        ("sampler.moves.snooker", weights.snooker),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                message: format!("Must be a non-negative weight, got {}", value),
            });
        }
    }
    if weights.differential_evolution + weights.snooker <= 0.0 {
        return Err(ValidationError::SemanticError(
            "move weights must not all be zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_probability(field: &str, value: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be in [0, 1], got {}", value),
        });
    }
    Ok(())
}

fn validate_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be positive, got {}", value),
        });
    }
    Ok(())
}
