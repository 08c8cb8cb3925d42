//! Error types for lymph-core.
//!
//! Errors carry stable numeric codes grouped by category:
//! - 10-19: graph and configuration
//! - 20-29: parameters
//! - 30-39: inference
//! - 40-49: patient data
//! - 60-69: I/O and persistence
//!
//! A spread probability outside [0, 1] inside a likelihood is not an error;
//! the likelihood evaluates to negative infinity instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mode::InferenceMode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Config,
    Parameters,
    Inference,
    Data,
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Parameters => write!(f, "parameters"),
            ErrorCategory::Inference => write!(f, "inference"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    // Graph and configuration errors (10-19)
    #[error("node '{name}' has unknown kind '{kind}'")]
    UnknownNodeKind { name: String, kind: String },

    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    #[error("invalid graph key '{0}': names must not contain commas")]
    InvalidKey(String),

    // Parameter errors (20-29)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{name} = {value} is outside [0, 1]")]
    OutOfDomain { name: String, value: f64 },

    // Inference errors (30-39)
    #[error("inference mode {0} is not implemented")]
    Unimplemented(InferenceMode),

    #[error("{0} has not been set")]
    Uninitialized(&'static str),

    #[error("modality tables differ between ipsi- and contralateral side")]
    ModalityMismatch,

    #[error("the given diagnosis has zero probability under the model")]
    ZeroEvidence,

    #[error("invalid sampler setup: {0}")]
    InvalidSampler(String),

    // Patient data errors (40-49)
    #[error("invalid patient data: {0}")]
    Data(String),

    #[error("unknown modality '{0}'")]
    UnknownModality(String),

    #[error("no data loaded for T-stage '{0}'")]
    UnknownStage(String),

    #[error("patient table lacks column {0}")]
    MissingColumn(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bundle error: {0}")]
    Bundle(#[from] lymph_bundle::BundleError),

    #[error("config validation error: {0}")]
    Validation(#[from] lymph_config::ValidationError),
}

impl Error {
    pub fn code(&self) -> u32 {
        match self {
            Error::UnknownNodeKind { .. } => 11,
            Error::InvalidGraph(_) => 12,
            Error::InvalidKey(_) => 13,
            Error::InvalidArgument(_) => 20,
            Error::OutOfDomain { .. } => 21,
            Error::Unimplemented(_) => 30,
            Error::Uninitialized(_) => 31,
            Error::ModalityMismatch => 32,
            Error::ZeroEvidence => 33,
            Error::InvalidSampler(_) => 34,
            Error::Data(_) => 40,
            Error::UnknownModality(_) => 41,
            Error::UnknownStage(_) => 42,
            Error::MissingColumn(_) => 43,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::Bundle(_) => 62,
            Error::Validation(_) => 63,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.code() {
            10..=19 => ErrorCategory::Config,
            20..=29 => ErrorCategory::Parameters,
            30..=39 => ErrorCategory::Inference,
            40..=49 => ErrorCategory::Data,
            _ => ErrorCategory::Io,
        }
    }
}
