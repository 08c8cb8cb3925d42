//! Inference mode and data-loading options.

use serde::{Deserialize, Serialize};

/// How diagnose time enters the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InferenceMode {
    /// Hidden Markov model evolved over discrete time steps.
    #[default]
    #[serde(rename = "HMM")]
    HiddenMarkovModel,
    /// Time-independent Bayesian network. Not supported.
    #[serde(rename = "BN")]
    BayesianNetwork,
}

impl std::fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceMode::HiddenMarkovModel => write!(f, "HMM"),
            InferenceMode::BayesianNetwork => write!(f, "BN"),
        }
    }
}

impl InferenceMode {
    /// Fail for anything but the hidden Markov model.
    pub fn require_hmm(self) -> crate::Result<()> {
        match self {
            InferenceMode::HiddenMarkovModel => Ok(()),
            other => Err(crate::Error::Unimplemented(other)),
        }
    }
}

/// How patient diagnoses are turned into marginalization columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginalizationOptions {
    /// Collapse identical columns into one, with a patient count.
    pub aggregate_duplicates: bool,
    /// Drop columns matching every observation (fully unknown patients).
    pub delete_ones: bool,
}

impl MarginalizationOptions {
    /// Per-side loading: collapse everything that can be collapsed.
    pub const UNILATERAL: Self = Self {
        aggregate_duplicates: true,
        delete_ones: true,
    };

    /// Bilateral loading: the two sides must keep one column per patient.
    pub const PER_PATIENT: Self = Self {
        aggregate_duplicates: false,
        delete_ones: false,
    };
}

impl Default for MarginalizationOptions {
    fn default() -> Self {
        Self::UNILATERAL
    }
}
