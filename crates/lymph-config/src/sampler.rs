//! Ensemble sampler settings.

use serde::{Deserialize, Serialize};

/// Settings for a convergence-monitored sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Walkers per parameter dimension.
    #[serde(default = "default_walkers_per_dim")]
    pub walkers_per_dim: usize,

    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Iterations between autocorrelation checks.
    #[serde(default = "default_check_interval")]
    pub check_interval: usize,

    /// Estimates are trusted once `iteration > trust_threshold * tau`.
    #[serde(default = "default_trust_threshold")]
    pub trust_threshold: f64,

    /// Maximum relative change between consecutive trusted estimates.
    #[serde(default = "default_rel_acor_threshold")]
    pub rel_acor_threshold: f64,

    #[serde(default)]
    pub moves: MoveWeights,

    /// RNG seed; `None` draws one from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            walkers_per_dim: default_walkers_per_dim(),
            max_steps: default_max_steps(),
            check_interval: default_check_interval(),
            trust_threshold: default_trust_threshold(),
            rel_acor_threshold: default_rel_acor_threshold(),
            moves: MoveWeights::default(),
            seed: None,
        }
    }
}

impl SamplerConfig {
    /// Walker count for a problem with `ndim` parameters.
    pub fn walkers_for(&self, ndim: usize) -> usize {
        self.walkers_per_dim * ndim
    }
}

/// Relative weights of the proposal moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveWeights {
    pub differential_evolution: f64,
    pub snooker: f64,
}

impl Default for MoveWeights {
    fn default() -> Self {
        Self {
            differential_evolution: 0.8,
            snooker: 0.2,
        }
    }
}

fn default_walkers_per_dim() -> usize {
    10
}

fn default_max_steps() -> usize {
    10_000
}

fn default_check_interval() -> usize {
    100
}

fn default_trust_threshold() -> f64 {
    50.0
}

fn default_rel_acor_threshold() -> f64 {
    0.05
}
