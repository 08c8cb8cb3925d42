//! Convergence-monitored ensemble sampling.
//!
//! [`ConvergenceSampler`] runs an affine-invariant ensemble sampler and
//! stops once the integrated autocorrelation time is both small compared to
//! the chain length and stable between checks.

mod convergence;
mod ensemble;
mod moves;

pub use convergence::{ConvergenceSampler, SamplingOutcome};
pub use ensemble::EnsembleSampler;
pub use moves::{Move, MoveMixture, Proposal};

use lymph_config::SamplerConfig;

use crate::bilateral::Bilateral;
use crate::mode::InferenceMode;
use crate::Result;

/// Unnormalized log-probability density over parameter vectors.
pub trait LogDensity {
    fn log_density(&mut self, theta: &[f64]) -> Result<f64>;
}

impl<F> LogDensity for F
where
    F: FnMut(&[f64]) -> Result<f64>,
{
    fn log_density(&mut self, theta: &[f64]) -> Result<f64> {
        self(theta)
    }
}

/// Stopping rule of [`ConvergenceSampler::run_sampling`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerSettings {
    pub max_steps: usize,
    pub check_interval: usize,
    pub trust_threshold: f64,
    pub rel_acor_threshold: f64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self::from_config(&SamplerConfig::default())
    }
}

impl SamplerSettings {
    pub fn from_config(config: &SamplerConfig) -> Self {
        Self {
            max_steps: config.max_steps,
            check_interval: config.check_interval,
            trust_threshold: config.trust_threshold,
            rel_acor_threshold: config.rel_acor_threshold,
        }
    }
}

/// [`Bilateral::combined_likelihood`] as a sampling target.
pub struct CombinedObjective<'a> {
    pub model: &'a mut Bilateral,
    pub t_stages: Vec<String>,
    pub t_max: usize,
    pub first_p: f64,
}

impl CombinedObjective<'_> {
    /// Number of parameters: spread probabilities plus one Binomial
    /// parameter per T-stage after the first.
    pub fn ndim(&self) -> usize {
        self.model.layout().len() + self.t_stages.len().saturating_sub(1)
    }
}

impl LogDensity for CombinedObjective<'_> {
    fn log_density(&mut self, theta: &[f64]) -> Result<f64> {
        self.model.combined_likelihood(
            theta,
            &self.t_stages,
            self.t_max,
            self.first_p,
            InferenceMode::HiddenMarkovModel,
        )
    }
}
