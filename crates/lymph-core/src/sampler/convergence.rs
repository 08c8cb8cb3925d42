//! Sampling with an autocorrelation-based stopping rule.

use lymph_config::SamplerConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use super::ensemble::EnsembleSampler;
use super::moves::MoveMixture;
use super::{LogDensity, SamplerSettings};
use crate::logging::generate_run_id;
use crate::{Error, Result};

/// Result of [`ConvergenceSampler::run_sampling`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingOutcome {
    /// Mean autocorrelation time at every check.
    pub acor_trace: Vec<f64>,
    /// Per-parameter autocorrelation times at every check.
    pub acor_history: Vec<Vec<f64>>,
    pub converged: bool,
    pub iterations: usize,
    /// Mean over walkers.
    pub acceptance_fraction: f64,
}

pub struct ConvergenceSampler<F> {
    sampler: EnsembleSampler<F>,
}

impl<F: LogDensity> ConvergenceSampler<F> {
    pub fn new(
        log_density: F,
        ndim: usize,
        nwalkers: usize,
        moves: MoveMixture,
        rng: StdRng,
    ) -> Result<Self> {
        Ok(Self {
            sampler: EnsembleSampler::new(nwalkers, ndim, log_density, moves, rng)?,
        })
    }

    /// Walker count, move weights and seed from `config`.
    pub fn from_config(log_density: F, ndim: usize, config: &SamplerConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::new(
            log_density,
            ndim,
            config.walkers_for(ndim),
            MoveMixture::from_weights(&config.moves)?,
            rng,
        )
    }

    pub fn sampler(&self) -> &EnsembleSampler<F> {
        &self.sampler
    }

    pub fn into_sampler(self) -> EnsembleSampler<F> {
        self.sampler
    }

    pub fn run(&mut self, settings: &SamplerSettings) -> Result<SamplingOutcome> {
        self.run_sampling(
            settings.max_steps,
            settings.check_interval,
            settings.trust_threshold,
            settings.rel_acor_threshold,
        )
    }

    /// Sample from a uniform start in the unit hypercube until converged or
    /// `max_steps` iterations are done.
    ///
    /// Every `check_interval` iterations the autocorrelation time `tau` of
    /// each parameter is estimated. The run has converged when every `tau`
    /// times `trust_threshold` is below the iteration count and every `tau`
    /// moved by less than `rel_acor_threshold` relative to the previous check.
    pub fn run_sampling(
        &mut self,
        max_steps: usize,
        check_interval: usize,
        trust_threshold: f64,
        rel_acor_threshold: f64,
    ) -> Result<SamplingOutcome> {
        if check_interval == 0 {
            return Err(Error::InvalidArgument(
                "check_interval must be positive".to_string(),
            ));
        }
        let run_id = generate_run_id();
        let span = info_span!("sampling", run_id = %run_id);
        let _guard = span.enter();
        info!(
            ndim = self.sampler.ndim(),
            nwalkers = self.sampler.nwalkers(),
            max_steps,
            "starting sampling"
        );

        self.sampler.start_uniform()?;

        let mut acor_trace = Vec::new();
        let mut acor_history = Vec::new();
        let mut old_tau = vec![f64::INFINITY; self.sampler.ndim()];
        let mut converged = false;

        for _ in 0..max_steps {
            self.sampler.step()?;
            let iteration = self.sampler.iteration();
            if iteration % check_interval != 0 {
                continue;
            }

            let tau = self.sampler.autocorr_time();
            let mean = tau.iter().sum::<f64>() / tau.len() as f64;
            acor_trace.push(mean);

            let trusted = tau.iter().all(|t| t * trust_threshold < iteration as f64);
            let stable = tau
                .iter()
                .zip(&old_tau)
                .all(|(new, old)| (old - new).abs() / new < rel_acor_threshold);
            debug!(iteration, mean_tau = mean, trusted, stable, "autocorrelation check");
            acor_history.push(tau.clone());

            if trusted && stable {
                converged = true;
                break;
            }
            old_tau = tau;
        }

        let iterations = self.sampler.iteration();
        let fractions = self.sampler.acceptance_fraction();
        let acceptance_fraction = fractions.iter().sum::<f64>() / fractions.len() as f64;
        if converged {
            info!(iterations, acceptance_fraction, "sampler converged");
        } else {
            warn!(iterations, acceptance_fraction, "maximum number of steps reached");
        }

        Ok(SamplingOutcome {
            acor_trace,
            acor_history,
            converged,
            iterations,
            acceptance_fraction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(theta: &[f64]) -> Result<f64> {
        Ok(if theta.iter().all(|x| (0.0..=1.0).contains(x)) {
            0.0
        } else {
            f64::NEG_INFINITY
        })
    }

    fn sampler(seed: u64) -> ConvergenceSampler<fn(&[f64]) -> Result<f64>> {
        ConvergenceSampler::new(
            flat as fn(&[f64]) -> Result<f64>,
            2,
            8,
            MoveMixture::default(),
            StdRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    #[test]
    fn zero_check_interval_is_rejected() {
        assert!(matches!(
            sampler(0).run_sampling(10, 0, 50.0, 0.05),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn trace_has_one_entry_per_check() {
        // unreachable trust threshold: never converges
        let outcome = sampler(1).run_sampling(60, 20, 1e9, 0.05).unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 60);
        assert_eq!(outcome.acor_trace.len(), 3);
        assert_eq!(outcome.acor_history.len(), 3);
        assert!(outcome.acor_history.iter().all(|tau| tau.len() == 2));
        assert!((0.0..=1.0).contains(&outcome.acceptance_fraction));
    }

    #[test]
    fn settings_default_from_config() {
        let settings = SamplerSettings::default();
        assert_eq!(settings.max_steps, 10_000);
        assert_eq!(settings.check_interval, 100);
        assert_eq!(settings.trust_threshold, 50.0);
        assert_eq!(settings.rel_acor_threshold, 0.05);
    }

    #[test]
    fn from_config_sizes_the_ensemble() {
        let config = SamplerConfig {
            seed: Some(9),
            ..SamplerConfig::default()
        };
        let sampler = ConvergenceSampler::from_config(flat, 3, &config).unwrap();
        assert_eq!(sampler.sampler().nwalkers(), 30);
        assert_eq!(sampler.sampler().ndim(), 3);
    }
}
