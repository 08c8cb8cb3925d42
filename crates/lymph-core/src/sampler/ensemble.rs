//! Affine-invariant ensemble sampler with red-blue updates.

use lymph_math::{integrated_time, DEFAULT_WINDOW_FACTOR};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::moves::MoveMixture;
use super::LogDensity;
use crate::{Error, Result};

pub struct EnsembleSampler<F> {
    ndim: usize,
    log_density: F,
    moves: MoveMixture,
    rng: StdRng,
    positions: Vec<Vec<f64>>,
    log_probs: Vec<f64>,
    /// `chain[step][walker]` is a position.
    chain: Vec<Vec<Vec<f64>>>,
    accepted: Vec<usize>,
}

impl<F: LogDensity> EnsembleSampler<F> {
    /// Checks that `nwalkers` is even, at least `2 * ndim`, and leaves every
    /// half large enough for the moves in `moves`.
    pub fn new(
        nwalkers: usize,
        ndim: usize,
        log_density: F,
        moves: MoveMixture,
        rng: StdRng,
    ) -> Result<Self> {
        if ndim == 0 {
            return Err(Error::InvalidSampler("need at least one dimension".to_string()));
        }
        if nwalkers % 2 != 0 {
            return Err(Error::InvalidSampler(format!(
                "walker count must be even, got {nwalkers}"
            )));
        }
        if nwalkers < 2 * ndim {
            return Err(Error::InvalidSampler(format!(
                "{nwalkers} walkers are too few for {ndim} dimensions"
            )));
        }
        if nwalkers / 2 < moves.min_complement() {
            return Err(Error::InvalidSampler(format!(
                "each half needs {} walkers, got {}",
                moves.min_complement(),
                nwalkers / 2
            )));
        }
        Ok(Self {
            ndim,
            log_density,
            moves,
            rng,
            positions: Vec::new(),
            log_probs: Vec::new(),
            chain: Vec::new(),
            accepted: vec![0; nwalkers],
        })
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }

    pub fn nwalkers(&self) -> usize {
        self.accepted.len()
    }

    pub fn iteration(&self) -> usize {
        self.chain.len()
    }

    pub fn chain(&self) -> &[Vec<Vec<f64>>] {
        &self.chain
    }

    pub fn log_density_mut(&mut self) -> &mut F {
        &mut self.log_density
    }

    pub fn into_log_density(self) -> F {
        self.log_density
    }

    /// Place walkers uniformly in the unit hypercube and reset the chain.
    pub fn start_uniform(&mut self) -> Result<()> {
        let (nwalkers, ndim) = (self.nwalkers(), self.ndim);
        let start = (0..nwalkers)
            .map(|_| (0..ndim).map(|_| self.rng.random::<f64>()).collect())
            .collect();
        self.start(start)
    }

    pub fn start(&mut self, positions: Vec<Vec<f64>>) -> Result<()> {
        if positions.len() != self.nwalkers() || positions.iter().any(|p| p.len() != self.ndim) {
            return Err(Error::InvalidSampler(format!(
                "start must be {} walkers of {} dimensions",
                self.nwalkers(),
                self.ndim
            )));
        }
        self.log_probs = positions
            .iter()
            .map(|p| self.evaluate(p))
            .collect::<Result<_>>()?;
        self.positions = positions;
        self.chain.clear();
        self.accepted.iter_mut().for_each(|a| *a = 0);
        Ok(())
    }

    fn evaluate(&mut self, theta: &[f64]) -> Result<f64> {
        let value = self.log_density.log_density(theta)?;
        Ok(if value.is_nan() { f64::NEG_INFINITY } else { value })
    }

    /// One iteration: each half of a random split is updated in turn using
    /// the other half.
    pub fn step(&mut self) -> Result<()> {
        if self.positions.is_empty() {
            return Err(Error::Uninitialized("walker positions"));
        }
        let mv = self.moves.choose(&mut self.rng);
        let nwalkers = self.nwalkers();
        let mut halves: Vec<usize> = (0..nwalkers).map(|w| w % 2).collect();
        halves.shuffle(&mut self.rng);

        for half in 0..2 {
            let active: Vec<usize> = (0..nwalkers).filter(|&w| halves[w] == half).collect();
            let proposals = {
                let current: Vec<&[f64]> = active.iter().map(|&w| self.positions[w].as_slice()).collect();
                let complement: Vec<&[f64]> = (0..nwalkers)
                    .filter(|&w| halves[w] != half)
                    .map(|w| self.positions[w].as_slice())
                    .collect();
                mv.propose(&mut self.rng, &current, &complement)
            };

            for (&walker, proposal) in active.iter().zip(proposals) {
                let new_log_prob = self.evaluate(&proposal.position)?;
                let diff = proposal.log_factor + new_log_prob - self.log_probs[walker];
                if diff > self.rng.random::<f64>().ln() {
                    self.positions[walker] = proposal.position;
                    self.log_probs[walker] = new_log_prob;
                    self.accepted[walker] += 1;
                }
            }
        }
        self.chain.push(self.positions.clone());
        Ok(())
    }

    /// Fraction of accepted proposals per walker.
    pub fn acceptance_fraction(&self) -> Vec<f64> {
        let n = self.iteration().max(1) as f64;
        self.accepted.iter().map(|&a| a as f64 / n).collect()
    }

    /// Integrated autocorrelation time of every parameter over the whole
    /// chain.
    pub fn autocorr_time(&self) -> Vec<f64> {
        (0..self.ndim)
            .map(|d| {
                let series: Vec<Vec<f64>> = (0..self.nwalkers())
                    .map(|w| self.chain.iter().map(|step| step[w][d]).collect())
                    .collect();
                integrated_time(&series, DEFAULT_WINDOW_FACTOR)
            })
            .collect()
    }
}
