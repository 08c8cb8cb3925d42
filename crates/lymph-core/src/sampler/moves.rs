//! Ensemble proposal moves.
//!
//! Both moves are "red-blue" moves: the walkers to update propose new
//! positions using only walkers of the complementary half.

use lymph_config::MoveWeights;
use rand::seq::index::sample;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::{Error, Result};

/// A proposal for one walker and the log of its Metropolis correction.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub position: Vec<f64>,
    pub log_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Move {
    /// Differential evolution: jump along the difference of two walkers.
    DifferentialEvolution {
        /// Standard deviation of the Gaussian jitter, drawn independently
        /// for every coordinate of a jump.
        sigma: f64,
        /// Jump scale; `None` uses `2.38 / sqrt(2 ndim)`.
        gamma0: Option<f64>,
    },
    /// Differential-evolution snooker move.
    Snooker { gamma: f64 },
}

impl Move {
    pub const fn differential_evolution() -> Self {
        Move::DifferentialEvolution {
            sigma: 1e-5,
            gamma0: None,
        }
    }

    pub const fn snooker() -> Self {
        Move::Snooker { gamma: 1.7 }
    }

    /// Walkers the complementary half must hold for a proposal.
    pub fn min_complement(&self) -> usize {
        match self {
            Move::DifferentialEvolution { .. } => 2,
            Move::Snooker { .. } => 3,
        }
    }

    /// One proposal per walker in `active`, built from `complement`.
    pub fn propose<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        active: &[&[f64]],
        complement: &[&[f64]],
    ) -> Vec<Proposal> {
        match *self {
            Move::DifferentialEvolution { sigma, gamma0 } => {
                active
                    .iter()
                    .map(|current| {
                        let ndim = current.len();
                        let gamma0 = gamma0.unwrap_or(2.38 / (2.0 * ndim as f64).sqrt());
                        let picked = sample(rng, complement.len(), 2);
                        let (w0, w1) = (complement[picked.index(0)], complement[picked.index(1)]);
                        let position = (0..ndim)
                            .map(|d| {
                                let noise: f64 = sigma * rng.sample::<f64, _>(StandardNormal);
                                current[d] + gamma0 * (w1[d] - w0[d]) + noise
                            })
                            .collect();
                        Proposal {
                            position,
                            log_factor: 0.0,
                        }
                    })
                    .collect()
            }
            Move::Snooker { gamma } => active
                .iter()
                .map(|current| {
                    let picked = sample(rng, complement.len(), 3);
                    let z = complement[picked.index(0)];
                    let z1 = complement[picked.index(1)];
                    let z2 = complement[picked.index(2)];
                    snooker_jump(current, z, z1, z2, gamma)
                })
                .collect(),
        }
    }
}

fn norm(v: impl Iterator<Item = f64>) -> f64 {
    v.map(|x| x * x).sum::<f64>().sqrt()
}

fn snooker_jump(current: &[f64], z: &[f64], z1: &[f64], z2: &[f64], gamma: f64) -> Proposal {
    let ndim = current.len();
    let dist = norm(current.iter().zip(z).map(|(s, z)| s - z));
    if dist == 0.0 {
        // no direction to move along
        return Proposal {
            position: current.to_vec(),
            log_factor: 0.0,
        };
    }
    let u: Vec<f64> = current.iter().zip(z).map(|(s, z)| (s - z) / dist).collect();
    let dot = |w: &[f64]| u.iter().zip(w).map(|(a, b)| a * b).sum::<f64>();
    let step = gamma * (dot(z1) - dot(z2));
    let position: Vec<f64> = current.iter().zip(&u).map(|(s, u)| s + u * step).collect();
    let new_dist = norm(position.iter().zip(z).map(|(q, z)| q - z));
    Proposal {
        position,
        log_factor: (ndim as f64 - 1.0) * (new_dist.ln() - dist.ln()),
    }
}

/// Moves with selection weights; one move is drawn per iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveMixture {
    moves: Vec<(Move, f64)>,
    total: f64,
}

impl MoveMixture {
    pub fn new(moves: Vec<(Move, f64)>) -> Result<Self> {
        if let Some((_, w)) = moves.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidSampler(format!("move weight {w} is not a valid weight")));
        }
        let total: f64 = moves.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return Err(Error::InvalidSampler("move weights must not all be zero".to_string()));
        }
        Ok(Self { moves, total })
    }

    pub fn from_weights(weights: &MoveWeights) -> Result<Self> {
        Self::new(vec![
            (Move::differential_evolution(), weights.differential_evolution),
            (Move::snooker(), weights.snooker),
        ])
    }

    pub fn moves(&self) -> &[(Move, f64)] {
        &self.moves
    }

    /// Largest complement any move with positive weight needs.
    pub fn min_complement(&self) -> usize {
        self.moves
            .iter()
            .filter(|(_, w)| *w > 0.0)
            .map(|(m, _)| m.min_complement())
            .max()
            .unwrap_or(2)
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Move {
        let mut target = rng.random::<f64>() * self.total;
        for (mv, weight) in &self.moves {
            if target < *weight {
                return *mv;
            }
            target -= weight;
        }
        // rounding left us past the end: take the last weighted move
        self.moves
            .iter()
            .rev()
            .find(|(_, w)| *w > 0.0)
            .map_or(self.moves[0].0, |(mv, _)| *mv)
    }
}

impl Default for MoveMixture {
    /// 80 % differential evolution, 20 % snooker.
    fn default() -> Self {
        let weights = MoveWeights::default();
        Self {
            moves: vec![
                (Move::differential_evolution(), weights.differential_evolution),
                (Move::snooker(), weights.snooker),
            ],
            total: weights.differential_evolution + weights.snooker,
        }
    }
}
