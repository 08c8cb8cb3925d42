//! Binomial distributions used as time-to-diagnosis priors.
//!
//! A T-stage's prior over the diagnosis time `t ∈ {0, …, t_max}` is modelled
//! as `Binomial(t_max, p)`: early stages get a small `p` (diagnosed after few
//! progression steps), late stages a larger one.

use serde::{Deserialize, Serialize};

use super::stable::{log_binomial, xlogy};

/// `ln P(K = k)` for `K ~ Binomial(n, p)`.
///
/// Returns NaN for `p` outside `[0, 1]` and `-∞` for `k > n`.
pub fn binomial_log_pmf(k: u64, n: u64, p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if k > n {
        return f64::NEG_INFINITY;
    }
    let successes = k as f64;
    let failures = (n - k) as f64;
    log_binomial(n, k) + xlogy(successes, p) + xlogy(failures, 1.0 - p)
}

/// `P(K = k)` for `K ~ Binomial(n, p)`.
pub fn binomial_pmf(k: u64, n: u64, p: f64) -> f64 {
    binomial_log_pmf(k, n, p).exp()
}

/// Probability mass vector of `Binomial(t_max, p)` over `t = 0..=t_max`.
pub fn binomial_time_prior(t_max: usize, p: f64) -> Vec<f64> {
    let n = t_max as u64;
    (0..=n).map(|k| binomial_pmf(k, n, p)).collect()
}

/// Serializable description of a Binomial time prior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinomialTimePrior {
    /// Last time step (inclusive).
    pub t_max: usize,
    /// Success probability per step.
    pub p: f64,
}

impl BinomialTimePrior {
    pub fn new(t_max: usize, p: f64) -> Self {
        Self { t_max, p }
    }

    /// Mean diagnosis time `t_max · p`.
    pub fn mean(&self) -> f64 {
        self.t_max as f64 * self.p
    }

    /// The probability mass vector, or `None` if `p` is not a probability.
    pub fn pmf(&self) -> Option<Vec<f64>> {
        if !(0.0..=1.0).contains(&self.p) {
            return None;
        }
        Some(binomial_time_prior(self.t_max, self.p))
    }
}
