//! Time priors: distributions over the diagnose time step per T-stage.

use std::collections::BTreeMap;

use lymph_math::binomial_time_prior;
use nalgebra::DVector;

use crate::{Error, Result};

/// T-stage label -> P(diagnosis at t), `t = 0, 1, ...`.
pub type TimePriors = BTreeMap<String, Vec<f64>>;

pub fn check_prior(prior: &[f64]) -> Result<()> {
    if prior.is_empty() {
        return Err(Error::InvalidArgument("time prior is empty".to_string()));
    }
    if let Some(bad) = prior.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(Error::InvalidArgument(format!(
            "time prior entry {bad} is not a probability"
        )));
    }
    Ok(())
}

/// `prior` as a vector of length `len`, padded with zero probability.
pub fn padded(prior: &[f64], len: usize) -> DVector<f64> {
    DVector::from_fn(len, |t, _| prior.get(t).copied().unwrap_or(0.0))
}

/// One Binomial(`t_max`, p) prior per stage: `first_p` for the first stage,
/// `later_ps` for the rest in order.
pub fn binomial_stage_priors(
    t_stages: &[String],
    first_p: f64,
    later_ps: &[f64],
    t_max: usize,
) -> Result<TimePriors> {
    if t_stages.len() != later_ps.len() + 1 {
        return Err(Error::InvalidArgument(format!(
            "{} T-stages need {} binomial parameters, got {}",
            t_stages.len(),
            t_stages.len().saturating_sub(1),
            later_ps.len()
        )));
    }
    Ok(t_stages
        .iter()
        .zip(std::iter::once(&first_p).chain(later_ps))
        .map(|(stage, &p)| (stage.clone(), binomial_time_prior(t_max, p)))
        .collect())
}
