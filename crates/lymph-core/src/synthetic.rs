//! Helpers for synthetic-data studies.

use std::collections::BTreeMap;

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

use crate::prior::TimePriors;
use crate::{Error, Result};

/// How a patient's diagnose time follows from the drawn T-stage.
#[derive(Debug, Clone, Copy)]
pub enum DiagnoseTimes<'a> {
    /// One fixed time step per T-stage.
    Fixed(&'a BTreeMap<String, usize>),
    /// A distribution over time steps per T-stage.
    Distributed(&'a TimePriors),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnPatient {
    pub t_stage: String,
    pub diagnose_time: usize,
}

/// Draw a T-stage from `stage_dist` for each patient, then a diagnose time
/// for that stage.
pub fn draw_diagnose_times<R: Rng + ?Sized>(
    rng: &mut R,
    num_patients: usize,
    stage_dist: &[(String, f64)],
    times: DiagnoseTimes<'_>,
) -> Result<Vec<DrawnPatient>> {
    if num_patients < 1 {
        return Err(Error::InvalidArgument(
            "number of patients to draw must be 1 or larger".to_string(),
        ));
    }
    let total: f64 = stage_dist.iter().map(|(_, p)| p).sum();
    if (total - 1.0).abs() > 1e-8 {
        return Err(Error::InvalidArgument(format!(
            "distribution over T-stages sums to {total}, not 1"
        )));
    }

    let stage_index = weighted(stage_dist.iter().map(|(_, p)| *p))?;
    let time_index = match times {
        DiagnoseTimes::Fixed(_) => BTreeMap::new(),
        DiagnoseTimes::Distributed(dists) => stage_dist
            .iter()
            .map(|(stage, _)| {
                let dist = dists
                    .get(stage)
                    .ok_or_else(|| Error::UnknownStage(stage.clone()))?;
                Ok((stage.as_str(), weighted(dist.iter().copied())?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?,
    };

    (0..num_patients)
        .map(|_| {
            let stage = &stage_dist[stage_index.sample(rng)].0;
            let diagnose_time = match times {
                DiagnoseTimes::Fixed(fixed) => *fixed
                    .get(stage)
                    .ok_or_else(|| Error::UnknownStage(stage.clone()))?,
                DiagnoseTimes::Distributed(_) => time_index[stage.as_str()].sample(rng),
            };
            Ok(DrawnPatient {
                t_stage: stage.clone(),
                diagnose_time,
            })
        })
        .collect()
}

fn weighted(weights: impl IntoIterator<Item = f64>) -> Result<WeightedIndex<f64>> {
    WeightedIndex::new(weights).map_err(|err| Error::InvalidArgument(err.to_string()))
}

/// `nsample` points drawn uniformly from the `ndim`-dimensional probability
/// simplex.
pub fn draw_from_simplex<R: Rng + ?Sized>(
    rng: &mut R,
    ndim: usize,
    nsample: usize,
) -> Result<Vec<Vec<f64>>> {
    if ndim < 1 {
        return Err(Error::InvalidArgument(
            "cannot draw from a simplex of dimension 0".to_string(),
        ));
    }
    if nsample < 1 {
        return Err(Error::InvalidArgument(
            "number of samples must be 1 or larger".to_string(),
        ));
    }

    Ok((0..nsample)
        .map(|_| {
            let mut cuts: Vec<f64> = std::iter::once(0.0)
                .chain((1..ndim).map(|_| rng.random::<f64>()))
                .chain(std::iter::once(1.0))
                .collect();
            cuts.sort_by(f64::total_cmp);
            cuts.windows(2).map(|w| w[1] - w[0]).collect()
        })
        .collect())
}
