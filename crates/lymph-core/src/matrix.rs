//! Model matrices.
//!
//! Each matrix is rebuilt in full by a pure function; models store the
//! returned value.

use nalgebra::{DMatrix, DVector};

use crate::graph::{EdgeSource, Graph};
use crate::modality::ModalityTable;
use crate::mode::MarginalizationOptions;
use crate::state::{bit, selector};

/// Transition matrix `A[i, j] = P(state j at t+1 | state i at t)`.
///
/// `spread_probs` follows the edge order of `graph` and must have one entry
/// per edge.
pub fn transition_matrix(graph: &Graph, spread_probs: &[f64]) -> DMatrix<f64> {
    let width = graph.lnl_count();
    let n = 1usize << width;
    let incoming = graph.incoming();
    let mut a = DMatrix::zeros(n, n);

    for i in 0..n {
        // P(a healthy LNL stays healthy | state i)
        let stay: Vec<f64> = incoming
            .iter()
            .map(|edges| {
                edges
                    .iter()
                    .filter(|(_, from)| match from {
                        EdgeSource::Tumor => true,
                        EdgeSource::Lnl(pos) => bit(i, *pos, width),
                    })
                    .map(|(edge, _)| 1.0 - spread_probs[*edge])
                    .product()
            })
            .collect();

        for j in 0..n {
            // involved LNLs never heal
            if (i & !j) != 0 {
                continue;
            }
            a[(i, j)] = (0..width)
                .filter(|&lnl| !bit(i, lnl, width))
                .map(|lnl| {
                    if bit(j, lnl, width) {
                        1.0 - stay[lnl]
                    } else {
                        stay[lnl]
                    }
                })
                .product();
        }
    }
    a
}

/// Observation matrix `B[i, o] = P(observation o | hidden state i)`.
///
/// Observation bits are modality-major: modality `k`, LNL `l` sits at
/// position `k * num_lnls + l`.
pub fn observation_matrix(num_lnls: usize, modalities: &ModalityTable) -> DMatrix<f64> {
    let width = num_lnls * modalities.len();
    DMatrix::from_fn(1usize << num_lnls, 1usize << width, |i, o| {
        let mut p = 1.0;
        for (k, (_, modality)) in modalities.iter().enumerate() {
            for lnl in 0..num_lnls {
                p *= modality.likelihood(bit(i, lnl, num_lnls), bit(o, k * num_lnls + lnl, width));
            }
        }
        p
    })
}

/// Marginalization matrix of one T-stage and the patient count per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Marginalization {
    pub matrix: DMatrix<f64>,
    pub counts: DVector<f64>,
}

/// One indicator column per diagnosis pattern over `width` observation bits.
pub fn marginalization_matrix(
    width: usize,
    patterns: &[Vec<Option<bool>>],
    options: MarginalizationOptions,
) -> Marginalization {
    let mut kept: Vec<&[Option<bool>]> = Vec::new();
    let mut counts: Vec<f64> = Vec::new();

    for pattern in patterns {
        if options.delete_ones && pattern.iter().all(Option::is_none) {
            continue;
        }
        if options.aggregate_duplicates {
            if let Some(k) = kept.iter().position(|p| *p == pattern.as_slice()) {
                counts[k] += 1.0;
                continue;
            }
        }
        kept.push(pattern);
        counts.push(1.0);
    }

    let matrix = if kept.is_empty() {
        DMatrix::zeros(1usize << width, 0)
    } else {
        let columns: Vec<DVector<f64>> = kept.iter().map(|p| selector(p)).collect();
        DMatrix::from_columns(&columns)
    };

    Marginalization {
        matrix,
        counts: DVector::from_vec(counts),
    }
}

/// State distributions for `t = 0..=t_last`, one row per step, starting
/// from the all-healthy state.
pub fn evolve(transition: &DMatrix<f64>, t_last: usize) -> DMatrix<f64> {
    let n = transition.nrows();
    let mut dist = DMatrix::zeros(t_last + 1, n);
    dist[(0, 0)] = 1.0;
    for t in 1..=t_last {
        let next = dist.row(t - 1) * transition;
        dist.set_row(t, &next);
    }
    dist
}
