//! Binary state indexing.
//!
//! A state over `width` binary components is an integer whose most
//! significant bit is the first component. Index 0 is all-healthy.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Involvement (or diagnosis) pattern. `None` matches either value.
pub type Pattern = [Option<bool>];

/// Largest number of binary components a hidden or observation state may
/// have. Matrices over states grow as `2^width`.
pub const MAX_STATE_BITS: usize = 20;

#[inline]
pub fn bit(state: usize, position: usize, width: usize) -> bool {
    (state >> (width - 1 - position)) & 1 == 1
}

pub fn state_to_bits(state: usize, width: usize) -> Vec<bool> {
    (0..width).map(|pos| bit(state, pos, width)).collect()
}

pub fn bits_to_state(bits: &[bool]) -> usize {
    bits.iter().fold(0, |acc, &b| (acc << 1) | usize::from(b))
}

/// All `2^width` states as boolean rows, in index order.
pub fn enumerate_states(width: usize) -> Vec<Vec<bool>> {
    (0..1usize << width)
        .map(|state| state_to_bits(state, width))
        .collect()
}

/// Whether `state` agrees with every present entry of `pattern`.
pub fn matches(state: usize, pattern: &Pattern) -> bool {
    let width = pattern.len();
    pattern
        .iter()
        .enumerate()
        .all(|(pos, want)| want.map_or(true, |w| bit(state, pos, width) == w))
}

/// Indicator vector over all states of `pattern.len()` components.
pub fn selector(pattern: &Pattern) -> DVector<f64> {
    let n = 1usize << pattern.len();
    DVector::from_fn(n, |state, _| if matches(state, pattern) { 1.0 } else { 0.0 })
}

pub fn check_width(pattern: &Pattern, expected: usize, what: &str) -> Result<()> {
    if pattern.len() != expected {
        return Err(Error::InvalidArgument(format!(
            "{what} has {} entries, expected {expected}",
            pattern.len()
        )));
    }
    Ok(())
}

/// Histogram of complete states in a boolean table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDistribution {
    /// Patients per state, indexed like [`enumerate_states`].
    pub counts: Vec<usize>,
    /// Zero-padded binary label per state, first column first.
    pub labels: Vec<String>,
    /// Rows skipped for containing unknown entries.
    pub skipped: usize,
}

/// Count how often each complete state occurs in `table`.
///
/// Rows with any unknown entry are skipped.
pub fn comp_state_dist(num_cols: usize, table: &[Vec<Option<bool>>]) -> Result<StateDistribution> {
    let mut counts = vec![0usize; 1 << num_cols];
    let mut skipped = 0;

    for (i, row) in table.iter().enumerate() {
        if row.len() != num_cols {
            return Err(Error::Data(format!(
                "row {i} has {} columns, expected {num_cols}",
                row.len()
            )));
        }
        match row.iter().copied().collect::<Option<Vec<bool>>>() {
            Some(bits) => counts[bits_to_state(&bits)] += 1,
            None => skipped += 1,
        }
    }

    let labels = (0..counts.len())
        .map(|state| format!("{:0width$b}", state, width = num_cols))
        .collect();

    Ok(StateDistribution {
        counts,
        labels,
        skipped,
    })
}
