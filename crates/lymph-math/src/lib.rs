//! Lymph math utilities.

pub mod math;

pub use math::autocorr::{autocorrelation, integrated_time, DEFAULT_WINDOW_FACTOR};
pub use math::binomial::{binomial_log_pmf, binomial_pmf, binomial_time_prior, BinomialTimePrior};
pub use math::stable::*;
