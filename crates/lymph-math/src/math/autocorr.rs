//! Integrated autocorrelation time of ensemble chains.
//!
//! Follows the estimator popularised by emcee (Goodman & Weare 2010,
//! Sokal's automatic windowing):
//!
//! 1. For each walker, the normalized autocorrelation function
//!    `ρ_w(m) = Σ_t y_t y_{t+m} / Σ_t y_t²` of the centered series `y`.
//! 2. Average over walkers: `f(m) = mean_w ρ_w(m)`.
//! 3. Cumulative estimate `τ(m) = 2 Σ_{j≤m} f(j) − 1`.
//! 4. Window: the first `m` with `m ≥ c · τ(m)`; if none, the last lag.
//!
//! The function is evaluated lag by lag and stops at the window, so the cost
//! is `O(walkers · n · window)` instead of a full `O(n²)` correlogram.

/// Sokal window factor used by emcee.
pub const DEFAULT_WINDOW_FACTOR: f64 = 5.0;

/// Full normalized autocorrelation function of one series.
///
/// A constant series has no defined normalization; it is reported as
/// perfectly decorrelated (`[1, 0, 0, …]`).
pub fn autocorrelation(series: &[f64]) -> Vec<f64> {
    let centered = center(series);
    let norm = lagged_product(&centered, 0);
    (0..centered.len())
        .map(|lag| normalized_lag(&centered, lag, norm))
        .collect()
}

/// Integrated autocorrelation time of one parameter across walkers.
///
/// `walkers[w]` is walker `w`'s series for the parameter; all series must have
/// the same length. Returns NaN for an empty input.
pub fn integrated_time(walkers: &[Vec<f64>], window_factor: f64) -> f64 {
    let n = walkers.first().map(Vec::len).unwrap_or(0);
    if n == 0 {
        return f64::NAN;
    }

    let centered: Vec<Vec<f64>> = walkers.iter().map(|w| center(w)).collect();
    let norms: Vec<f64> = centered.iter().map(|c| lagged_product(c, 0)).collect();
    let n_walkers = centered.len() as f64;

    let mut cumulative = 0.0;
    let mut tau = f64::NAN;
    for lag in 0..n {
        let f: f64 = centered
            .iter()
            .zip(&norms)
            .map(|(c, &norm)| normalized_lag(c, lag, norm))
            .sum::<f64>()
            / n_walkers;
        cumulative += f;
        tau = 2.0 * cumulative - 1.0;
        if lag as f64 >= window_factor * tau {
            return tau;
        }
    }
    tau
}

fn center(series: &[f64]) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }
    let mean = series.iter().sum::<f64>() / series.len() as f64;
    series.iter().map(|x| x - mean).collect()
}

fn lagged_product(centered: &[f64], lag: usize) -> f64 {
    centered
        .iter()
        .zip(centered.iter().skip(lag))
        .map(|(a, b)| a * b)
        .sum()
}

fn normalized_lag(centered: &[f64], lag: usize, norm: f64) -> f64 {
    if norm == 0.0 {
        return if lag == 0 { 1.0 } else { 0.0 };
    }
    lagged_product(centered, lag) / norm
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn acf_starts_at_one() {
        let acf = autocorrelation(&[1.0, 3.0, 2.0, 5.0, 4.0]);
        assert_eq!(acf.len(), 5);
        assert!(approx_eq(acf[0], 1.0, 1e-12));
        assert!(acf.iter().all(|v| v.abs() <= 1.0 + 1e-12));
    }

    #[test]
    fn acf_of_constant_series() {
        let acf = autocorrelation(&[2.0; 4]);
        assert_eq!(acf, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn acf_matches_hand_computation() {
        // centered: [-1, 1, -1, 1]; sum of squares 4
        let acf = autocorrelation(&[0.0, 2.0, 0.0, 2.0]);
        assert!(approx_eq(acf[1], -3.0 / 4.0, 1e-12));
        assert!(approx_eq(acf[2], 2.0 / 4.0, 1e-12));
        assert!(approx_eq(acf[3], -1.0 / 4.0, 1e-12));
    }

    #[test]
    fn ar1_chain_recovers_known_time() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        // AR(1) with phi = 0.9 has tau = (1 + phi) / (1 - phi) = 19
        let mut rng = StdRng::seed_from_u64(7);
        let walkers: Vec<Vec<f64>> = (0..4)
            .map(|_| {
                let mut x = 0.0;
                (0..5000)
                    .map(|_| {
                        x = 0.9 * x + (rng.random::<f64>() - 0.5);
                        x
                    })
                    .collect()
            })
            .collect();
        let tau = integrated_time(&walkers, DEFAULT_WINDOW_FACTOR);
        assert!(tau > 10.0 && tau < 30.0, "tau = {tau}");
    }

    #[test]
    fn white_noise_is_nearly_uncorrelated() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(11);
        let walkers: Vec<Vec<f64>> = (0..8)
            .map(|_| (0..2000).map(|_| rng.random::<f64>()).collect())
            .collect();
        let tau = integrated_time(&walkers, DEFAULT_WINDOW_FACTOR);
        assert!(tau > 0.5 && tau < 2.0, "tau = {tau}");
    }

    #[test]
    fn empty_input_is_nan() {
        assert!(integrated_time(&[], DEFAULT_WINDOW_FACTOR).is_nan());
        assert!(integrated_time(&[Vec::new()], DEFAULT_WINDOW_FACTOR).is_nan());
    }

    #[test]
    fn constant_walkers_decorrelate_immediately() {
        let tau = integrated_time(&[vec![0.5; 50], vec![0.2; 50]], DEFAULT_WINDOW_FACTOR);
        assert!(approx_eq(tau, 1.0, 1e-12));
    }
}
