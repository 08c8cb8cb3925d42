//! Property-based tests for lymph-math numerical functions.

use lymph_math::{
    autocorrelation, binomial_log_pmf, binomial_pmf, binomial_time_prior, log_binomial,
    log_factorial,
};
use proptest::prelude::*;

const TOL: f64 = 1e-10;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a.signum() == b.signum();
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

// ============================================================================
// Binomial
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every time prior is a probability vector.
    #[test]
    fn time_prior_sums_to_one(t_max in 0usize..60, p in 0.0..=1.0f64) {
        let prior = binomial_time_prior(t_max, p);
        prop_assert_eq!(prior.len(), t_max + 1);
        prop_assert!(prior.iter().all(|&v| (0.0..=1.0 + TOL).contains(&v)));
        let total: f64 = prior.iter().sum();
        prop_assert!(approx_eq(total, 1.0, 1e-9), "sum = {}", total);
    }

    /// Binomial(n, p) at k equals Binomial(n, 1 - p) at n - k.
    #[test]
    fn pmf_reflection(n in 1u64..40, k_frac in 0.0..=1.0f64, p in 0.0..=1.0f64) {
        let k = ((n as f64) * k_frac).floor() as u64;
        let left = binomial_pmf(k, n, p);
        let right = binomial_pmf(n - k, n, 1.0 - p);
        prop_assert!(approx_eq(left, right, 1e-9), "{} != {}", left, right);
    }

    /// Log pmf never exceeds zero for valid probabilities.
    #[test]
    fn log_pmf_non_positive(n in 0u64..50, k in 0u64..50, p in 0.0..=1.0f64) {
        let value = binomial_log_pmf(k, n, p);
        prop_assert!(value <= TOL, "log pmf = {}", value);
    }
}

// ============================================================================
// Log factorial / binomial coefficient
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// ln n! = ln (n-1)! + ln n
    #[test]
    fn log_factorial_recurrence(n in 2u64..150) {
        let lhs = log_factorial(n);
        let rhs = log_factorial(n - 1) + (n as f64).ln();
        prop_assert!(approx_eq(lhs, rhs, 1e-9));
    }

    /// C(n, k) = C(n, n - k)
    #[test]
    fn log_binomial_symmetric(n in 0u64..120, k_frac in 0.0..=1.0f64) {
        let k = ((n as f64) * k_frac).floor() as u64;
        prop_assert!(approx_eq(log_binomial(n, k), log_binomial(n, n - k), 1e-9));
    }
}

// ============================================================================
// Autocorrelation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The normalized correlogram starts at one and stays within [-1, 1].
    #[test]
    fn acf_is_normalized(series in prop::collection::vec(-10.0..10.0f64, 2..80)) {
        let acf = autocorrelation(&series);
        prop_assert_eq!(acf.len(), series.len());
        prop_assert!(approx_eq(acf[0], 1.0, TOL));
        prop_assert!(acf.iter().all(|v| v.abs() <= 1.0 + 1e-9));
    }
}
