//! Log-domain special functions.
//!
//! The Binomial time priors are evaluated through log factorials so that
//! large horizons (`t_max` in the hundreds) do not overflow the way a naive
//! `n! / (k! (n-k)!)` does.

use std::f64::consts::PI;

const HALF_LN_TWO_PI: f64 = 0.918_938_533_204_672_8;
const LANCZOS_G: f64 = 7.0;
#[allow(clippy::excessive_precision)]
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// `ln |Γ(z)|` via the Lanczos approximation, reflected below one half.
///
/// Poles (non-positive integers) and `-∞` map to NaN.
pub fn log_gamma(z: f64) -> f64 {
    if z.is_nan() || z == f64::NEG_INFINITY {
        return f64::NAN;
    }
    if z == f64::INFINITY {
        return f64::INFINITY;
    }
    if z <= 0.0 && z == z.round() {
        return f64::NAN;
    }
    if z < 0.5 {
        let sin_pi_z = (PI * z).sin();
        return PI.ln() - sin_pi_z.abs().ln() - log_gamma(1.0 - z);
    }

    let shifted = z - 1.0;
    let series = LANCZOS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS[0], |acc, (i, c)| acc + c / (shifted + i as f64));
    let t = shifted + LANCZOS_G + 0.5;
    HALF_LN_TWO_PI + (shifted + 0.5) * t.ln() - t + series.ln()
}

/// `ln n!`.
pub fn log_factorial(n: u64) -> f64 {
    match n {
        0 | 1 => 0.0,
        _ => log_gamma(n as f64 + 1.0),
    }
}

/// `ln C(n, k)`; `-∞` when `k > n`.
pub fn log_binomial(n: u64, k: u64) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    if k == 0 || k == n {
        return 0.0;
    }
    log_factorial(n) - log_factorial(k) - log_factorial(n - k)
}

/// `a · ln(b)` with the convention `0 · ln 0 = 0`.
pub fn xlogy(a: f64, b: f64) -> f64 {
    if a == 0.0 && !b.is_nan() {
        return 0.0;
    }
    a * b.ln()
}

/// Whether every entry lies in the closed unit interval.
///
/// NaN never lies in the interval.
pub fn all_in_unit_interval(values: &[f64]) -> bool {
    values.iter().all(|v| (0.0..=1.0).contains(v))
}
