//! Chi-square helpers and the impact-parameter penalty.

use statrs::distribution::{ChiSquared, ContinuousCDF};

const PROBABILITY_FLOOR: f64 = 1e-16;

/// One-sided survival function of the standard normal distribution.
pub fn normal_sf(z: f64) -> f64 {
    0.5 * statrs::function::erf::erfc(z / std::f64::consts::SQRT_2)
}

/// Chi-square CDF with `ndof` degrees of freedom; zero for non-positive `x`.
///
/// Returns NaN for a NaN argument or zero degrees of freedom.
pub fn chi2_cdf(x: f64, ndof: usize) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    match ChiSquared::new(ndof as f64) {
        Ok(dist) => dist.cdf(x),
        Err(_) => f64::NAN,
    }
}

/// Chi-square quantile with `ndof` degrees of freedom for `p` in `[0, 1]`.
pub fn chi2_quantile(p: f64, ndof: usize) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if ndof == 1 {
        // square of a two-sided normal quantile
        let z = statrs::function::erf::erf_inv(p);
        return 2.0 * z * z;
    }
    match ChiSquared::new(ndof as f64) {
        Ok(dist) => dist.inverse_cdf(p),
        Err(_) => f64::NAN,
    }
}

/// Penalty derived from the longitudinal impact parameter, in units of its resolution.
///
/// The two-sided Gaussian probability of compatibility with the primary vertex
/// is turned into a pileup probability, clamped away from 0 and 1, mapped to a
/// one-degree-of-freedom chi-square quantile and squared.
pub fn chi2_from_dz(dz: f64) -> f64 {
    let prob_lv = normal_sf(dz.abs()) * 2.0;
    let prob_pu = (1.0 - prob_lv).clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR);
    let quantile = chi2_quantile(prob_pu, 1);
    quantile * quantile
}
