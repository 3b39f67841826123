//! Strategies turning per-iteration alphas into a probability-like weight.

use std::fmt;

use crate::chi2::chi2_cdf;
use crate::config::{Combination, IterationConfig};
use crate::metric::Metric;
use crate::stats::RegionStats;

/// Region state visible to a combiner for a single particle.
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext<'a> {
    /// Iterations configured on the particle's region.
    pub iterations: &'a [IterationConfig],
    /// Finalised statistics of the particle's region for this event.
    pub stats: &'a RegionStats,
    /// Eta window of the region claiming the particle.
    pub eta_bin: usize,
}

/// Combines raw metric values and an external chi2 penalty into a weight in `[0, 1]`.
pub trait WeightCombiner: fmt::Debug + Send + Sync {
    /// `values[k]` is the particle's alpha for iteration `k` of its region.
    fn combine(&self, ctx: &ScoreContext<'_>, values: &[f64], chi2: f64) -> f64;
}

/// Signed chi-square of each alpha around its iteration's median, converted to a CDF.
///
/// Every iteration is scored against the median and RMS of that same
/// iteration in the particle's eta window.
///
/// Iterations flagged [`Combination::MultiplyPValues`] close the running block
/// and multiply its p-value into the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChiSquareCombiner;

impl WeightCombiner for ChiSquareCombiner {
    fn combine(&self, ctx: &ScoreContext<'_>, values: &[f64], chi2: f64) -> f64 {
        if ctx
            .iterations
            .first()
            .map_or(true, |first| first.metric == Metric::Identity)
        {
            return 1.0;
        }
        let mut block = 0.0;
        let mut p_value = 1.0;
        let mut ndof = 0usize;
        for (idx, iteration) in ctx.iterations.iter().enumerate() {
            // no pileup seen
            if ctx.stats.count(idx) == 0 {
                return 1.0;
            }
            if iteration.combination == Combination::MultiplyPValues && idx > 0 {
                p_value *= chi2_cdf(block, ndof);
                ndof = 0;
                block = 0.0;
            }
            let median = ctx.stats.median(idx, ctx.eta_bin);
            let rms = ctx.stats.rms(idx, ctx.eta_bin);
            let raw = values.get(idx).copied().unwrap_or(f64::NAN);
            let value = if iteration.metric.is_logarithmic() && raw == 0.0 {
                median
            } else {
                raw
            };
            let diff = value - median;
            block += diff * diff.abs() / rms / rms;
            ndof += 1;
            if idx == 0 && chi2 != 0.0 {
                ndof += 1;
                block += chi2;
            }
        }
        p_value * chi2_cdf(block, ndof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegionConfig;
    use puppi_core::{Category, Particle};

    fn filled_stats(region: &RegionConfig) -> RegionStats {
        let mut stats = RegionStats::new(region);
        let pu = Particle::new(1.0, 0.0, 0.0, Category::AssociatedToPu);
        for idx in 0..region.iterations.len() {
            stats.add(region, idx, &pu, 1.0);
            stats.add(region, idx, &pu, 3.0);
            stats.finalize(region, idx);
        }
        stats
    }

    fn ctx<'a>(region: &'a RegionConfig, stats: &'a RegionStats) -> ScoreContext<'a> {
        ScoreContext {
            iterations: &region.iterations,
            stats,
            eta_bin: 0,
        }
    }

    #[test]
    fn value_at_median_scores_zero() {
        let region = RegionConfig::central();
        let stats = filled_stats(&region);
        let ctx = ctx(&region, &stats);
        let median = stats.median(0, 0);
        let rms = stats.rms(0, 0);
        assert_eq!(ChiSquareCombiner.combine(&ctx, &[median], 0.0), 0.0);
        assert_eq!(ChiSquareCombiner.combine(&ctx, &[median - rms], 0.0), 0.0);
        let above = ChiSquareCombiner.combine(&ctx, &[median + rms], 0.0);
        assert!((above - chi2_cdf(1.0, 1)).abs() < 1e-12);
    }

    #[test]
    fn empty_pool_means_weight_one() {
        let region = RegionConfig::central();
        let stats = RegionStats::new(&region);
        let ctx = ctx(&region, &stats);
        assert_eq!(ChiSquareCombiner.combine(&ctx, &[5.0], 0.0), 1.0);
    }

    #[test]
    fn zero_log_alpha_is_replaced_by_median() {
        let region = RegionConfig::central();
        let stats = filled_stats(&region);
        let ctx = ctx(&region, &stats);
        assert_eq!(ChiSquareCombiner.combine(&ctx, &[0.0], 0.0), 0.0);
        let with_penalty = ChiSquareCombiner.combine(&ctx, &[0.0], 4.0);
        assert!((with_penalty - chi2_cdf(4.0, 2)).abs() < 1e-12);
    }

    #[test]
    fn multiplied_blocks() {
        let mut region = RegionConfig::central();
        let mut second = region.iterations[0];
        second.combination = Combination::MultiplyPValues;
        region.iterations.push(second);
        let stats = filled_stats(&region);
        let ctx = ctx(&region, &stats);
        let (median, rms) = (stats.median(1, 0), stats.rms(1, 0));
        let weight =
            ChiSquareCombiner.combine(&ctx, &[median + rms, median + 2.0 * rms], 0.0);
        let expected = chi2_cdf(1.0, 1) * chi2_cdf(4.0, 1);
        assert!((weight - expected).abs() < 1e-12);
    }

    #[test]
    fn each_iteration_uses_its_own_median_and_rms() {
        let mut region = RegionConfig::central();
        region.iterations[0].apply_low_pu_corr = false;
        region.iterations[0].rms_pt_min = 0.0;
        let mut second = region.iterations[0];
        second.metric = Metric::PtSum;
        region.iterations.push(second);

        let mut stats = RegionStats::new(&region);
        let pu = Particle::new(1.0, 0.0, 0.0, Category::AssociatedToPu);
        for value in [1.0, 2.0, 3.0] {
            stats.add(&region, 0, &pu, value);
        }
        for value in [90.0, 100.0, 110.0] {
            stats.add(&region, 1, &pu, value);
        }
        stats.finalize(&region, 0);
        stats.finalize(&region, 1);
        assert_eq!(stats.median(0, 0), 2.0);
        assert_eq!(stats.median(1, 0), 100.0);

        let ctx = ctx(&region, &stats);
        assert_eq!(ChiSquareCombiner.combine(&ctx, &[2.0, 100.0], 0.0), 0.0);

        let one_sigma = [2.0 + stats.rms(0, 0), 100.0 + stats.rms(1, 0)];
        let weight = ChiSquareCombiner.combine(&ctx, &one_sigma, 0.0);
        assert!((weight - chi2_cdf(2.0, 2)).abs() < 1e-12);
    }
}
