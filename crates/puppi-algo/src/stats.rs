//! Per-event median/RMS accumulation for one region.

use puppi_core::{Category, Particle};

use crate::chi2::chi2_quantile;
use crate::config::RegionConfig;

const RMS_FLOOR: f64 = 1e-5;

/// Accumulated values and the finalised summary of one iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IterationStats {
    values: Vec<f64>,
    median: f64,
    rms: f64,
    median_per_eta: Vec<f64>,
    rms_per_eta: Vec<f64>,
}

impl IterationStats {
    fn new(n_eta_bins: usize) -> Self {
        Self {
            values: Vec::new(),
            median: 0.0,
            rms: 0.0,
            median_per_eta: vec![0.0; n_eta_bins],
            rms_per_eta: vec![0.0; n_eta_bins],
        }
    }

    fn reset(&mut self) {
        self.values.clear();
        self.median = 0.0;
        self.rms = 0.0;
        self.median_per_eta.iter_mut().for_each(|value| *value = 0.0);
        self.rms_per_eta.iter_mut().for_each(|value| *value = 0.0);
    }

    /// Number of pileup values accumulated this event.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Region-wide median before eta scale factors.
    pub fn median(&self) -> f64 {
        self.median
    }

    /// Region-wide RMS before eta scale factors.
    pub fn rms(&self) -> f64 {
        self.rms
    }
}

/// Per-event statistics of one region across its iterations.
///
/// Pileup-charged values feed the median/RMS pool of their iteration.
/// Primary-vertex-charged values go to a single pool shared by all
/// iterations of the event; it is only read by the low-pileup correction.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionStats {
    iterations: Vec<IterationStats>,
    pv_values: Vec<f64>,
}

impl RegionStats {
    /// Creates empty statistics sized for `region`.
    pub fn new(region: &RegionConfig) -> Self {
        Self {
            iterations: (0..region.iterations.len())
                .map(|_| IterationStats::new(region.eta_bins.len()))
                .collect(),
            pv_values: Vec::new(),
        }
    }

    /// Clears all accumulated values and summaries.
    pub fn reset(&mut self) {
        self.iterations.iter_mut().for_each(IterationStats::reset);
        self.pv_values.clear();
    }

    /// Records `value` computed for `particle` under iteration `iteration`.
    pub fn add(&mut self, region: &RegionConfig, iteration: usize, particle: &Particle, value: f64) {
        let Some(config) = region.iterations.get(iteration) else {
            return;
        };
        if particle.pt < config.rms_pt_min || particle.eta.abs() >= region.eta_max_extrap {
            return;
        }
        match particle.category {
            Category::AssociatedToPu => self.iterations[iteration].values.push(value),
            Category::AssociatedToPv => self.pv_values.push(value),
            _ => {}
        }
    }

    /// Computes the median and RMS of `iteration` and spreads them over the eta windows.
    ///
    /// An empty pool leaves every summary at zero.
    pub fn finalize(&mut self, region: &RegionConfig, iteration: usize) {
        let Some(config) = region.iterations.get(iteration) else {
            return;
        };
        let stats = &mut self.iterations[iteration];
        let count = stats.values.len();
        if count == 0 {
            return;
        }
        stats.values.sort_by(f64::total_cmp);

        let last_zero = stats
            .values
            .iter()
            .rposition(|value| *value == 0.0)
            .unwrap_or(0);
        let halfway = last_zero + ((count - last_zero) as f64 * 0.5) as usize;
        let median = stats.values[halfway];

        let mut sum_sq = 0.0;
        let mut n_rms = 0usize;
        for &value in &stats.values {
            if value == 0.0 {
                continue;
            }
            if config.apply_low_pu_corr && value > median {
                continue;
            }
            n_rms += 1;
            sum_sq += (value - median) * (value - median);
        }
        let mut rms = if n_rms > 0 {
            sum_sq / n_rms as f64
        } else {
            sum_sq
        };
        if rms == 0.0 {
            rms = RMS_FLOOR;
        }
        rms = rms.sqrt() * config.rms_scale_factor;

        let mut median = median;
        if config.apply_low_pu_corr {
            self.pv_values.sort_by(f64::total_cmp);
            let n_pv = self.pv_values.iter().filter(|value| **value <= median).count();
            let adjust = n_pv as f64 / (n_pv as f64 + 0.5 * count as f64);
            if adjust > 0.0 {
                let shift = (chi2_quantile(adjust, 1) * rms).sqrt();
                median -= shift;
                rms -= shift;
            }
        }

        stats.median = median;
        stats.rms = rms;
        for (bin_idx, bin) in region.eta_bins.iter().enumerate() {
            stats.rms_per_eta[bin_idx] = rms * bin.rms_eta_sf;
            stats.median_per_eta[bin_idx] = median * bin.med_eta_sf;
        }
        tracing::trace!(
            region = %region.name,
            iteration,
            count,
            median,
            rms,
            "region statistics finalised"
        );
    }

    /// Summary of one iteration.
    pub fn iteration(&self, iteration: usize) -> Option<&IterationStats> {
        self.iterations.get(iteration)
    }

    /// Number of pileup values accumulated for `iteration`.
    pub fn count(&self, iteration: usize) -> usize {
        self.iterations.get(iteration).map_or(0, IterationStats::count)
    }

    /// Median of `iteration` scaled for eta window `eta_bin`.
    pub fn median(&self, iteration: usize, eta_bin: usize) -> f64 {
        self.iterations
            .get(iteration)
            .and_then(|stats| stats.median_per_eta.get(eta_bin))
            .copied()
            .unwrap_or(0.0)
    }

    /// RMS of `iteration` scaled for eta window `eta_bin`.
    pub fn rms(&self, iteration: usize, eta_bin: usize) -> f64 {
        self.iterations
            .get(iteration)
            .and_then(|stats| stats.rms_per_eta.get(eta_bin))
            .copied()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EtaBinConfig, RegionConfig};

    fn region(low_pu: bool) -> RegionConfig {
        let mut region = RegionConfig::central();
        region.iterations[0].apply_low_pu_corr = low_pu;
        region.iterations[0].rms_pt_min = 0.0;
        region.eta_bins.push(EtaBinConfig {
            eta_min: 2.5,
            eta_max: 3.0,
            med_eta_sf: 0.5,
            rms_eta_sf: 2.0,
            ..region.eta_bins[0]
        });
        region
    }

    fn pu() -> Particle {
        Particle::new(1.0, 0.0, 0.0, Category::AssociatedToPu)
    }

    #[test]
    fn median_skips_leading_zeros() {
        let region = region(false);
        let mut stats = RegionStats::new(&region);
        for value in [0.0, 0.0, 1.0, 2.0, 3.0] {
            stats.add(&region, 0, &pu(), value);
        }
        stats.finalize(&region, 0);
        // last zero at index 1 -> 1 + floor(4 * 0.5) = 3
        assert_eq!(stats.iteration(0).unwrap().median(), 2.0);
        let expected_rms = ((1.0 + 0.0 + 1.0) / 3.0f64).sqrt();
        assert!((stats.rms(0, 0) - expected_rms).abs() < 1e-12);
        assert!((stats.median(0, 1) - 1.0).abs() < 1e-12);
        assert!((stats.rms(0, 1) - 2.0 * expected_rms).abs() < 1e-12);
    }

    #[test]
    fn constant_pool_gets_floor_rms() {
        let region = region(false);
        let mut stats = RegionStats::new(&region);
        for _ in 0..4 {
            stats.add(&region, 0, &pu(), 1.5);
        }
        stats.finalize(&region, 0);
        assert!((stats.rms(0, 0) - RMS_FLOOR.sqrt()).abs() < 1e-15);
    }

    #[test]
    fn gates_on_pt_eta_and_category() {
        let mut region = region(false);
        region.iterations[0].rms_pt_min = 0.5;
        let mut stats = RegionStats::new(&region);
        stats.add(&region, 0, &Particle::new(0.4, 0.0, 0.0, Category::AssociatedToPu), 1.0);
        stats.add(&region, 0, &Particle::new(1.0, 2.1, 0.0, Category::AssociatedToPu), 1.0);
        stats.add(&region, 0, &Particle::new(1.0, 0.0, 0.0, Category::Neutral), 1.0);
        stats.add(&region, 0, &Particle::new(1.0, 0.0, 0.0, Category::AssociatedToPv), 1.0);
        assert_eq!(stats.count(0), 0);
        stats.add(&region, 0, &pu(), 1.0);
        assert_eq!(stats.count(0), 1);
    }

    #[test]
    fn low_pu_correction_shifts_median_down() {
        let region = region(true);
        let mut stats = RegionStats::new(&region);
        for value in [1.0, 2.0, 3.0, 4.0] {
            stats.add(&region, 0, &pu(), value);
        }
        let pv = Particle::new(1.0, 0.0, 0.0, Category::AssociatedToPv);
        stats.add(&region, 0, &pv, 0.5);
        stats.finalize(&region, 0);
        assert!(stats.median(0, 0) < 3.0);
    }

    #[test]
    fn empty_pool_and_reset_leave_zeros() {
        let region = region(false);
        let mut stats = RegionStats::new(&region);
        stats.finalize(&region, 0);
        assert_eq!(stats.median(0, 0), 0.0);
        stats.add(&region, 0, &pu(), 1.0);
        stats.finalize(&region, 0);
        stats.reset();
        assert_eq!(stats.count(0), 0);
        assert_eq!(stats.rms(0, 0), 0.0);
    }
}
