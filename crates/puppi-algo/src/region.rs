//! Compiled, immutable region set shared by every engine instance.

use std::sync::Arc;

use puppi_core::serde::stable_hash_string;
use puppi_core::{ErrorInfo, PuppiError};

use crate::combine::{ChiSquareCombiner, WeightCombiner};
use crate::config::{EtaBinConfig, PuppiConfig, RegionConfig};

/// A configured region paired with its combination strategy.
#[derive(Debug, Clone)]
pub struct AlgoRegion {
    config: RegionConfig,
    combiner: Arc<dyn WeightCombiner>,
}

impl AlgoRegion {
    /// Region configuration.
    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Combination strategy of the region.
    pub fn combiner(&self) -> &dyn WeightCombiner {
        self.combiner.as_ref()
    }

    /// Eta window `eta_bin` of the region.
    pub fn eta_bin(&self, eta_bin: usize) -> Option<&EtaBinConfig> {
        self.config.eta_bins.get(eta_bin)
    }
}

/// Region and eta window claiming a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionMatch {
    /// Index of the winning region.
    pub region: usize,
    /// Index of the claiming eta window inside that region.
    pub eta_bin: usize,
}

/// Validated configuration plus compiled regions.
#[derive(Debug, Clone)]
pub struct PuppiSetup {
    config: PuppiConfig,
    regions: Vec<AlgoRegion>,
    max_iterations: usize,
    config_hash: String,
}

impl PuppiSetup {
    /// Validates `config` and attaches the default chi-square combiner to every region.
    pub fn new(config: PuppiConfig) -> Result<Self, PuppiError> {
        config.validate()?;
        let config_hash = stable_hash_string(&config)?;
        let regions = config
            .regions
            .iter()
            .cloned()
            .map(|region| AlgoRegion {
                config: region,
                combiner: Arc::new(ChiSquareCombiner),
            })
            .collect::<Vec<_>>();
        let max_iterations = config.max_iterations();
        tracing::info!(
            regions = regions.len(),
            max_iterations,
            apply_chs = config.apply_chs,
            invert = config.invert,
            hash = %config_hash,
            "puppi setup compiled"
        );
        Ok(Self {
            config,
            regions,
            max_iterations,
            config_hash,
        })
    }

    /// Replaces the combination strategy of region `region`.
    pub fn with_combiner(
        mut self,
        region: usize,
        combiner: Arc<dyn WeightCombiner>,
    ) -> Result<Self, PuppiError> {
        let count = self.regions.len();
        let slot = self.regions.get_mut(region).ok_or_else(|| {
            PuppiError::Config(
                ErrorInfo::new("region-out-of-range", "combiner targets an unknown region")
                    .with_context("region", region)
                    .with_context("regions", count),
            )
        })?;
        slot.combiner = combiner;
        Ok(self)
    }

    /// Source configuration.
    pub fn config(&self) -> &PuppiConfig {
        &self.config
    }

    /// Compiled regions in configuration order.
    pub fn regions(&self) -> &[AlgoRegion] {
        &self.regions
    }

    /// Largest iteration count across regions, at least one.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// SHA-256 of the canonical JSON configuration.
    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    /// Resolves the region claiming `(pt, eta)`.
    ///
    /// Inside a region the first claiming eta window wins. Every region is
    /// scanned, so when regions overlap the last claiming region wins.
    pub fn classify(&self, pt: f64, eta: f64) -> Option<RegionMatch> {
        let mut found = None;
        for (region_idx, region) in self.regions.iter().enumerate() {
            if let Some(eta_bin) = region.config.claim(pt, eta) {
                found = Some(RegionMatch {
                    region: region_idx,
                    eta_bin,
                });
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_regions_split_at_tracker_edge() {
        let setup = PuppiSetup::new(PuppiConfig::default()).unwrap();
        assert_eq!(
            setup.classify(1.0, 1.0),
            Some(RegionMatch {
                region: 0,
                eta_bin: 0
            })
        );
        assert_eq!(
            setup.classify(1.0, -3.5),
            Some(RegionMatch {
                region: 1,
                eta_bin: 1
            })
        );
        assert_eq!(setup.classify(1.0, 2.5), None);
        assert_eq!(setup.classify(1.0, 12.0), None);
    }

    #[test]
    fn combiner_index_is_checked() {
        let setup = PuppiSetup::new(PuppiConfig::default()).unwrap();
        let err = setup
            .with_combiner(5, Arc::new(ChiSquareCombiner))
            .unwrap_err();
        assert_eq!(err.info().code, "region-out-of-range");
    }
}
