//! Engine and region configuration: serde defaults, built-in regions and validation.

use puppi_core::{ErrorInfo, PuppiError};
use serde::{Deserialize, Serialize};

use crate::metric::Metric;

/// Engine-wide flags, thresholds and the ordered list of regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuppiConfig {
    /// Record per-particle alphas, medians and RMS values.
    #[serde(default)]
    pub diagnostics: bool,
    /// Force vertex-associated charged particles to weight 1 (PV) or 0 (PU).
    #[serde(default = "default_true")]
    pub apply_chs: bool,
    /// Emit `1 - w` instead of `w`.
    #[serde(default)]
    pub invert: bool,
    /// Fold the impact-parameter chi2 penalty into the combination.
    #[serde(default)]
    pub use_exp: bool,
    /// Weights below this value are zeroed.
    #[serde(default = "default_min_weight")]
    pub min_weight: f64,
    /// Photons above this pt are forced to weight 1 (disabled when not positive).
    #[serde(default = "default_pt_max_photons")]
    pub pt_max_photons: f64,
    /// Photon protection applies only below this |eta|.
    #[serde(default = "default_eta_max_photons")]
    pub eta_max_photons: f64,
    /// Neutral weights ramp to 1 at this pt (disabled when not positive).
    #[serde(default = "default_pt_max_neutrals")]
    pub pt_max_neutrals: f64,
    /// Pt at which the neutral ramp starts.
    #[serde(default)]
    pub pt_max_neutrals_start_slope: f64,
    /// Regions in priority order; later matches win.
    #[serde(default = "default_regions")]
    pub regions: Vec<RegionConfig>,
}

/// One configured eta/pt region with its iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Label used in logs and reports.
    #[serde(default)]
    pub name: String,
    /// Only particles with |eta| below this feed the region statistics.
    #[serde(default = "default_eta_max_extrap")]
    pub eta_max_extrap: f64,
    /// Eta windows claimed by the region.
    pub eta_bins: Vec<EtaBinConfig>,
    /// Metric iterations evaluated for particles in the region.
    pub iterations: Vec<IterationConfig>,
}

/// Eta window with its pt floor, neutral threshold and median/RMS scale factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EtaBinConfig {
    /// Lower |eta| edge (exclusive).
    pub eta_min: f64,
    /// Upper |eta| edge (exclusive).
    pub eta_max: f64,
    /// Particles must have pt strictly above this to be claimed.
    #[serde(default)]
    pub pt_min: f64,
    /// Neutral threshold at zero pileup vertices.
    #[serde(default)]
    pub min_neutral_pt: f64,
    /// Neutral threshold increase per pileup vertex.
    #[serde(default)]
    pub min_neutral_pt_slope: f64,
    /// Scale factor applied to the RMS in this window.
    #[serde(default = "default_scale_factor")]
    pub rms_eta_sf: f64,
    /// Scale factor applied to the median in this window.
    #[serde(default = "default_scale_factor")]
    pub med_eta_sf: f64,
}

impl EtaBinConfig {
    /// Neutral pt threshold for the given effective pileup-vertex count.
    pub fn neutral_pt(&self, npv: usize) -> f64 {
        self.min_neutral_pt + npv as f64 * self.min_neutral_pt_slope
    }

    fn claims(&self, pt: f64, abs_eta: f64) -> bool {
        abs_eta > self.eta_min && abs_eta < self.eta_max && pt > self.pt_min
    }
}

/// How an iteration joins the running chi2 sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "i32", into = "i32")]
pub enum Combination {
    /// 0: add to the running chi2 sum.
    #[default]
    AddChi2,
    /// 1: close the running block into a p-value and multiply.
    MultiplyPValues,
}

impl TryFrom<i32> for Combination {
    type Error = PuppiError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Combination::AddChi2),
            1 => Ok(Combination::MultiplyPValues),
            other => Err(PuppiError::Config(
                ErrorInfo::new("unknown-combination", "comb_opt must be 0 or 1")
                    .with_context("comb_opt", other),
            )),
        }
    }
}

impl From<Combination> for i32 {
    fn from(value: Combination) -> i32 {
        match value {
            Combination::AddChi2 => 0,
            Combination::MultiplyPValues => 1,
        }
    }
}

/// One metric evaluation per particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationConfig {
    /// Shape variable to evaluate.
    #[serde(rename = "algo_id")]
    pub metric: Metric,
    /// Use the charged-from-PV subset as neighbours instead of all particles.
    #[serde(default)]
    pub use_charged: bool,
    /// Apply the low-pileup median/RMS correction.
    #[serde(default)]
    pub apply_low_pu_corr: bool,
    /// Combination rule for this iteration.
    #[serde(default, rename = "comb_opt")]
    pub combination: Combination,
    /// Cone radius in (eta, phi).
    pub cone: f64,
    /// Minimum pt for a particle to enter the statistics.
    #[serde(default)]
    pub rms_pt_min: f64,
    /// Extra scale factor on the RMS.
    #[serde(default = "default_scale_factor")]
    pub rms_scale_factor: f64,
}

fn default_true() -> bool {
    true
}

fn default_min_weight() -> f64 {
    0.01
}

fn default_pt_max_photons() -> f64 {
    -1.0
}

fn default_eta_max_photons() -> f64 {
    2.5
}

fn default_pt_max_neutrals() -> f64 {
    200.0
}

fn default_eta_max_extrap() -> f64 {
    2.0
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_regions() -> Vec<RegionConfig> {
    vec![RegionConfig::central(), RegionConfig::forward()]
}

impl Default for PuppiConfig {
    fn default() -> Self {
        Self {
            diagnostics: false,
            apply_chs: true,
            invert: false,
            use_exp: false,
            min_weight: default_min_weight(),
            pt_max_photons: default_pt_max_photons(),
            eta_max_photons: default_eta_max_photons(),
            pt_max_neutrals: default_pt_max_neutrals(),
            pt_max_neutrals_start_slope: 0.0,
            regions: default_regions(),
        }
    }
}

impl RegionConfig {
    /// Tracker-covered region: charged-PV neighbours, |eta| < 2.5.
    pub fn central() -> Self {
        Self {
            name: "central".to_string(),
            eta_max_extrap: default_eta_max_extrap(),
            eta_bins: vec![EtaBinConfig {
                eta_min: 0.0,
                eta_max: 2.5,
                pt_min: 0.0,
                min_neutral_pt: 0.2,
                min_neutral_pt_slope: 0.015,
                rms_eta_sf: 1.0,
                med_eta_sf: 1.0,
            }],
            iterations: vec![IterationConfig {
                metric: Metric::LogPt2OverDr2,
                use_charged: true,
                apply_low_pu_corr: true,
                combination: Combination::AddChi2,
                cone: 0.4,
                rms_pt_min: 0.1,
                rms_scale_factor: 1.0,
            }],
        }
    }

    /// Forward region: all-particle neighbours, statistics extrapolated from the centre.
    pub fn forward() -> Self {
        Self {
            name: "forward".to_string(),
            eta_max_extrap: default_eta_max_extrap(),
            eta_bins: vec![
                EtaBinConfig {
                    eta_min: 2.5,
                    eta_max: 3.0,
                    pt_min: 0.0,
                    min_neutral_pt: 1.7,
                    min_neutral_pt_slope: 0.08,
                    rms_eta_sf: 1.0,
                    med_eta_sf: 0.9,
                },
                EtaBinConfig {
                    eta_min: 3.0,
                    eta_max: 10.0,
                    pt_min: 0.0,
                    min_neutral_pt: 2.0,
                    min_neutral_pt_slope: 0.08,
                    rms_eta_sf: 1.0,
                    med_eta_sf: 0.75,
                },
            ],
            iterations: vec![IterationConfig {
                metric: Metric::LogPt2OverDr2,
                use_charged: false,
                apply_low_pu_corr: true,
                combination: Combination::AddChi2,
                cone: 0.4,
                rms_pt_min: 0.5,
                rms_scale_factor: 1.0,
            }],
        }
    }

    /// Index of the first eta window claiming `(pt, eta)`.
    pub fn claim(&self, pt: f64, eta: f64) -> Option<usize> {
        let abs_eta = eta.abs();
        self.eta_bins.iter().position(|bin| bin.claims(pt, abs_eta))
    }
}

fn config_error(code: &str, message: &str, region: usize) -> PuppiError {
    PuppiError::Config(ErrorInfo::new(code, message).with_context("region", region))
}

fn check_finite(value: f64, field: &str) -> Result<(), PuppiError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PuppiError::Config(
            ErrorInfo::new("invalid-threshold", "threshold must be finite")
                .with_context("field", field)
                .with_context("value", value),
        ))
    }
}

impl PuppiConfig {
    /// Checks the structural consistency of the configuration.
    pub fn validate(&self) -> Result<(), PuppiError> {
        check_finite(self.min_weight, "min_weight")?;
        check_finite(self.pt_max_photons, "pt_max_photons")?;
        check_finite(self.eta_max_photons, "eta_max_photons")?;
        check_finite(self.pt_max_neutrals, "pt_max_neutrals")?;
        check_finite(
            self.pt_max_neutrals_start_slope,
            "pt_max_neutrals_start_slope",
        )?;
        if self.pt_max_neutrals > 0.0 && self.pt_max_neutrals <= self.pt_max_neutrals_start_slope {
            return Err(PuppiError::Config(
                ErrorInfo::new(
                    "invalid-neutral-ramp",
                    "pt_max_neutrals must exceed pt_max_neutrals_start_slope",
                )
                .with_context("pt_max_neutrals", self.pt_max_neutrals)
                .with_context("start", self.pt_max_neutrals_start_slope),
            ));
        }
        for (idx, region) in self.regions.iter().enumerate() {
            region.validate(idx)?;
        }
        Ok(())
    }

    /// Largest iteration count across regions, at least one.
    pub fn max_iterations(&self) -> usize {
        self.regions
            .iter()
            .map(|region| region.iterations.len())
            .max()
            .unwrap_or(0)
            .max(1)
    }
}

impl RegionConfig {
    fn validate(&self, idx: usize) -> Result<(), PuppiError> {
        if self.eta_bins.is_empty() {
            return Err(config_error(
                "empty-eta-bins",
                "region must declare at least one eta window",
                idx,
            ));
        }
        if self.iterations.is_empty() {
            return Err(config_error(
                "missing-iterations",
                "region must declare at least one iteration",
                idx,
            ));
        }
        if !self.eta_max_extrap.is_finite() {
            return Err(config_error(
                "invalid-threshold",
                "eta_max_extrap must be finite",
                idx,
            ));
        }
        for (bin_idx, bin) in self.eta_bins.iter().enumerate() {
            let finite = [
                bin.eta_min,
                bin.pt_min,
                bin.min_neutral_pt,
                bin.min_neutral_pt_slope,
                bin.rms_eta_sf,
                bin.med_eta_sf,
            ]
            .iter()
            .all(|value| value.is_finite());
            if !finite || bin.eta_max.is_nan() || bin.eta_min >= bin.eta_max {
                return Err(PuppiError::Config(
                    ErrorInfo::new("invalid-eta-window", "eta window must satisfy min < max")
                        .with_context("region", idx)
                        .with_context("eta_bin", bin_idx),
                ));
            }
        }
        for (iter_idx, iteration) in self.iterations.iter().enumerate() {
            if !(iteration.cone.is_finite() && iteration.cone > 0.0) {
                return Err(PuppiError::Config(
                    ErrorInfo::new("non-positive-cone", "cone radius must be positive")
                        .with_context("region", idx)
                        .with_context("iteration", iter_idx)
                        .with_context("cone", iteration.cone),
                ));
            }
            if !(iteration.rms_scale_factor.is_finite() && iteration.rms_pt_min.is_finite()) {
                return Err(PuppiError::Config(
                    ErrorInfo::new("invalid-threshold", "iteration thresholds must be finite")
                        .with_context("region", idx)
                        .with_context("iteration", iter_idx),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = PuppiConfig::default();
        config.validate().unwrap();
        assert_eq!(config.max_iterations(), 1);
    }

    #[test]
    fn empty_region_list_still_runs_one_iteration() {
        let config = PuppiConfig {
            regions: Vec::new(),
            ..PuppiConfig::default()
        };
        config.validate().unwrap();
        assert_eq!(config.max_iterations(), 1);
    }

    #[test]
    fn claim_requires_pt_above_floor() {
        let mut region = RegionConfig::central();
        region.eta_bins[0].pt_min = 1.0;
        assert_eq!(region.claim(1.0, 0.5), None);
        assert_eq!(region.claim(1.5, -0.5), Some(0));
        assert_eq!(region.claim(1.5, 2.5), None);
    }
}
