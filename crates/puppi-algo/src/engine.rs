//! Per-event weighting pipeline.

use std::sync::Arc;

use puppi_core::{Category, ErrorInfo, Particle, PuppiError};
use serde::{Deserialize, Serialize};

use crate::chi2::chi2_from_dz;
use crate::combine::ScoreContext;
use crate::config::{IterationConfig, PuppiConfig};
use crate::metric::alpha;
use crate::region::{PuppiSetup, RegionMatch};
use crate::stats::RegionStats;

/// Sentinel stored for a particle whose region lacks the current iteration.
pub const MISSING_ALPHA: f64 = -1.0;

/// Median/RMS diagnostic reported for particles no region claims.
pub const UNCLASSIFIED_DIAGNOSTIC: f64 = -10.0;

/// Lifecycle of an engine within one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No event loaded.
    Idle,
    /// Particles loaded and partitioned.
    Initialized,
    /// Region statistics computed for every iteration.
    StatsComputed,
    /// Weights available.
    WeightsComputed,
}

/// Optional per-event diagnostic arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Own-region alphas, iteration-major: `alphas[k * n + i]`.
    pub alphas: Vec<f64>,
    /// Iteration-0 alphas under every region, region-major: `raw_alphas[r * n + i]`.
    pub raw_alphas: Vec<f64>,
    /// Region median reported for each particle.
    pub alpha_median: Vec<f64>,
    /// Region RMS reported for each particle.
    pub alpha_rms: Vec<f64>,
    /// Number of configured regions, the row count of `raw_alphas`.
    pub n_algos: usize,
}

/// Weighting engine owning all per-event buffers.
///
/// One engine serves one event at a time; concurrent events use separate
/// engines sharing the same [`PuppiSetup`].
#[derive(Debug, Clone)]
pub struct PuppiEngine {
    setup: Arc<PuppiSetup>,
    state: EngineState,
    particles: Vec<Particle>,
    charged_pv: Vec<Particle>,
    npv: usize,
    stats: Vec<RegionStats>,
    values: Vec<f64>,
    weights: Vec<f64>,
    diagnostics: Option<Diagnostics>,
}

impl PuppiEngine {
    /// Creates an idle engine over a shared setup.
    pub fn new(setup: Arc<PuppiSetup>) -> Self {
        let stats = setup
            .regions()
            .iter()
            .map(|region| RegionStats::new(region.config()))
            .collect();
        Self {
            setup,
            state: EngineState::Idle,
            particles: Vec::new(),
            charged_pv: Vec::new(),
            npv: 0,
            stats,
            values: Vec::new(),
            weights: Vec::new(),
            diagnostics: None,
        }
    }

    /// Loads an event, discarding everything left from the previous one.
    ///
    /// `npv` is the effective pileup-vertex count feeding the neutral threshold.
    pub fn initialize(&mut self, particles: &[Particle], npv: usize) {
        self.particles.clear();
        self.particles.extend_from_slice(particles);
        self.charged_pv.clear();
        self.charged_pv.extend(
            particles
                .iter()
                .filter(|particle| particle.category == Category::AssociatedToPv)
                .copied(),
        );
        self.npv = npv;
        self.values.clear();
        self.weights.clear();
        self.diagnostics = None;
        self.state = EngineState::Initialized;
    }

    /// Computes one weight per loaded particle, index-aligned with the input.
    ///
    /// Statistics are rebuilt on every call, so repeated calls on the same
    /// event return identical weights.
    pub fn compute_weights(&mut self) -> Result<&[f64], PuppiError> {
        if self.state == EngineState::Idle {
            return Err(PuppiError::Engine(
                ErrorInfo::new("not-initialized", "no event loaded")
                    .with_hint("call initialize before compute_weights"),
            ));
        }
        self.compute_statistics();
        let raw_alphas = if self.setup.config().diagnostics {
            self.raw_alphas(0)
        } else {
            Vec::new()
        };
        self.compute_particle_weights(raw_alphas);
        debug_assert_eq!(self.weights.len(), self.particles.len());
        Ok(&self.weights)
    }

    fn compute_statistics(&mut self) {
        let n = self.particles.len();
        let max_iterations = self.setup.max_iterations();
        let Self {
            setup,
            particles,
            charged_pv,
            stats,
            values,
            ..
        } = &mut *self;
        let particles: &[Particle] = particles;
        let charged_pv: &[Particle] = charged_pv;
        stats.iter_mut().for_each(RegionStats::reset);
        values.clear();
        values.reserve(n * max_iterations);

        let regions = setup.regions();
        for iteration in 0..max_iterations {
            for particle in particles.iter() {
                let own = setup
                    .classify(particle.pt, particle.eta)
                    .and_then(|found| {
                        regions[found.region]
                            .config()
                            .iterations
                            .get(iteration)
                            .map(|config| (found.region, config))
                    });
                let Some((own_region, own_config)) = own else {
                    values.push(MISSING_ALPHA);
                    continue;
                };
                let own_value = evaluate(own_config, particle, particles, charged_pv);
                values.push(own_value);
                if !own_value.is_finite() {
                    tracing::debug!(
                        value = own_value,
                        pt = particle.pt,
                        eta = particle.eta,
                        iteration,
                        "non-finite alpha skipped in statistics"
                    );
                    continue;
                }
                // every region's statistics see every particle, evaluated under that region's metric
                for (region_idx, region) in regions.iter().enumerate() {
                    let Some(config) = region.config().iterations.get(iteration) else {
                        continue;
                    };
                    let value = if region_idx == own_region {
                        own_value
                    } else {
                        evaluate(config, particle, particles, charged_pv)
                    };
                    stats[region_idx].add(region.config(), iteration, particle, value);
                }
            }
            for (region, region_stats) in regions.iter().zip(stats.iter_mut()) {
                region_stats.finalize(region.config(), iteration);
            }
        }
        self.state = EngineState::StatsComputed;
    }

    fn raw_alphas(&self, iteration: usize) -> Vec<f64> {
        let mut raw = Vec::with_capacity(self.setup.regions().len() * self.particles.len());
        for region in self.setup.regions() {
            let Some(config) = region.config().iterations.get(iteration) else {
                raw.extend(std::iter::repeat(MISSING_ALPHA).take(self.particles.len()));
                continue;
            };
            for particle in &self.particles {
                let value = evaluate(config, particle, &self.particles, &self.charged_pv);
                if !value.is_finite() {
                    tracing::debug!(
                        value,
                        pt = particle.pt,
                        eta = particle.eta,
                        region = %region.config().name,
                        "non-finite raw alpha"
                    );
                }
                raw.push(value);
            }
        }
        raw
    }

    fn compute_particle_weights(&mut self, raw_alphas: Vec<f64>) {
        let n = self.particles.len();
        let config = self.setup.config();
        let mut weights = Vec::with_capacity(n);
        let mut medians = Vec::with_capacity(n);
        let mut rmss = Vec::with_capacity(n);
        let mut particle_values = Vec::with_capacity(self.setup.max_iterations());

        for (idx, particle) in self.particles.iter().enumerate() {
            let Some(found) = self.setup.classify(particle.pt, particle.eta) else {
                weights.push(0.0);
                medians.push(UNCLASSIFIED_DIAGNOSTIC);
                rmss.push(UNCLASSIFIED_DIAGNOSTIC);
                continue;
            };
            let region = &self.setup.regions()[found.region];
            let region_stats = &self.stats[found.region];
            let median = region_stats.median(0, found.eta_bin);
            let rms = region_stats.rms(0, found.eta_bin);

            let chi2 = if config.use_exp && !particle.is_neutral_type() {
                chi2_from_dz(particle.dz)
            } else {
                0.0
            };

            let iterations = &region.config().iterations;
            particle_values.clear();
            particle_values.extend((0..iterations.len()).map(|k| self.values[n * k + idx]));
            let ctx = ScoreContext {
                iterations,
                stats: region_stats,
                eta_bin: found.eta_bin,
            };
            let raw_weight = region.combiner().combine(&ctx, &particle_values, chi2);
            let weight = apply_overrides(config, particle, raw_weight, self.neutral_pt(found));

            weights.push(weight);
            medians.push(median);
            rmss.push(rms);
        }

        self.weights = weights;
        self.diagnostics = config.diagnostics.then(|| Diagnostics {
            alphas: self.values.clone(),
            raw_alphas,
            alpha_median: medians,
            alpha_rms: rmss,
            n_algos: self.setup.regions().len(),
        });
        self.state = EngineState::WeightsComputed;
    }

    fn neutral_pt(&self, found: RegionMatch) -> f64 {
        self.setup.regions()[found.region]
            .eta_bin(found.eta_bin)
            .map_or(0.0, |bin| bin.neutral_pt(self.npv))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Shared setup.
    pub fn setup(&self) -> &Arc<PuppiSetup> {
        &self.setup
    }

    /// Particles of the loaded event.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Weights from the last [`compute_weights`](Self::compute_weights) call.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Diagnostic arrays, present only when diagnostics are configured.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        self.diagnostics.as_ref()
    }

    /// Finalised statistics of region `region`.
    pub fn region_stats(&self, region: usize) -> Option<&RegionStats> {
        self.stats.get(region)
    }

    /// Number of configured regions.
    pub fn region_count(&self) -> usize {
        self.setup.regions().len()
    }

    /// Number of statistics passes per event.
    pub fn max_iterations(&self) -> usize {
        self.setup.max_iterations()
    }
}

fn evaluate(
    config: &IterationConfig,
    particle: &Particle,
    particles: &[Particle],
    charged_pv: &[Particle],
) -> f64 {
    let neighbours = if config.use_charged {
        charged_pv
    } else {
        particles
    };
    alpha(config.metric, particle, neighbours, config.cone)
}

/// Applies the category, threshold and protection rules in their fixed order.
pub fn apply_overrides(
    config: &PuppiConfig,
    particle: &Particle,
    raw_weight: f64,
    neutral_pt: f64,
) -> f64 {
    let mut weight = raw_weight;
    match particle.category {
        Category::LeptonExcluded => weight = 1.0,
        Category::AssociatedToPv if config.apply_chs => weight = 1.0,
        Category::AssociatedToPu if config.apply_chs => weight = 0.0,
        _ => {}
    }
    if !weight.is_finite() {
        tracing::debug!(
            weight,
            pt = particle.pt,
            eta = particle.eta,
            category = %particle.category,
            "non-finite weight reset to zero"
        );
        weight = 0.0;
    }
    let is_neutral = particle.category == Category::Neutral;
    if weight * particle.pt < neutral_pt && is_neutral {
        weight = 0.0;
    }
    if config.pt_max_photons > 0.0
        && particle.is_photon()
        && particle.eta.abs() < config.eta_max_photons
        && particle.pt > config.pt_max_photons
    {
        weight = 1.0;
    } else if config.pt_max_neutrals > 0.0 && is_neutral {
        let ramp = (particle.pt - config.pt_max_neutrals_start_slope)
            / (config.pt_max_neutrals - config.pt_max_neutrals_start_slope);
        weight = if ramp < weight {
            weight
        } else if ramp > 1.0 {
            1.0
        } else {
            ramp
        };
    }
    if weight < config.min_weight {
        weight = 0.0;
    }
    if config.invert {
        weight = 1.0 - weight;
    }
    weight
}
