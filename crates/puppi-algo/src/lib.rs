#![deny(missing_docs)]
#![doc = "PUPPI per-particle pileup weights: shape variables, per-region median/RMS statistics, chi-square combination and the ordered override policy."]

/// Chi-square helpers and the impact-parameter penalty.
pub mod chi2;
/// Combination strategies.
pub mod combine;
/// Serde configuration and validation.
pub mod config;
/// Per-event orchestration.
pub mod engine;
/// Shape variables.
pub mod metric;
/// Compiled region set and classifier.
pub mod region;
/// Per-event median/RMS statistics.
pub mod stats;

pub use combine::{ChiSquareCombiner, ScoreContext, WeightCombiner};
pub use config::{Combination, EtaBinConfig, IterationConfig, PuppiConfig, RegionConfig};
pub use engine::{
    apply_overrides, Diagnostics, EngineState, PuppiEngine, MISSING_ALPHA,
    UNCLASSIFIED_DIAGNOSTIC,
};
pub use metric::{alpha, Metric, SELF_EXCLUSION_DR2};
pub use region::{AlgoRegion, PuppiSetup, RegionMatch};
pub use stats::{IterationStats, RegionStats};
