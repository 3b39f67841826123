//! Local shape variables ("alpha") summarising activity around a particle.

use puppi_core::{delta_r2, Category, ErrorInfo, Particle, PuppiError};
use serde::{Deserialize, Serialize};

/// Squared distance at or below which a neighbour is treated as the particle itself.
pub const SELF_EXCLUSION_DR2: f64 = 0.0001;

/// Aggregate computed over neighbours inside a cone, identified by its integer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Metric {
    /// Id -1: constant 1, no neighbour sum.
    Identity,
    /// Id 0: `ln Σ pt/ΔR²`.
    LogPtOverDr2,
    /// Id 1: reference pt plus `Σ pt`.
    SeededPtSum,
    /// Id 2: `Σ 1/ΔR²`.
    InverseDr2,
    /// Id 3: `ln Σ 1/ΔR²`.
    LogInverseDr2,
    /// Id 4: `Σ pt`.
    PtSum,
    /// Id 5: `ln Σ pt²/ΔR²`.
    LogPt2OverDr2,
}

impl Metric {
    /// Integer id used in configuration files.
    pub fn id(self) -> i32 {
        match self {
            Metric::Identity => -1,
            Metric::LogPtOverDr2 => 0,
            Metric::SeededPtSum => 1,
            Metric::InverseDr2 => 2,
            Metric::LogInverseDr2 => 3,
            Metric::PtSum => 4,
            Metric::LogPt2OverDr2 => 5,
        }
    }

    /// True for metrics whose non-zero sum is replaced by its natural logarithm.
    pub fn is_logarithmic(self) -> bool {
        matches!(
            self,
            Metric::LogPtOverDr2 | Metric::LogInverseDr2 | Metric::LogPt2OverDr2
        )
    }

    fn contribution(self, pt: f64, dr2: f64) -> f64 {
        match self {
            Metric::Identity => 0.0,
            Metric::LogPtOverDr2 => pt / dr2,
            Metric::SeededPtSum | Metric::PtSum => pt,
            Metric::InverseDr2 | Metric::LogInverseDr2 => 1.0 / dr2,
            Metric::LogPt2OverDr2 => pt * pt / dr2,
        }
    }
}

impl TryFrom<i32> for Metric {
    type Error = PuppiError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        match id {
            -1 => Ok(Metric::Identity),
            0 => Ok(Metric::LogPtOverDr2),
            1 => Ok(Metric::SeededPtSum),
            2 => Ok(Metric::InverseDr2),
            3 => Ok(Metric::LogInverseDr2),
            4 => Ok(Metric::PtSum),
            5 => Ok(Metric::LogPt2OverDr2),
            other => Err(PuppiError::Config(
                ErrorInfo::new("unknown-metric", "metric id must be in -1..=5")
                    .with_context("algo_id", other),
            )),
        }
    }
}

impl From<Metric> for i32 {
    fn from(metric: Metric) -> i32 {
        metric.id()
    }
}

/// Evaluates `metric` for `centre` against `neighbours` inside a cone of radius `cone`.
///
/// Lepton-excluded neighbours never contribute. A neighbour contributes only when
/// `SELF_EXCLUSION_DR2 < ΔR² < cone²`, so the centre itself (present in its own
/// neighbour list) is skipped. A zero sum is returned as zero even for the
/// logarithmic metrics; callers treat it as "no local activity".
pub fn alpha(metric: Metric, centre: &Particle, neighbours: &[Particle], cone: f64) -> f64 {
    if metric == Metric::Identity {
        return 1.0;
    }
    let cone2 = cone * cone;
    let mut sum = if metric == Metric::SeededPtSum {
        centre.pt
    } else {
        0.0
    };
    for part in neighbours {
        if part.category == Category::LeptonExcluded {
            continue;
        }
        // cheap rejection before the wrapped azimuth
        if (part.eta - centre.eta).abs() >= cone {
            continue;
        }
        let dr2 = delta_r2(part.eta, part.phi, centre.eta, centre.phi);
        if dr2 < cone2 && dr2 > SELF_EXCLUSION_DR2 {
            sum += metric.contribution(part.pt, dr2);
        }
    }
    if sum != 0.0 && metric.is_logarithmic() {
        sum.ln()
    } else {
        sum
    }
}
