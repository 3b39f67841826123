//! Per-event particle record consumed by the weighting engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, PuppiError};

/// Sentinel used for undefined impact parameters.
pub const UNDEFINED_IMPACT_PARAMETER: f64 = -9999.0;

/// PDG code of the photon.
pub const PDG_PHOTON: i32 = 22;

/// PDG code of the long-lived neutral kaon, used as the neutral hadron code.
pub const PDG_NEUTRAL_HADRON: i32 = 130;

/// Vertex-association category assigned once at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Neutral, or charged without a usable vertex association.
    Neutral,
    /// Charged and associated with the primary vertex.
    AssociatedToPv,
    /// Charged and associated with a pileup vertex.
    AssociatedToPu,
    /// Lepton excluded from the pileup treatment.
    LeptonExcluded,
}

impl Category {
    /// Numeric code used by diagnostics and interchange formats.
    pub fn code(self) -> i32 {
        match self {
            Category::Neutral => 0,
            Category::AssociatedToPv => 1,
            Category::AssociatedToPu => 2,
            Category::LeptonExcluded => 3,
        }
    }
}

impl TryFrom<i32> for Category {
    type Error = PuppiError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Category::Neutral),
            1 => Ok(Category::AssociatedToPv),
            2 => Ok(Category::AssociatedToPu),
            3 => Ok(Category::LeptonExcluded),
            other => Err(PuppiError::Input(
                ErrorInfo::new("unknown-category", "category code is not in 0..=3")
                    .with_context("code", other),
            )),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Neutral => "neutral",
            Category::AssociatedToPv => "pv",
            Category::AssociatedToPu => "pu",
            Category::LeptonExcluded => "lepton",
        };
        f.write_str(label)
    }
}

/// Reconstructed particle as seen by the weighting engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth in `(-π, π]`.
    pub phi: f64,
    /// Mass.
    #[serde(default)]
    pub mass: f64,
    /// Electric charge.
    #[serde(default)]
    pub charge: i32,
    /// Particle-type code.
    #[serde(default)]
    pub pdg_id: i32,
    /// Longitudinal impact parameter with respect to the chosen vertex.
    #[serde(default = "undefined_impact_parameter")]
    pub dz: f64,
    /// Transverse impact parameter.
    #[serde(default = "undefined_impact_parameter")]
    pub d0: f64,
    /// Vertex-association category.
    pub category: Category,
}

fn undefined_impact_parameter() -> f64 {
    UNDEFINED_IMPACT_PARAMETER
}

impl Particle {
    /// Creates a particle with undefined impact parameters and no type code.
    pub fn new(pt: f64, eta: f64, phi: f64, category: Category) -> Self {
        Self {
            pt,
            eta,
            phi,
            mass: 0.0,
            charge: 0,
            pdg_id: 0,
            dz: UNDEFINED_IMPACT_PARAMETER,
            d0: UNDEFINED_IMPACT_PARAMETER,
            category,
        }
    }

    /// Sets the particle-type code.
    pub fn with_pdg_id(mut self, pdg_id: i32) -> Self {
        self.pdg_id = pdg_id;
        self
    }

    /// Sets the charge.
    pub fn with_charge(mut self, charge: i32) -> Self {
        self.charge = charge;
        self
    }

    /// Sets the longitudinal impact parameter.
    pub fn with_dz(mut self, dz: f64) -> Self {
        self.dz = dz;
        self
    }

    /// Returns true for photons (signed code, antiparticles never match).
    pub fn is_photon(&self) -> bool {
        self.pdg_id == PDG_PHOTON
    }

    /// Returns true for photons and neutral hadrons regardless of sign.
    pub fn is_neutral_type(&self) -> bool {
        matches!(self.pdg_id.abs(), PDG_PHOTON | PDG_NEUTRAL_HADRON)
    }
}
