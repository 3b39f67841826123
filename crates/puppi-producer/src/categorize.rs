//! Vertex-association categories for incoming candidates.

use puppi_core::{Category, Particle, UNDEFINED_IMPACT_PARAMETER};
use serde::{Deserialize, Serialize};

use crate::candidate::{FromPv, InputCandidate, Kinematics};

/// Thresholds deciding how loosely associated charged tracks are categorised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Exclude charged leptons from the weighting.
    #[serde(default)]
    pub puppi_no_lep: bool,
    /// Map loose association to pileup and tight to primary vertex.
    #[serde(default)]
    pub use_from_pv_loose_tight: bool,
    /// Decide loosely associated tracks on `|dz|`.
    #[serde(default = "default_true")]
    pub use_dz_cut: bool,
    /// `|dz|` below which a loose track counts as primary vertex.
    #[serde(default = "default_dz_cut")]
    pub dz_cut: f64,
    /// `|eta|` from which the dz cut applies.
    #[serde(default)]
    pub eta_min_use_dz: f64,
    /// Loose tracks above this pt count as primary vertex (disabled when not positive).
    #[serde(default = "default_pt_max_charged")]
    pub pt_max_charged: f64,
    /// Loose tracks beyond this `|eta|` count as primary vertex.
    #[serde(default = "default_eta_max_charged")]
    pub eta_max_charged: f64,
}

fn default_true() -> bool {
    true
}

fn default_dz_cut() -> f64 {
    0.3
}

fn default_pt_max_charged() -> f64 {
    -1.0
}

fn default_eta_max_charged() -> f64 {
    99999.0
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            puppi_no_lep: false,
            use_from_pv_loose_tight: false,
            use_dz_cut: true,
            dz_cut: default_dz_cut(),
            eta_min_use_dz: 0.0,
            pt_max_charged: default_pt_max_charged(),
            eta_max_charged: default_eta_max_charged(),
        }
    }
}

/// Category of a candidate given its charge, type and vertex association.
pub fn categorize(config: &IngestConfig, kinematics: &Kinematics, from_pv: FromPv, dz: f64) -> Category {
    if kinematics.charge == 0 {
        return Category::Neutral;
    }
    if config.puppi_no_lep && kinematics.is_lepton() {
        return Category::LeptonExcluded;
    }
    match from_pv {
        FromPv::NoPv => Category::AssociatedToPu,
        FromPv::PvUsedInFit => Category::AssociatedToPv,
        FromPv::PvLoose | FromPv::PvTight => {
            let abs_eta = kinematics.eta.abs();
            if config.pt_max_charged > 0.0 && kinematics.pt > config.pt_max_charged {
                Category::AssociatedToPv
            } else if abs_eta > config.eta_max_charged {
                Category::AssociatedToPv
            } else if config.use_dz_cut && abs_eta >= config.eta_min_use_dz {
                if dz.abs() < config.dz_cut {
                    Category::AssociatedToPv
                } else {
                    Category::AssociatedToPu
                }
            } else if config.use_from_pv_loose_tight {
                if from_pv == FromPv::PvTight {
                    Category::AssociatedToPv
                } else {
                    Category::AssociatedToPu
                }
            } else {
                Category::Neutral
            }
        }
    }
}

/// Resolves every candidate into the uniform particle record, index-aligned with the input.
pub fn ingest(config: &IngestConfig, candidates: &[InputCandidate]) -> Vec<Particle> {
    candidates
        .iter()
        .map(|candidate| {
            let (category, dz, d0) = match candidate {
                InputCandidate::Packed(packed) if packed.has_vertex => (
                    categorize(config, &packed.kinematics, packed.from_pv, packed.dz),
                    packed.dz,
                    packed.dxy,
                ),
                InputCandidate::Packed(_) => (
                    Category::Neutral,
                    UNDEFINED_IMPACT_PARAMETER,
                    UNDEFINED_IMPACT_PARAMETER,
                ),
                InputCandidate::Reconstructed(reco) => {
                    let (dz, d0) = reco.impact_parameters();
                    (categorize(config, &reco.kinematics, reco.from_pv(), dz), dz, d0)
                }
            };
            let kinematics = candidate.kinematics();
            Particle {
                pt: kinematics.pt,
                eta: kinematics.eta,
                phi: kinematics.phi,
                mass: kinematics.mass,
                charge: kinematics.charge,
                pdg_id: kinematics.pdg_id,
                dz,
                d0,
                category,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kin(pt: f64, eta: f64, charge: i32, pdg_id: i32) -> Kinematics {
        Kinematics {
            pt,
            eta,
            phi: 0.0,
            mass: 0.0,
            charge,
            pdg_id,
        }
    }

    #[test]
    fn neutral_and_lepton_come_first() {
        let config = IngestConfig {
            puppi_no_lep: true,
            ..IngestConfig::default()
        };
        assert_eq!(categorize(&config, &kin(1.0, 0.0, 0, 22), FromPv::NoPv, 0.0), Category::Neutral);
        assert_eq!(
            categorize(&config, &kin(1.0, 0.0, -1, 13), FromPv::NoPv, 0.0),
            Category::LeptonExcluded
        );
        assert_eq!(
            categorize(&IngestConfig::default(), &kin(1.0, 0.0, -1, 13), FromPv::NoPv, 0.0),
            Category::AssociatedToPu
        );
    }

    #[test]
    fn loose_tracks_follow_cut_order() {
        let config = IngestConfig {
            pt_max_charged: 20.0,
            eta_max_charged: 2.5,
            ..IngestConfig::default()
        };
        let loose = FromPv::PvLoose;
        assert_eq!(categorize(&config, &kin(30.0, 0.0, 1, 211), loose, 5.0), Category::AssociatedToPv);
        assert_eq!(categorize(&config, &kin(5.0, 2.7, 1, 211), loose, 5.0), Category::AssociatedToPv);
        assert_eq!(categorize(&config, &kin(5.0, 1.0, 1, 211), loose, 0.1), Category::AssociatedToPv);
        assert_eq!(categorize(&config, &kin(5.0, 1.0, 1, 211), loose, -0.3), Category::AssociatedToPu);
    }

    #[test]
    fn loose_tight_mapping_and_fallback() {
        let config = IngestConfig {
            use_dz_cut: false,
            use_from_pv_loose_tight: true,
            ..IngestConfig::default()
        };
        let track = kin(5.0, 1.0, 1, 211);
        assert_eq!(categorize(&config, &track, FromPv::PvLoose, 0.0), Category::AssociatedToPu);
        assert_eq!(categorize(&config, &track, FromPv::PvTight, 9.0), Category::AssociatedToPv);
        let plain = IngestConfig {
            use_dz_cut: false,
            ..IngestConfig::default()
        };
        assert_eq!(categorize(&plain, &track, FromPv::PvTight, 0.0), Category::Neutral);
    }

    #[test]
    fn dz_cut_starts_at_eta_min() {
        let config = IngestConfig {
            eta_min_use_dz: 2.0,
            ..IngestConfig::default()
        };
        assert_eq!(
            categorize(&config, &kin(5.0, 1.0, 1, 211), FromPv::PvTight, 5.0),
            Category::Neutral
        );
        assert_eq!(
            categorize(&config, &kin(5.0, -2.0, 1, 211), FromPv::PvTight, 5.0),
            Category::AssociatedToPu
        );
    }
}
