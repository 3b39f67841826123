//! Input candidate representations accepted by the producer.

use puppi_core::{FourMomentum, UNDEFINED_IMPACT_PARAMETER};
use serde::{Deserialize, Serialize};

/// Kinematics and identity shared by every candidate representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
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
}

impl Kinematics {
    /// Cartesian four-momentum.
    pub fn p4(&self) -> FourMomentum {
        FourMomentum::from_pt_eta_phi_m(self.pt, self.eta, self.phi, self.mass)
    }

    /// Same direction with pt and mass scaled by `weight`.
    pub fn scaled(&self, weight: f64) -> Self {
        Self {
            pt: self.pt * weight,
            mass: self.mass * weight,
            ..*self
        }
    }

    /// Electron or muon.
    pub fn is_lepton(&self) -> bool {
        matches!(self.pdg_id.abs(), 11 | 13)
    }
}

/// Vertex-association quality of a charged track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FromPv {
    /// Associated to a pileup vertex.
    NoPv,
    /// Loosely compatible with the primary vertex.
    PvLoose,
    /// Tightly compatible with the primary vertex.
    PvTight,
    /// Used in the primary vertex fit.
    PvUsedInFit,
}

/// Compact candidate carrying its own association summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackedCandidate {
    /// Kinematics.
    #[serde(flatten)]
    pub kinematics: Kinematics,
    /// Association with the primary vertex.
    pub from_pv: FromPv,
    /// Longitudinal impact parameter.
    #[serde(default = "undefined_impact_parameter")]
    pub dz: f64,
    /// Transverse impact parameter.
    #[serde(default = "undefined_impact_parameter")]
    pub dxy: f64,
    /// Whether the candidate references a vertex at all.
    #[serde(default = "default_true")]
    pub has_vertex: bool,
    /// Stored weight from an earlier weighting pass.
    #[serde(default)]
    pub puppi_weight: f64,
    /// Stored weight from an earlier pass that excluded leptons.
    #[serde(default)]
    pub puppi_weight_no_lep: f64,
}

/// Track summary of a fully reconstructed candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Longitudinal impact parameter with respect to each vertex, in vertex order.
    pub dz: Vec<f64>,
    /// Transverse impact parameter.
    #[serde(default = "undefined_impact_parameter")]
    pub d0: f64,
    /// Index of the vertex whose fit used this track.
    #[serde(default)]
    pub associated_vertex: Option<usize>,
}

/// Full candidate whose association is derived from its track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoCandidate {
    /// Kinematics.
    #[serde(flatten)]
    pub kinematics: Kinematics,
    /// Track, absent for neutral candidates.
    #[serde(default)]
    pub track: Option<TrackInfo>,
}

impl RecoCandidate {
    /// Association summary mirroring the one packed candidates carry.
    ///
    /// A track used in a vertex fit is `PvUsedInFit` for vertex 0 and `NoPv`
    /// otherwise. An unassociated track is `PvTight` when vertex 0 is the
    /// closest in `|dz|`, `PvLoose` otherwise.
    pub fn from_pv(&self) -> FromPv {
        let Some(track) = &self.track else {
            return FromPv::PvLoose;
        };
        match track.associated_vertex {
            Some(0) => FromPv::PvUsedInFit,
            Some(_) => FromPv::NoPv,
            None => {
                let mut closest = None;
                let mut best = 9999.0;
                for (idx, dz) in track.dz.iter().enumerate() {
                    if dz.abs() < best {
                        best = dz.abs();
                        closest = Some(idx);
                    }
                }
                if closest == Some(0) {
                    FromPv::PvTight
                } else {
                    FromPv::PvLoose
                }
            }
        }
    }

    /// Impact parameters with respect to vertex 0, sentinel when unknown.
    pub fn impact_parameters(&self) -> (f64, f64) {
        match &self.track {
            Some(track) => match track.dz.first() {
                Some(dz) => (*dz, track.d0),
                None => (UNDEFINED_IMPACT_PARAMETER, UNDEFINED_IMPACT_PARAMETER),
            },
            None => (UNDEFINED_IMPACT_PARAMETER, UNDEFINED_IMPACT_PARAMETER),
        }
    }
}

/// Closed set of candidate representations, resolved once at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputCandidate {
    /// Compact candidate.
    Packed(PackedCandidate),
    /// Fully reconstructed candidate.
    Reconstructed(RecoCandidate),
}

impl InputCandidate {
    /// Kinematics of either representation.
    pub fn kinematics(&self) -> &Kinematics {
        match self {
            InputCandidate::Packed(packed) => &packed.kinematics,
            InputCandidate::Reconstructed(reco) => &reco.kinematics,
        }
    }

    /// Packed view, if this is a packed candidate.
    pub fn as_packed(&self) -> Option<&PackedCandidate> {
        match self {
            InputCandidate::Packed(packed) => Some(packed),
            InputCandidate::Reconstructed(_) => None,
        }
    }
}

fn undefined_impact_parameter() -> f64 {
    UNDEFINED_IMPACT_PARAMETER
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reco(track: Option<TrackInfo>) -> RecoCandidate {
        RecoCandidate {
            kinematics: Kinematics {
                pt: 3.0,
                eta: 0.1,
                phi: 0.2,
                mass: 0.0,
                charge: -1,
                pdg_id: -211,
            },
            track,
        }
    }

    fn track(dz: &[f64], associated_vertex: Option<usize>) -> Option<TrackInfo> {
        Some(TrackInfo {
            dz: dz.to_vec(),
            d0: 0.01,
            associated_vertex,
        })
    }

    #[test]
    fn association_from_fit() {
        assert_eq!(reco(track(&[0.1, 2.0], Some(0))).from_pv(), FromPv::PvUsedInFit);
        assert_eq!(reco(track(&[0.1, 2.0], Some(1))).from_pv(), FromPv::NoPv);
    }

    #[test]
    fn unassociated_tracks_use_closest_vertex() {
        assert_eq!(reco(track(&[0.1, 2.0], None)).from_pv(), FromPv::PvTight);
        assert_eq!(reco(track(&[3.0, -0.5], None)).from_pv(), FromPv::PvLoose);
        // ties go to the earlier vertex
        assert_eq!(reco(track(&[0.5, -0.5], None)).from_pv(), FromPv::PvTight);
        assert_eq!(reco(track(&[], None)).from_pv(), FromPv::PvLoose);
        assert_eq!(reco(None).from_pv(), FromPv::PvLoose);
    }

    #[test]
    fn impact_parameters_use_first_vertex() {
        assert_eq!(reco(track(&[0.4, 2.0], None)).impact_parameters(), (0.4, 0.01));
        assert_eq!(
            reco(None).impact_parameters(),
            (UNDEFINED_IMPACT_PARAMETER, UNDEFINED_IMPACT_PARAMETER)
        );
    }

    #[test]
    fn tagged_json_layout() {
        let json = r#"{"kind":"packed","pt":2.0,"eta":0.5,"phi":1.0,"charge":1,"pdg_id":211,"from_pv":"pv_tight","dz":0.02}"#;
        let candidate: InputCandidate = serde_json::from_str(json).unwrap();
        let packed = candidate.as_packed().unwrap();
        assert_eq!(packed.from_pv, FromPv::PvTight);
        assert!(packed.has_vertex);
        assert_eq!(packed.dxy, UNDEFINED_IMPACT_PARAMETER);
        assert_eq!(candidate.kinematics().pdg_id, 211);
    }
}
