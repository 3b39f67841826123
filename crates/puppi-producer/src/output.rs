//! Weighted four-momenta, packed-candidate clones and reuse of previously stored weights.

use puppi_algo::PuppiConfig;
use puppi_core::{ErrorInfo, FourMomentum, PuppiError, PDG_PHOTON};

use crate::candidate::{InputCandidate, PackedCandidate};

fn check_aligned(candidates: &[InputCandidate], weights: &[f64]) -> Result<(), PuppiError> {
    if candidates.len() != weights.len() {
        return Err(PuppiError::Input(
            ErrorInfo::new("length-mismatch", "weights are not aligned with candidates")
                .with_context("candidates", candidates.len())
                .with_context("weights", weights.len()),
        ));
    }
    Ok(())
}

/// Scales each candidate's four-momentum by its weight.
pub fn weighted_p4s(
    candidates: &[InputCandidate],
    weights: &[f64],
) -> Result<Vec<FourMomentum>, PuppiError> {
    check_aligned(candidates, weights)?;
    Ok(candidates
        .iter()
        .zip(weights)
        .map(|(candidate, weight)| candidate.kinematics().p4() * *weight)
        .collect())
}

fn not_packed(idx: usize, message: &str) -> PuppiError {
    PuppiError::Input(ErrorInfo::new("not-packed", message).with_context("index", idx))
}

/// Copies of the packed input with kinematics scaled by their weights.
///
/// With `store` set, each weight is also written into the clone's stored
/// weight: `puppi_weight_no_lep` when `no_lep` is set, `puppi_weight` otherwise.
/// Fails on the first candidate that is not packed.
pub fn clone_packed(
    candidates: &[InputCandidate],
    weights: &[f64],
    store: bool,
    no_lep: bool,
) -> Result<Vec<PackedCandidate>, PuppiError> {
    check_aligned(candidates, weights)?;
    candidates
        .iter()
        .zip(weights)
        .enumerate()
        .map(|(idx, (candidate, weight))| {
            let mut clone = *candidate
                .as_packed()
                .ok_or_else(|| not_packed(idx, "cloning needs packed candidates"))?;
            clone.kinematics = clone.kinematics.scaled(*weight);
            if store && no_lep {
                clone.puppi_weight_no_lep = *weight;
            } else if store {
                clone.puppi_weight = *weight;
            }
            Ok(clone)
        })
        .collect()
}

/// Weights already stored on packed candidates, with high-pt photon protection.
///
/// Fails on the first candidate that is not packed.
pub fn existing_weights(
    config: &PuppiConfig,
    no_lep: bool,
    candidates: &[InputCandidate],
) -> Result<Vec<f64>, PuppiError> {
    candidates
        .iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let packed = candidate
                .as_packed()
                .ok_or_else(|| not_packed(idx, "stored weights need packed candidates"))?;
            let kinematics = &packed.kinematics;
            let photon_protected = config.pt_max_photons > 0.0
                && kinematics.pdg_id == PDG_PHOTON
                && kinematics.eta.abs() < config.eta_max_photons
                && kinematics.pt > config.pt_max_photons;
            Ok(if photon_protected {
                1.0
            } else if no_lep {
                packed.puppi_weight_no_lep
            } else {
                packed.puppi_weight
            })
        })
        .collect()
}
