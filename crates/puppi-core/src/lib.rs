#![deny(missing_docs)]
#![doc = "Particle records, angular kinematics and the shared error surface of the PUPPI pileup weighting engine."]

pub mod errors;
pub mod kinematics;
pub mod particle;
/// Canonical JSON/YAML serde and hashing helpers.
pub mod serde;

pub use errors::{ErrorInfo, PuppiError};
pub use kinematics::{delta_phi, delta_r2, reduce_phi, FourMomentum};
pub use particle::{
    Category, Particle, PDG_NEUTRAL_HADRON, PDG_PHOTON, UNDEFINED_IMPACT_PARAMETER,
};
