//! Angular distances in (pseudorapidity, azimuth) space and four-momenta.

use std::f64::consts::PI;
use std::ops::Mul;

use serde::{Deserialize, Serialize};

/// Wraps an azimuthal angle into `(-π, π]`.
pub fn reduce_phi(phi: f64) -> f64 {
    let reduced = if phi.abs() <= PI {
        phi
    } else {
        phi - (phi / (2.0 * PI)).round() * 2.0 * PI
    };
    if reduced <= -PI {
        reduced + 2.0 * PI
    } else {
        reduced
    }
}

/// Azimuthal separation wrapped into `(-π, π]`.
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    reduce_phi(phi1 - phi2)
}

/// Squared angular distance `Δη² + Δφ²` with the azimuth wrapped.
pub fn delta_r2(eta1: f64, phi1: f64, eta2: f64, phi2: f64) -> f64 {
    let deta = eta1 - eta2;
    let dphi = delta_phi(phi1, phi2);
    deta * deta + dphi * dphi
}

/// Cartesian four-momentum `(px, py, pz, E)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FourMomentum {
    /// Momentum along x.
    pub px: f64,
    /// Momentum along y.
    pub py: f64,
    /// Momentum along the beam axis.
    pub pz: f64,
    /// Energy.
    pub e: f64,
}

impl FourMomentum {
    /// Builds a four-momentum from transverse momentum, pseudorapidity, azimuth and mass.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let p2 = px * px + py * py + pz * pz;
        Self {
            px,
            py,
            pz,
            e: (p2 + mass * mass).sqrt(),
        }
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }
}

impl Mul<f64> for FourMomentum {
    type Output = FourMomentum;

    fn mul(self, rhs: f64) -> FourMomentum {
        FourMomentum {
            px: self.px * rhs,
            py: self.py * rhs,
            pz: self.pz * rhs,
            e: self.e * rhs,
        }
    }
}
