#![allow(dead_code)]

use std::f64::consts::PI;
use std::sync::Arc;

use puppi_algo::{PuppiConfig, PuppiEngine, PuppiSetup};
use puppi_core::{Category, Particle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn engine(config: PuppiConfig) -> PuppiEngine {
    PuppiEngine::new(Arc::new(PuppiSetup::new(config).unwrap()))
}

/// Mixed event: a primary-vertex jet near (0, 0) on top of uniform pileup.
pub fn synthetic_event(seed: u64, n_pileup: usize) -> Vec<Particle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut particles = Vec::new();
    for idx in 0..12 {
        let category = if idx % 3 == 0 {
            Category::Neutral
        } else {
            Category::AssociatedToPv
        };
        let pdg = if category == Category::Neutral { 22 } else { 211 };
        particles.push(
            Particle::new(
                rng.gen_range(2.0..30.0),
                rng.gen_range(-0.3..0.3),
                rng.gen_range(-0.3..0.3),
                category,
            )
            .with_pdg_id(pdg)
            .with_charge(if pdg == 22 { 0 } else { 1 }),
        );
    }
    for idx in 0..n_pileup {
        let category = match idx % 3 {
            0 => Category::Neutral,
            _ => Category::AssociatedToPu,
        };
        particles.push(
            Particle::new(
                rng.gen_range(0.2..3.0),
                rng.gen_range(-4.5..4.5),
                rng.gen_range(-PI..PI),
                category,
            )
            .with_pdg_id(if category == Category::Neutral { 130 } else { -211 })
            .with_dz(rng.gen_range(-5.0..5.0)),
        );
    }
    particles
}
