use std::error::Error;
use std::f64::consts::PI;

use clap::Args;
use puppi_core::serde::to_canonical_json_bytes;
use puppi_producer::{
    EventProducer, Event, FromPv, InputCandidate, Kinematics, PackedCandidate, Vertex,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::load_config;

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Seed for the synthetic event.
    #[arg(long, default_value_t = 2024)]
    pub seed: u64,
    /// Number of candidates in the event.
    #[arg(long, default_value_t = 400)]
    pub particles: usize,
    /// Optional YAML configuration.
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    provenance: DemoProvenance,
    config_hash: String,
    npv: usize,
    summary: Vec<ClassSummary>,
}

#[derive(Debug, Serialize)]
struct DemoProvenance {
    seed: u64,
    particles: usize,
}

#[derive(Debug, Serialize)]
struct ClassSummary {
    class: String,
    count: usize,
    mean_weight: f64,
    raw_pt: f64,
    weighted_pt: f64,
}

/// Seeded event of `particles` candidates: a hard jet near the origin on top of uniform pileup.
pub fn synthetic_event(seed: u64, particles: usize) -> Event {
    let mut rng = StdRng::seed_from_u64(seed);
    let n_jet = (particles / 10).min(20);
    let mut candidates = Vec::with_capacity(particles);
    for idx in 0..particles {
        let is_jet = idx < n_jet;
        let (pt, eta, phi) = if is_jet {
            (
                rng.gen_range(2.0..40.0),
                rng.gen_range(-0.3..0.3),
                rng.gen_range(-0.3..0.3),
            )
        } else {
            (
                rng.gen_range(0.3..3.0),
                rng.gen_range(-4.7..4.7),
                rng.gen_range(-PI..PI),
            )
        };
        let charged = idx % 3 != 0;
        let (charge, pdg_id) = match (charged, idx % 2 == 0) {
            (true, true) => (1, 211),
            (true, false) => (-1, -211),
            (false, true) => (0, 22),
            (false, false) => (0, 130),
        };
        let from_pv = match (is_jet, charged) {
            (true, true) => FromPv::PvUsedInFit,
            (false, true) => FromPv::NoPv,
            (_, false) => FromPv::PvLoose,
        };
        let dz = if !charged {
            0.0
        } else if is_jet {
            rng.gen_range(-0.05..0.05)
        } else {
            rng.gen_range(-8.0..8.0)
        };
        candidates.push(InputCandidate::Packed(PackedCandidate {
            kinematics: Kinematics {
                pt,
                eta,
                phi,
                mass: 0.0,
                charge,
                pdg_id,
            },
            from_pv,
            dz,
            dxy: 0.0,
            has_vertex: charged,
            puppi_weight: 0.0,
            puppi_weight_no_lep: 0.0,
        }));
    }
    let n_vertices = 1 + particles / 20;
    let vertices = (0..n_vertices)
        .map(|_| Vertex {
            z: rng.gen_range(-15.0..15.0),
            ndof: rng.gen_range(2.0..40.0),
            is_fake: false,
        })
        .collect();
    Event {
        candidates,
        vertices,
    }
}

pub fn run(args: &DemoArgs) -> Result<(), Box<dyn Error>> {
    let report = build_demo_report(args)?;
    let json = to_canonical_json_bytes(&report).map_err(|err| Box::new(err) as Box<dyn Error>)?;
    println!("{}", String::from_utf8(json)?);
    Ok(())
}

fn build_demo_report(args: &DemoArgs) -> Result<DemoReport, Box<dyn Error>> {
    let config = load_config(args.config.as_deref())?;
    let mut producer = EventProducer::new(&config).map_err(|err| Box::new(err) as Box<dyn Error>)?;
    let event = synthetic_event(args.seed, args.particles);
    let output = producer
        .produce(&event)
        .map_err(|err| Box::new(err) as Box<dyn Error>)?;

    let mut summary: Vec<ClassSummary> = ["charged", "neutral"]
        .iter()
        .map(|class| ClassSummary {
            class: class.to_string(),
            count: 0,
            mean_weight: 0.0,
            raw_pt: 0.0,
            weighted_pt: 0.0,
        })
        .collect();
    for ((candidate, weight), p4) in event.candidates.iter().zip(&output.weights).zip(&output.p4s) {
        let kinematics = candidate.kinematics();
        let class = &mut summary[usize::from(kinematics.charge == 0)];
        class.count += 1;
        class.mean_weight += weight;
        class.raw_pt += kinematics.pt;
        class.weighted_pt += p4.pt();
    }
    for class in &mut summary {
        if class.count > 0 {
            class.mean_weight /= class.count as f64;
        }
    }
    Ok(DemoReport {
        provenance: DemoProvenance {
            seed: args.seed,
            particles: args.particles,
        },
        config_hash: producer.setup().config_hash().to_string(),
        npv: output.npv,
        summary,
    })
}
