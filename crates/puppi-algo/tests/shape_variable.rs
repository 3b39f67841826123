use puppi_algo::{alpha, Metric};
use puppi_core::{Category, Particle};

fn neutral(pt: f64, eta: f64, phi: f64) -> Particle {
    Particle::new(pt, eta, phi, Category::Neutral)
}

#[test]
fn identity_metric_is_constant() {
    let centre = neutral(5.0, 0.0, 0.0);
    let crowd: Vec<_> = (0..5).map(|i| neutral(1.0, 0.05 * i as f64, 0.1)).collect();
    assert_eq!(alpha(Metric::Identity, &centre, &crowd, 0.4), 1.0);
    assert_eq!(alpha(Metric::Identity, &centre, &[], 0.4), 1.0);
}

#[test]
fn isolated_particle_gives_zero_or_seed() {
    let centre = neutral(7.0, 1.0, 1.0);
    for metric in [
        Metric::LogPtOverDr2,
        Metric::InverseDr2,
        Metric::LogInverseDr2,
        Metric::PtSum,
        Metric::LogPt2OverDr2,
    ] {
        assert_eq!(alpha(metric, &centre, &[centre], 0.4), 0.0, "{metric:?}");
    }
    assert_eq!(alpha(Metric::SeededPtSum, &centre, &[centre], 0.4), 7.0);
}

#[test]
fn pt_sum_half_cone_contributes_exact_pt() {
    // dr2 = cone^2 / 2 with cone = 0.5
    let centre = neutral(1.0, 0.0, 0.0);
    let neighbour = neutral(3.25, 0.25, 0.25);
    let value = alpha(Metric::PtSum, &centre, &[centre, neighbour], 0.5);
    assert_eq!(value, 3.25);
}

#[test]
fn neighbour_on_cone_edge_is_excluded() {
    // 0.375^2 + 0.5^2 == 0.625^2 exactly
    let centre = neutral(1.0, 0.0, 0.0);
    let edge = neutral(2.0, 0.375, 0.5);
    assert_eq!(alpha(Metric::PtSum, &centre, &[edge], 0.625), 0.0);
    let inside = neutral(2.0, 0.375, 0.4999);
    assert_eq!(alpha(Metric::PtSum, &centre, &[inside], 0.625), 2.0);
}

#[test]
fn coincident_neighbours_are_excluded() {
    let centre = neutral(1.0, 0.0, 0.0);
    let coincident = neutral(4.0, 0.005, 0.0);
    let near = neutral(4.0, 0.02, 0.0);
    assert_eq!(alpha(Metric::PtSum, &centre, &[coincident], 0.4), 0.0);
    assert_eq!(alpha(Metric::PtSum, &centre, &[near], 0.4), 4.0);
}

#[test]
fn leptons_never_contribute() {
    let centre = neutral(1.0, 0.0, 0.0);
    let lepton = Particle::new(10.0, 0.1, 0.0, Category::LeptonExcluded);
    assert_eq!(alpha(Metric::PtSum, &centre, &[lepton], 0.4), 0.0);
}

#[test]
fn azimuth_wraps_around() {
    let centre = neutral(1.0, 0.0, 3.1);
    let across = neutral(2.0, 0.0, -3.1);
    let value = alpha(Metric::InverseDr2, &centre, &[across], 0.4);
    let dphi = 2.0 * std::f64::consts::PI - 6.2;
    assert!((value - 1.0 / (dphi * dphi)).abs() < 1e-6);
}

#[test]
fn log_metrics_take_the_log_of_the_sum() {
    let centre = neutral(1.0, 0.0, 0.0);
    let a = neutral(2.0, 0.1, 0.0);
    let b = neutral(3.0, 0.0, 0.2);
    let sum: f64 = 4.0 / 0.010000000000000002 + 9.0 / 0.04000000000000001;
    let value = alpha(Metric::LogPt2OverDr2, &centre, &[a, b], 0.4);
    assert!((value - sum.ln()).abs() < 1e-9);
    let inverse = alpha(Metric::LogInverseDr2, &centre, &[a, b], 0.4);
    assert!((inverse - (1.0 / 0.010000000000000002 + 1.0 / 0.04000000000000001f64).ln()).abs() < 1e-9);
}
