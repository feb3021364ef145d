//! Integration tests for abd-bench.

use abd_bench::metrics::BenchmarkMetrics;
use abd_bench::runner::BenchmarkRunner;
use abd_bench::scenarios::{Scenario, ScenarioKind};
use abd_material::MaterialDatabase;
use abd_solver::Simulator;
use abd_types::BodyId;

// ─── Scenario Tests ───────────────────────────────────────────

#[test]
fn two_spheres_setup() {
    let s = Scenario::two_spheres();
    assert_eq!(s.kind, ScenarioKind::TwoSpheres);
    assert_eq!(s.bodies.len(), 3);
    assert!(s.bodies[0].is_fully_pinned());
    assert!(s.bodies[1..].iter().all(|b| b.pinned_dofs.is_empty()));
    assert!(s.config.validate().is_ok());
}

#[test]
fn sphere_pile_setup() {
    let s = Scenario::sphere_pile();
    assert_eq!(s.bodies.len(), 6);
    assert_eq!(
        s.vertex_count(),
        s.bodies.iter().map(|b| b.mesh.vertex_count()).sum::<usize>()
    );
}

#[test]
fn all_scenarios() {
    assert_eq!(ScenarioKind::all().len(), 3);
    for &kind in ScenarioKind::all() {
        assert_eq!(ScenarioKind::from_name(kind.name()), Some(kind));
        assert_eq!(Scenario::from_kind(kind).kind, kind);
    }
    assert_eq!(ScenarioKind::from_name("hanging_sheet"), None);
}

#[test]
fn material_skips_floor() {
    let db = MaterialDatabase::with_defaults();
    let steel = db.get("steel").unwrap();
    let s = Scenario::box_drop().with_material(steel);
    assert_eq!(s.bodies[1].density, steel.density);
    assert_eq!(s.bodies[1].stiffness, Some(steel.stiffness));
    assert_ne!(s.bodies[0].stiffness, Some(steel.stiffness));
}

// ─── Runner Tests ─────────────────────────────────────────────

#[test]
fn run_box_drop() {
    let mut scenario = Scenario::box_drop();
    scenario.timesteps = 5; // Very short for testing
    let metrics = BenchmarkRunner::run(&scenario).unwrap();

    assert_eq!(metrics.scenario, "box_drop");
    assert_eq!(metrics.timesteps, 5);
    assert_eq!(metrics.body_count, 2);
    assert!(metrics.total_wall_time > 0.0);
    assert!(metrics.max_displacement > 0.0); // Gravity should cause displacement
    assert!(metrics.final_kinetic_energy > 0.0);
}

#[test]
fn run_all_scenarios_briefly() {
    for &kind in ScenarioKind::all() {
        let mut scenario = Scenario::from_kind(kind);
        scenario.timesteps = 3;
        let metrics = BenchmarkRunner::run(&scenario).unwrap();
        assert_eq!(metrics.scenario, kind.name());
        assert!(metrics.final_kinetic_energy.is_finite());
        assert!(metrics.max_displacement.is_finite());
        assert!(metrics.min_step_time <= metrics.max_step_time);
    }
}

#[test]
fn two_spheres_settle_on_floor() {
    let scenario = Scenario::two_spheres();
    let threshold = scenario.config.contact_threshold;
    let mut sim = Simulator::new(scenario.config.clone(), scenario.bodies.clone()).unwrap();
    sim.setup().unwrap();
    let reports = sim.run(300).unwrap();

    let lower = sim.get_deformed_vertices(BodyId(1)).unwrap();
    let bottom = lower.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    assert!(bottom > -threshold && bottom < 0.01, "lower sphere bottom at {bottom}");

    for report in &reports[reports.len() - 20..] {
        assert!(
            report.max_penetration < threshold,
            "step {} penetration {}",
            report.step,
            report.max_penetration
        );
    }
    assert!(sim.kinetic_energy().unwrap().is_finite());
}

// ─── Metrics Tests ────────────────────────────────────────────

fn sample_metrics() -> BenchmarkMetrics {
    BenchmarkMetrics {
        scenario: "test".into(),
        body_count: 2,
        vertex_count: 16,
        triangle_count: 24,
        timesteps: 10,
        total_wall_time: 0.5,
        avg_step_time: 0.05,
        min_step_time: 0.04,
        max_step_time: 0.06,
        avg_newton_iterations: 1.5,
        unconverged_steps: 0,
        max_contacts: 4,
        max_penetration: 0.002,
        final_kinetic_energy: 0.001,
        max_displacement: 0.3,
    }
}

#[test]
fn csv_output() {
    let csv = BenchmarkMetrics::to_csv(&[sample_metrics()]);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("scenario,bodies"));
    assert!(lines[1].starts_with("test,2,16,24,10"));
    assert_eq!(
        lines[0].split(',').count(),
        lines[1].split(',').count()
    );
}

#[test]
fn metrics_serialize() {
    let json = serde_json::to_string(&sample_metrics()).unwrap();
    let back: BenchmarkMetrics = serde_json::from_str(&json).unwrap();
    assert_eq!(back.max_contacts, 4);
    assert_eq!(back.scenario, "test");
}
