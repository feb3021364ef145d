//! Integration tests for abd-solver.

use abd_contact::{Contact, PenaltyContact};
use abd_material::{MaterialProperties, OrthogonalityModel};
use abd_math::kinematic::{compose, from_translation, translation, world_position};
use abd_math::{BlockPattern, DMat3, DVec3, PinningProjection, Vec12};
use abd_mesh::generators::{cuboid, cuboid_between, tetrahedron, uv_sphere};
use abd_mesh::TriangleMesh;
use abd_solver::assembly::predict;
use abd_solver::config::{LinearSolverKind, NewtonConfig, SimulationConfig};
use abd_solver::state::split_poses;
use abd_solver::{
    Body, BodyBlocks, IncrementalPotential, MassProperties, NewtonReport, NewtonSolver,
    SimulationState, Simulator, StepReport,
};
use abd_telemetry::{EventBus, EventKind, VecSink};
use abd_types::{AbdError, BodyId};
use approx::assert_relative_eq;
use nalgebra::SymmetricEigen;

fn floor() -> Body {
    Body::new(cuboid_between(DVec3::new(-2.0, -1.0, -2.0), DVec3::new(2.0, 0.0, 2.0)))
        .with_name("floor")
        .with_density(1000.0)
        .pinned()
}

fn contact_config() -> SimulationConfig {
    SimulationConfig {
        contact_stiffness: 1.0e6,
        contact_threshold: 0.1,
        ..Default::default()
    }
}

fn min_y(points: &[DVec3]) -> f64 {
    points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min)
}

// ─── Config Tests ─────────────────────────────────────────────

#[test]
fn config_defaults() {
    let config = SimulationConfig::default();
    assert_eq!(config.timestep, 0.01);
    assert_eq!(config.gravity, [0.0, -9.8, 0.0]);
    assert_eq!(config.newton.max_iterations, 10);
    assert_eq!(config.newton.tolerance, 0.1);
    assert_eq!(config.newton.cg_tolerance, 1e-5);
    assert_eq!(config.newton.cg_max_iterations, 50);
    assert_eq!(config.newton.line_search_max_steps, 5);
    assert_eq!(config.newton.linear_solver, LinearSolverKind::Pcg);
    assert!(config.validate().is_ok());
}

#[test]
fn config_presets_validate() {
    assert!(SimulationConfig::debug().validate().is_ok());
    let hq = SimulationConfig::high_quality();
    assert!(hq.validate().is_ok());
    assert_eq!(hq.newton.linear_solver, LinearSolverKind::Cholesky);
    assert!(hq.newton.max_iterations > SimulationConfig::default().newton.max_iterations);
}

#[test]
fn config_partial_toml() {
    let text = r#"
        timestep = 0.005
        contact_stiffness = 2e5

        [newton]
        max_iterations = 4
        linear_solver = "cholesky"
    "#;
    let config = SimulationConfig::from_toml_str(text).unwrap();
    assert_eq!(config.timestep, 0.005);
    assert_eq!(config.contact_stiffness, 2e5);
    assert_eq!(config.newton.max_iterations, 4);
    assert_eq!(config.newton.linear_solver, LinearSolverKind::Cholesky);
    // Untouched fields keep their defaults.
    assert_eq!(config.newton.cg_max_iterations, 50);
    assert_eq!(config.max_contacts, SimulationConfig::default().max_contacts);
}

#[test]
fn config_toml_round_trip() {
    let config = SimulationConfig::high_quality();
    let text = config.to_toml_string().unwrap();
    let back = SimulationConfig::from_toml_str(&text).unwrap();
    assert_eq!(back, config);
}

#[test]
fn config_rejects_bad_values() {
    let bad = [
        SimulationConfig { timestep: 0.0, ..Default::default() },
        SimulationConfig { contact_stiffness: -1.0, ..Default::default() },
        SimulationConfig { contact_threshold: f64::NAN, ..Default::default() },
        SimulationConfig { max_contacts: 0, ..Default::default() },
        SimulationConfig { gravity: [0.0, f64::INFINITY, 0.0], ..Default::default() },
        SimulationConfig {
            newton: NewtonConfig { line_search_max_steps: 0, ..Default::default() },
            ..Default::default()
        },
    ];
    for config in bad {
        assert!(matches!(config.validate(), Err(AbdError::InvalidConfig(_))));
    }
}

#[test]
fn config_parse_error_is_serialization() {
    let err = SimulationConfig::from_toml_str("timestep = \"fast\"").unwrap_err();
    assert!(matches!(err, AbdError::Serialization(_)));
}

#[test]
fn config_load_from_file() {
    let path = std::env::temp_dir().join("abd_solver_config_load_test.toml");
    std::fs::write(&path, "timestep = 0.02\n").unwrap();
    let config = SimulationConfig::load(&path).unwrap();
    assert_eq!(config.timestep, 0.02);
    std::fs::remove_file(&path).ok();

    let missing = SimulationConfig::load(std::env::temp_dir().join("abd_no_such_config.toml"));
    assert!(matches!(missing, Err(AbdError::Io(_))));
}

// ─── Body Tests ───────────────────────────────────────────────

#[test]
fn body_builder() {
    let steel = MaterialProperties::new("steel", 7850.0, 1e10);
    let body = Body::new(cuboid(DVec3::splat(0.5)))
        .with_name("box")
        .with_material(&steel)
        .with_translation(DVec3::new(0.0, 2.0, 0.0))
        .with_velocity(DVec3::new(1.0, 0.0, 0.0));
    assert_eq!(body.density, 7850.0);
    assert_eq!(body.stiffness, Some(1e10));
    assert_eq!(translation(&body.initial_q), DVec3::new(0.0, 2.0, 0.0));
    assert!(!body.is_fully_pinned());
    assert!(body.validate(0).is_ok());
    assert!(body.pinned().is_fully_pinned());
}

#[test]
fn body_validation_errors() {
    let mesh = cuboid(DVec3::splat(0.5));
    let cases = [
        Body::new(mesh.clone()).with_density(0.0),
        Body::new(mesh.clone()).with_stiffness(-5.0),
        Body::new(mesh.clone()).with_pinned_dofs([3, 12]),
        Body::new(mesh.clone()).with_velocity(DVec3::new(f64::NAN, 0.0, 0.0)),
    ];
    for body in cases {
        assert!(matches!(
            body.validate(7),
            Err(AbdError::InvalidBody { body: 7, .. })
        ));
    }
}

// ─── Mass Tests ───────────────────────────────────────────────

#[test]
fn unit_cube_moments() {
    let props = MassProperties::integrate(&cuboid_between(DVec3::ZERO, DVec3::ONE)).unwrap();
    assert_relative_eq!(props.volume, 1.0, epsilon = 1e-12);
    assert_relative_eq!(props.first.x, 0.5, epsilon = 1e-12);
    assert_relative_eq!(props.first.y, 0.5, epsilon = 1e-12);
    assert_relative_eq!(props.first.z, 0.5, epsilon = 1e-12);
    assert_relative_eq!(props.second.x_axis.x, 1.0 / 3.0, epsilon = 1e-12);
    assert_relative_eq!(props.second.z_axis.z, 1.0 / 3.0, epsilon = 1e-12);
    assert_relative_eq!(props.second.y_axis.x, 0.25, epsilon = 1e-12);
    assert_relative_eq!(props.second.z_axis.y, 0.25, epsilon = 1e-12);
    assert_relative_eq!(props.center_of_mass().x, 0.5, epsilon = 1e-12);
}

#[test]
fn tetrahedron_volume() {
    let props = MassProperties::integrate(&tetrahedron(1.0)).unwrap();
    assert_relative_eq!(props.volume, 1.0 / 6.0, epsilon = 1e-12);
    // Centroid at (¼, ¼, ¼).
    assert_relative_eq!(props.first.x, 1.0 / 24.0, epsilon = 1e-12);
    assert_relative_eq!(props.center_of_mass().z, 0.25, epsilon = 1e-12);
}

#[test]
fn centered_box_mass_matrix() {
    let props = MassProperties::integrate(&cuboid(DVec3::new(1.0, 0.5, 0.25))).unwrap();
    assert_relative_eq!(props.volume, 1.0, epsilon = 1e-12);
    assert_relative_eq!(props.first.length(), 0.0, epsilon = 1e-12);

    let m = props.mass_matrix(2.0);
    assert_eq!(m, m.transpose());
    assert_relative_eq!(m[(3, 3)], 2.0, epsilon = 1e-12);
    assert_relative_eq!(m[(7, 7)], 2.0, epsilon = 1e-12);
    // ρ ∫x² over [-1,1]×[-½,½]×[-¼,¼] = 2 · (2/3 · 1 · ½) = 2/3.
    assert_relative_eq!(m[(0, 0)], 2.0 / 3.0, epsilon = 1e-12);
    // Axis blocks are decoupled.
    assert_eq!(m[(0, 4)], 0.0);
    assert_eq!(m[(3, 11)], 0.0);

    let eig = SymmetricEigen::new(m);
    assert!(eig.eigenvalues.iter().all(|&l| l > 0.0));
}

#[test]
fn mass_is_translation_invariant_in_volume() {
    let mesh = cuboid(DVec3::splat(0.5));
    let a = MassProperties::integrate(&mesh).unwrap();
    let b = MassProperties::integrate(&mesh.translated(DVec3::new(3.0, -2.0, 1.0))).unwrap();
    assert_relative_eq!(a.volume, b.volume, epsilon = 1e-12);
    assert_relative_eq!(b.center_of_mass().x, 3.0, epsilon = 1e-12);
}

#[test]
fn sphere_volume_approaches_analytic() {
    let exact = 4.0 / 3.0 * std::f64::consts::PI;
    let props = MassProperties::integrate(&uv_sphere(1.0, 16, 32)).unwrap();
    assert!(props.volume < exact);
    assert!(props.volume > 0.9 * exact);
}

#[test]
fn inverted_mesh_has_negative_volume() {
    let mut mesh = cuboid(DVec3::splat(0.5));
    for tri in mesh.indices.chunks_exact_mut(3) {
        tri.swap(1, 2);
    }
    let props = MassProperties::integrate(&mesh).unwrap();
    assert_relative_eq!(props.volume, -1.0, epsilon = 1e-12);
}

// ─── State Tests ──────────────────────────────────────────────

#[test]
fn state_initial_velocity() {
    let poses = [from_translation(DVec3::new(0.0, 1.0, 0.0))];
    let state = SimulationState::from_initial(&poses, &[DVec3::new(2.0, 0.0, 0.0)], 0.01).unwrap();
    assert_eq!(state.body_count(), 1);
    assert_eq!(state.body_q(BodyId(0)), poses[0]);
    assert_relative_eq!(state.qm1[3], -0.02, epsilon = 1e-15);
    assert_relative_eq!(
        state.body_velocity(BodyId(0), 0.01).x,
        2.0,
        epsilon = 1e-12
    );
}

#[test]
fn state_advance_rotates() {
    let poses = [from_translation(DVec3::ZERO)];
    let mut state = SimulationState::from_initial(&poses, &[DVec3::ZERO], 0.01).unwrap();
    let next = from_translation(DVec3::new(0.0, -0.1, 0.0));
    state.advance(next.iter().copied().collect());
    assert_eq!(state.body_qm1(BodyId(0)), poses[0]);
    assert_eq!(state.body_q(BodyId(0)), next);
    assert!(!state.has_non_finite());
}

#[test]
fn state_rejects_mismatched_velocities() {
    let poses = [from_translation(DVec3::ZERO); 2];
    assert!(SimulationState::from_initial(&poses, &[DVec3::ZERO], 0.01).is_err());
}

// ─── Assembly Tests ───────────────────────────────────────────

#[test]
fn predict_applies_gravity_to_translation_only() {
    let q: Vec<f64> = from_translation(DVec3::new(0.0, 1.0, 0.0)).iter().copied().collect();
    let q_tilde = predict(&q, &q, 0.1, DVec3::new(0.0, -10.0, 0.0));
    let pose = split_poses(&q_tilde)[0];
    assert_relative_eq!(translation(&pose).y, 0.9, epsilon = 1e-12);
    for dof in [0, 1, 2, 4, 5, 6, 8, 9, 10] {
        assert_eq!(q_tilde[dof], q[dof]);
    }
}

fn two_body_blocks() -> BodyBlocks {
    let props = MassProperties::integrate(&cuboid(DVec3::splat(0.5))).unwrap();
    BodyBlocks {
        mass: vec![props.mass_matrix(1.0), props.mass_matrix(2.0)],
        volumes: vec![1.0, 1.0],
        stiffnesses: vec![1.0e3, 2.0e3],
    }
}

fn sample_contacts() -> (Vec<Contact>, BlockPattern) {
    let contacts = vec![
        Contact {
            body_a: 0,
            body_b: 1,
            vertex: 0,
            ref_a: DVec3::new(0.5, -0.5, 0.5),
            ref_b: DVec3::new(0.5, 0.5, 0.5),
            normal: DVec3::Y,
            depth: 0.01,
            valid: true,
        },
        Contact {
            body_a: 1,
            body_b: 0,
            vertex: 5,
            ref_a: DVec3::new(-0.5, 0.5, 0.5),
            ref_b: DVec3::new(-0.5, -0.5, 0.4),
            normal: DVec3::new(0.1, -1.0, 0.05).normalize(),
            depth: 0.01,
            valid: true,
        },
    ];
    let mut pattern = BlockPattern::new();
    pattern.insert_pair(0, 1);
    (contacts, pattern)
}

fn perturbed_q() -> Vec<f64> {
    let f0 = DMat3::from_cols(
        DVec3::new(1.01, 0.02, -0.01),
        DVec3::new(-0.03, 0.98, 0.02),
        DVec3::new(0.01, 0.01, 1.02),
    );
    let f1 = DMat3::from_rotation_y(0.3) * DMat3::from_diagonal(DVec3::new(1.0, 1.03, 0.97));
    compose(f0, DVec3::new(0.1, 0.99, -0.05))
        .iter()
        .chain(compose(f1, DVec3::new(0.0, 0.02, 0.01)).iter())
        .copied()
        .collect()
}

#[test]
fn potential_zero_at_target_without_contacts() {
    let blocks = two_body_blocks();
    let q: Vec<f64> = from_translation(DVec3::Y)
        .iter()
        .chain(from_translation(DVec3::ZERO).iter())
        .copied()
        .collect();
    let pattern = BlockPattern::new();
    let potential = IncrementalPotential {
        bodies: &blocks,
        model: &OrthogonalityModel,
        penalty: PenaltyContact::new(1e4),
        contacts: &[],
        contact_pattern: &pattern,
        q_tilde: &q,
        dt: 0.01,
    };
    let energy = potential.energy(&q).unwrap();
    assert_eq!(energy.total, 0.0);
    assert!(potential.gradient(&q).unwrap().iter().all(|&g| g == 0.0));
    assert_eq!(potential.hessian(&q).unwrap().nnz_blocks(), 2);
}

#[test]
fn potential_gradient_matches_finite_difference() {
    let blocks = two_body_blocks();
    let (contacts, pattern) = sample_contacts();
    let q = perturbed_q();
    let q_tilde: Vec<f64> = q.iter().enumerate().map(|(i, v)| v + 0.01 * ((i % 5) as f64 - 2.0)).collect();
    let potential = IncrementalPotential {
        bodies: &blocks,
        model: &OrthogonalityModel,
        penalty: PenaltyContact::new(1e4),
        contacts: &contacts,
        contact_pattern: &pattern,
        q_tilde: &q_tilde,
        dt: 0.1,
    };

    let g = potential.gradient(&q).unwrap();
    let eps = 1e-5;
    for i in 0..q.len() {
        let mut plus = q.clone();
        let mut minus = q.clone();
        plus[i] += eps;
        minus[i] -= eps;
        let fd = (potential.energy(&plus).unwrap().total - potential.energy(&minus).unwrap().total)
            / (2.0 * eps);
        assert!(
            (fd - g[i]).abs() < 1e-5 * g[i].abs().max(1.0),
            "dof {i}: fd={fd}, analytic={}",
            g[i]
        );
    }
}

#[test]
fn potential_hessian_matches_gradient_difference() {
    let blocks = two_body_blocks();
    let (contacts, pattern) = sample_contacts();
    let q = perturbed_q();
    let q_tilde = q.clone();
    let potential = IncrementalPotential {
        bodies: &blocks,
        model: &OrthogonalityModel,
        penalty: PenaltyContact::new(1e4),
        contacts: &contacts,
        contact_pattern: &pattern,
        q_tilde: &q_tilde,
        dt: 0.1,
    };

    let h = potential.hessian(&q).unwrap();
    assert_eq!(h.nnz_blocks(), 4);
    let csr = h.to_csr();
    assert!(csr.max_asymmetry() < 1e-9);

    let direction: Vec<f64> = (0..q.len()).map(|i| ((i * 7 % 11) as f64 - 5.0) / 5.0).collect();
    let mut hv = vec![0.0; q.len()];
    h.mul_vec(&direction, &mut hv);

    let eps = 1e-6;
    let plus: Vec<f64> = q.iter().zip(&direction).map(|(q, d)| q + eps * d).collect();
    let minus: Vec<f64> = q.iter().zip(&direction).map(|(q, d)| q - eps * d).collect();
    let g_plus = potential.gradient(&plus).unwrap();
    let g_minus = potential.gradient(&minus).unwrap();
    for i in 0..q.len() {
        let fd = (g_plus[i] - g_minus[i]) / (2.0 * eps);
        assert!(
            (fd - hv[i]).abs() < 1e-4 * hv[i].abs().max(1.0),
            "row {i}: fd={fd}, analytic={}",
            hv[i]
        );
    }
}

#[test]
fn potential_rejects_wrong_dimension() {
    let blocks = two_body_blocks();
    let pattern = BlockPattern::new();
    let q_tilde = vec![0.0; 24];
    let potential = IncrementalPotential {
        bodies: &blocks,
        model: &OrthogonalityModel,
        penalty: PenaltyContact::default(),
        contacts: &[],
        contact_pattern: &pattern,
        q_tilde: &q_tilde,
        dt: 0.01,
    };
    assert!(matches!(
        potential.energy(&[0.0; 12]),
        Err(AbdError::Dimension { expected: 24, actual: 12 })
    ));
}

// ─── Newton Tests ─────────────────────────────────────────────

fn single_body_setup() -> (BodyBlocks, Vec<f64>, Vec<f64>) {
    let props = MassProperties::integrate(&cuboid(DVec3::splat(0.5))).unwrap();
    let blocks = BodyBlocks {
        mass: vec![props.mass_matrix(1000.0)],
        volumes: vec![props.volume],
        stiffnesses: vec![1e8],
    };
    let q: Vec<f64> = from_translation(DVec3::new(0.0, 1.0, 0.0)).iter().copied().collect();
    let q_tilde = predict(&q, &q, 0.01, DVec3::new(0.0, -9.8, 0.0));
    (blocks, q, q_tilde)
}

#[test]
fn newton_reaches_inertial_target() {
    let (blocks, mut q, q_tilde) = single_body_setup();
    let pattern = BlockPattern::new();
    let potential = IncrementalPotential {
        bodies: &blocks,
        model: &OrthogonalityModel,
        penalty: PenaltyContact::default(),
        contacts: &[],
        contact_pattern: &pattern,
        q_tilde: &q_tilde,
        dt: 0.01,
    };
    let mut solver = NewtonSolver::new(NewtonConfig::default());
    let report = solver.solve(&potential, &PinningProjection::identity(12), &mut q).unwrap();

    assert!(report.converged);
    assert!(report.iterations >= 1);
    assert!(report.final_energy <= report.initial_energy);
    assert_eq!(report.history.len() as u32, report.iterations);
    assert_relative_eq!(q[7], q_tilde[7], epsilon = 1e-6);
}

#[test]
fn newton_report_serializes() {
    let (blocks, mut q, q_tilde) = single_body_setup();
    let pattern = BlockPattern::new();
    let potential = IncrementalPotential {
        bodies: &blocks,
        model: &OrthogonalityModel,
        penalty: PenaltyContact::default(),
        contacts: &[],
        contact_pattern: &pattern,
        q_tilde: &q_tilde,
        dt: 0.01,
    };
    let report = NewtonSolver::new(NewtonConfig::default())
        .solve(&potential, &PinningProjection::identity(12), &mut q)
        .unwrap();

    let json = serde_json::to_string(&report).unwrap();
    let back: NewtonReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.iterations, report.iterations);
    assert_eq!(back.converged, report.converged);
    assert_eq!(back.history.len(), report.history.len());
    assert_relative_eq!(back.final_energy, report.final_energy, max_relative = 1e-12);
    let (first, orig) = (&back.history[0], &report.history[0]);
    assert_eq!(first.linear_solver, orig.linear_solver);
    assert_eq!(first.line_search_accepted, orig.line_search_accepted);
    assert_relative_eq!(first.gradient_norm, orig.gradient_norm, max_relative = 1e-12);
}

#[test]
fn newton_holds_pinned_dofs_exactly() {
    let (blocks, mut q, q_tilde) = single_body_setup();
    let start_y = q[7];
    let pattern = BlockPattern::new();
    let potential = IncrementalPotential {
        bodies: &blocks,
        model: &OrthogonalityModel,
        penalty: PenaltyContact::default(),
        contacts: &[],
        contact_pattern: &pattern,
        q_tilde: &q_tilde,
        dt: 0.01,
    };
    let projection = PinningProjection::new(12, &[7]).unwrap();
    let mut solver = NewtonSolver::new(NewtonConfig::default());
    let report = solver.solve(&potential, &projection, &mut q).unwrap();

    assert!(report.converged);
    assert_eq!(q[7], start_y);
}

#[test]
fn newton_cholesky_matches_pcg() {
    let (blocks, q0, q_tilde) = single_body_setup();
    let pattern = BlockPattern::new();
    let potential = IncrementalPotential {
        bodies: &blocks,
        model: &OrthogonalityModel,
        penalty: PenaltyContact::default(),
        contacts: &[],
        contact_pattern: &pattern,
        q_tilde: &q_tilde,
        dt: 0.01,
    };
    let projection = PinningProjection::identity(12);

    let mut q_pcg = q0.clone();
    NewtonSolver::new(NewtonConfig::default())
        .solve(&potential, &projection, &mut q_pcg)
        .unwrap();

    let mut q_llt = q0;
    let config = NewtonConfig {
        linear_solver: LinearSolverKind::Cholesky,
        ..Default::default()
    };
    let report = NewtonSolver::new(config)
        .solve(&potential, &projection, &mut q_llt)
        .unwrap();
    assert_eq!(report.history[0].linear_solver, "faer-cholesky");

    for (a, b) in q_pcg.iter().zip(&q_llt) {
        assert_relative_eq!(a, b, epsilon = 1e-8);
    }
}

#[test]
fn newton_fully_pinned_is_converged_immediately() {
    let (blocks, mut q, q_tilde) = single_body_setup();
    let before = q.clone();
    let pattern = BlockPattern::new();
    let potential = IncrementalPotential {
        bodies: &blocks,
        model: &OrthogonalityModel,
        penalty: PenaltyContact::default(),
        contacts: &[],
        contact_pattern: &pattern,
        q_tilde: &q_tilde,
        dt: 0.01,
    };
    let projection = PinningProjection::new(12, &(0..12).collect::<Vec<_>>()).unwrap();
    let report = NewtonSolver::new(NewtonConfig::default())
        .solve(&potential, &projection, &mut q)
        .unwrap();
    assert!(report.converged);
    assert_eq!(report.iterations, 0);
    assert_eq!(q, before);
}

// ─── Simulator Tests ──────────────────────────────────────────

#[test]
fn simulator_rejects_empty_scene() {
    let result = Simulator::new(SimulationConfig::default(), Vec::new());
    assert!(matches!(result, Err(AbdError::InvalidConfig(_))));
}

#[test]
fn simulator_requires_setup() {
    let mut sim = Simulator::new(
        SimulationConfig::default(),
        vec![Body::new(cuboid(DVec3::splat(0.5)))],
    )
    .unwrap();
    assert!(!sim.is_initialized());
    assert!(matches!(sim.step(), Err(AbdError::NotInitialized(_))));
    assert!(matches!(sim.reset(), Err(AbdError::NotInitialized(_))));
    assert!(sim.get_deformed_vertices(BodyId(0)).is_err());
}

#[test]
fn simulator_rejects_open_free_body() {
    let cube = cuboid(DVec3::splat(0.5));
    let vertices: Vec<DVec3> = cube.positions().collect();
    let triangles: Vec<[u32; 3]> = (1..cube.triangle_count()).map(|t| cube.triangle(t)).collect();
    let open = TriangleMesh::from_vertices(&vertices, &triangles).unwrap();
    let mut sim = Simulator::new(SimulationConfig::default(), vec![Body::new(open)]).unwrap();
    assert!(matches!(sim.setup(), Err(AbdError::UnsupportedGeometry(_))));
}

#[test]
fn simulator_rejects_inverted_free_body() {
    let mut mesh = cuboid(DVec3::splat(0.5));
    for tri in mesh.indices.chunks_exact_mut(3) {
        tri.swap(1, 2);
    }
    let mut sim =
        Simulator::new(SimulationConfig::default(), vec![Body::new(mesh)]).unwrap();
    assert!(matches!(sim.setup(), Err(AbdError::UnsupportedGeometry(_))));
}

#[test]
fn free_fall_matches_implicit_euler() {
    let body = Body::new(cuboid(DVec3::splat(0.5)))
        .with_density(1000.0)
        .with_translation(DVec3::new(0.0, 5.0, 0.0));
    let mut sim = Simulator::new(SimulationConfig::default(), vec![body]).unwrap();
    sim.setup().unwrap();

    let reports = sim.run(10).unwrap();
    assert!(reports.iter().all(|r| r.converged && r.contact_count == 0));
    assert_eq!(sim.step_count(), 10);
    assert_relative_eq!(sim.time(), 0.1, epsilon = 1e-12);

    // v_n = n·dt·g exactly for implicit Euler under constant gravity.
    let v = sim.body_velocity(BodyId(0)).unwrap();
    assert_relative_eq!(v.y, -0.98, epsilon = 1e-3);
    assert_relative_eq!(v.x, 0.0, epsilon = 1e-6);

    // y_n = y_0 + dt²·g·n(n+1)/2.
    let pose = sim.body_pose(BodyId(0)).unwrap();
    assert_relative_eq!(translation(&pose).y, 5.0 - 1e-4 * 9.8 * 55.0, epsilon = 1e-4);
    assert!(sim.kinetic_energy().unwrap() > 0.0);
    assert!(sim.elastic_energy().unwrap() < 1e-6);
}

#[test]
fn initial_velocity_carries_body() {
    let config = SimulationConfig {
        gravity: [0.0; 3],
        ..Default::default()
    };
    let body = Body::new(cuboid(DVec3::splat(0.5)))
        .with_density(1000.0)
        .with_velocity(DVec3::new(1.0, 0.0, 0.0));
    let mut sim = Simulator::new(config, vec![body]).unwrap();
    sim.setup().unwrap();
    sim.run(10).unwrap();
    let pose = sim.body_pose(BodyId(0)).unwrap();
    assert_relative_eq!(translation(&pose).x, 0.1, epsilon = 1e-3);
}

#[test]
fn deep_penetration_is_reduced() {
    let cube = Body::new(cuboid(DVec3::splat(0.5)))
        .with_name("cube")
        .with_density(1000.0)
        .with_translation(DVec3::new(0.0, 0.45, 0.0));
    let mut sim = Simulator::new(contact_config(), vec![floor(), cube]).unwrap();
    sim.setup().unwrap();

    let before = -min_y(&sim.get_deformed_vertices(BodyId(1)).unwrap());
    assert_relative_eq!(before, 0.05, epsilon = 1e-12);

    let report = sim.step().unwrap();
    assert_eq!(report.contact_count, 4);
    assert_relative_eq!(report.max_penetration, 0.05, epsilon = 1e-9);
    assert!(report.final_potential <= report.initial_potential + 0.1);

    let after = -min_y(&sim.get_deformed_vertices(BodyId(1)).unwrap());
    assert!(after < before, "penetration grew from {before} to {after}");

    let json = serde_json::to_string(&report).unwrap();
    let back: StepReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.step, 0);
    assert_eq!(back.contact_count, report.contact_count);
    assert_eq!(back.newton_iterations, report.newton_iterations);
    assert_eq!(back.converged, report.converged);
    assert_relative_eq!(back.max_penetration, report.max_penetration, max_relative = 1e-12);
    assert_relative_eq!(back.final_potential, report.final_potential, max_relative = 1e-12);
}

#[test]
fn cube_comes_to_rest_on_floor() {
    let cube = Body::new(cuboid(DVec3::splat(0.5)))
        .with_density(1000.0)
        .with_translation(DVec3::new(0.0, 0.501, 0.0));
    let mut sim = Simulator::new(contact_config(), vec![floor(), cube]).unwrap();
    sim.setup().unwrap();
    sim.run(100).unwrap();

    let vertices = sim.get_deformed_vertices(BodyId(1)).unwrap();
    let bottom = min_y(&vertices);
    assert!(bottom > -0.01 && bottom < 0.01, "bottom at {bottom}");
    let pose = sim.body_pose(BodyId(1)).unwrap();
    assert!(translation(&pose).x.abs() < 1e-3);
    assert!(translation(&pose).z.abs() < 1e-3);
    assert!(sim.body_velocity(BodyId(1)).unwrap().length() < 0.05);
}

#[test]
fn sphere_settles_within_threshold() {
    let sphere = Body::new(uv_sphere(0.5, 8, 16))
        .with_density(1000.0)
        .with_translation(DVec3::new(0.0, 0.55, 0.0));
    let mut sim = Simulator::new(contact_config(), vec![floor(), sphere]).unwrap();
    sim.setup().unwrap();
    sim.run(150).unwrap();

    let bottom = min_y(&sim.get_deformed_vertices(BodyId(1)).unwrap());
    assert!(bottom > -0.05, "bottom at {bottom}");
    assert!(bottom < 0.01);
}

#[test]
fn pinned_floor_never_moves() {
    let cube = Body::new(cuboid(DVec3::splat(0.5)))
        .with_density(1000.0)
        .with_translation(DVec3::new(0.0, 0.48, 0.0));
    let mut sim = Simulator::new(contact_config(), vec![floor(), cube]).unwrap();
    sim.setup().unwrap();
    let initial = sim.body_pose(BodyId(0)).unwrap();
    sim.run(20).unwrap();
    assert_eq!(sim.body_pose(BodyId(0)).unwrap(), initial);
    assert_eq!(sim.projection().unwrap().pinned_dofs().len(), 12);
}

#[test]
fn reset_restores_initial_vertices_exactly() {
    let rotation = DMat3::from_rotation_z(0.2);
    let cube = Body::new(cuboid(DVec3::splat(0.5)))
        .with_density(1000.0)
        .with_transform(rotation, DVec3::new(0.0, 0.6, 0.0))
        .with_velocity(DVec3::new(0.5, 0.0, 0.0));
    let initial_q: Vec12 = cube.initial_q;
    let mesh = cube.mesh.clone();
    let mut sim = Simulator::new(contact_config(), vec![floor(), cube]).unwrap();
    sim.setup().unwrap();

    for steps in [0, 3, 12] {
        sim.run(steps).unwrap();
        sim.reset().unwrap();
        assert_eq!(sim.step_count(), 0);
        assert_eq!(sim.time(), 0.0);
        let expected: Vec<DVec3> = mesh.positions().map(|x| world_position(&initial_q, x)).collect();
        assert_eq!(sim.get_deformed_vertices(BodyId(1)).unwrap(), expected);
        assert_relative_eq!(sim.body_velocity(BodyId(1)).unwrap().x, 0.5, epsilon = 1e-9);
    }
}

#[test]
fn simulator_emits_telemetry() {
    let sink = VecSink::new();
    let log = sink.log();
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(sink));

    let cube = Body::new(cuboid(DVec3::splat(0.5)))
        .with_density(1000.0)
        .with_translation(DVec3::new(0.0, 0.48, 0.0));
    let mut sim = Simulator::new(contact_config(), vec![floor(), cube])
        .unwrap()
        .with_event_bus(bus);
    sim.setup().unwrap();
    sim.step().unwrap();

    let bus = sim.event_bus_mut().unwrap();
    assert_eq!(bus.pending_count(), 0);
    let delivered = bus.delivered_count();

    let events = log.lock().unwrap();
    assert_eq!(events.len() as u64, delivered);
    assert!(matches!(events.first().map(|e| &e.kind), Some(EventKind::TimestepBegin { .. })));
    assert!(matches!(events.last().map(|e| &e.kind), Some(EventKind::TimestepEnd { .. })));
    assert!(events.iter().any(|e| matches!(
        e.kind,
        EventKind::ContactDetection { contact_count: 4, pair_count: 1, .. }
    )));
    assert!(events.iter().any(|e| matches!(e.kind, EventKind::NewtonIteration { .. })));
    assert!(events.iter().any(|e| matches!(e.kind, EventKind::Convergence { .. })));
    assert!(events.iter().all(|e| e.timestep == 0));
}

#[test]
fn contact_buffer_truncation_is_reported() {
    let config = SimulationConfig {
        max_contacts: 2,
        ..contact_config()
    };
    let cube = Body::new(cuboid(DVec3::splat(0.5)))
        .with_density(1000.0)
        .with_translation(DVec3::new(0.0, 0.48, 0.0));
    let mut sim = Simulator::new(config, vec![floor(), cube]).unwrap();
    sim.setup().unwrap();
    let report = sim.step().unwrap();
    assert_eq!(report.contact_count, 2);
    assert_eq!(report.truncated_contacts, 2);
    assert_eq!(sim.last_contacts().len(), 2);
}
