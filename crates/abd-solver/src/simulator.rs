//! The simulator loop.
//!
//! Owns the bodies, the per-body constant data built by [`Simulator::setup`],
//! the state, and the per-step contact buffer. Each [`Simulator::step`]
//! predicts `q̃`, enumerates contacts at the start-of-step poses, runs the
//! Newton solve with that contact set frozen, and shifts `q` into `qm1`.

use std::time::Instant;

use abd_contact::{BruteForceQuery, ContactDetector, ContactSet, PenaltyContact, ProximityQuery};
use abd_material::{EnergyModel, OrthogonalityModel};
use abd_math::kinematic::world_position;
use abd_math::{DVec3, PinningProjection, Vec12};
use abd_mesh::{Topology, TriangleMesh};
use abd_telemetry::{EventBus, EventKind};
use abd_types::constants::{DOFS_PER_BODY, EPSILON};
use abd_types::{AbdError, AbdResult, BodyId};
use serde::{Deserialize, Serialize};

use crate::assembly::{predict, BodyBlocks, EnergyBreakdown, IncrementalPotential};
use crate::body::Body;
use crate::config::SimulationConfig;
use crate::mass::MassProperties;
use crate::newton::{NewtonReport, NewtonSolver};
use crate::state::{split_poses, SimulationState};

/// Summary of one timestep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Index of the step just taken (0-indexed).
    pub step: u32,
    /// Simulation time after the step.
    pub time: f64,
    /// Newton updates applied.
    pub newton_iterations: u32,
    /// Final free-DOF gradient norm.
    pub gradient_norm: f64,
    /// Whether Newton reached its tolerance.
    pub converged: bool,
    /// Contacts used for the step.
    pub contact_count: usize,
    /// Contacts dropped on buffer overflow.
    pub truncated_contacts: usize,
    /// Deepest contact at the start of the step.
    pub max_penetration: f64,
    /// Potential at the start-of-step configuration.
    pub initial_potential: f64,
    /// Potential at the accepted configuration.
    pub final_potential: f64,
    /// Inner linear solver iterations summed over the step.
    pub linear_iterations: u32,
    /// Newton iterations whose line search found no acceptable trial.
    pub line_search_failures: u32,
    /// Wall-clock time of the step (seconds).
    pub wall_time: f64,
}

/// Data built once by `setup()` and kept until the simulator is dropped.
struct Prepared {
    blocks: BodyBlocks,
    mass_properties: Vec<MassProperties>,
    projection: PinningProjection,
    initial: SimulationState,
    state: SimulationState,
}

/// Affine body simulator.
pub struct Simulator {
    config: SimulationConfig,
    bodies: Vec<Body>,
    model: Box<dyn EnergyModel>,
    detector: ContactDetector,
    newton: NewtonSolver,
    events: Option<EventBus>,
    prepared: Option<Prepared>,
    contacts: ContactSet,
    time: f64,
    step_count: u32,
}

impl Simulator {
    /// Validates the config and bodies. Call [`setup`](Self::setup) before stepping.
    pub fn new(config: SimulationConfig, bodies: Vec<Body>) -> AbdResult<Self> {
        config.validate()?;
        if bodies.is_empty() {
            return Err(AbdError::InvalidConfig("scene has no bodies".into()));
        }
        for (i, body) in bodies.iter().enumerate() {
            body.validate(i)?;
        }

        let detector = Self::build_detector(&config, Box::new(BruteForceQuery::new()));
        let newton = NewtonSolver::new(config.newton.clone());
        Ok(Self {
            config,
            bodies,
            model: Box::new(OrthogonalityModel::new()),
            detector,
            newton,
            events: None,
            prepared: None,
            contacts: ContactSet::default(),
            time: 0.0,
            step_count: 0,
        })
    }

    fn build_detector(config: &SimulationConfig, query: Box<dyn ProximityQuery>) -> ContactDetector {
        ContactDetector::new(
            query,
            config.contact_threshold,
            config.query_distance,
            config.max_contacts,
        )
    }

    /// Replaces the proximity query service.
    pub fn with_query(mut self, query: Box<dyn ProximityQuery>) -> Self {
        self.detector = Self::build_detector(&self.config, query);
        self
    }

    /// Replaces the elastic energy model.
    pub fn with_energy_model(mut self, model: Box<dyn EnergyModel>) -> Self {
        self.model = model;
        self
    }

    /// Attaches a telemetry bus.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Telemetry bus, if attached.
    pub fn event_bus_mut(&mut self) -> Option<&mut EventBus> {
        self.events.as_mut()
    }

    /// Builds mass blocks, the pinning projection, and the initial state.
    pub fn setup(&mut self) -> AbdResult<()> {
        let n = self.bodies.len();
        let mut blocks = BodyBlocks::default();
        let mut mass_properties = Vec::with_capacity(n);
        let mut pinned = Vec::new();

        for (i, body) in self.bodies.iter().enumerate() {
            if !body.is_fully_pinned() {
                let topology = Topology::build(&body.mesh);
                if !topology.is_closed() {
                    return Err(AbdError::UnsupportedGeometry(format!(
                        "body {i} ('{}') is an open shell with {} boundary edges",
                        body.name,
                        topology.boundary_edge_count()
                    )));
                }
                if !topology.is_consistently_oriented() {
                    tracing::warn!(
                        body = i,
                        duplicate_half_edges = topology.duplicate_half_edges,
                        "inconsistent face winding"
                    );
                }
            }
            let props = MassProperties::integrate(&body.mesh)?;
            if props.volume <= EPSILON && !body.is_fully_pinned() {
                return Err(AbdError::UnsupportedGeometry(format!(
                    "body {i} ('{}') encloses non-positive volume {}; free bodies need a closed, outward-wound mesh",
                    body.name, props.volume
                )));
            }
            blocks.mass.push(props.mass_matrix(body.density));
            blocks.volumes.push(props.volume.max(0.0));
            blocks
                .stiffnesses
                .push(body.stiffness.unwrap_or(self.config.elastic_stiffness));
            pinned.extend(body.pinned_dofs.iter().map(|d| i * DOFS_PER_BODY + d));
            mass_properties.push(props);
        }

        let projection = PinningProjection::new(n * DOFS_PER_BODY, &pinned)?;
        let initial = self.initial_state()?;

        tracing::info!(
            bodies = n,
            free_dofs = projection.free_count(),
            pinned_dofs = projection.pinned_dofs().len(),
            total_mass = mass_properties
                .iter()
                .zip(&self.bodies)
                .map(|(p, b)| p.mass(b.density))
                .sum::<f64>(),
            query = self.detector.query_name(),
            model = self.model.name(),
            "simulator setup"
        );

        self.prepared = Some(Prepared {
            blocks,
            mass_properties,
            projection,
            state: initial.clone(),
            initial,
        });
        self.contacts = ContactSet::default();
        self.time = 0.0;
        self.step_count = 0;
        Ok(())
    }

    fn initial_state(&self) -> AbdResult<SimulationState> {
        let poses: Vec<Vec12> = self.bodies.iter().map(|b| b.initial_q).collect();
        let velocities: Vec<DVec3> = self.bodies.iter().map(|b| b.initial_velocity).collect();
        SimulationState::from_initial(&poses, &velocities, self.config.timestep)
    }

    fn prepared(&self) -> AbdResult<&Prepared> {
        self.prepared
            .as_ref()
            .ok_or_else(|| AbdError::NotInitialized("call setup() first".into()))
    }

    /// Restores every body to its initial pose and velocity.
    pub fn reset(&mut self) -> AbdResult<()> {
        let prepared = self
            .prepared
            .as_mut()
            .ok_or_else(|| AbdError::NotInitialized("call setup() first".into()))?;
        prepared.state = prepared.initial.clone();
        self.contacts = ContactSet::default();
        self.time = 0.0;
        self.step_count = 0;
        tracing::debug!("simulator reset");
        Ok(())
    }

    /// Advances the simulation by one timestep.
    pub fn step(&mut self) -> AbdResult<StepReport> {
        let start = Instant::now();
        let prepared = self
            .prepared
            .as_ref()
            .ok_or_else(|| AbdError::NotInitialized("call setup() first".into()))?;
        let timestep = self.step_count;
        let dt = self.config.timestep;
        let start_time = self.time;

        let poses = prepared.state.poses();
        let meshes: Vec<&TriangleMesh> = self.bodies.iter().map(|b| &b.mesh).collect();
        let contacts = self.detector.detect(&meshes, &poses)?;

        let q_tilde = predict(
            &prepared.state.q,
            &prepared.state.qm1,
            dt,
            DVec3::from_array(self.config.gravity),
        );
        let potential = IncrementalPotential {
            bodies: &prepared.blocks,
            model: self.model.as_ref(),
            penalty: PenaltyContact::new(self.config.contact_stiffness),
            contacts: &contacts.contacts,
            contact_pattern: &contacts.pattern,
            q_tilde: &q_tilde,
            dt,
        };
        let mut q = prepared.state.q.clone();
        let newton = self.newton.solve(&potential, &prepared.projection, &mut q)?;

        if q.iter().any(|v| !v.is_finite()) {
            tracing::warn!(step = timestep, "configuration became non-finite");
        }

        let report = StepReport {
            step: timestep,
            time: self.time + dt,
            newton_iterations: newton.iterations,
            gradient_norm: newton.gradient_norm,
            converged: newton.converged,
            contact_count: contacts.len(),
            truncated_contacts: contacts.stats.truncated,
            max_penetration: contacts.stats.max_depth,
            initial_potential: newton.initial_energy,
            final_potential: newton.final_energy,
            linear_iterations: newton.linear_iterations,
            line_search_failures: newton.line_search_failures,
            wall_time: 0.0,
        };

        if let Some(prepared) = self.prepared.as_mut() {
            prepared.state.advance(q);
        }
        self.time += dt;
        self.step_count += 1;

        let mut events = Vec::new();
        if self.events.is_some() {
            events.push(EventKind::TimestepBegin { sim_time: start_time });
            events.extend(self.step_events(&contacts, &newton));
        }
        self.contacts = contacts;

        let wall_time = start.elapsed().as_secs_f64();
        if let Some(bus) = self.events.as_mut() {
            events.push(EventKind::TimestepEnd { wall_time });
            bus.publish(timestep, events);
        }

        tracing::debug!(
            step = timestep,
            newton_iterations = report.newton_iterations,
            gradient_norm = report.gradient_norm,
            converged = report.converged,
            contacts = report.contact_count,
            wall_time,
            "step complete"
        );
        Ok(StepReport { wall_time, ..report })
    }

    /// Runs `steps` timesteps and returns their reports.
    pub fn run(&mut self, steps: u32) -> AbdResult<Vec<StepReport>> {
        (0..steps).map(|_| self.step()).collect()
    }

    /// Events describing a finished step, in emission order.
    fn step_events(&self, contacts: &ContactSet, newton: &NewtonReport) -> Vec<EventKind> {
        let mut events = vec![EventKind::ContactDetection {
            contact_count: contacts.len() as u32,
            pair_count: contacts.pairs.len() as u32,
            truncated: contacts.stats.truncated as u32,
            max_penetration: contacts.stats.max_depth,
        }];
        for record in &newton.history {
            events.push(EventKind::LinearSolve {
                solver: record.linear_solver.clone(),
                iterations: record.linear_iterations,
                residual: record.linear_residual,
            });
            events.push(EventKind::NewtonIteration {
                iteration: record.iteration,
                gradient_norm: record.gradient_norm,
                energy: record.energy,
                step_length: record.step_length,
            });
        }
        events.push(EventKind::Convergence {
            iterations: newton.iterations,
            final_residual: newton.gradient_norm,
            converged: newton.converged,
        });
        if let (Ok(kinetic), Ok(energy)) = (self.kinetic_energy(), self.potential_energy()) {
            events.push(EventKind::Energy {
                kinetic,
                elastic: energy.elastic,
                contact: energy.contact,
            });
        }
        events
    }

    // ─── Queries ──────────────────────────────────────────────

    /// World-space vertices of one body at the current configuration.
    pub fn get_deformed_vertices(&self, body: BodyId) -> AbdResult<Vec<DVec3>> {
        let q = self.body_pose(body)?;
        let mesh = &self.bodies[body.index()].mesh;
        Ok(mesh.positions().map(|x| world_position(&q, x)).collect())
    }

    /// Current generalized coordinates of one body.
    pub fn body_pose(&self, body: BodyId) -> AbdResult<Vec12> {
        let prepared = self.prepared()?;
        self.check_body(body)?;
        Ok(prepared.state.body_q(body))
    }

    /// Translational velocity of one body, from `q − qm1`.
    pub fn body_velocity(&self, body: BodyId) -> AbdResult<DVec3> {
        let prepared = self.prepared()?;
        self.check_body(body)?;
        Ok(prepared.state.body_velocity(body, self.config.timestep))
    }

    fn check_body(&self, body: BodyId) -> AbdResult<()> {
        if body.index() >= self.bodies.len() {
            return Err(AbdError::Dimension {
                expected: self.bodies.len(),
                actual: body.index(),
            });
        }
        Ok(())
    }

    /// Unit-density volume integrals of one body.
    pub fn mass_properties(&self, body: BodyId) -> AbdResult<MassProperties> {
        let prepared = self.prepared()?;
        self.check_body(body)?;
        Ok(prepared.mass_properties[body.index()])
    }

    /// `½ vᵀ M v` with `v = (q − qm1) / dt`.
    pub fn kinetic_energy(&self) -> AbdResult<f64> {
        let prepared = self.prepared()?;
        let v = split_poses(&prepared.state.velocity(self.config.timestep));
        Ok(v.iter()
            .zip(&prepared.blocks.mass)
            .map(|(v, m)| 0.5 * v.dot(&(m * v)))
            .sum())
    }

    /// Total elastic energy at the current configuration.
    pub fn elastic_energy(&self) -> AbdResult<f64> {
        Ok(self.potential_energy()?.elastic)
    }

    /// Elastic and contact energies of the current configuration, with the
    /// last contact set, against a zero-velocity inertial target.
    pub fn potential_energy(&self) -> AbdResult<EnergyBreakdown> {
        let prepared = self.prepared()?;
        let potential = IncrementalPotential {
            bodies: &prepared.blocks,
            model: self.model.as_ref(),
            penalty: PenaltyContact::new(self.config.contact_stiffness),
            contacts: &self.contacts.contacts,
            contact_pattern: &self.contacts.pattern,
            q_tilde: &prepared.state.q,
            dt: self.config.timestep,
        };
        potential.energy(&prepared.state.q)
    }

    /// Contacts used by the most recent step.
    pub fn last_contacts(&self) -> &ContactSet {
        &self.contacts
    }

    /// Current state, if set up.
    pub fn state(&self) -> Option<&SimulationState> {
        self.prepared.as_ref().map(|p| &p.state)
    }

    /// The pinning projection, if set up.
    pub fn projection(&self) -> Option<&PinningProjection> {
        self.prepared.as_ref().map(|p| &p.projection)
    }

    /// Returns true once `setup()` has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.prepared.is_some()
    }

    /// Bodies in the order they were passed to [`Simulator::new`].
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Number of bodies, pinned ones included.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// The validated configuration this simulator runs with.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Steps taken since setup or the last reset.
    pub fn step_count(&self) -> u32 {
        self.step_count
    }
}
