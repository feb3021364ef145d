//! Benchmark scenarios: bodies + config for each test case.
//!
//! Three canonical scenes, each over a pinned floor slab:
//! 1. **Two spheres**: one sphere resting on the floor, a second one
//!    dropped from 0.5 above it
//! 2. **Box drop**: a tilted cube falls and settles on a corner, then a face
//! 3. **Sphere pile**: a 2×2 layer of spheres with one more on top

use abd_material::MaterialProperties;
use abd_math::{DMat3, DVec3};
use abd_mesh::generators::{cuboid, slab, uv_sphere};
use abd_solver::{Body, SimulationConfig};
use serde::{Deserialize, Serialize};

/// Which benchmark scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    /// Two unit-diameter spheres stacked over the floor.
    TwoSpheres,
    /// A tilted cube dropped onto the floor.
    BoxDrop,
    /// Five spheres piled on the floor.
    SpherePile,
}

impl ScenarioKind {
    /// Returns all scenario kinds.
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::TwoSpheres,
            ScenarioKind::BoxDrop,
            ScenarioKind::SpherePile,
        ]
    }

    /// Returns a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::TwoSpheres => "two_spheres",
            ScenarioKind::BoxDrop => "box_drop",
            ScenarioKind::SpherePile => "sphere_pile",
        }
    }

    /// Parses a name produced by [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// A fully specified benchmark scenario.
pub struct Scenario {
    /// Scenario type.
    pub kind: ScenarioKind,
    /// Bodies; index 0 is always the pinned floor.
    pub bodies: Vec<Body>,
    /// Simulation configuration.
    pub config: SimulationConfig,
    /// Number of timesteps to simulate.
    pub timesteps: u32,
}

/// Contact settings shared by all scenes: stiff enough that a 1000 kg/m³
/// body rests within a few millimeters of the surface.
fn scene_config() -> SimulationConfig {
    SimulationConfig {
        contact_stiffness: 1.0e6,
        contact_threshold: 0.1,
        ..Default::default()
    }
}

fn floor() -> Body {
    Body::new(slab(8.0, 8.0, 1.0)).with_name("floor").pinned()
}

fn sphere(name: &str, radius: f64, center: DVec3) -> Body {
    Body::new(uv_sphere(radius, 8, 16))
        .with_name(name)
        .with_translation(center)
}

impl Scenario {
    /// Two spheres of radius 0.5: the lower one just above the floor, the
    /// upper one 0.5 above the lower one.
    pub fn two_spheres() -> Self {
        Self {
            kind: ScenarioKind::TwoSpheres,
            bodies: vec![
                floor(),
                sphere("lower", 0.5, DVec3::new(0.0, 0.55, 0.0)),
                sphere("upper", 0.5, DVec3::new(0.0, 2.05, 0.0)),
            ],
            config: scene_config(),
            timesteps: 200,
        }
    }

    /// A unit cube tilted about two axes, released 1.5 above the floor.
    pub fn box_drop() -> Self {
        let tilt = DMat3::from_rotation_z(0.3) * DMat3::from_rotation_x(0.2);
        Self {
            kind: ScenarioKind::BoxDrop,
            bodies: vec![
                floor(),
                Body::new(cuboid(DVec3::splat(0.5)))
                    .with_name("box")
                    .with_transform(tilt, DVec3::new(0.0, 1.5, 0.0)),
            ],
            config: scene_config(),
            timesteps: 150,
        }
    }

    /// Four spheres of radius 0.3 on the floor and a fifth dropped on top.
    pub fn sphere_pile() -> Self {
        let mut bodies = vec![floor()];
        for (i, (x, z)) in [(-0.35, -0.35), (0.35, -0.35), (-0.35, 0.35), (0.35, 0.35)]
            .into_iter()
            .enumerate()
        {
            bodies.push(sphere(&format!("base_{i}"), 0.3, DVec3::new(x, 0.32, z)));
        }
        bodies.push(sphere("top", 0.3, DVec3::new(0.05, 1.1, 0.0)));
        Self {
            kind: ScenarioKind::SpherePile,
            bodies,
            config: scene_config(),
            timesteps: 120,
        }
    }

    /// Create a scenario by kind.
    pub fn from_kind(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::TwoSpheres => Self::two_spheres(),
            ScenarioKind::BoxDrop => Self::box_drop(),
            ScenarioKind::SpherePile => Self::sphere_pile(),
        }
    }

    /// Applies a material to every free body. The floor keeps its own.
    pub fn with_material(mut self, properties: &MaterialProperties) -> Self {
        for body in self.bodies.iter_mut().filter(|b| !b.is_fully_pinned()) {
            *body = body.clone().with_material(properties);
        }
        self
    }

    /// Replaces the simulation config.
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Total vertices over all bodies.
    pub fn vertex_count(&self) -> usize {
        self.bodies.iter().map(|b| b.mesh.vertex_count()).sum()
    }

    /// Total triangles over all bodies.
    pub fn triangle_count(&self) -> usize {
        self.bodies.iter().map(|b| b.mesh.triangle_count()).sum()
    }
}
