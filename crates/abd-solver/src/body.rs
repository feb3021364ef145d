//! Body records consumed by the simulator.
//!
//! A body is a local-space triangle mesh plus the data needed to place it
//! in the scene: density, optional stiffness, initial pose and velocity,
//! and the local DOFs held fixed for its whole lifetime.

use abd_material::MaterialProperties;
use abd_math::kinematic::{compose, from_translation};
use abd_math::{DMat3, DVec3, Vec12};
use abd_mesh::TriangleMesh;
use abd_types::constants::{DEFAULT_DENSITY, DOFS_PER_BODY};
use abd_types::{AbdError, AbdResult};

/// One affine body.
#[derive(Debug, Clone)]
pub struct Body {
    /// Label used in logs and reports.
    pub name: String,
    /// Surface mesh in the body's local frame.
    pub mesh: TriangleMesh,
    /// Volumetric density.
    pub density: f64,
    /// Orthogonality stiffness. `None` uses the config's `elastic_stiffness`.
    pub stiffness: Option<f64>,
    /// Generalized coordinates at `t = 0`.
    pub initial_q: Vec12,
    /// Initial translational velocity.
    pub initial_velocity: DVec3,
    /// Local DOF indices (0..12) held fixed.
    pub pinned_dofs: Vec<usize>,
}

impl Body {
    /// Creates an unpinned body at the identity pose, at rest.
    pub fn new(mesh: TriangleMesh) -> Self {
        Self {
            name: String::from("body"),
            mesh,
            density: DEFAULT_DENSITY,
            stiffness: None,
            initial_q: compose(DMat3::IDENTITY, DVec3::ZERO),
            initial_velocity: DVec3::ZERO,
            pinned_dofs: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = Some(stiffness);
        self
    }

    /// Takes density and stiffness from a material preset.
    pub fn with_material(mut self, material: &MaterialProperties) -> Self {
        self.density = material.density;
        self.stiffness = Some(material.stiffness);
        self
    }

    /// Places the body at `offset` with the identity linear part.
    pub fn with_translation(mut self, offset: DVec3) -> Self {
        self.initial_q = from_translation(offset);
        self
    }

    /// Places the body with an arbitrary linear part and translation.
    pub fn with_transform(mut self, linear: DMat3, offset: DVec3) -> Self {
        self.initial_q = compose(linear, offset);
        self
    }

    /// Sets the raw 12-vector initial pose.
    pub fn with_pose(mut self, q: Vec12) -> Self {
        self.initial_q = q;
        self
    }

    pub fn with_velocity(mut self, velocity: DVec3) -> Self {
        self.initial_velocity = velocity;
        self
    }

    /// Pins all 12 DOFs, making the body static.
    pub fn pinned(mut self) -> Self {
        self.pinned_dofs = (0..DOFS_PER_BODY).collect();
        self
    }

    pub fn with_pinned_dofs(mut self, dofs: impl IntoIterator<Item = usize>) -> Self {
        self.pinned_dofs = dofs.into_iter().collect();
        self
    }

    /// Returns true when every local DOF is pinned.
    pub fn is_fully_pinned(&self) -> bool {
        (0..DOFS_PER_BODY).all(|d| self.pinned_dofs.contains(&d))
    }

    /// Checks the record before setup. `index` is only used in the error.
    pub fn validate(&self, index: usize) -> AbdResult<()> {
        let invalid = |reason: String| AbdError::InvalidBody {
            body: index as u32,
            reason,
        };

        self.mesh
            .validate()
            .map_err(|e| invalid(format!("'{}': {e}", self.name)))?;
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(invalid(format!("density must be positive, got {}", self.density)));
        }
        if let Some(k) = self.stiffness {
            if !(k.is_finite() && k > 0.0) {
                return Err(invalid(format!("stiffness must be positive, got {k}")));
            }
        }
        if let Some(&dof) = self.pinned_dofs.iter().find(|&&d| d >= DOFS_PER_BODY) {
            return Err(invalid(format!(
                "pinned DOF {dof} out of range 0..{DOFS_PER_BODY}"
            )));
        }
        if self.initial_q.iter().any(|v| !v.is_finite()) {
            return Err(invalid("initial pose is not finite".into()));
        }
        if !self.initial_velocity.is_finite() {
            return Err(invalid("initial velocity is not finite".into()));
        }
        Ok(())
    }
}
