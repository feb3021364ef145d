//! Simulation state: current and previous generalized coordinates.
//!
//! Both vectors are flat with 12 entries per body, laid out in body order,
//! so they can be handed to the global assembler and the linear solvers
//! without copies.

use abd_math::kinematic::translation;
use abd_math::linalg::TRANSLATION_DOFS;
use abd_math::{DVec3, Vec12};
use abd_types::constants::DOFS_PER_BODY;
use abd_types::{AbdError, AbdResult, BodyId};

/// Splits a flat coordinate vector into per-body 12-vectors.
pub fn split_poses(q: &[f64]) -> Vec<Vec12> {
    q.chunks_exact(DOFS_PER_BODY)
        .map(Vec12::from_column_slice)
        .collect()
}

/// `q` and `q_prev` for every body.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    /// Current generalized coordinates.
    pub q: Vec<f64>,
    /// Generalized coordinates one step earlier.
    pub qm1: Vec<f64>,
}

impl SimulationState {
    /// Builds the state from initial poses and translational velocities.
    ///
    /// `qm1` is the pose translated back by `dt · v`, so the first
    /// prediction `q + (q − qm1)` carries the initial velocity.
    pub fn from_initial(poses: &[Vec12], velocities: &[DVec3], dt: f64) -> AbdResult<Self> {
        if poses.len() != velocities.len() {
            return Err(AbdError::Dimension {
                expected: poses.len(),
                actual: velocities.len(),
            });
        }
        let mut q = Vec::with_capacity(poses.len() * DOFS_PER_BODY);
        let mut qm1 = Vec::with_capacity(poses.len() * DOFS_PER_BODY);
        for (pose, &v) in poses.iter().zip(velocities) {
            q.extend(pose.iter());
            let mut previous = *pose;
            for (&dof, shift) in TRANSLATION_DOFS.iter().zip(v.to_array()) {
                previous[dof] -= dt * shift;
            }
            qm1.extend(previous.iter());
        }
        Ok(Self { q, qm1 })
    }

    /// Number of bodies.
    pub fn body_count(&self) -> usize {
        self.q.len() / DOFS_PER_BODY
    }

    /// Current pose of one body.
    pub fn body_q(&self, body: BodyId) -> Vec12 {
        Vec12::from_column_slice(&self.q[body.dof_range()])
    }

    /// Previous pose of one body.
    pub fn body_qm1(&self, body: BodyId) -> Vec12 {
        Vec12::from_column_slice(&self.qm1[body.dof_range()])
    }

    /// Current poses of all bodies.
    pub fn poses(&self) -> Vec<Vec12> {
        split_poses(&self.q)
    }

    /// Finite-difference velocity `(q − qm1) / dt` of the flat state.
    pub fn velocity(&self, dt: f64) -> Vec<f64> {
        self.q
            .iter()
            .zip(&self.qm1)
            .map(|(q, qm1)| (q - qm1) / dt)
            .collect()
    }

    /// Translational velocity of one body.
    pub fn body_velocity(&self, body: BodyId, dt: f64) -> DVec3 {
        (translation(&self.body_q(body)) - translation(&self.body_qm1(body))) / dt
    }

    /// Shifts `q` into `qm1` and installs the new configuration.
    pub fn advance(&mut self, q_next: Vec<f64>) {
        self.qm1 = std::mem::replace(&mut self.q, q_next);
    }

    /// Returns true if any coordinate is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.q.iter().chain(&self.qm1).any(|v| !v.is_finite())
    }
}
