//! Global assembly of the incremental potential.
//!
//! One implicit Euler step minimizes
//!
//! ```text
//! Φ(q) = ½ (q − q̃)ᵀ M (q − q̃) + dt² · (E_elastic(q) + E_contact(q))
//! ```
//!
//! whose gradient `M(q − q̃) + dt²(g_e + g_c)` is the implicit Euler
//! residual and whose Hessian `M + dt²(H_e + H_c)` is its Jacobian. `M` and
//! `H_e` are block diagonal; `H_c` adds up to four blocks per contacting
//! body pair.
//!
//! Per-body and per-contact terms are evaluated in parallel, collected in
//! index order, then reduced or scattered sequentially so the result is
//! bit-identical run to run.

use abd_contact::{Contact, PenaltyContact};
use abd_material::EnergyModel;
use abd_math::linalg::TRANSLATION_DOFS;
use abd_math::reduce::pairwise_sum;
use abd_math::{BlockCsrMatrix, BlockPattern, DVec3, Mat12, Vec12};
use abd_types::constants::DOFS_PER_BODY;
use abd_types::{AbdError, AbdResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::state::split_poses;

/// Explicit prediction `q̃ = q + (q − q_prev) + dt²·g`.
///
/// Gravity acts on the translation entries only.
pub fn predict(q: &[f64], qm1: &[f64], dt: f64, gravity: DVec3) -> Vec<f64> {
    let mut q_tilde: Vec<f64> = q.iter().zip(qm1).map(|(q, qm1)| 2.0 * q - qm1).collect();
    let g = gravity.to_array();
    for body in q_tilde.chunks_exact_mut(DOFS_PER_BODY) {
        for (&dof, g) in TRANSLATION_DOFS.iter().zip(g) {
            body[dof] += dt * dt * g;
        }
    }
    q_tilde
}

/// Terms of the incremental potential at one configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyBreakdown {
    /// `½ (q − q̃)ᵀ M (q − q̃)`.
    pub inertia: f64,
    /// Unscaled elastic energy `E_elastic(q)`.
    pub elastic: f64,
    /// Unscaled contact energy `E_contact(q)`.
    pub contact: f64,
    /// `inertia + dt²·(elastic + contact)`.
    pub total: f64,
}

/// Per-body data that stays fixed across steps.
#[derive(Debug, Clone, Default)]
pub struct BodyBlocks {
    /// 12×12 mass block per body.
    pub mass: Vec<Mat12>,
    /// Volume per body, weighting the elastic energy.
    pub volumes: Vec<f64>,
    /// Orthogonality stiffness per body.
    pub stiffnesses: Vec<f64>,
}

impl BodyBlocks {
    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.mass.len()
    }

    /// Returns true if there are no bodies.
    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }
}

/// The incremental potential of one timestep.
///
/// Contacts and `q̃` are frozen for the duration of the Newton solve.
pub struct IncrementalPotential<'a> {
    /// Mass, volume and stiffness per body.
    pub bodies: &'a BodyBlocks,
    /// Elastic energy model shared by all bodies.
    pub model: &'a dyn EnergyModel,
    /// Contact penalty model.
    pub penalty: PenaltyContact,
    /// Contacts detected at the start of the step.
    pub contacts: &'a [Contact],
    /// Off-diagonal block pattern of the contacts.
    pub contact_pattern: &'a BlockPattern,
    /// Inertial target `q̃`.
    pub q_tilde: &'a [f64],
    /// Timestep.
    pub dt: f64,
}

impl IncrementalPotential<'_> {
    /// Total number of generalized coordinates.
    pub fn dimension(&self) -> usize {
        self.bodies.len() * DOFS_PER_BODY
    }

    fn check(&self, q: &[f64]) -> AbdResult<Vec<Vec12>> {
        if q.len() != self.dimension() {
            return Err(AbdError::Dimension {
                expected: self.dimension(),
                actual: q.len(),
            });
        }
        Ok(split_poses(q))
    }

    /// `M_i (q_i − q̃_i)` for every body.
    fn inertial_forces(&self, poses: &[Vec12]) -> Vec<Vec12> {
        let targets = split_poses(self.q_tilde);
        poses
            .par_iter()
            .zip(targets.par_iter())
            .zip(self.bodies.mass.par_iter())
            .map(|((q, q_tilde), m)| m * (q - q_tilde))
            .collect()
    }

    /// Evaluates every term of `Φ(q)`.
    pub fn energy(&self, q: &[f64]) -> AbdResult<EnergyBreakdown> {
        let poses = self.check(q)?;
        let targets = split_poses(self.q_tilde);

        let inertia: Vec<f64> = poses
            .par_iter()
            .zip(targets.par_iter())
            .zip(self.bodies.mass.par_iter())
            .map(|((q, q_tilde), m)| {
                let r = q - q_tilde;
                0.5 * r.dot(&(m * r))
            })
            .collect();
        let elastic: Vec<f64> = poses
            .par_iter()
            .enumerate()
            .map(|(i, qi)| {
                self.model
                    .energy(qi, self.bodies.volumes[i], self.bodies.stiffnesses[i])
            })
            .collect();

        let inertia = pairwise_sum(&inertia, 0.0);
        let elastic = pairwise_sum(&elastic, 0.0);
        let contact = self.penalty.total_energy(self.contacts, &poses);
        Ok(EnergyBreakdown {
            inertia,
            elastic,
            contact,
            total: inertia + self.dt * self.dt * (elastic + contact),
        })
    }

    /// Gradient `M(q − q̃) + dt²(g_e + g_c)`.
    pub fn gradient(&self, q: &[f64]) -> AbdResult<Vec<f64>> {
        let poses = self.check(q)?;
        let dt2 = self.dt * self.dt;
        let inertial = self.inertial_forces(&poses);
        let elastic: Vec<Vec12> = poses
            .par_iter()
            .enumerate()
            .map(|(i, qi)| {
                self.model
                    .gradient(qi, self.bodies.volumes[i], self.bodies.stiffnesses[i])
            })
            .collect();

        let mut per_body: Vec<Vec12> = inertial
            .iter()
            .zip(&elastic)
            .map(|(m, e)| m + e * dt2)
            .collect();

        // Scatter in contact order; bodies touched by several contacts sum.
        for eval in self.penalty.evaluate_all(self.contacts, &poses) {
            per_body[eval.body_a] += eval.grad_a * dt2;
            per_body[eval.body_b] += eval.grad_b * dt2;
        }

        Ok(per_body.iter().flat_map(|g| g.iter().copied()).collect())
    }

    /// Block pattern of the Hessian: every diagonal block plus the contact pairs.
    pub fn pattern(&self) -> BlockPattern {
        let mut pattern = BlockPattern::diagonal(self.bodies.len());
        pattern.extend(self.contact_pattern);
        pattern
    }

    /// Hessian `M + dt²(H_e + H_c)` in block-CSR form.
    pub fn hessian(&self, q: &[f64]) -> AbdResult<BlockCsrMatrix> {
        let poses = self.check(q)?;
        let dt2 = self.dt * self.dt;
        let n = self.bodies.len();

        let diagonal: Vec<Mat12> = poses
            .par_iter()
            .enumerate()
            .map(|(i, qi)| {
                let h = self
                    .model
                    .hessian(qi, self.bodies.volumes[i], self.bodies.stiffnesses[i]);
                self.bodies.mass[i] + h * dt2
            })
            .collect();

        let mut hessian = BlockCsrMatrix::from_pattern(n, n, &self.pattern());
        for (i, block) in diagonal.iter().enumerate() {
            hessian.add_to_block(i, i, block)?;
        }
        for eval in self.penalty.evaluate_all(self.contacts, &poses) {
            let (a, b) = (eval.body_a, eval.body_b);
            hessian.add_to_block(a, a, &(eval.h_aa * dt2))?;
            hessian.add_to_block(b, b, &(eval.h_bb * dt2))?;
            hessian.add_to_block(a, b, &(eval.h_ab * dt2))?;
            hessian.add_to_block(b, a, &(eval.h_ba * dt2))?;
        }
        Ok(hessian)
    }
}
