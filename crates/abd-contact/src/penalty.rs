//! Quadratic penalty contact energy.
//!
//! For a contact with fixed normal `n`, penetration `d = n·(x_b − x_a)`
//! and energy `E = k·d²`. With `u = J(ref_a)ᵀn` and `v = J(ref_b)ᵀn`:
//!
//! ```text
//! ∂E/∂q_a = −2kd · u          ∂E/∂q_b = +2kd · v
//! H_aa = 2k · u uᵀ            H_bb = 2k · v vᵀ
//! H_ab = −2k · u vᵀ           H_ba = H_abᵀ
//! ```
//!
//! There is no clamp on `d`: only penetrating contacts reach this model.

use abd_math::kinematic::jacobian_transpose_mul;
use abd_math::reduce::pairwise_sum;
use abd_math::{Mat12, Vec12};
use abd_types::constants::DEFAULT_CONTACT_STIFFNESS;
use rayon::prelude::*;

use crate::contact::Contact;

/// Energy, gradients and Hessian blocks of a single contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvaluation {
    /// Body owning the penetrating vertex.
    pub body_a: usize,
    /// Body being penetrated.
    pub body_b: usize,
    /// `k·d²`.
    pub energy: f64,
    /// ∂E/∂q_a.
    pub grad_a: Vec12,
    /// ∂E/∂q_b.
    pub grad_b: Vec12,
    /// ∂²E/∂q_a².
    pub h_aa: Mat12,
    /// ∂²E/∂q_b².
    pub h_bb: Mat12,
    /// ∂²E/∂q_a∂q_b.
    pub h_ab: Mat12,
    /// ∂²E/∂q_b∂q_a, the exact transpose of `h_ab`.
    pub h_ba: Mat12,
}

/// Penalty contact model `E = k·d²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenaltyContact {
    /// Penalty stiffness `k`.
    pub stiffness: f64,
}

impl Default for PenaltyContact {
    fn default() -> Self {
        Self::new(DEFAULT_CONTACT_STIFFNESS)
    }
}

impl PenaltyContact {
    /// Creates a penalty model with stiffness `k`.
    pub fn new(stiffness: f64) -> Self {
        Self { stiffness }
    }

    /// Energy of one contact.
    pub fn energy(&self, contact: &Contact, q: &[Vec12]) -> f64 {
        let d = contact.penetration(
            &q[contact.body_a as usize],
            &q[contact.body_b as usize],
        );
        self.stiffness * d * d
    }

    /// Energy, gradients and Hessian blocks of one contact.
    pub fn evaluate(&self, contact: &Contact, q: &[Vec12]) -> ContactEvaluation {
        let a = contact.body_a as usize;
        let b = contact.body_b as usize;
        let k = self.stiffness;
        let d = contact.penetration(&q[a], &q[b]);

        let u = jacobian_transpose_mul(contact.ref_a, contact.normal);
        let v = jacobian_transpose_mul(contact.ref_b, contact.normal);

        // Scale after the outer product so the diagonal blocks stay exactly symmetric.
        let h_ab = u * v.transpose() * (-2.0 * k);
        ContactEvaluation {
            body_a: a,
            body_b: b,
            energy: k * d * d,
            grad_a: -2.0 * k * d * u,
            grad_b: 2.0 * k * d * v,
            h_aa: u * u.transpose() * (2.0 * k),
            h_bb: v * v.transpose() * (2.0 * k),
            h_ab,
            h_ba: h_ab.transpose(),
        }
    }

    /// Evaluates every contact in parallel, preserving input order.
    pub fn evaluate_all(&self, contacts: &[Contact], q: &[Vec12]) -> Vec<ContactEvaluation> {
        contacts.par_iter().map(|c| self.evaluate(c, q)).collect()
    }

    /// Total energy of all contacts, reduced deterministically.
    pub fn total_energy(&self, contacts: &[Contact], q: &[Vec12]) -> f64 {
        let per_contact: Vec<f64> = contacts.par_iter().map(|c| self.energy(c, q)).collect();
        pairwise_sum(&per_contact, 0.0)
    }
}
