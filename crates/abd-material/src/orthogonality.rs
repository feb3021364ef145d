//! Orthogonality (near-rigidity) energy.
//!
//! Penalizes the deviation of the linear part `F` from a rotation:
//!
//! ```text
//! E(q) = ½ · k · V · ‖FᵀF − I‖²_F
//! ```
//!
//! With `C = FᵀF − I`, writing `F_ab = q[4a + b]`:
//!
//! ```text
//! ∂E/∂F_ab            = 2kV · (F C)_ab
//! ∂²E/∂F_ab ∂F_cd     = 2kV · (δ_ac C_db + F_ad F_cb + (F Fᵀ)_ac δ_bd)
//! ```
//!
//! At `F = I` the 9×9 block has eigenvalue `4kV` on symmetric
//! perturbations and `0` on the 3 infinitesimal rotations.

use abd_math::linalg::LINEAR_DOFS;
use abd_math::{Mat12, Vec12};
use nalgebra::Matrix3;

use crate::traits::{ElasticEvaluation, EnergyModel};

/// `½·k·V·‖FᵀF − I‖²` orthogonality potential.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrthogonalityModel;

impl OrthogonalityModel {
    /// Creates a new orthogonality model.
    pub fn new() -> Self {
        Self
    }
}

#[inline]
fn linear_part(q: &Vec12) -> Matrix3<f64> {
    Matrix3::new(q[0], q[1], q[2], q[4], q[5], q[6], q[8], q[9], q[10])
}

#[inline]
fn strain(f: &Matrix3<f64>) -> Matrix3<f64> {
    f.transpose() * f - Matrix3::identity()
}

fn gradient_from(f: &Matrix3<f64>, c: &Matrix3<f64>, scale: f64) -> Vec12 {
    let g = f * c * scale;
    let mut out = Vec12::zeros();
    for a in 0..3 {
        for b in 0..3 {
            out[4 * a + b] = g[(a, b)];
        }
    }
    out
}

fn hessian_from(f: &Matrix3<f64>, c: &Matrix3<f64>, scale: f64) -> Mat12 {
    let fft = f * f.transpose();
    let mut h = Mat12::zeros();
    for (r, &row) in LINEAR_DOFS.iter().enumerate() {
        let (a, b) = (r / 3, r % 3);
        for (s, &col) in LINEAR_DOFS.iter().enumerate() {
            let (e, d) = (s / 3, s % 3);
            let mut v = f[(a, d)] * f[(e, b)];
            if a == e {
                v += c[(d, b)];
            }
            if b == d {
                v += fft[(a, e)];
            }
            h[(row, col)] = scale * v;
        }
    }
    h
}

impl EnergyModel for OrthogonalityModel {
    fn energy(&self, q: &Vec12, volume: f64, stiffness: f64) -> f64 {
        let c = strain(&linear_part(q));
        0.5 * stiffness * volume * c.norm_squared()
    }

    fn gradient(&self, q: &Vec12, volume: f64, stiffness: f64) -> Vec12 {
        let f = linear_part(q);
        gradient_from(&f, &strain(&f), 2.0 * stiffness * volume)
    }

    fn hessian(&self, q: &Vec12, volume: f64, stiffness: f64) -> Mat12 {
        let f = linear_part(q);
        hessian_from(&f, &strain(&f), 2.0 * stiffness * volume)
    }

    fn evaluate(&self, q: &Vec12, volume: f64, stiffness: f64) -> ElasticEvaluation {
        let f = linear_part(q);
        let c = strain(&f);
        let scale = 2.0 * stiffness * volume;
        ElasticEvaluation {
            energy: 0.25 * scale * c.norm_squared(),
            gradient: gradient_from(&f, &c, scale),
            hessian: hessian_from(&f, &c, scale),
        }
    }

    fn name(&self) -> &str {
        "orthogonality"
    }
}
