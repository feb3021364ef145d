//! Energy model trait, the core material abstraction.
//!
//! Every elastic model implements this trait, enabling the solver to swap
//! material strategies without changing its assembly logic.

use abd_math::{Mat12, Vec12};

/// Energy, gradient and Hessian of one body at one configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticEvaluation {
    /// Scalar elastic energy.
    pub energy: f64,
    /// ∂E/∂q.
    pub gradient: Vec12,
    /// ∂²E/∂q².
    pub hessian: Mat12,
}

/// Trait for per-body elastic energies over the 12 generalized coordinates.
///
/// All methods are pure functions of `q`, the body's volume and its
/// stiffness, so bodies can be evaluated in parallel.
///
/// Translation DOFs (3, 7, 11) must not appear in the energy: the model
/// is translation invariant.
pub trait EnergyModel: Send + Sync {
    /// Elastic energy at `q`.
    fn energy(&self, q: &Vec12, volume: f64, stiffness: f64) -> f64;

    /// Gradient of [`energy`](Self::energy) with respect to `q`.
    fn gradient(&self, q: &Vec12, volume: f64, stiffness: f64) -> Vec12;

    /// Hessian of [`energy`](Self::energy) with respect to `q`. Symmetric.
    fn hessian(&self, q: &Vec12, volume: f64, stiffness: f64) -> Mat12;

    /// All three at once. Models may override to share intermediates.
    fn evaluate(&self, q: &Vec12, volume: f64, stiffness: f64) -> ElasticEvaluation {
        ElasticEvaluation {
            energy: self.energy(q, volume, stiffness),
            gradient: self.gradient(q, volume, stiffness),
            hessian: self.hessian(q, volume, stiffness),
        }
    }

    /// Returns the name of this energy model.
    fn name(&self) -> &str;
}
