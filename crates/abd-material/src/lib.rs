//! # abd-material
//!
//! Energy model abstraction and material database.
//!
//! ## Design
//!
//! The [`EnergyModel`] trait defines how a body's generalized coordinates
//! map to an elastic energy, its gradient, and its Hessian. The solver
//! holds a `Box<dyn EnergyModel>` and evaluates it per body, so models can
//! be swapped without touching the Newton loop.
//!
//! [`OrthogonalityModel`] is the near-rigidity energy `½·k·V·‖FᵀF − I‖²`.
//! The [`MaterialDatabase`] stores named presets (density + stiffness).

pub mod database;
pub mod orthogonality;
pub mod properties;
pub mod traits;

pub use database::MaterialDatabase;
pub use orthogonality::OrthogonalityModel;
pub use properties::MaterialProperties;
pub use traits::{ElasticEvaluation, EnergyModel};
